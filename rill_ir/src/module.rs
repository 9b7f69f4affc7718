//! Module definitions for the Rill IR

use crate::subroutine::Subroutine;
use serde::{Deserialize, Serialize};

/// A container for subroutines
///
/// The module also owns the shared counter handed out to global constants,
/// so every `gconst` in the module gets a distinct id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    pub name: String,
    subroutines: Vec<Subroutine>,
    next_const_id: u64,
}

impl Module {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            subroutines: Vec::new(),
            next_const_id: 0,
        }
    }

    /// Adds a subroutine to the module
    pub fn add_subroutine(&mut self, subroutine: Subroutine) -> &mut Subroutine {
        self.subroutines.push(subroutine);
        let last = self.subroutines.len() - 1;
        &mut self.subroutines[last]
    }

    pub fn subroutines(&self) -> &[Subroutine] {
        &self.subroutines
    }

    pub fn subroutines_mut(&mut self) -> &mut [Subroutine] {
        &mut self.subroutines
    }

    /// Hands out the next global-constant id
    pub fn next_const_id(&mut self) -> u64 {
        let id = self.next_const_id;
        self.next_const_id += 1;
        id
    }
}
