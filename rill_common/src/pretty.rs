//! Pretty-printing helpers for reproducible text output
//!
//! The IR text form is compared byte-for-byte in golden tests, so all
//! indentation goes through this one type.

use std::fmt;

/// Number of spaces added per nesting level
const INDENT_WIDTH: usize = 4;

/// Simple pretty printer with scoped indentation
#[derive(Debug, Clone, Default)]
pub struct PrettyPrinter {
    data: String,
    level: usize,
}

impl PrettyPrinter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a line of data, prefixed with the current indentation
    pub fn append(&mut self, data: &str) {
        self.data.push_str(&" ".repeat(INDENT_WIDTH * self.level));
        self.data.push_str(data);
    }

    /// Adds a line of data with a newline after it
    pub fn appendln(&mut self, data: &str) {
        self.append(data);
        self.data.push('\n');
    }

    /// Adds an empty line (no indentation)
    pub fn blank(&mut self) {
        self.data.push('\n');
    }

    /// Runs `body` with the indentation deepened by one level
    pub fn indented<F: FnOnce(&mut Self)>(&mut self, body: F) {
        self.level += 1;
        body(self);
        self.level -= 1;
    }

    /// Consumes the printer and returns the accumulated output
    pub fn finish(self) -> String {
        self.data
    }
}

impl fmt::Display for PrettyPrinter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.data)
    }
}
