//! The pass manager
//!
//! Passes are classified by the level of IR they run on: module, subroutine,
//! basic block or instruction. Each level has its own pass trait and its own
//! registration method, so a pass can never end up in the wrong bucket.
//! Within a level, passes run in registration order; there is no fixed-point
//! iteration.

use rill_common::RillResult;
use rill_ir::{BlockId, InstrId, Module, Subroutine};

/// A pass over a whole module
pub trait ModulePass {
    fn run_pass(&mut self, module: &mut Module) -> RillResult<()>;
}

/// A pass over a single subroutine
pub trait SubroutinePass {
    fn run_pass(&mut self, sub: &mut Subroutine) -> RillResult<()>;
}

/// A pass over a single basic block
pub trait BlockPass {
    fn run_pass(&mut self, sub: &mut Subroutine, block: BlockId) -> RillResult<()>;
}

/// A pass over a single instruction
pub trait InstructionPass {
    fn run_pass(&mut self, sub: &mut Subroutine, instr: InstrId) -> RillResult<()>;
}

/// Runs all registered passes over a module
#[derive(Default)]
pub struct PassManager {
    module_passes: Vec<Box<dyn ModulePass>>,
    subroutine_passes: Vec<Box<dyn SubroutinePass>>,
    block_passes: Vec<Box<dyn BlockPass>>,
    instruction_passes: Vec<Box<dyn InstructionPass>>,
}

impl PassManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_module_pass(&mut self, pass: Box<dyn ModulePass>) {
        self.module_passes.push(pass);
    }

    pub fn register_subroutine_pass(&mut self, pass: Box<dyn SubroutinePass>) {
        self.subroutine_passes.push(pass);
    }

    pub fn register_block_pass(&mut self, pass: Box<dyn BlockPass>) {
        self.block_passes.push(pass);
    }

    pub fn register_instruction_pass(&mut self, pass: Box<dyn InstructionPass>) {
        self.instruction_passes.push(pass);
    }

    /// Runs all the passes registered in the manager. The passes run in this
    /// order:
    /// 1. Module passes
    /// 2. Subroutine passes
    /// 3. Block passes
    /// 4. Instruction passes
    pub fn run_passes(&mut self, module: &mut Module) -> RillResult<()> {
        for pass in &mut self.module_passes {
            pass.run_pass(module)?;
        }
        for sub in module.subroutines_mut() {
            for pass in &mut self.subroutine_passes {
                pass.run_pass(sub)?;
            }
            let blocks: Vec<BlockId> = sub.blocks().collect();
            for block in blocks {
                for pass in &mut self.block_passes {
                    pass.run_pass(sub, block)?;
                }
                let instrs: Vec<InstrId> = sub.block_instrs(block).to_vec();
                for instr in instrs {
                    // A block pass may have removed the instruction already
                    if sub.instr_block(instr).is_none() {
                        continue;
                    }
                    for pass in &mut self.instruction_passes {
                        pass.run_pass(sub, instr)?;
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rill_ir::{Binding, Subroutine, Type};
    use std::cell::RefCell;
    use std::rc::Rc;

    type Trace = Rc<RefCell<Vec<String>>>;

    struct Recorder {
        label: &'static str,
        trace: Trace,
    }

    impl ModulePass for Recorder {
        fn run_pass(&mut self, module: &mut Module) -> RillResult<()> {
            self.trace.borrow_mut().push(format!("{}:{}", self.label, module.name));
            Ok(())
        }
    }

    impl SubroutinePass for Recorder {
        fn run_pass(&mut self, sub: &mut Subroutine) -> RillResult<()> {
            self.trace.borrow_mut().push(format!("{}:{}", self.label, sub.name()));
            Ok(())
        }
    }

    impl BlockPass for Recorder {
        fn run_pass(&mut self, sub: &mut Subroutine, block: BlockId) -> RillResult<()> {
            self.trace
                .borrow_mut()
                .push(format!("{}:{}", self.label, sub.block_name(block)));
            Ok(())
        }
    }

    impl InstructionPass for Recorder {
        fn run_pass(&mut self, sub: &mut Subroutine, instr: InstrId) -> RillResult<()> {
            self.trace
                .borrow_mut()
                .push(format!("{}:{}", self.label, sub.instr_kind(instr).opcode_name()));
            Ok(())
        }
    }

    #[test]
    fn test_levels_run_in_order() {
        let mut module = Module::new("m");
        let sub = module.add_subroutine(Subroutine::procedure("p", vec![], Binding::Local));
        let bb0 = sub.add_block("bb0").unwrap();
        let c = sub.new_const("c", Type::I32, "1");
        sub.add_instr(bb0, c).unwrap();

        let trace: Trace = Rc::new(RefCell::new(Vec::new()));
        let mut manager = PassManager::new();
        manager.register_instruction_pass(Box::new(Recorder {
            label: "instr",
            trace: Rc::clone(&trace),
        }));
        manager.register_block_pass(Box::new(Recorder {
            label: "block",
            trace: Rc::clone(&trace),
        }));
        manager.register_module_pass(Box::new(Recorder {
            label: "module",
            trace: Rc::clone(&trace),
        }));
        manager.register_subroutine_pass(Box::new(Recorder {
            label: "sub",
            trace: Rc::clone(&trace),
        }));

        manager.run_passes(&mut module).unwrap();
        assert_eq!(
            *trace.borrow(),
            vec!["module:m", "sub:p", "block:bb0", "instr:const"]
        );
    }

    #[test]
    fn test_registration_order_within_a_level() {
        let mut module = Module::new("m");
        let sub = module.add_subroutine(Subroutine::procedure("p", vec![], Binding::Local));
        sub.add_block("bb0").unwrap();

        let trace: Trace = Rc::new(RefCell::new(Vec::new()));
        let mut manager = PassManager::new();
        manager.register_block_pass(Box::new(Recorder { label: "first", trace: Rc::clone(&trace) }));
        manager.register_block_pass(Box::new(Recorder { label: "second", trace: Rc::clone(&trace) }));

        manager.run_passes(&mut module).unwrap();
        assert_eq!(*trace.borrow(), vec!["first:bb0", "second:bb0"]);
    }
}
