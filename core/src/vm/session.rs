use anyhow::{Context, Result};
use tracing::debug;

use crate::{
    ast::parse_program,
    val::Val,
    vm::{Bytecode, Compiler, CompilerState, Vm, VmConfig},
};

/// Incremental evaluation for a REPL: each [`Session::eval`] compiles against
/// the symbols and constants of earlier inputs and runs on the same globals.
pub struct Session {
    state: CompilerState,
    vm: Vm,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(VmConfig::default())
    }
}

impl Session {
    pub fn new(config: VmConfig) -> Self {
        Self {
            state: CompilerState::new(),
            vm: Vm::with_config(Bytecode::default(), config),
        }
    }

    /// Evaluates one chunk of source and returns the value of its last
    /// statement (for `let`, the bound value). Parse and compile failures
    /// leave the session untouched; a runtime failure keeps any globals
    /// written before it.
    pub fn eval(&mut self, src: &str) -> Result<Val> {
        let program = parse_program(src).context("parse error")?;
        if program.statements.is_empty() {
            return Ok(Val::Null);
        }

        let mut compiler = Compiler::with_state(self.state.clone());
        compiler.compile(&program).context("compile error")?;
        let (bytecode, state) = compiler.finish();
        self.state = state;
        debug!(constants = self.state.constants.len(), "session compiled input");

        self.vm.load(bytecode);
        self.vm.run().context("runtime error")?;
        Ok(self.vm.last_popped().clone())
    }

    pub fn globals(&self) -> &[Val] {
        self.vm.globals()
    }
}
