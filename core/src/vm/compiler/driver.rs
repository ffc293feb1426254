use tracing::debug;

use super::builder::CompilationScope;
use crate::{
    resolve::{Symbol, SymbolScope, SymbolTable},
    stmt::Program,
    val::{BUILTINS, Val},
    vm::{Bytecode, CompileError, CompileErrors, Opcode},
};

pub(super) const MAX_CONSTANTS: usize = 1 << 16;
pub(super) const MAX_GLOBALS: usize = 1 << 16;
pub(super) const MAX_LOCALS: usize = 1 << 8;
pub(super) const MAX_ARGUMENTS: usize = u8::MAX as usize;
pub(super) const MAX_FREE: usize = u8::MAX as usize;
pub(super) const MAX_ELEMENTS: usize = u16::MAX as usize;

/// What survives between compilations in an interactive session: the global
/// symbols and the constant pool they index into.
#[derive(Debug, Clone)]
pub struct CompilerState {
    pub symbols: SymbolTable,
    pub constants: Vec<Val>,
}

impl CompilerState {
    /// Fresh state with every builtin registered.
    pub fn new() -> Self {
        let mut symbols = SymbolTable::new();
        for (index, builtin) in BUILTINS.iter().enumerate() {
            symbols.define_builtin(index, builtin.name);
        }
        Self {
            symbols,
            constants: Vec::new(),
        }
    }
}

impl Default for CompilerState {
    fn default() -> Self {
        Self::new()
    }
}

/// Lowers a [`Program`] to stack bytecode.
///
/// Calling [`Compiler::compile`] again appends to the same main instruction
/// stream. After a failed compile the instruction stream is unspecified and
/// should be discarded.
pub struct Compiler {
    pub(super) constants: Vec<Val>,
    pub(super) symbols: SymbolTable,
    pub(super) current: CompilationScope,
    pub(super) enclosing: Vec<CompilationScope>,
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

impl Compiler {
    pub fn new() -> Self {
        Self::with_state(CompilerState::new())
    }

    pub fn with_state(state: CompilerState) -> Self {
        Self {
            constants: state.constants,
            symbols: state.symbols,
            current: CompilationScope::default(),
            enclosing: Vec::new(),
        }
    }

    /// Compiles every top-level statement. A failing statement is reported
    /// and compilation moves on to the next one, so all independent errors
    /// surface together.
    pub fn compile(&mut self, program: &Program) -> Result<(), CompileErrors> {
        debug!(statements = program.statements.len(), "compiling program");
        let mut errors = Vec::new();
        for stmt in &program.statements {
            if let Err(err) = self.compile_stmt(stmt) {
                debug!(error = %err, "statement failed to compile");
                errors.push(err);
                self.unwind_to_main();
            }
        }
        if errors.is_empty() {
            debug!(
                bytes = self.current.instructions.len(),
                constants = self.constants.len(),
                "compiled program"
            );
            Ok(())
        } else {
            Err(CompileErrors(errors))
        }
    }

    pub fn bytecode(&self) -> Bytecode {
        Bytecode {
            instructions: self.current.instructions.clone(),
            constants: self.constants.clone(),
        }
    }

    pub fn into_state(self) -> CompilerState {
        CompilerState {
            symbols: self.symbols,
            constants: self.constants,
        }
    }

    /// Consumes the compiler, yielding the program and the state to resume from.
    pub fn finish(self) -> (Bytecode, CompilerState) {
        let bytecode = Bytecode {
            instructions: self.current.instructions,
            constants: self.constants.clone(),
        };
        let state = CompilerState {
            symbols: self.symbols,
            constants: self.constants,
        };
        (bytecode, state)
    }

    /// Binds `name` in the innermost scope, enforcing the per-scope slot limit.
    pub(super) fn define(&mut self, name: &str) -> Result<Symbol, CompileError> {
        let n = self.symbols.num_definitions();
        if self.symbols.is_global() {
            if n >= MAX_GLOBALS {
                return Err(CompileError::TooManyGlobals(MAX_GLOBALS));
            }
        } else if n >= MAX_LOCALS {
            return Err(CompileError::TooManyLocals(MAX_LOCALS));
        }
        Ok(self.symbols.define(name))
    }

    pub(super) fn load_symbol(&mut self, symbol: &Symbol) {
        match symbol.scope {
            SymbolScope::Global => self.emit(Opcode::GetGlobal, &[symbol.index]),
            SymbolScope::Local => self.emit(Opcode::GetLocal, &[symbol.index]),
            SymbolScope::Builtin => self.emit(Opcode::GetBuiltin, &[symbol.index]),
            SymbolScope::Free => self.emit(Opcode::GetFree, &[symbol.index]),
            SymbolScope::Function => self.emit(Opcode::CurrentClosure, &[]),
        };
    }
}

/// Compiles a standalone program with a fresh symbol table.
pub fn compile_program(program: &Program) -> Result<Bytecode, CompileErrors> {
    let mut compiler = Compiler::new();
    compiler.compile(program)?;
    Ok(compiler.finish().0)
}
