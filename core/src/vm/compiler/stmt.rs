use super::driver::Compiler;
use crate::{
    resolve::SymbolScope,
    stmt::{Block, Stmt},
    vm::{CompileError, Opcode},
};

impl Compiler {
    pub(super) fn compile_stmt(&mut self, stmt: &Stmt) -> Result<(), CompileError> {
        match stmt {
            Stmt::Expr(expr) => {
                self.compile_expr(expr)?;
                self.emit(Opcode::Pop, &[]);
            }
            Stmt::Let { name, value } => {
                // The value is compiled before the name exists, so `let x = x`
                // only sees an outer `x`.
                self.compile_expr(value)?;
                let symbol = self.define(name)?;
                let op = match symbol.scope {
                    SymbolScope::Global => Opcode::SetGlobal,
                    _ => Opcode::SetLocal,
                };
                self.emit(op, &[symbol.index]);
            }
            Stmt::Return(value) => {
                self.compile_expr(value)?;
                self.emit(Opcode::ReturnValue, &[]);
            }
        }
        Ok(())
    }

    pub(super) fn compile_block(&mut self, block: &Block) -> Result<(), CompileError> {
        for stmt in &block.statements {
            self.compile_stmt(stmt)?;
        }
        Ok(())
    }
}
