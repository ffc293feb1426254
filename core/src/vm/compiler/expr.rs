use std::sync::Arc;

use tracing::debug;

use super::builder::PLACEHOLDER;
use super::driver::{Compiler, MAX_ARGUMENTS, MAX_ELEMENTS, MAX_FREE};
use crate::{
    expr::Expr,
    op::{BinOp, UnaryOp},
    stmt::Block,
    val::{CompiledFunction, Val},
    vm::{CompileError, Opcode},
};

impl Compiler {
    pub(super) fn compile_expr(&mut self, expr: &Expr) -> Result<(), CompileError> {
        match expr {
            Expr::Int(i) => {
                let idx = self.add_constant(Val::Int(*i))?;
                self.emit(Opcode::Constant, &[idx]);
            }
            Expr::Str(s) => {
                let idx = self.add_constant(Val::from(s.as_str()))?;
                self.emit(Opcode::Constant, &[idx]);
            }
            Expr::Bool(true) => {
                self.emit(Opcode::True, &[]);
            }
            Expr::Bool(false) => {
                self.emit(Opcode::False, &[]);
            }
            Expr::Ident(name) => {
                let symbol = self
                    .symbols
                    .resolve(name)
                    .ok_or_else(|| CompileError::UndefinedVariable(name.clone()))?;
                self.load_symbol(&symbol);
            }
            Expr::Prefix(op, right) => {
                self.compile_expr(right)?;
                let opcode = match op {
                    UnaryOp::Not => Opcode::Bang,
                    UnaryOp::Neg => Opcode::Minus,
                };
                self.emit(opcode, &[]);
            }
            Expr::Infix(left, BinOp::Lt, right) => {
                // a < b  ==>  b > a
                self.compile_expr(right)?;
                self.compile_expr(left)?;
                self.emit(Opcode::GreaterThan, &[]);
            }
            Expr::Infix(left, op, right) => {
                self.compile_expr(left)?;
                self.compile_expr(right)?;
                let opcode = match op {
                    BinOp::Add => Opcode::Add,
                    BinOp::Sub => Opcode::Sub,
                    BinOp::Mul => Opcode::Mul,
                    BinOp::Div => Opcode::Div,
                    BinOp::Eq => Opcode::Equal,
                    BinOp::Ne => Opcode::NotEqual,
                    BinOp::Gt | BinOp::Lt => Opcode::GreaterThan,
                };
                self.emit(opcode, &[]);
            }
            Expr::If {
                condition,
                consequence,
                alternative,
            } => self.compile_if(condition, consequence, alternative.as_ref())?,
            Expr::Array(items) => {
                if items.len() > MAX_ELEMENTS {
                    return Err(CompileError::TooManyElements(MAX_ELEMENTS));
                }
                for item in items {
                    self.compile_expr(item)?;
                }
                self.emit(Opcode::Array, &[items.len()]);
            }
            Expr::Hash(pairs) => {
                if pairs.len() * 2 > MAX_ELEMENTS {
                    return Err(CompileError::TooManyElements(MAX_ELEMENTS));
                }
                for (key, value) in pairs {
                    self.compile_expr(key)?;
                    self.compile_expr(value)?;
                }
                self.emit(Opcode::Hash, &[pairs.len() * 2]);
            }
            Expr::Index(left, index) => {
                self.compile_expr(left)?;
                self.compile_expr(index)?;
                self.emit(Opcode::Index, &[]);
            }
            Expr::Function { name, params, body } => {
                self.compile_function(name.as_deref(), params, body)?;
            }
            Expr::Call { function, args } => {
                if args.len() > MAX_ARGUMENTS {
                    return Err(CompileError::TooManyArguments(MAX_ARGUMENTS));
                }
                self.compile_expr(function)?;
                for arg in args {
                    self.compile_expr(arg)?;
                }
                self.emit(Opcode::Call, &[args.len()]);
            }
        }
        Ok(())
    }

    /// Every `if` leaves exactly one value: a branch that does not end in
    /// an expression, and a missing `else`, yield `null`.
    fn compile_if(
        &mut self,
        condition: &Expr,
        consequence: &Block,
        alternative: Option<&Block>,
    ) -> Result<(), CompileError> {
        self.compile_expr(condition)?;
        let jump_not_truthy = self.emit(Opcode::JumpNotTruthy, &[PLACEHOLDER]);

        self.compile_branch(consequence)?;
        let jump = self.emit(Opcode::Jump, &[PLACEHOLDER]);
        let after_consequence = self.current_position();
        self.patch_jump(jump_not_truthy, after_consequence)?;

        match alternative {
            Some(block) => self.compile_branch(block)?,
            None => {
                self.emit(Opcode::Null, &[]);
            }
        }
        let after_alternative = self.current_position();
        self.patch_jump(jump, after_alternative)
    }

    fn compile_branch(&mut self, block: &Block) -> Result<(), CompileError> {
        let start = self.current_position();
        self.compile_block(block)?;
        if self.current_position() > start && self.last_instruction_is(Opcode::Pop) {
            self.remove_last_pop();
        } else {
            self.emit(Opcode::Null, &[]);
        }
        Ok(())
    }

    fn compile_function(&mut self, name: Option<&str>, params: &[String], body: &Block) -> Result<(), CompileError> {
        self.enter_scope();
        if let Some(name) = name {
            self.symbols.define_function_name(name);
        }
        for param in params {
            self.define(param)?;
        }
        self.compile_block(body)?;
        if self.last_instruction_is(Opcode::Pop) {
            self.replace_last_pop_with_return();
        }
        if !self.last_instruction_is(Opcode::ReturnValue) {
            self.emit(Opcode::Return, &[]);
        }

        let num_locals = self.symbols.num_definitions();
        let (instructions, free) = self.leave_scope();
        if free.len() > MAX_FREE {
            return Err(CompileError::TooManyFreeVariables(MAX_FREE));
        }
        for symbol in &free {
            self.load_symbol(symbol);
        }

        let func = CompiledFunction {
            instructions,
            num_locals,
            num_parameters: params.len(),
        };
        let idx = self.add_constant(Val::Function(Arc::new(func)))?;
        debug!(
            name = name.unwrap_or("<anonymous>"),
            constant = idx,
            num_locals,
            free = free.len(),
            "compiled function"
        );
        self.emit(Opcode::Closure, &[idx, free.len()]);
        Ok(())
    }
}
