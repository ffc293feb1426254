use tracing::trace;

use super::driver::{Compiler, MAX_CONSTANTS};
use crate::{
    resolve::Symbol,
    val::Val,
    vm::{CompileError, Instructions, Opcode, make},
};

/// Placeholder written into a jump before its target is known.
pub(super) const PLACEHOLDER: usize = 9999;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct EmittedInstruction {
    pub opcode: Opcode,
    pub position: usize,
}

/// Instruction buffer of one function body (or of the main program) plus
/// the two most recent emissions, which the peephole helpers inspect.
#[derive(Debug, Clone, Default)]
pub(super) struct CompilationScope {
    pub instructions: Instructions,
    pub last: Option<EmittedInstruction>,
    pub previous: Option<EmittedInstruction>,
}

impl Compiler {
    /// Appends an instruction and returns its start offset.
    pub(super) fn emit(&mut self, op: Opcode, operands: &[usize]) -> usize {
        let ins = make(op, operands);
        let scope = &mut self.current;
        let position = scope.instructions.len();
        scope.instructions.0.extend_from_slice(&ins);
        scope.previous = scope.last;
        scope.last = Some(EmittedInstruction { opcode: op, position });
        position
    }

    pub(super) fn add_constant(&mut self, val: Val) -> Result<usize, CompileError> {
        if self.constants.len() >= MAX_CONSTANTS {
            return Err(CompileError::TooManyConstants(MAX_CONSTANTS));
        }
        self.constants.push(val);
        Ok(self.constants.len() - 1)
    }

    pub(super) fn current_position(&self) -> usize {
        self.current.instructions.len()
    }

    pub(super) fn last_instruction_is(&self, op: Opcode) -> bool {
        self.current.last.is_some_and(|last| last.opcode == op)
    }

    pub(super) fn remove_last_pop(&mut self) {
        let scope = &mut self.current;
        if let Some(last) = scope.last.filter(|last| last.opcode == Opcode::Pop) {
            scope.instructions.0.truncate(last.position);
            scope.last = scope.previous.take();
        }
    }

    /// Turns a trailing `Pop` into `ReturnValue` so a body's final expression
    /// becomes its result.
    pub(super) fn replace_last_pop_with_return(&mut self) {
        let scope = &mut self.current;
        if let Some(last) = scope.last.as_mut().filter(|last| last.opcode == Opcode::Pop) {
            scope.instructions.0[last.position] = Opcode::ReturnValue as u8;
            last.opcode = Opcode::ReturnValue;
        }
    }

    /// Rewrites the u16 target of the jump emitted at `pos`.
    pub(super) fn patch_jump(&mut self, pos: usize, target: usize) -> Result<(), CompileError> {
        let target = u16::try_from(target).map_err(|_| CompileError::JumpOutOfRange(target))?;
        if let Some(slot) = self.current.instructions.0.get_mut(pos + 1..pos + 3) {
            slot.copy_from_slice(&target.to_be_bytes());
        }
        Ok(())
    }

    pub(super) fn enter_scope(&mut self) {
        let outer = std::mem::take(&mut self.current);
        self.enclosing.push(outer);
        self.symbols.push_scope();
        trace!(depth = self.enclosing.len(), "enter compilation scope");
    }

    /// Closes the innermost function scope, returning its instructions and
    /// the symbols it captured.
    pub(super) fn leave_scope(&mut self) -> (Instructions, Vec<Symbol>) {
        let outer = self.enclosing.pop().unwrap_or_default();
        let scope = std::mem::replace(&mut self.current, outer);
        let free = self.symbols.pop_scope();
        trace!(depth = self.enclosing.len(), free = free.len(), "leave compilation scope");
        (scope.instructions, free)
    }

    /// Drops every open function scope after a failed statement.
    pub(super) fn unwind_to_main(&mut self) {
        while !self.enclosing.is_empty() {
            self.leave_scope();
        }
    }
}
