mod exec;
mod frame;

use std::sync::Arc;

use crate::val::{Closure, CompiledFunction, Val};
use crate::vm::{Bytecode, VmError};

use frame::Frame;

static NULL: Val = Val::Null;

/// Capacities fixed when a [`Vm`] is built. Exceeding any of them is a
/// runtime error, never a reallocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VmConfig {
    pub stack_size: usize,
    pub globals_size: usize,
    pub max_frames: usize,
}

impl Default for VmConfig {
    fn default() -> Self {
        Self {
            stack_size: 2048,
            globals_size: 65536,
            max_frames: 1024,
        }
    }
}

/// Stack machine executing one [`Bytecode`] program at a time.
///
/// `sp` always points at the next free slot, so `stack[sp]` holds the value
/// most recently popped. Globals survive [`Vm::load`], which is what lets a
/// REPL feed programs one line at a time.
pub struct Vm {
    config: VmConfig,
    constants: Vec<Val>,
    main: Arc<Closure>,
    stack: Vec<Val>,
    sp: usize,
    globals: Vec<Val>,
    current: Frame,
    /// Suspended callers, innermost last.
    frames: Vec<Frame>,
}

fn main_closure(bytecode: &mut Bytecode) -> Arc<Closure> {
    let func = CompiledFunction {
        instructions: std::mem::take(&mut bytecode.instructions),
        num_locals: 0,
        num_parameters: 0,
    };
    Arc::new(Closure::new(Arc::new(func), Vec::new()))
}

impl Vm {
    pub fn new(bytecode: Bytecode) -> Self {
        Self::with_config(bytecode, VmConfig::default())
    }

    pub fn with_config(mut bytecode: Bytecode, config: VmConfig) -> Self {
        let main = main_closure(&mut bytecode);
        Self {
            config,
            constants: bytecode.constants,
            current: Frame::new(Arc::clone(&main), 0),
            main,
            stack: vec![Val::Null; config.stack_size],
            sp: 0,
            globals: Vec::new(),
            frames: Vec::with_capacity(config.max_frames.min(64)),
        }
    }

    /// Swaps in a new program, keeping globals.
    pub fn load(&mut self, mut bytecode: Bytecode) {
        self.main = main_closure(&mut bytecode);
        self.constants = bytecode.constants;
        self.reset();
    }

    fn reset(&mut self) {
        self.sp = 0;
        self.frames.clear();
        self.current = Frame::new(Arc::clone(&self.main), 0);
    }

    /// The value left behind by the most recent pop.
    pub fn last_popped(&self) -> &Val {
        self.stack.get(self.sp).unwrap_or(&NULL)
    }

    pub fn stack_top(&self) -> Option<&Val> {
        self.sp.checked_sub(1).and_then(|top| self.stack.get(top))
    }

    /// Globals written so far; unset slots below the highest written one are
    /// `null`.
    pub fn globals(&self) -> &[Val] {
        &self.globals
    }

    /// Number of active frames, the main frame included.
    pub fn frame_depth(&self) -> usize {
        self.frames.len() + 1
    }

    #[inline]
    fn push(&mut self, val: Val) -> Result<(), VmError> {
        let slot = self.stack.get_mut(self.sp).ok_or(VmError::StackOverflow)?;
        *slot = val;
        self.sp += 1;
        Ok(())
    }

    #[inline]
    fn pop(&mut self) -> Result<Val, VmError> {
        self.sp = self.sp.checked_sub(1).ok_or(VmError::StackUnderflow)?;
        Ok(self.stack[self.sp].clone())
    }
}
