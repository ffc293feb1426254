use std::{collections::BTreeMap, sync::Arc};

use tracing::{debug, trace};

use super::{Vm, frame::Frame};
use crate::{
    op::{BinOp, UnaryOp},
    val::{BUILTINS, Builtin, Closure, Val},
    vm::{Opcode, VmError},
};

fn malformed(ip: usize, reason: &'static str) -> VmError {
    VmError::MalformedBytecode { ip, reason }
}

impl Vm {
    /// Executes the loaded program from its first instruction. The stack and
    /// frames start fresh; globals do not.
    pub fn run(&mut self) -> Result<(), VmError> {
        self.reset();
        debug!(
            bytes = self.main.func.instructions.len(),
            constants = self.constants.len(),
            "vm run"
        );
        let result = self.execute();
        match &result {
            Ok(()) => debug!(sp = self.sp, "vm finished"),
            Err(err) => debug!(error = %err, depth = self.frame_depth(), "vm halted"),
        }
        result
    }

    fn execute(&mut self) -> Result<(), VmError> {
        loop {
            let ip = self.current.ip;
            let Some(&byte) = self.current.instructions().get(ip) else {
                if self.frames.is_empty() {
                    return Ok(());
                }
                return Err(malformed(ip, "function ended without returning"));
            };
            self.current.ip += 1;

            match Opcode::try_from(byte)? {
                Opcode::Constant => {
                    let idx = self.current.read_u16()?;
                    let val = self
                        .constants
                        .get(idx)
                        .cloned()
                        .ok_or(malformed(ip, "constant index out of range"))?;
                    self.push(val)?;
                }
                Opcode::Pop => {
                    self.pop()?;
                }
                Opcode::Add => self.binary(BinOp::Add)?,
                Opcode::Sub => self.binary(BinOp::Sub)?,
                Opcode::Mul => self.binary(BinOp::Mul)?,
                Opcode::Div => self.binary(BinOp::Div)?,
                Opcode::Equal => self.binary(BinOp::Eq)?,
                Opcode::NotEqual => self.binary(BinOp::Ne)?,
                Opcode::GreaterThan => self.binary(BinOp::Gt)?,
                Opcode::True => self.push(Val::TRUE)?,
                Opcode::False => self.push(Val::FALSE)?,
                Opcode::Null => self.push(Val::Null)?,
                Opcode::Minus => {
                    let operand = self.pop()?;
                    self.push(UnaryOp::Neg.eval(&operand)?)?;
                }
                Opcode::Bang => {
                    let operand = self.pop()?;
                    self.push(UnaryOp::Not.eval(&operand)?)?;
                }
                Opcode::Jump => {
                    let target = self.current.read_u16()?;
                    self.current.ip = target;
                }
                Opcode::JumpNotTruthy => {
                    let target = self.current.read_u16()?;
                    if !self.pop()?.is_truthy() {
                        self.current.ip = target;
                    }
                }
                Opcode::SetGlobal => {
                    let idx = self.current.read_u16()?;
                    if idx >= self.config.globals_size {
                        return Err(VmError::GlobalsOverflow(idx));
                    }
                    let val = self.pop()?;
                    if idx >= self.globals.len() {
                        self.globals.resize(idx + 1, Val::Null);
                    }
                    self.globals[idx] = val;
                }
                Opcode::GetGlobal => {
                    let idx = self.current.read_u16()?;
                    let val = self.globals.get(idx).cloned().unwrap_or(Val::Null);
                    self.push(val)?;
                }
                Opcode::SetLocal => {
                    let slot = self.current.base_pointer + self.current.read_u8()?;
                    let val = self.pop()?;
                    *self
                        .stack
                        .get_mut(slot)
                        .ok_or(malformed(ip, "local slot out of range"))? = val;
                }
                Opcode::GetLocal => {
                    let slot = self.current.base_pointer + self.current.read_u8()?;
                    let val = self
                        .stack
                        .get(slot)
                        .cloned()
                        .ok_or(malformed(ip, "local slot out of range"))?;
                    self.push(val)?;
                }
                Opcode::GetFree => {
                    let idx = self.current.read_u8()?;
                    let val = self
                        .current
                        .closure
                        .free
                        .get(idx)
                        .cloned()
                        .ok_or(malformed(ip, "free variable index out of range"))?;
                    self.push(val)?;
                }
                Opcode::GetBuiltin => {
                    let idx = self.current.read_u8()?;
                    let builtin = BUILTINS.get(idx).ok_or(malformed(ip, "unknown builtin"))?;
                    self.push(Val::Builtin(builtin))?;
                }
                Opcode::CurrentClosure => {
                    let closure = Arc::clone(&self.current.closure);
                    self.push(Val::Closure(closure))?;
                }
                Opcode::Array => {
                    let n = self.current.read_u16()?;
                    let start = self.sp.checked_sub(n).ok_or(VmError::StackUnderflow)?;
                    let items: Arc<[Val]> = self.stack[start..self.sp].iter().cloned().collect();
                    self.sp = start;
                    self.push(Val::Array(items))?;
                }
                Opcode::Hash => {
                    let n = self.current.read_u16()?;
                    let start = self.sp.checked_sub(n).ok_or(VmError::StackUnderflow)?;
                    let mut map = BTreeMap::new();
                    for pair in self.stack[start..self.sp].chunks_exact(2) {
                        map.insert(pair[0].hash_key()?, pair[1].clone());
                    }
                    self.sp = start;
                    self.push(Val::Hash(Arc::new(map)))?;
                }
                Opcode::Index => {
                    let index = self.pop()?;
                    let container = self.pop()?;
                    self.push(container.index(&index)?)?;
                }
                Opcode::Call => {
                    let num_args = self.current.read_u8()?;
                    self.call(num_args)?;
                }
                Opcode::ReturnValue => {
                    let ret = self.pop()?;
                    if !self.return_from_call(ret)? {
                        return Ok(());
                    }
                }
                Opcode::Return => {
                    if !self.return_from_call(Val::Null)? {
                        return Ok(());
                    }
                }
                Opcode::Closure => {
                    let const_idx = self.current.read_u16()?;
                    let num_free = self.current.read_u8()?;
                    self.push_closure(ip, const_idx, num_free)?;
                }
            }
        }
    }

    fn binary(&mut self, op: BinOp) -> Result<(), VmError> {
        let right = self.pop()?;
        let left = self.pop()?;
        self.push(op.eval(&left, &right)?)
    }

    /// The callee sits below its `num_args` arguments.
    fn call(&mut self, num_args: usize) -> Result<(), VmError> {
        let callee_slot = self.sp.checked_sub(num_args + 1).ok_or(VmError::StackUnderflow)?;
        match &self.stack[callee_slot] {
            Val::Closure(closure) => {
                let closure = Arc::clone(closure);
                self.call_closure(closure, num_args)
            }
            Val::Builtin(builtin) => {
                let builtin = *builtin;
                self.call_builtin(builtin, num_args)
            }
            other => Err(VmError::NotCallable(other.type_name())),
        }
    }

    fn call_closure(&mut self, closure: Arc<Closure>, num_args: usize) -> Result<(), VmError> {
        let func = &closure.func;
        if num_args != func.num_parameters {
            return Err(VmError::WrongArgumentCount {
                want: func.num_parameters,
                got: num_args,
            });
        }
        if self.frame_depth() >= self.config.max_frames {
            return Err(VmError::FrameOverflow(self.config.max_frames));
        }
        let base_pointer = self.sp - num_args;
        let sp = base_pointer + func.num_locals;
        if sp > self.stack.len() {
            return Err(VmError::StackOverflow);
        }
        // locals beyond the arguments may hold stale values from earlier calls
        for slot in self.stack.iter_mut().take(sp).skip(base_pointer + num_args) {
            *slot = Val::Null;
        }
        trace!(
            args = num_args,
            locals = func.num_locals,
            depth = self.frame_depth() + 1,
            "call closure"
        );
        let caller = std::mem::replace(&mut self.current, Frame::new(closure, base_pointer));
        self.frames.push(caller);
        self.sp = sp;
        Ok(())
    }

    fn call_builtin(&mut self, builtin: &'static Builtin, num_args: usize) -> Result<(), VmError> {
        let args = &self.stack[self.sp - num_args..self.sp];
        trace!(name = builtin.name, args = num_args, "call builtin");
        let result = (builtin.func)(args).map_err(|err| VmError::Builtin {
            name: builtin.name,
            message: err.to_string(),
        })?;
        self.sp -= num_args + 1;
        self.push(result)
    }

    /// Pops the current frame and pushes `ret` in place of the callee.
    /// Returns `false` when the main frame itself returned.
    fn return_from_call(&mut self, ret: Val) -> Result<bool, VmError> {
        let Some(caller) = self.frames.pop() else {
            return Ok(false);
        };
        let finished = std::mem::replace(&mut self.current, caller);
        self.sp = finished
            .base_pointer
            .checked_sub(1)
            .ok_or(VmError::StackUnderflow)?;
        self.push(ret)?;
        Ok(true)
    }

    fn push_closure(&mut self, ip: usize, const_idx: usize, num_free: usize) -> Result<(), VmError> {
        let func = match self.constants.get(const_idx) {
            Some(Val::Function(func)) => Arc::clone(func),
            Some(_) => return Err(malformed(ip, "closure constant is not a function")),
            None => return Err(malformed(ip, "constant index out of range")),
        };
        let start = self.sp.checked_sub(num_free).ok_or(VmError::StackUnderflow)?;
        let free = self.stack[start..self.sp].to_vec();
        self.sp = start;
        self.push(Val::Closure(Arc::new(Closure::new(func, free))))
    }
}
