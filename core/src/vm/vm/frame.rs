use std::sync::Arc;

use crate::val::Closure;
use crate::vm::{VmError, read_u8, read_u16};

/// Activation record of one closure call.
#[derive(Debug, Clone)]
pub(super) struct Frame {
    pub(super) closure: Arc<Closure>,
    /// Offset of the next byte to decode.
    pub(super) ip: usize,
    /// Stack slot of the first argument; locals follow it.
    pub(super) base_pointer: usize,
}

impl Frame {
    pub(super) fn new(closure: Arc<Closure>, base_pointer: usize) -> Self {
        Self {
            closure,
            ip: 0,
            base_pointer,
        }
    }

    #[inline]
    pub(super) fn instructions(&self) -> &[u8] {
        self.closure.func.instructions.as_bytes()
    }

    #[inline]
    pub(super) fn read_u16(&mut self) -> Result<usize, VmError> {
        let operand = read_u16(self.instructions(), self.ip).ok_or(VmError::MalformedBytecode {
            ip: self.ip,
            reason: "truncated u16 operand",
        })?;
        self.ip += 2;
        Ok(operand as usize)
    }

    #[inline]
    pub(super) fn read_u8(&mut self) -> Result<usize, VmError> {
        let operand = read_u8(self.instructions(), self.ip).ok_or(VmError::MalformedBytecode {
            ip: self.ip,
            reason: "truncated u8 operand",
        })?;
        self.ip += 1;
        Ok(operand as usize)
    }
}
