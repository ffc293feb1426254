//! Bytecode compiler and stack virtual machine.
//!
//! [`compile_program`] lowers a parsed program into [`Bytecode`]; [`Vm`]
//! executes it. [`Session`] glues both together for incremental use.

mod bytecode;
mod compiler;
mod error;
mod session;
#[allow(clippy::module_inception)]
mod vm;

pub use bytecode::*;
pub use compiler::{Compiler, CompilerState, compile_program};
pub use error::{CompileError, CompileErrors, VmError};
pub use session::Session;
pub use vm::{Vm, VmConfig};

#[cfg(test)]
mod vm_test;
