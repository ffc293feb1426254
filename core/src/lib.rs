//! Monkey language toolchain: tokenizer, Pratt parser, bytecode compiler and
//! stack virtual machine.

pub mod ast;
pub mod expr;
mod op;
pub mod resolve;
pub mod stmt;
pub mod token;
pub mod val;
pub mod vm;

pub use op::{BinOp, UnaryOp};
