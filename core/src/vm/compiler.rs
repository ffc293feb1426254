mod builder;
mod driver;
mod expr;
mod stmt;

pub use driver::{Compiler, CompilerState, compile_program};
