mod ast;
mod display;

pub use ast::{Block, Program, Stmt};
