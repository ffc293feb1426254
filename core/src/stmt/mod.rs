mod stmt_impl;

pub use stmt_impl::{Block, Program, Stmt};
