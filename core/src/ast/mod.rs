mod parser;


pub use parser::{Parser, parse_program};
