mod symbols;


pub use symbols::{Symbol, SymbolScope, SymbolTable};
