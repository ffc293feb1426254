mod builtins;
mod values;


pub use builtins::{BUILTINS, Builtin, BuiltinFn, builtin_index};
pub use values::{Closure, CompiledFunction, HashKey, Val};
