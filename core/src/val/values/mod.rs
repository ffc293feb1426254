use std::{collections::BTreeMap, fmt, sync::Arc};

use crate::{val::Builtin, vm::Instructions, vm::VmError};

mod convert;

/// Runtime value. Heap-backed variants share their payload through `Arc`, so
/// cloning a `Val` never deep-copies and values can cross thread boundaries.
#[derive(Debug, Clone)]
pub enum Val {
    Int(i64),
    Bool(bool),
    Str(Arc<str>),
    Null,
    Array(Arc<[Val]>),
    Hash(Arc<BTreeMap<HashKey, Val>>),
    Function(Arc<CompiledFunction>),
    Closure(Arc<Closure>),
    Builtin(&'static Builtin),
}

/// The subset of values usable as hash keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HashKey {
    Int(i64),
    Bool(bool),
    Str(Arc<str>),
}

impl From<HashKey> for Val {
    fn from(key: HashKey) -> Self {
        match key {
            HashKey::Int(i) => Val::Int(i),
            HashKey::Bool(b) => Val::Bool(b),
            HashKey::Str(s) => Val::Str(s),
        }
    }
}

impl fmt::Display for HashKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HashKey::Int(i) => f.write_str(itoa::Buffer::new().format(*i)),
            HashKey::Bool(b) => write!(f, "{b}"),
            HashKey::Str(s) => f.write_str(s),
        }
    }
}

/// A function body lowered to bytecode. Lives in the constant pool.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledFunction {
    pub instructions: Instructions,
    pub num_locals: usize,
    pub num_parameters: usize,
}

/// A compiled function paired with the values it captured when it was built.
#[derive(Debug, Clone)]
pub struct Closure {
    pub func: Arc<CompiledFunction>,
    pub free: Vec<Val>,
}

impl Closure {
    pub fn new(func: Arc<CompiledFunction>, free: Vec<Val>) -> Self {
        Self { func, free }
    }
}

impl Val {
    pub const TRUE: Val = Val::Bool(true);
    pub const FALSE: Val = Val::Bool(false);

    pub fn type_name(&self) -> &'static str {
        match self {
            Val::Int(_) => "INTEGER",
            Val::Bool(_) => "BOOLEAN",
            Val::Str(_) => "STRING",
            Val::Null => "NULL",
            Val::Array(_) => "ARRAY",
            Val::Hash(_) => "HASH",
            Val::Function(_) => "COMPILED_FUNCTION",
            Val::Closure(_) => "CLOSURE",
            Val::Builtin(_) => "BUILTIN",
        }
    }

    /// Only `false` and `null` are falsy.
    #[inline]
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Val::Bool(false) | Val::Null)
    }

    pub fn hash_key(&self) -> Result<HashKey, VmError> {
        match self {
            Val::Int(i) => Ok(HashKey::Int(*i)),
            Val::Bool(b) => Ok(HashKey::Bool(*b)),
            Val::Str(s) => Ok(HashKey::Str(Arc::clone(s))),
            other => Err(VmError::UnhashableKey(other.type_name())),
        }
    }

    /// Index into an array or hash. Missing entries are `null`, not errors.
    pub fn index(&self, idx: &Val) -> Result<Val, VmError> {
        match (self, idx) {
            (Val::Array(items), Val::Int(i)) => Ok(usize::try_from(*i)
                .ok()
                .and_then(|i| items.get(i))
                .cloned()
                .unwrap_or(Val::Null)),
            (Val::Hash(map), key) => {
                let key = key.hash_key()?;
                Ok(map.get(&key).cloned().unwrap_or(Val::Null))
            }
            (container, idx) => Err(VmError::IndexNotSupported {
                container: container.type_name(),
                index: idx.type_name(),
            }),
        }
    }
}

impl PartialEq for Val {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Val::Int(a), Val::Int(b)) => a == b,
            (Val::Bool(a), Val::Bool(b)) => a == b,
            (Val::Str(a), Val::Str(b)) => a == b,
            (Val::Null, Val::Null) => true,
            (Val::Array(a), Val::Array(b)) => a == b,
            (Val::Hash(a), Val::Hash(b)) => a == b,
            (Val::Function(a), Val::Function(b)) => Arc::ptr_eq(a, b),
            (Val::Closure(a), Val::Closure(b)) => Arc::ptr_eq(a, b),
            (Val::Builtin(a), Val::Builtin(b)) => a.name == b.name,
            _ => false,
        }
    }
}

impl fmt::Display for Val {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Val::Int(i) => f.write_str(itoa::Buffer::new().format(*i)),
            Val::Bool(b) => write!(f, "{b}"),
            Val::Str(s) => f.write_str(s),
            Val::Null => f.write_str("null"),
            Val::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Val::Hash(map) => {
                f.write_str("{")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                f.write_str("}")
            }
            Val::Function(func) => write!(f, "CompiledFunction[{} params]", func.num_parameters),
            Val::Closure(closure) => write!(
                f,
                "Closure[{} params, {} free]",
                closure.func.num_parameters,
                closure.free.len()
            ),
            Val::Builtin(builtin) => write!(f, "builtin function {}", builtin.name),
        }
    }
}
