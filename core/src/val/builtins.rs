use std::{fmt, sync::Arc};

use anyhow::{Result, anyhow, bail};

use crate::val::Val;

/// Native function signature. Errors are surfaced by the VM as runtime errors
/// naming the builtin.
pub type BuiltinFn = fn(args: &[Val]) -> Result<Val>;

pub struct Builtin {
    pub name: &'static str,
    pub func: BuiltinFn,
}

impl fmt::Debug for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Builtin").field("name", &self.name).finish()
    }
}

/// The fixed builtin table. A builtin's position here is its symbol index, so
/// entries may only ever be appended.
pub static BUILTINS: [Builtin; 6] = [
    Builtin { name: "len", func: len },
    Builtin { name: "puts", func: puts },
    Builtin { name: "first", func: first },
    Builtin { name: "last", func: last },
    Builtin { name: "rest", func: rest },
    Builtin { name: "push", func: push },
];

pub fn builtin_index(name: &str) -> Option<usize> {
    BUILTINS.iter().position(|b| b.name == name)
}

fn expect_args(args: &[Val], want: usize) -> Result<()> {
    if args.len() != want {
        bail!("wrong number of arguments. got={}, want={}", args.len(), want);
    }
    Ok(())
}

fn array_arg<'a>(name: &str, val: &'a Val) -> Result<&'a Arc<[Val]>> {
    match val {
        Val::Array(items) => Ok(items),
        other => Err(anyhow!("argument to `{}` must be ARRAY, got {}", name, other.type_name())),
    }
}

/// Byte length of a string, element count of an array, entry count of a hash.
fn len(args: &[Val]) -> Result<Val> {
    expect_args(args, 1)?;
    let n = match &args[0] {
        Val::Str(s) => s.len(),
        Val::Array(items) => items.len(),
        Val::Hash(map) => map.len(),
        other => bail!("argument to `len` not supported, got {}", other.type_name()),
    };
    Ok(Val::Int(n as i64))
}

fn puts(args: &[Val]) -> Result<Val> {
    for arg in args {
        println!("{arg}");
    }
    Ok(Val::Null)
}

fn first(args: &[Val]) -> Result<Val> {
    expect_args(args, 1)?;
    let items = array_arg("first", &args[0])?;
    Ok(items.first().cloned().unwrap_or(Val::Null))
}

fn last(args: &[Val]) -> Result<Val> {
    expect_args(args, 1)?;
    let items = array_arg("last", &args[0])?;
    Ok(items.last().cloned().unwrap_or(Val::Null))
}

fn rest(args: &[Val]) -> Result<Val> {
    expect_args(args, 1)?;
    let items = array_arg("rest", &args[0])?;
    if items.is_empty() {
        return Ok(Val::Null);
    }
    Ok(Val::Array(Arc::from(&items[1..])))
}

/// Returns a new array; the argument is left untouched.
fn push(args: &[Val]) -> Result<Val> {
    expect_args(args, 2)?;
    let items = array_arg("push", &args[0])?;
    let mut out = Vec::with_capacity(items.len() + 1);
    out.extend(items.iter().cloned());
    out.push(args[1].clone());
    Ok(Val::Array(Arc::from(out)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(name: &str, args: &[Val]) -> Result<Val> {
        let idx = builtin_index(name).expect("builtin exists");
        (BUILTINS[idx].func)(args)
    }

    #[test]
    fn test_len() {
        assert_eq!(call("len", &["".into()]).unwrap(), Val::Int(0));
        assert_eq!(call("len", &["four".into()]).unwrap(), Val::Int(4));
        assert_eq!(call("len", &[vec![1, 2, 3].into()]).unwrap(), Val::Int(3));
        let err = call("len", &[Val::Int(1)]).unwrap_err();
        assert_eq!(err.to_string(), "argument to `len` not supported, got INTEGER");
        let err = call("len", &["one".into(), "two".into()]).unwrap_err();
        assert_eq!(err.to_string(), "wrong number of arguments. got=2, want=1");
    }

    #[test]
    fn test_array_helpers() {
        let arr: Val = vec![1, 2, 3].into();
        assert_eq!(call("first", &[arr.clone()]).unwrap(), Val::Int(1));
        assert_eq!(call("last", &[arr.clone()]).unwrap(), Val::Int(3));
        assert_eq!(call("rest", &[arr.clone()]).unwrap(), vec![2, 3].into());
        assert_eq!(call("push", &[arr.clone(), Val::Int(4)]).unwrap(), vec![1, 2, 3, 4].into());
        // push does not mutate its input
        assert_eq!(arr, vec![1, 2, 3].into());

        let empty: Val = Vec::<i64>::new().into();
        assert_eq!(call("first", &[empty.clone()]).unwrap(), Val::Null);
        assert_eq!(call("last", &[empty.clone()]).unwrap(), Val::Null);
        assert_eq!(call("rest", &[empty]).unwrap(), Val::Null);

        let err = call("first", &[Val::Int(1)]).unwrap_err();
        assert_eq!(err.to_string(), "argument to `first` must be ARRAY, got INTEGER");
    }

    #[test]
    fn test_puts_returns_null() {
        assert_eq!(call("puts", &["hello".into()]).unwrap(), Val::Null);
    }

    #[test]
    fn test_builtin_order_is_stable() {
        let names: Vec<&str> = BUILTINS.iter().map(|b| b.name).collect();
        assert_eq!(names, ["len", "puts", "first", "last", "rest", "push"]);
    }
}
