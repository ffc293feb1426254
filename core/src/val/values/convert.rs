use std::{collections::BTreeMap, sync::Arc};

use super::{HashKey, Val};

impl From<String> for Val {
    #[inline]
    fn from(s: String) -> Self {
        Val::Str(Arc::<str>::from(s))
    }
}

impl From<&str> for Val {
    #[inline]
    fn from(s: &str) -> Self {
        Val::Str(Arc::from(s))
    }
}

impl From<i64> for Val {
    #[inline]
    fn from(i: i64) -> Self {
        Val::Int(i)
    }
}

impl From<i32> for Val {
    #[inline]
    fn from(i: i32) -> Self {
        Val::Int(i as i64)
    }
}

impl From<bool> for Val {
    #[inline]
    fn from(b: bool) -> Self {
        Val::Bool(b)
    }
}

impl<T> From<Vec<T>> for Val
where
    T: Into<Val>,
{
    fn from(v: Vec<T>) -> Self {
        let v: Vec<Val> = v.into_iter().map(Into::into).collect();
        Val::Array(Arc::<[Val]>::from(v))
    }
}

impl<T> From<Option<T>> for Val
where
    T: Into<Val>,
{
    fn from(opt: Option<T>) -> Self {
        opt.map(Into::into).unwrap_or(Val::Null)
    }
}

impl From<BTreeMap<HashKey, Val>> for Val {
    fn from(map: BTreeMap<HashKey, Val>) -> Self {
        Val::Hash(Arc::new(map))
    }
}

impl From<&str> for HashKey {
    fn from(s: &str) -> Self {
        HashKey::Str(Arc::from(s))
    }
}

impl From<i64> for HashKey {
    fn from(i: i64) -> Self {
        HashKey::Int(i)
    }
}

impl From<bool> for HashKey {
    fn from(b: bool) -> Self {
        HashKey::Bool(b)
    }
}
