use std::fmt::Display;

use crate::{token::Token, val::Val, vm::VmError};

fn unsupported<R>(op: &BinOp, l: &Val, r: &Val) -> Result<R, VmError> {
    Err(VmError::UnsupportedOperands {
        op: op.symbol(),
        left: l.type_name(),
        right: r.type_name(),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
}

impl UnaryOp {
    pub fn from_token(token: &Token) -> Option<Self> {
        match token {
            Token::Not => Some(UnaryOp::Not),
            Token::Sub => Some(UnaryOp::Neg),
            _ => None,
        }
    }

    pub(crate) fn eval(&self, val: &Val) -> Result<Val, VmError> {
        match self {
            UnaryOp::Not => Ok(Val::Bool(!val.is_truthy())),
            UnaryOp::Neg => match val {
                Val::Int(i) => Ok(Val::Int(i.wrapping_neg())),
                other => Err(VmError::UnsupportedNegation(other.type_name())),
            },
        }
    }
}

impl Display for UnaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnaryOp::Not => write!(f, "!"),
            UnaryOp::Neg => write!(f, "-"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    Ne,
    Gt,
    Lt,
}

impl BinOp {
    pub fn from_token(token: &Token) -> Option<Self> {
        match token {
            Token::Add => Some(BinOp::Add),
            Token::Sub => Some(BinOp::Sub),
            Token::Mul => Some(BinOp::Mul),
            Token::Div => Some(BinOp::Div),
            Token::Eq => Some(BinOp::Eq),
            Token::Ne => Some(BinOp::Ne),
            Token::Gt => Some(BinOp::Gt),
            Token::Lt => Some(BinOp::Lt),
            _ => None,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::Gt => ">",
            BinOp::Lt => "<",
        }
    }

    pub(crate) fn is_arith(&self) -> bool {
        matches!(self, BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div)
    }

    /// Applies the operator with the VM's semantics. Integer arithmetic wraps.
    pub(crate) fn eval(&self, l: &Val, r: &Val) -> Result<Val, VmError> {
        if self.is_arith() {
            return self.arith(l, r);
        }
        match self {
            BinOp::Eq => Ok(Val::Bool(l == r)),
            BinOp::Ne => Ok(Val::Bool(l != r)),
            BinOp::Gt => match (l, r) {
                (Val::Int(a), Val::Int(b)) => Ok(Val::Bool(a > b)),
                _ => unsupported(self, l, r),
            },
            BinOp::Lt => match (l, r) {
                (Val::Int(a), Val::Int(b)) => Ok(Val::Bool(a < b)),
                _ => unsupported(self, l, r),
            },
            _ => unreachable!("arithmetic handled above"),
        }
    }

    fn arith(&self, l: &Val, r: &Val) -> Result<Val, VmError> {
        match (l, r) {
            (Val::Int(a), Val::Int(b)) => {
                let (a, b) = (*a, *b);
                let out = match self {
                    BinOp::Add => a.wrapping_add(b),
                    BinOp::Sub => a.wrapping_sub(b),
                    BinOp::Mul => a.wrapping_mul(b),
                    BinOp::Div => {
                        if b == 0 {
                            return Err(VmError::DivisionByZero);
                        }
                        a.wrapping_div(b)
                    }
                    _ => return unsupported(self, l, r),
                };
                Ok(Val::Int(out))
            }
            (Val::Str(a), Val::Str(b)) if *self == BinOp::Add => {
                let mut s = String::with_capacity(a.len() + b.len());
                s.push_str(a);
                s.push_str(b);
                Ok(Val::Str(s.into()))
            }
            _ => unsupported(self, l, r),
        }
    }
}

impl Display for BinOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}
