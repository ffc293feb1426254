use std::fmt::{self, Display};

use crate::{
    op::{BinOp, UnaryOp},
    stmt::Block,
};

/// Grammar (abridged):
/// expr    ::= prefix {infix}
/// prefix  ::= id | int | string | bool | '!' expr | '-' expr | '(' expr ')'
///           | if | fn | array | hash
/// infix   ::= binop expr | '(' [expr {',' expr}] ')' | '[' expr ']'
/// if      ::= 'if' '(' expr ')' block ['else' block]
/// fn      ::= 'fn' '(' [id {',' id}] ')' block
/// array   ::= '[' [expr {',' expr}] ']'
/// hash    ::= '{' [expr ':' expr {',' expr ':' expr}] '}'
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Ident(String),
    Int(i64),
    Bool(bool),
    Str(String),
    Prefix(UnaryOp, Box<Expr>),
    Infix(Box<Expr>, BinOp, Box<Expr>),
    If {
        condition: Box<Expr>,
        consequence: Block,
        alternative: Option<Block>,
    },
    /// `name` is the `let` binding this literal was assigned to, if any; the
    /// compiler binds it inside the body so the function can call itself.
    Function {
        name: Option<String>,
        params: Vec<String>,
        body: Block,
    },
    Call {
        function: Box<Expr>,
        args: Vec<Expr>,
    },
    Array(Vec<Expr>),
    Hash(Vec<(Expr, Expr)>),
    Index(Box<Expr>, Box<Expr>),
}

fn write_list<T: Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

impl Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Ident(name) => f.write_str(name),
            Expr::Int(i) => write!(f, "{i}"),
            Expr::Bool(b) => write!(f, "{b}"),
            Expr::Str(s) => write!(f, "{s:?}"),
            Expr::Prefix(op, right) => write!(f, "({op}{right})"),
            Expr::Infix(left, op, right) => write!(f, "({left} {op} {right})"),
            Expr::If {
                condition,
                consequence,
                alternative,
            } => {
                write!(f, "if ({condition}) {consequence}")?;
                if let Some(alt) = alternative {
                    write!(f, " else {alt}")?;
                }
                Ok(())
            }
            Expr::Function { params, body, .. } => {
                f.write_str("fn(")?;
                write_list(f, params)?;
                write!(f, ") {body}")
            }
            Expr::Call { function, args } => {
                write!(f, "{function}(")?;
                write_list(f, args)?;
                f.write_str(")")
            }
            Expr::Array(items) => {
                f.write_str("[")?;
                write_list(f, items)?;
                f.write_str("]")
            }
            Expr::Hash(pairs) => {
                f.write_str("{")?;
                for (i, (k, v)) in pairs.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                f.write_str("}")
            }
            Expr::Index(left, index) => write!(f, "({left}[{index}])"),
        }
    }
}
