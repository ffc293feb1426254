use crate::expr::Expr;

/// Statement AST node types
///
/// program   ::= statement*
/// statement ::= let_stmt | return_stmt | expr_stmt
/// let_stmt  ::= 'let' id '=' expr [';']
/// return_stmt ::= 'return' expr [';']
/// expr_stmt ::= expr [';']
/// block     ::= '{' statement* '}'
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// let name = value;
    Let { name: String, value: Expr },
    /// return value;
    Return(Expr),
    /// expression;
    Expr(Expr),
}

/// `{ statements }`, the body of a function or an `if` branch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Block {
    pub statements: Vec<Stmt>,
}

impl Block {
    pub fn new(statements: Vec<Stmt>) -> Self {
        Self { statements }
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program {
    pub statements: Vec<Stmt>,
}

impl Program {
    pub fn new(statements: Vec<Stmt>) -> Self {
        Program { statements }
    }
}
