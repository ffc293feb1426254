use std::fmt;

use thiserror::Error;

/// Reasons a program cannot be lowered to bytecode.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error("undefined variable {0}")]
    UndefinedVariable(String),
    #[error("too many constants (max {0})")]
    TooManyConstants(usize),
    #[error("too many global bindings (max {0})")]
    TooManyGlobals(usize),
    #[error("too many local bindings in one function (max {0})")]
    TooManyLocals(usize),
    #[error("too many call arguments (max {0})")]
    TooManyArguments(usize),
    #[error("too many captured variables in one closure (max {0})")]
    TooManyFreeVariables(usize),
    #[error("too many elements in one literal (max {0})")]
    TooManyElements(usize),
    #[error("jump target {0} does not fit a 16-bit operand")]
    JumpOutOfRange(usize),
}

/// Every error reported while compiling one program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileErrors(pub Vec<CompileError>);

impl CompileErrors {
    pub fn iter(&self) -> impl Iterator<Item = &CompileError> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<CompileError> for CompileErrors {
    fn from(err: CompileError) -> Self {
        Self(vec![err])
    }
}

impl fmt::Display for CompileErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{err}")?;
        }
        Ok(())
    }
}

impl std::error::Error for CompileErrors {}

/// Fatal runtime conditions. Any of these stops the VM.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VmError {
    #[error("stack overflow")]
    StackOverflow,
    #[error("stack underflow")]
    StackUnderflow,
    #[error("frame overflow: call depth exceeds {0}")]
    FrameOverflow(usize),
    #[error("global index {0} exceeds globals capacity")]
    GlobalsOverflow(usize),
    #[error("unknown opcode {0}")]
    UnknownOpcode(u8),
    #[error("malformed bytecode at {ip}: {reason}")]
    MalformedBytecode { ip: usize, reason: &'static str },
    #[error("unsupported types for binary operation: {left} {op} {right}")]
    UnsupportedOperands {
        op: &'static str,
        left: &'static str,
        right: &'static str,
    },
    #[error("unsupported type for negation: {0}")]
    UnsupportedNegation(&'static str),
    #[error("division by zero")]
    DivisionByZero,
    #[error("calling non-function and non-built-in: {0}")]
    NotCallable(&'static str),
    #[error("wrong number of arguments: want={want}, got={got}")]
    WrongArgumentCount { want: usize, got: usize },
    #[error("unusable as hash key: {0}")]
    UnhashableKey(&'static str),
    #[error("index operator not supported: {container}[{index}]")]
    IndexNotSupported {
        container: &'static str,
        index: &'static str,
    },
    #[error("error calling builtin `{name}`: {message}")]
    Builtin { name: &'static str, message: String },
}
