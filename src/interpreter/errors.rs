use std::fmt;

use crate::frontend::errors::ParserError;
use crate::frontend::operator::InfixOperator;
use crate::frontend::token::Token;

#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeErrorKind {
    UnexpectedType {
        expected: &'static str,
        got: &'static str,
        expr: String,
    },
    IllegalInfixOperation {
        op: InfixOperator,
        lhs: &'static str,
        rhs: &'static str,
    },
    NotDefined(String),
    AlreadyDefined(String),
    SetUndefined(String),
    WrongArity {
        expected: usize,
        got: usize,
    },
    IndexOutOfBounds {
        index: i64,
        length: usize,
    },
    BadSliceBounds {
        start: i64,
        end: i64,
        length: usize,
    },
    SliceAssignment,
    DivisionByZero,
    /// A break or continue escaped every loop.
    StrayExit(&'static str),
    /// Failure inside a built-in function, tagged with the call site.
    Builtin(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeError {
    pub token: Token,
    pub kind: RuntimeErrorKind,
}

pub type RuntimeResult<T> = Result<T, RuntimeError>;

impl RuntimeError {
    pub fn new(token: Token, kind: RuntimeErrorKind) -> Self {
        RuntimeError { token, kind }
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} Eval error: ", self.token.location())?;

        match &self.kind {
            RuntimeErrorKind::UnexpectedType {
                expected,
                got,
                expr,
            } => {
                write!(
                    f,
                    "Expected type {}, got {} for expression {:?}",
                    expected, got, expr
                )
            }
            RuntimeErrorKind::IllegalInfixOperation { op, lhs, rhs } => {
                write!(
                    f,
                    "Operator {:?} is not defined for types {} and {}",
                    op.symbol(),
                    lhs,
                    rhs
                )
            }
            RuntimeErrorKind::NotDefined(name) => {
                write!(f, "Variable {:?} not defined", name)
            }
            RuntimeErrorKind::AlreadyDefined(name) => {
                write!(f, "Unable to create variable: {:?} already exists", name)
            }
            RuntimeErrorKind::SetUndefined(name) => {
                write!(f, "Unable to set variable: {:?} does not exist", name)
            }
            RuntimeErrorKind::WrongArity { expected, got } => {
                write!(f, "Expected {} arguments, got {}", expected, got)
            }
            RuntimeErrorKind::IndexOutOfBounds { index, length } => {
                write!(
                    f,
                    "Index {} out of bounds for container of length {}",
                    index, length
                )
            }
            RuntimeErrorKind::BadSliceBounds { start, end, length } => {
                write!(
                    f,
                    "Invalid slice bounds {}:{} for container of length {}",
                    start, end, length
                )
            }
            RuntimeErrorKind::SliceAssignment => {
                write!(f, "Cannot assign to a slice expression")
            }
            RuntimeErrorKind::DivisionByZero => {
                write!(f, "Division by zero")
            }
            RuntimeErrorKind::StrayExit(keyword) => {
                write!(f, "Exit statement {:?} outside of a loop context", keyword)
            }
            RuntimeErrorKind::Builtin(message) => {
                write!(f, "{}", message)
            }
        }
    }
}

/// The single opaque error surfaced to the embedder.
#[derive(Debug)]
pub enum Error {
    Parse(ParserError),
    Eval(RuntimeError),
    Io(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Parse(e) => write!(f, "{}", e),
            Error::Eval(e) => write!(f, "{}", e),
            Error::Io(e) => write!(f, "{}", e),
        }
    }
}

impl From<ParserError> for Error {
    fn from(e: ParserError) -> Self {
        Error::Parse(e)
    }
}

impl From<RuntimeError> for Error {
    fn from(e: RuntimeError) -> Self {
        Error::Eval(e)
    }
}
