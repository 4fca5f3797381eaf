use std::fmt;

use super::token::Token;

#[derive(Debug, Clone, PartialEq)]
pub enum ParserErrorKind {
    /// Something specific was required at this position.
    WrongToken { expected: &'static str },
    /// No way to start an expression with this token.
    UnexpectedToken,
    BadIntegerLiteral,
    ExpectedLValue,
    BadLetBinding,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParserError {
    pub token: Token,
    pub kind: ParserErrorKind,
}

pub type ParserResult<T> = Result<T, ParserError>;

impl ParserError {
    pub fn new(token: Token, kind: ParserErrorKind) -> Self {
        ParserError { token, kind }
    }

    pub fn wrong_token(expected: &'static str, token: Token) -> Self {
        ParserError::new(token, ParserErrorKind::WrongToken { expected })
    }

    pub fn unexpected_token(token: Token) -> Self {
        ParserError::new(token, ParserErrorKind::UnexpectedToken)
    }
}

impl fmt::Display for ParserError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} Parsing error: ", self.token.location())?;

        match &self.kind {
            ParserErrorKind::WrongToken { expected } => {
                write!(f, "expected {}, got {}", expected, self.token.describe())
            }
            ParserErrorKind::UnexpectedToken => {
                write!(f, "don't know what to do with {:?}", self.token.describe())
            }
            ParserErrorKind::BadIntegerLiteral => {
                write!(f, "{:?} is not an integer literal", self.token.literal)
            }
            ParserErrorKind::ExpectedLValue => {
                write!(
                    f,
                    "left side of assignment must be an identifier or an index expression"
                )
            }
            ParserErrorKind::BadLetBinding => {
                write!(f, "let expects an assignment to an identifier")
            }
        }
    }
}
