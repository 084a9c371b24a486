//! Translation-time errors.
//!
//! Every variant names the offending token's `index` in the flat token
//! stream, mirroring `original_source/translator.py`'s assertion messages,
//! which all interpolate the loop counter `i`.

use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    UndefinedTerm { index: usize, term: String },
    ReservedName { index: usize, name: String },
    NestedFunction { index: usize },
    NestedCondition { index: usize },
    NestedLoop { index: usize },
    LoopInsideCondition { index: usize },
    StringInsideControl { index: usize },
    VariableInsideControl { index: usize },
    UnexpectedElse { index: usize },
    UnexpectedThen { index: usize },
    UnexpectedFunctionEnd { index: usize },
    UnexpectedLoopEnd { index: usize },
    UnexpectedLeave { index: usize },
    UnterminatedFunction { index: usize },
    UnterminatedCondition { index: usize },
    UnterminatedLoop { index: usize },
    UnterminatedString { index: usize },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::UndefinedTerm { index, term } => {
                write!(f, "term \"{}\" is undefined, you can't use it (at {})", term, index)
            }
            Error::ReservedName { index, name } => write!(
                f,
                "name \"{}\" can't be redefined as it is used by the system (at {})",
                name, index
            ),
            Error::NestedFunction { index } => {
                write!(f, "nested functions are not allowed (at {})", index)
            }
            Error::NestedCondition { index } => {
                write!(f, "nested conditions are not allowed (at {})", index)
            }
            Error::NestedLoop { index } => write!(f, "nested loops are not allowed (at {})", index),
            Error::LoopInsideCondition { index } => write!(
                f,
                "loops inside a condition are not allowed (at {})",
                index
            ),
            Error::StringInsideControl { index } => write!(
                f,
                "strings inside a condition or loop are not allowed (at {})",
                index
            ),
            Error::VariableInsideControl { index } => write!(
                f,
                "variable declaration is not allowed inside a condition, loop or function (at {})",
                index
            ),
            Error::UnexpectedElse { index } => {
                write!(f, "unexpected \"else\" outside a condition (at {})", index)
            }
            Error::UnexpectedThen { index } => {
                write!(f, "unexpected \"then\" outside a condition (at {})", index)
            }
            Error::UnexpectedFunctionEnd { index } => {
                write!(f, "unexpected \";\" outside a function (at {})", index)
            }
            Error::UnexpectedLoopEnd { index } => {
                write!(f, "unexpected loop ending outside a loop (at {})", index)
            }
            Error::UnexpectedLeave { index } => {
                write!(f, "unexpected \"leave\" outside a loop (at {})", index)
            }
            Error::UnterminatedFunction { index } => write!(
                f,
                "function starting at {} was never closed with \";\"",
                index
            ),
            Error::UnterminatedCondition { index } => write!(
                f,
                "condition starting at {} was never closed with \"then\"",
                index
            ),
            Error::UnterminatedLoop { index } => {
                write!(f, "loop starting at {} was never closed", index)
            }
            Error::UnterminatedString { index } => write!(
                f,
                "string starting at {} was never closed with a trailing \"\\\"\"",
                index
            ),
        }
    }
}

impl std::error::Error for Error {}

pub type Result<T> = std::result::Result<T, Error>;
