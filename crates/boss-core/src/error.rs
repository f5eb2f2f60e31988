use std::fmt;

use crate::expression::ExpressionKind;

/// Errors raised directly by the Expression data model.
///
/// Kept as a hand-rolled `Display`/`Error` pair with `From` impls at the
/// crates that wrap it, rather than a derive-macro error type, so that the
/// taxonomy stays a small closed set rather than growing ad hoc.
#[derive(Debug, Clone)]
pub enum CoreError {
    /// A get-by-kind operation found a different kind than expected.
    ArgumentTypeMismatch {
        expected: ExpressionKind,
        found: String,
    },
    /// Indexed access out of bounds.
    OutOfRange { index: usize, len: usize },
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ArgumentTypeMismatch { expected, found } => {
                write!(f, "expected argument of kind {expected:?}, found {found}")
            }
            Self::OutOfRange { index, len } => {
                write!(f, "index {index} out of range for length {len}")
            }
        }
    }
}

impl std::error::Error for CoreError {}

pub type CoreResult<T> = Result<T, CoreError>;
