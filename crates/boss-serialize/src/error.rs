use std::fmt;

use boss_core::CoreError;

/// Errors from malformed wire data or a lower-layer [`CoreError`] surfacing
/// while walking a decoded tree.
#[derive(Debug, Clone)]
pub enum SerializeError {
    /// Malformed wire data: an out-of-bound offset, unknown type tag, or a
    /// truncated string pool.
    Corrupt { offset: usize, reason: String },
    Core(CoreError),
}

impl fmt::Display for SerializeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Corrupt { offset, reason } => {
                write!(f, "serialized expression corrupt at byte {offset}: {reason}")
            }
            Self::Core(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for SerializeError {}

impl From<CoreError> for SerializeError {
    fn from(e: CoreError) -> Self {
        Self::Core(e)
    }
}

pub type SerializeResult<T> = Result<T, SerializeError>;

pub(crate) fn corrupt(offset: usize, reason: impl Into<String>) -> SerializeError {
    SerializeError::Corrupt {
        offset,
        reason: reason.into(),
    }
}
