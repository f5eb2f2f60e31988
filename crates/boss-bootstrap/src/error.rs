use std::fmt;

use boss_core::CoreError;
use boss_serialize::SerializeError;

/// Failures that can surface while loading a library or dispatching through
/// it. `EngineRaised` is the only one the engine's own `evaluate()` call can
/// produce; everything else is this crate rejecting malformed input before
/// ever crossing the library boundary.
#[derive(Debug, Clone)]
pub enum BootstrapError {
    /// `dlopen`/`LoadLibrary` failed for the given path.
    LibraryOpenFailed { path: String, reason: String },
    /// The library opened but doesn't export an `evaluate` symbol.
    MissingEntryPoint { path: String },
    /// The loaded library's `evaluate` raised. The caller pairs this
    /// message with the expression it was evaluating to build an
    /// `ErrorWhenEvaluatingExpression` wrapper.
    EngineRaised { message: String },
    Core(CoreError),
    Serialize(SerializeError),
}

impl fmt::Display for BootstrapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LibraryOpenFailed { path, reason } => {
                write!(f, "library \"{path}\" could not be loaded: {reason}")
            }
            Self::MissingEntryPoint { path } => {
                write!(f, "library \"{path}\" does not provide an evaluate function")
            }
            Self::EngineRaised { message } => write!(f, "{message}"),
            Self::Core(e) => write!(f, "{e}"),
            Self::Serialize(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for BootstrapError {}

impl From<CoreError> for BootstrapError {
    fn from(e: CoreError) -> Self {
        Self::Core(e)
    }
}

impl From<SerializeError> for BootstrapError {
    fn from(e: SerializeError) -> Self {
        Self::Serialize(e)
    }
}

pub type BootstrapResult<T> = Result<T, BootstrapError>;
