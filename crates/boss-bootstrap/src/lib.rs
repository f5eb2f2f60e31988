//! The bootstrap layer: a minimal, engine-agnostic evaluator that knows how
//! to load plugin libraries and route expressions through them, without
//! knowing anything about what any particular operator means.

mod engine;
mod error;
mod library_cache;

pub use engine::{BootstrapConfig, BootstrapEngine};
pub use error::{BootstrapError, BootstrapResult};
pub use library_cache::{EngineLibrary, LibraryCache, ENGINE_ERROR_HEAD};
