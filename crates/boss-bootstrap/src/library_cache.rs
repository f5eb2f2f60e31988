//! Loads and caches engine shared libraries, and marshals expressions
//! across the boundary into each library's `evaluate` entry point.
//!
//! A plugin's payload crosses the boundary as a `Box<Expression>` raw
//! pointer rather than through a separate opaque wrapper struct: every
//! engine a `BootstrapEngine` talks to here is built against this same
//! `boss-core`, so the pointer's layout is already stable and a second
//! heap allocation would buy nothing. See `DESIGN.md`.

use std::collections::HashMap;

use boss_core::Expression;
use libloading::{Library, Symbol};

use crate::error::{BootstrapError, BootstrapResult};

type EvaluateFn = unsafe extern "C" fn(*mut Expression) -> *mut Expression;

/// Head a plugin returns to signal that evaluation raised, rather than
/// produced a value. Unwinding a Rust panic across this `extern "C"`
/// boundary is undefined behavior, so plugins are expected to catch their
/// own panics and report failure in-band as an ordinary returned
/// expression instead; this sentinel head is the convention `evaluate`
/// implementations use to do that.
pub const ENGINE_ERROR_HEAD: &str = "BossEngineRaised";

/// Anything a [`crate::BootstrapEngine`] can hand an expression to for
/// evaluation by path. [`LibraryCache`] is the only real implementation;
/// the indirection exists so tests can dispatch through an in-process
/// fake instead of a `dlopen`ed library.
pub trait EngineLibrary {
    fn evaluate(&mut self, path: &str, argument: Expression) -> BootstrapResult<Expression>;
}

struct LoadedLibrary {
    // Kept alive for as long as `evaluate` may be called through it; never
    // accessed directly once loaded.
    _library: Library,
    evaluate: EvaluateFn,
}

/// A path-to-library table. Entries are opened lazily on first use and
/// never evicted during normal operation; they are only closed when the
/// cache itself is dropped, at which point a library's `reset` symbol is
/// called first if it exports one.
#[derive(Default)]
pub struct LibraryCache {
    libraries: HashMap<String, LoadedLibrary>,
}

impl LibraryCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn load(path: &str) -> BootstrapResult<LoadedLibrary> {
        // SAFETY: loading and resolving symbols from an arbitrary path is
        // inherently unsafe across FFI; the caller is trusted to name a
        // library that implements the documented `evaluate` contract.
        let library = unsafe { Library::new(path) }.map_err(|e| BootstrapError::LibraryOpenFailed {
            path: path.to_owned(),
            reason: e.to_string(),
        })?;
        let evaluate = unsafe {
            let sym: Symbol<'_, EvaluateFn> =
                library
                    .get(b"evaluate\0")
                    .map_err(|_| BootstrapError::MissingEntryPoint {
                        path: path.to_owned(),
                    })?;
            *sym
        };
        Ok(LoadedLibrary {
            _library: library,
            evaluate,
        })
    }
}

impl EngineLibrary for LibraryCache {
    /// Invokes `path`'s `evaluate` entry point on `argument`, opening and
    /// caching the library first if this is the first call for that path.
    fn evaluate(&mut self, path: &str, argument: Expression) -> BootstrapResult<Expression> {
        if !self.libraries.contains_key(path) {
            tracing::debug!(path, "opening engine library");
            let loaded = Self::load(path)?;
            self.libraries.insert(path.to_owned(), loaded);
        }
        let entry = &self.libraries[path];
        let in_ptr = Box::into_raw(Box::new(argument));
        // SAFETY: `entry.evaluate` was resolved from a library whose symbol
        // table names it `evaluate`; the documented contract takes and
        // returns ownership of a `Box<Expression>` across the boundary.
        let out_ptr = unsafe { (entry.evaluate)(in_ptr) };
        if out_ptr.is_null() {
            return Err(BootstrapError::EngineRaised {
                message: format!("engine at \"{path}\" returned a null result"),
            });
        }
        // SAFETY: the library contract hands back ownership of a pointer it
        // produced via `Box::into_raw::<Expression>`.
        let result = *unsafe { Box::from_raw(out_ptr) };
        match result.as_complex() {
            Some(c) if c.head().as_str() == ENGINE_ERROR_HEAD => {
                let message = c
                    .static_args()
                    .first()
                    .or_else(|| c.dynamic_args().first())
                    .and_then(Expression::as_string)
                    .unwrap_or("engine raised without a message")
                    .to_owned();
                Err(BootstrapError::EngineRaised { message })
            }
            _ => Ok(result),
        }
    }
}

impl Drop for LibraryCache {
    fn drop(&mut self) {
        for (path, loaded) in &self.libraries {
            // SAFETY: `reset` is an optional, no-argument teardown hook;
            // absence is the common case, not an error.
            let reset: Option<Symbol<'_, unsafe extern "C" fn()>> =
                unsafe { loaded._library.get(b"reset\0") }.ok();
            if let Some(reset) = reset {
                tracing::debug!(path, "calling engine reset hook");
                unsafe { reset() };
            }
        }
    }
}
