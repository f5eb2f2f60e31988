use std::fmt;
use std::sync::Arc;

use crate::clone_reason::CloneReason;
use crate::error::{CoreError, CoreResult};
use crate::expression::ExpressionKind;
use crate::symbol::Symbol;

/// A primitive type that can be the element type of a [`Span`].
///
/// Implemented for the eight atom kinds the wire format knows about
/// (`ComplexExpression` is deliberately excluded -- spans are columnar views
/// over one *primitive* type).
pub trait SpanElement: Clone + fmt::Debug + 'static {
    const KIND: ExpressionKind;
}

macro_rules! span_element {
    ($ty:ty, $kind:expr) => {
        impl SpanElement for $ty {
            const KIND: ExpressionKind = $kind;
        }
    };
}

span_element!(bool, ExpressionKind::Bool);
span_element!(i8, ExpressionKind::I8);
span_element!(i32, ExpressionKind::I32);
span_element!(i64, ExpressionKind::I64);
span_element!(f32, ExpressionKind::F32);
span_element!(f64, ExpressionKind::F64);
span_element!(String, ExpressionKind::String);
span_element!(Symbol, ExpressionKind::Symbol);

/// How a [`Span`]'s backing elements are held.
enum SpanStorage<T: SpanElement> {
    /// A buffer this span (transitively) owns.
    Owned(Arc<[T]>),
    /// A raw, caller-supplied buffer plus an optional one-shot release
    /// closure -- the zero-copy FFI case. `ptr` must stay valid and
    /// unaliased-for-mutation for the lifetime of this span; that contract
    /// is the caller's, which is why constructing one is `unsafe`.
    Raw {
        ptr: *const T,
        len: usize,
        release: Option<Box<dyn FnOnce() + Send>>,
    },
}

/// A contiguous, borrowed-or-owned view over atoms of one primitive type.
///
/// Move-only: there is no `Clone` impl. `subspan` consumes `self` and
/// returns a narrower view over the same storage (no copy); `clone_span`
/// consumes `self` by reference and materializes a fresh owned copy of just
/// the visible range, requiring a [`CloneReason`].
pub struct Span<T: SpanElement> {
    storage: SpanStorage<T>,
    begin: usize,
    end: usize,
}

impl<T: SpanElement> Span<T> {
    pub fn from_vec(values: Vec<T>) -> Self {
        let len = values.len();
        Self {
            storage: SpanStorage::Owned(Arc::from(values)),
            begin: 0,
            end: len,
        }
    }

    pub fn from_shared(values: Arc<[T]>) -> Self {
        let len = values.len();
        Self {
            storage: SpanStorage::Owned(values),
            begin: 0,
            end: len,
        }
    }

    /// Wraps a raw buffer with an explicit release closure, invoked exactly
    /// once when the returned span (or whichever narrowed subspan inherits
    /// the storage) is dropped.
    ///
    /// # Safety
    ///
    /// `ptr` must be valid for reads of `len` elements of `T` for as long as
    /// the returned `Span` (and any subspan derived from it) is alive, and
    /// must not be mutated through another alias during that time.
    pub unsafe fn from_raw(
        ptr: *const T,
        len: usize,
        release: Option<Box<dyn FnOnce() + Send>>,
    ) -> Self {
        Self {
            storage: SpanStorage::Raw { ptr, len, release },
            begin: 0,
            end: len,
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.begin
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn backing(&self) -> &[T] {
        match &self.storage {
            SpanStorage::Owned(buf) => buf,
            // SAFETY: `ptr`/`len` were established as valid for reads by the
            // `from_raw` caller's contract, and are never mutated via this
            // reference.
            SpanStorage::Raw { ptr, len, .. } => unsafe { std::slice::from_raw_parts(*ptr, *len) },
        }
    }

    pub fn get(&self, index: usize) -> CoreResult<&T> {
        self.backing()
            .get(self.begin + index)
            .filter(|_| index < self.len())
            .ok_or(CoreError::OutOfRange {
                index,
                len: self.len(),
            })
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.backing()[self.begin..self.end].iter()
    }

    /// Produces a view narrower on both ends, covering `[offset, offset+len)`
    /// of the current view. `len` defaults to "rest of the span" when `None`.
    ///
    /// Consumes `self`: no copy is made, the same storage (and any release
    /// closure) transfers to the returned span.
    pub fn subspan(self, offset: usize, len: Option<usize>) -> CoreResult<Self> {
        let current_len = self.len();
        let new_len = len.unwrap_or(current_len.saturating_sub(offset));
        if offset > current_len || offset + new_len > current_len {
            return Err(CoreError::OutOfRange {
                index: offset + new_len,
                len: current_len,
            });
        }
        let begin = self.begin + offset;
        let end = begin + new_len;
        Ok(Self {
            storage: self.storage,
            begin,
            end,
        })
    }

    /// Materializes a fresh owned buffer by copying the visible element
    /// range.
    pub fn clone_span(&self, _reason: CloneReason) -> Self {
        Self::from_vec(self.iter().cloned().collect())
    }
}

impl<T: SpanElement> Drop for Span<T> {
    fn drop(&mut self) {
        if let SpanStorage::Raw { release, .. } = &mut self.storage {
            if let Some(release) = release.take() {
                release();
            }
        }
    }
}

impl<T: SpanElement + fmt::Debug> fmt::Debug for Span<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subspan_preserves_elements_and_length() {
        let span = Span::from_vec(vec![1i32, 2, 3, 4, 5]);
        let sub = span.subspan(1, Some(3)).unwrap();
        assert_eq!(sub.len(), 3);
        assert_eq!(sub.iter().copied().collect::<Vec<_>>(), vec![2, 3, 4]);
    }

    #[test]
    fn subspan_out_of_range_errors() {
        let span = Span::from_vec(vec![1i32, 2, 3]);
        assert!(span.subspan(2, Some(5)).is_err());
    }

    #[test]
    fn raw_span_runs_release_exactly_once() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        let buf = vec![10i64, 20, 30];
        let calls = Arc::new(AtomicUsize::new(0));
        let calls2 = Arc::clone(&calls);
        let span = unsafe {
            Span::from_raw(
                buf.as_ptr(),
                buf.len(),
                Some(Box::new(move || {
                    calls2.fetch_add(1, Ordering::SeqCst);
                })),
            )
        };
        let narrowed = span.subspan(1, Some(2)).unwrap();
        assert_eq!(narrowed.iter().copied().collect::<Vec<_>>(), vec![20, 30]);
        drop(narrowed);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn clone_span_materializes_owned_copy() {
        let span = Span::from_vec(vec!["a".to_owned(), "b".to_owned()]);
        let cloned = span.clone_span(CloneReason::ForTesting);
        assert_eq!(cloned.iter().cloned().collect::<Vec<_>>(), vec!["a", "b"]);
    }
}
