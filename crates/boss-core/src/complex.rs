use std::fmt;

use smallvec::SmallVec;

use crate::clone_reason::CloneReason;
use crate::error::{CoreError, CoreResult};
use crate::expression::Expression;
use crate::span::Span;
use crate::symbol::Symbol;

/// A span of one of the eight primitive atom kinds, type-erased so a
/// `ComplexExpression` can hold a heterogeneous sequence of them in its
/// span-argument lane.
pub enum SpanArg {
    Bool(Span<bool>),
    I8(Span<i8>),
    I32(Span<i32>),
    I64(Span<i64>),
    F32(Span<f32>),
    F64(Span<f64>),
    String(Span<String>),
    Symbol(Span<Symbol>),
}

impl SpanArg {
    pub fn len(&self) -> usize {
        match self {
            Self::Bool(s) => s.len(),
            Self::I8(s) => s.len(),
            Self::I32(s) => s.len(),
            Self::I64(s) => s.len(),
            Self::F32(s) => s.len(),
            Self::F64(s) => s.len(),
            Self::String(s) => s.len(),
            Self::Symbol(s) => s.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Materializes the element at `index` (relative to this span) as an
    /// owned [`Expression`].
    pub fn element_as_expression(&self, index: usize) -> CoreResult<Expression> {
        Ok(match self {
            Self::Bool(s) => Expression::Bool(*s.get(index)?),
            Self::I8(s) => Expression::I8(*s.get(index)?),
            Self::I32(s) => Expression::I32(*s.get(index)?),
            Self::I64(s) => Expression::I64(*s.get(index)?),
            Self::F32(s) => Expression::F32(*s.get(index)?),
            Self::F64(s) => Expression::F64(*s.get(index)?),
            Self::String(s) => Expression::String(s.get(index)?.clone()),
            Self::Symbol(s) => Expression::Symbol(s.get(index)?.clone()),
        })
    }
}

/// A single polymorphic handle into one position of a `ComplexExpression`'s
/// unified argument view.
///
/// `Static` and `Dynamic` both hold a reference into an owned `Expression`
/// slot; `SpanElement` holds an already-materialized copy of a primitive
/// span element, since spans don't store `Expression`s to reference.
pub enum ArgumentRef<'a> {
    Static(&'a Expression),
    Dynamic(&'a Expression),
    SpanElement(Expression),
}

impl ArgumentRef<'_> {
    /// Converts this reference to an owned `Expression`. For `Static`/
    /// `Dynamic` this requires a [`CloneReason`] since it copies through a
    /// shared reference; `SpanElement` is already an owned value.
    pub fn to_owned_with(&self, reason: CloneReason) -> Expression {
        match self {
            Self::Static(e) | Self::Dynamic(e) => e.deep_clone(reason),
            Self::SpanElement(e) => e.deep_clone(reason),
        }
    }
}

/// The virtual zero-based sequence presenting static, dynamic, and span
/// arguments as one index space, in that order.
pub struct ArgumentView<'a> {
    complex: &'a ComplexExpression,
}

impl<'a> ArgumentView<'a> {
    pub fn len(&self) -> usize {
        self.complex.static_args.len()
            + self.complex.dynamic_args.len()
            + self.complex.span_args.iter().map(SpanArg::len).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> CoreResult<ArgumentRef<'a>> {
        let statics = self.complex.static_args.len();
        let dynamics = self.complex.dynamic_args.len();
        if index < statics {
            return Ok(ArgumentRef::Static(&self.complex.static_args[index]));
        }
        let index = index - statics;
        if index < dynamics {
            return Ok(ArgumentRef::Dynamic(&self.complex.dynamic_args[index]));
        }
        let mut index = index - dynamics;
        for span in &self.complex.span_args {
            if index < span.len() {
                return Ok(ArgumentRef::SpanElement(span.element_as_expression(index)?));
            }
            index -= span.len();
        }
        Err(CoreError::OutOfRange {
            index: statics + dynamics + index,
            len: self.len(),
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = ArgumentRef<'a>> + '_ {
        (0..self.len()).map(move |i| self.get(i).expect("index within len() is always valid"))
    }
}

/// A tree node: a head [`Symbol`] plus three argument storage lanes.
///
/// The static-argument lane is kept as a `SmallVec` rather than a
/// compile-time-typed tuple -- lane placement is irrelevant to equality and
/// serialization, so there's nothing a typed tuple would buy here; see
/// `DESIGN.md`. Most expressions in practice have only a handful of
/// arguments, so both argument lanes inline up to three elements before
/// spilling to the heap. Move-only: there is no `Clone` impl, only
/// `deep_clone` with an explicit [`CloneReason`].
pub struct ComplexExpression {
    head: Symbol,
    static_args: SmallVec<[Expression; 3]>,
    dynamic_args: SmallVec<[Expression; 3]>,
    span_args: Vec<SpanArg>,
}

impl ComplexExpression {
    pub fn new(head: Symbol, dynamic_args: Vec<Expression>) -> Self {
        Self {
            head,
            static_args: SmallVec::new(),
            dynamic_args: dynamic_args.into(),
            span_args: Vec::new(),
        }
    }

    pub fn with_lanes(
        head: Symbol,
        static_args: Vec<Expression>,
        dynamic_args: Vec<Expression>,
        span_args: Vec<SpanArg>,
    ) -> Self {
        Self {
            head,
            static_args: static_args.into(),
            dynamic_args: dynamic_args.into(),
            span_args,
        }
    }

    pub fn head(&self) -> &Symbol {
        &self.head
    }

    pub fn head_mut(&mut self) -> &mut Symbol {
        &mut self.head
    }

    pub fn static_args(&self) -> &[Expression] {
        &self.static_args
    }

    pub fn dynamic_args(&self) -> &[Expression] {
        &self.dynamic_args
    }

    pub fn span_args(&self) -> &[SpanArg] {
        &self.span_args
    }

    pub fn arguments(&self) -> ArgumentView<'_> {
        ArgumentView { complex: self }
    }

    /// Moves the `index`-th argument out of the dynamic lane if it lives
    /// there (a true move); otherwise materializes a copy tagged with
    /// [`CloneReason::ImplicitConversionWithGetArguments`], since the static
    /// and span lanes don't support removing a single element cheaply. This
    /// split is exactly why that reason exists in the closed enumeration.
    pub fn get_argument(&mut self, index: usize) -> CoreResult<Expression> {
        let statics = self.static_args.len();
        if index < statics {
            return Ok(self.static_args[index]
                .deep_clone(CloneReason::ImplicitConversionWithGetArguments));
        }
        let dyn_index = index - statics;
        if dyn_index < self.dynamic_args.len() {
            return Ok(self.dynamic_args.remove(dyn_index));
        }
        self.clone_argument(index, CloneReason::ImplicitConversionWithGetArguments)
    }

    /// Materializes a copy of the `index`-th argument without disturbing the
    /// node, regardless of which lane it lives in.
    pub fn clone_argument(&self, index: usize, reason: CloneReason) -> CoreResult<Expression> {
        Ok(self.arguments().get(index)?.to_owned_with(reason))
    }

    /// Consumes the node, yielding its four parts. After this call the node
    /// no longer exists.
    pub fn decompose(self) -> (Symbol, Vec<Expression>, Vec<Expression>, Vec<SpanArg>) {
        (
            self.head,
            self.static_args.into_vec(),
            self.dynamic_args.into_vec(),
            self.span_args,
        )
    }

    pub fn deep_clone(&self, reason: CloneReason) -> Self {
        Self {
            head: self.head.clone(),
            static_args: self
                .static_args
                .iter()
                .map(|e| e.deep_clone(reason))
                .collect(),
            dynamic_args: self
                .dynamic_args
                .iter()
                .map(|e| e.deep_clone(reason))
                .collect(),
            span_args: self
                .span_args
                .iter()
                .map(|span| materialize_span_arg(span, reason))
                .collect(),
        }
    }
}

fn materialize_span_arg(span: &SpanArg, reason: CloneReason) -> SpanArg {
    macro_rules! clone_variant {
        ($variant:ident, $s:expr) => {
            SpanArg::$variant($s.clone_span(reason))
        };
    }
    match span {
        SpanArg::Bool(s) => clone_variant!(Bool, s),
        SpanArg::I8(s) => clone_variant!(I8, s),
        SpanArg::I32(s) => clone_variant!(I32, s),
        SpanArg::I64(s) => clone_variant!(I64, s),
        SpanArg::F32(s) => clone_variant!(F32, s),
        SpanArg::F64(s) => clone_variant!(F64, s),
        SpanArg::String(s) => clone_variant!(String, s),
        SpanArg::Symbol(s) => clone_variant!(Symbol, s),
    }
}

/// Heads equal and, via the unified argument view, each position equal --
/// lane placement never matters.
impl PartialEq for ComplexExpression {
    fn eq(&self, other: &Self) -> bool {
        if self.head != other.head {
            return false;
        }
        let (ours, theirs) = (self.arguments(), other.arguments());
        if ours.len() != theirs.len() {
            return false;
        }
        (0..ours.len()).all(|i| {
            let (a, b) = (ours.get(i), theirs.get(i));
            match (a, b) {
                (Ok(a), Ok(b)) => args_equal(&a, &b),
                _ => false,
            }
        })
    }
}

fn args_equal(a: &ArgumentRef<'_>, b: &ArgumentRef<'_>) -> bool {
    fn owned(r: &ArgumentRef<'_>) -> Expression {
        match r {
            ArgumentRef::Static(e) | ArgumentRef::Dynamic(e) => e.deep_clone(CloneReason::ForTesting),
            ArgumentRef::SpanElement(e) => e.deep_clone(CloneReason::ForTesting),
        }
    }
    owned(a).values_equal(&owned(b))
}

impl fmt::Debug for ComplexExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

impl fmt::Display for ComplexExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.head)?;
        let view = self.arguments();
        for i in 0..view.len() {
            if i > 0 {
                write!(f, ", ")?;
            }
            match view.get(i) {
                Ok(ArgumentRef::Static(e) | ArgumentRef::Dynamic(e)) => write!(f, "{e}")?,
                Ok(ArgumentRef::SpanElement(e)) => write!(f, "{e}")?,
                Err(_) => write!(f, "<?>")?,
            }
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plus(a: i64, b: i64) -> ComplexExpression {
        ComplexExpression::new(Symbol::new("Plus"), vec![Expression::I64(a), Expression::I64(b)])
    }

    #[test]
    fn argument_count_matches_lane_sum() {
        let span = SpanArg::I32(Span::from_vec(vec![1, 2, 3]));
        let c = ComplexExpression::with_lanes(
            Symbol::new("Table"),
            vec![Expression::I64(0)],
            vec![Expression::I64(1), Expression::I64(2)],
            vec![span],
        );
        assert_eq!(c.arguments().len(), 1 + 2 + 3);
    }

    #[test]
    fn equality_ignores_lane_placement() {
        let left = ComplexExpression::with_lanes(
            Symbol::new("F"),
            vec![Expression::I64(1)],
            vec![Expression::I64(2)],
            vec![],
        );
        let right = ComplexExpression::new(
            Symbol::new("F"),
            vec![Expression::I64(1), Expression::I64(2)],
        );
        assert_eq!(left, right);
    }

    #[test]
    fn get_argument_moves_from_dynamic_lane() {
        let mut c = plus(5, 4);
        let first = c.get_argument(0).unwrap();
        assert_eq!(first, Expression::I64(5));
        assert_eq!(c.arguments().len(), 1);
    }

    #[test]
    fn out_of_range_access_fails() {
        let c = plus(1, 2);
        assert!(matches!(
            c.clone_argument(5, CloneReason::ForTesting),
            Err(CoreError::OutOfRange { .. })
        ));
    }

    #[test]
    fn decompose_consumes_node() {
        let c = plus(1, 2);
        let (head, statics, dynamics, spans) = c.decompose();
        assert_eq!(head.as_str(), "Plus");
        assert!(statics.is_empty());
        assert_eq!(dynamics.len(), 2);
        assert!(spans.is_empty());
    }
}
