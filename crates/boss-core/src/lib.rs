//! The Expression data model at the heart of BOSS.
//!
//! A single algebraic data type, `Expression`, is simultaneously the
//! program, the data, and the protocol boundary between evaluation engines.
//! This crate defines that type and nothing else: serialization lives in
//! `boss-serialize`, engine dispatch in `boss-bootstrap`.

mod clone_reason;
mod complex;
mod error;
mod expression;
mod span;
mod symbol;

pub use clone_reason::CloneReason;
pub use complex::{ArgumentRef, ArgumentView, ComplexExpression, SpanArg};
pub use error::{CoreError, CoreResult};
pub use expression::{Expression, ExpressionKind};
pub use span::{Span, SpanElement};
pub use symbol::Symbol;
