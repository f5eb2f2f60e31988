use std::fmt;

use crate::clone_reason::CloneReason;
use crate::complex::ComplexExpression;
use crate::symbol::Symbol;

/// Tag values for the primitive atom kinds plus `ComplexExpression`.
///
/// These numbers are part of the wire format and must never be renumbered:
/// `boss-serialize` writes them verbatim as the low bits of each argument's
/// type byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ExpressionKind {
    Bool = 0,
    I8 = 1,
    I32 = 2,
    I64 = 3,
    F32 = 4,
    F64 = 5,
    String = 6,
    Symbol = 7,
    Complex = 8,
}

impl ExpressionKind {
    pub const fn tag(self) -> u8 {
        self as u8
    }

    pub fn from_tag(tag: u8) -> Option<Self> {
        Some(match tag {
            0 => Self::Bool,
            1 => Self::I8,
            2 => Self::I32,
            3 => Self::I64,
            4 => Self::F32,
            5 => Self::F64,
            6 => Self::String,
            7 => Self::Symbol,
            8 => Self::Complex,
            _ => return None,
        })
    }
}

/// The heterogeneous tagged tree that is simultaneously BOSS's program, its
/// data, and the protocol boundary between evaluation engines.
///
/// Modeled as a tagged sum type with one variant per atom kind plus a boxed
/// `ComplexExpression`, rather than an inheritance hierarchy.
#[derive(Debug)]
pub enum Expression {
    Bool(bool),
    I8(i8),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    String(String),
    Symbol(Symbol),
    Complex(Box<ComplexExpression>),
}

impl Expression {
    pub fn complex(head: impl Into<Symbol>, args: Vec<Self>) -> Self {
        Self::Complex(Box::new(ComplexExpression::new(head.into(), args)))
    }

    pub fn kind(&self) -> ExpressionKind {
        match self {
            Self::Bool(_) => ExpressionKind::Bool,
            Self::I8(_) => ExpressionKind::I8,
            Self::I32(_) => ExpressionKind::I32,
            Self::I64(_) => ExpressionKind::I64,
            Self::F32(_) => ExpressionKind::F32,
            Self::F64(_) => ExpressionKind::F64,
            Self::String(_) => ExpressionKind::String,
            Self::Symbol(_) => ExpressionKind::Symbol,
            Self::Complex(_) => ExpressionKind::Complex,
        }
    }

    pub fn as_complex(&self) -> Option<&ComplexExpression> {
        match self {
            Self::Complex(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_complex_mut(&mut self) -> Option<&mut ComplexExpression> {
        match self {
            Self::Complex(c) => Some(c),
            _ => None,
        }
    }

    pub fn into_complex(self) -> Result<ComplexExpression, Self> {
        match self {
            Self::Complex(c) => Ok(*c),
            other => Err(other),
        }
    }

    pub fn as_string(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_symbol(&self) -> Option<&Symbol> {
        match self {
            Self::Symbol(s) => Some(s),
            _ => None,
        }
    }

    /// Deep copy requiring an audit reason.
    ///
    /// This is the only way to duplicate an `Expression` -- there is no
    /// `Clone` impl, by design, so that every deep copy site in the codebase
    /// states why it needed one.
    pub fn deep_clone(&self, reason: CloneReason) -> Self {
        match self {
            Self::Bool(v) => Self::Bool(*v),
            Self::I8(v) => Self::I8(*v),
            Self::I32(v) => Self::I32(*v),
            Self::I64(v) => Self::I64(*v),
            Self::F32(v) => Self::F32(*v),
            Self::F64(v) => Self::F64(*v),
            Self::String(v) => Self::String(v.clone()),
            Self::Symbol(v) => Self::Symbol(v.clone()),
            Self::Complex(c) => Self::Complex(Box::new(c.deep_clone(reason))),
        }
    }

    /// Numeric equality for numbers, string equality for strings,
    /// symbol-name equality for Symbols, and recursion
    /// for `ComplexExpression`s. Lane placement never matters -- this is
    /// enforced by `ComplexExpression::eq` going through the unified
    /// argument view rather than comparing lanes directly.
    pub fn values_equal(&self, other: &Self) -> bool {
        use Expression::{Bool, Complex, String as Str, Symbol as Sym};

        if let (Some(a), Some(b)) = (self.as_f64(), other.as_f64()) {
            return a == b;
        }
        match (self, other) {
            (Bool(a), Bool(b)) => a == b,
            (Str(a), Str(b)) => a == b,
            (Sym(a), Sym(b)) => a == b,
            (Complex(a), Complex(b)) => a == b,
            // No fallback: a Bool never numerically compares equal to an Int.
            _ => false,
        }
    }

    /// Widens any numeric atom to `f64` for cross-kind equality comparison;
    /// returns `None` for non-numeric atoms (Bool included -- Bool compares
    /// only to Bool, see `values_equal`).
    fn as_f64(&self) -> Option<f64> {
        match self {
            Self::I8(v) => Some(f64::from(*v)),
            Self::I32(v) => Some(f64::from(*v)),
            #[allow(clippy::cast_precision_loss)]
            Self::I64(v) => Some(*v as f64),
            Self::F32(v) => Some(f64::from(*v)),
            Self::F64(v) => Some(*v),
            _ => None,
        }
    }
}

impl PartialEq for Expression {
    fn eq(&self, other: &Self) -> bool {
        self.values_equal(other)
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::I8(v) => write!(f, "{v}"),
            Self::I32(v) => write!(f, "{v}"),
            Self::I64(v) => write!(f, "{v}"),
            Self::F32(v) => write!(f, "{v}"),
            Self::F64(v) => write!(f, "{v}"),
            Self::String(v) => write!(f, "{v:?}"),
            Self::Symbol(v) => write!(f, "{v}"),
            Self::Complex(c) => write!(f, "{c}"),
        }
    }
}

macro_rules! from_atom {
    ($variant:ident, $ty:ty) => {
        impl From<$ty> for Expression {
            fn from(value: $ty) -> Self {
                Self::$variant(value)
            }
        }
    };
}

from_atom!(Bool, bool);
from_atom!(I8, i8);
from_atom!(I32, i32);
from_atom!(I64, i64);
from_atom!(F32, f32);
from_atom!(F64, f64);
from_atom!(String, String);
from_atom!(Symbol, Symbol);

impl From<&str> for Expression {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_round_trips() {
        for tag in 0u8..=8 {
            let kind = ExpressionKind::from_tag(tag).unwrap();
            assert_eq!(kind.tag(), tag);
        }
        assert!(ExpressionKind::from_tag(9).is_none());
    }

    #[test]
    fn numeric_widening_equality() {
        assert_eq!(Expression::I32(5), Expression::I64(5));
        assert_eq!(Expression::F32(2.5), Expression::F64(2.5));
        assert_ne!(Expression::I32(5), Expression::Bool(true));
    }
}
