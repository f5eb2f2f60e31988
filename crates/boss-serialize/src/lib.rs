//! The portable, pointer-free serialization format for expression trees: a
//! single contiguous byte buffer that can be memory-mapped or sent across a
//! process boundary and read back without relocation.

mod decode;
mod encode;
mod error;
mod lazy;
mod wire;

use boss_core::Expression;

pub use error::{SerializeError, SerializeResult};
pub use lazy::{lazy_equals, LazilyDeserializedExpression};

/// An owned, already-serialized expression tree.
///
/// Building one never fails; the input is always a well-formed in-memory
/// `Expression`. Reading one back can fail if the bytes didn't actually come
/// from `build` (or were corrupted in transit).
#[derive(Debug, Clone)]
pub struct SerializedExpression {
    bytes: Vec<u8>,
}

impl SerializedExpression {
    /// Serializes `root` into a standalone buffer.
    pub fn build(root: &Expression) -> Self {
        Self {
            bytes: encode::encode(root),
        }
    }

    /// Wraps an externally-produced buffer without validating it. Use
    /// [`Self::deserialize`] to validate by actually walking the tree.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consumes this wrapper, yielding the raw buffer. Ownership of the
    /// serialized bytes transfers to the caller; this value is gone after
    /// the call.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Fully deserializes the buffer into an owned `Expression` tree.
    pub fn deserialize(&self) -> SerializeResult<Expression> {
        decode::decode(&self.bytes)
    }

    /// Parses just enough of the buffer to compare it against `other`
    /// without materializing every node, short-circuiting on the first
    /// mismatch.
    pub fn lazy_equals(&self, other: &Expression) -> SerializeResult<bool> {
        let lazy = LazilyDeserializedExpression::new(&self.bytes)?;
        lazy_equals(&lazy, other)
    }
}

#[cfg(test)]
mod tests {
    use boss_core::Expression;
    use pretty_assertions::assert_eq;

    use super::*;

    fn table_example() -> Expression {
        Expression::complex(
            "Table",
            vec![
                Expression::complex(
                    "Something",
                    vec![
                        Expression::I32(5),
                        Expression::I32(17),
                        Expression::complex(
                            "Sum",
                            vec![Expression::I32(3), Expression::I32(9), Expression::I32(2)],
                        ),
                    ],
                ),
                Expression::complex(
                    "Else",
                    vec![Expression::I32(6), Expression::complex("Date", vec![])],
                ),
            ],
        )
    }

    #[test]
    fn round_trips_nested_tree() {
        let original = table_example();
        let serialized = SerializedExpression::build(&original);
        let restored = serialized.deserialize().expect("valid buffer");
        assert_eq!(original, restored);
    }

    #[test]
    fn round_trips_flat_atom_root() {
        let original = Expression::I64(42);
        let serialized = SerializedExpression::build(&original);
        let restored = serialized.deserialize().expect("valid buffer");
        assert_eq!(original, restored);
    }

    #[test]
    fn round_trips_strings_and_symbols() {
        let original = Expression::complex(
            "Greeting",
            vec![
                Expression::String("hello".to_owned()),
                Expression::Symbol(boss_core::Symbol::new("World")),
            ],
        );
        let serialized = SerializedExpression::build(&original);
        let restored = serialized.deserialize().expect("valid buffer");
        assert_eq!(original, restored);
    }

    #[test]
    fn rle_run_round_trips() {
        let children = (0..12).map(Expression::I32).collect();
        let original = Expression::complex("Run", children);
        let serialized = SerializedExpression::build(&original);
        let restored = serialized.deserialize().expect("valid buffer");
        assert_eq!(original, restored);
    }

    #[test]
    fn lazy_equals_matches_deserialize() {
        let original = table_example();
        let serialized = SerializedExpression::build(&original);
        assert!(serialized.lazy_equals(&original).expect("valid buffer"));

        let different = Expression::complex("Table", vec![Expression::I32(0)]);
        assert!(!serialized.lazy_equals(&different).expect("valid buffer"));
    }

    #[test]
    fn lazy_equals_widens_across_numeric_kinds() {
        let serialized = SerializedExpression::build(&Expression::I32(5));
        assert!(serialized.lazy_equals(&Expression::I64(5)).expect("valid buffer"));
        assert!(!serialized.lazy_equals(&Expression::I64(6)).expect("valid buffer"));
    }

    #[test]
    fn corrupt_buffer_is_rejected() {
        let serialized = SerializedExpression::from_bytes(vec![0u8; 4]);
        assert!(serialized.deserialize().is_err());
    }

    #[test]
    fn original_address_is_zeroed_on_emit() {
        let serialized = SerializedExpression::build(&table_example());
        let header = crate::wire::Header::read(serialized.as_bytes()).expect("valid header");
        assert_eq!(header.original_address, 0);
    }
}
