//! A decoded-on-demand view over a wire buffer, for comparing a serialized
//! tree against an in-memory one without paying for a full deserialize when
//! the comparison can short-circuit early.

use boss_core::{Expression, ExpressionKind, Symbol};

use crate::error::{corrupt, SerializeResult};
use crate::wire::{decode_type_word, read_u64, types_offset, values_offset};
use crate::wire::{ExprDescriptor, Header, EXPR_DESC_LEN, TYPE_LEN, VALUE_LEN};

/// A wire buffer paired with its parsed-but-not-walked header, types array,
/// and expression descriptors. Holding the buffer is cheap; materializing
/// `Expression` subtrees from it happens lazily, one node at a time, during
/// [`lazy_equals`].
pub struct LazilyDeserializedExpression<'a> {
    buf: &'a [u8],
    types: Vec<ExpressionKind>,
    exprs: Vec<ExprDescriptor>,
    values_start: usize,
    pool_start: usize,
}

impl<'a> LazilyDeserializedExpression<'a> {
    /// Parses just the header, types array, and expression descriptors --
    /// the metadata needed to walk the tree on demand -- without
    /// materializing a single `Expression`.
    pub fn new(buf: &'a [u8]) -> SerializeResult<Self> {
        let header = Header::read(buf).ok_or_else(|| corrupt(0, "buffer shorter than header"))?;
        let argument_count = header.argument_count as usize;
        let expression_count = header.expression_count as usize;

        let types_start = types_offset(argument_count);
        let types_end = types_start + argument_count * TYPE_LEN;
        if types_end > buf.len() {
            return Err(corrupt(types_start, "truncated types section"));
        }
        let mut types = Vec::with_capacity(argument_count);
        let mut pos = types_start;
        while pos < types_end {
            let (kind, rle) = decode_type_word(read_u64(buf, pos));
            if rle {
                let run = read_u64(buf, pos + TYPE_LEN) as usize;
                if run < 2 || pos + run * TYPE_LEN > types_end {
                    return Err(corrupt(pos, "run length out of range"));
                }
                for _ in 0..run {
                    types.push(kind);
                }
                pos += run * TYPE_LEN;
            } else {
                types.push(kind);
                pos += TYPE_LEN;
            }
        }

        let exprs_start = crate::wire::exprs_offset(argument_count);
        let mut exprs = Vec::with_capacity(expression_count);
        for i in 0..expression_count {
            let offset = exprs_start + i * EXPR_DESC_LEN;
            if offset + EXPR_DESC_LEN > buf.len() {
                return Err(corrupt(offset, "truncated expression descriptor"));
            }
            exprs.push(ExprDescriptor::read(buf, offset));
        }

        Ok(Self {
            buf,
            types,
            exprs,
            values_start: values_offset(),
            pool_start: crate::wire::string_pool_offset(argument_count, expression_count),
        })
    }

    fn head_at(&self, expr_idx: usize) -> SerializeResult<&'a str> {
        let descriptor = self.exprs[expr_idx];
        read_str(self.buf, self.pool_start, descriptor.symbol_name_offset)
    }

    fn child_count(&self, expr_idx: usize) -> usize {
        let descriptor = self.exprs[expr_idx];
        (descriptor.end_child_offset - descriptor.start_child_offset) as usize
    }

    fn child_kind(&self, expr_idx: usize, child: usize) -> ExpressionKind {
        let descriptor = self.exprs[expr_idx];
        self.types[descriptor.start_child_offset as usize + child]
    }

    fn child_value(&self, expr_idx: usize, child: usize) -> u64 {
        let descriptor = self.exprs[expr_idx];
        let slot = descriptor.start_child_offset as usize + child;
        read_u64(self.buf, self.values_start + slot * VALUE_LEN)
    }

    fn string_at(&self, offset: u64) -> SerializeResult<&'a str> {
        read_str(self.buf, self.pool_start, offset)
    }
}

fn read_str<'a>(buf: &'a [u8], pool_start: usize, offset: u64) -> SerializeResult<&'a str> {
    let start = pool_start + offset as usize;
    let end = buf[start..]
        .iter()
        .position(|&b| b == 0)
        .map(|rel| start + rel)
        .ok_or_else(|| corrupt(start, "unterminated string pool entry"))?;
    std::str::from_utf8(&buf[start..end]).map_err(|_| corrupt(start, "string pool entry is not valid UTF-8"))
}

/// Compares a lazily-parsed wire tree against an in-memory `Expression`
/// without fully materializing either side, returning as soon as a mismatch
/// is found anywhere in the traversal.
pub fn lazy_equals(lazy: &LazilyDeserializedExpression<'_>, other: &Expression) -> SerializeResult<bool> {
    if lazy.exprs.is_empty() {
        let value = read_u64(lazy.buf, lazy.values_start);
        return atom_equals(lazy.types[0], value, lazy, other);
    }
    expr_equals(lazy, 0, other)
}

fn expr_equals(
    lazy: &LazilyDeserializedExpression<'_>,
    expr_idx: usize,
    other: &Expression,
) -> SerializeResult<bool> {
    let Some(other) = other.as_complex() else {
        return Ok(false);
    };
    if lazy.head_at(expr_idx)? != other.head().as_str() {
        return Ok(false);
    }
    let view = other.arguments();
    if lazy.child_count(expr_idx) != view.len() {
        return Ok(false);
    }
    for i in 0..view.len() {
        let arg = view.get(i)?.to_owned_with(boss_core::CloneReason::ForTesting);
        let kind = lazy.child_kind(expr_idx, i);
        let value = lazy.child_value(expr_idx, i);
        let matches = if kind == ExpressionKind::Complex {
            expr_equals(lazy, value as usize, &arg)?
        } else {
            atom_equals(kind, value, lazy, &arg)?
        };
        if !matches {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Materializes the wire-side atom and defers to `Expression::values_equal`
/// so cross-width numeric comparisons (e.g. a wire `I32` against an in-memory
/// `I64`) widen the same way two in-memory `Expression`s would.
fn atom_equals(
    kind: ExpressionKind,
    value: u64,
    lazy: &LazilyDeserializedExpression<'_>,
    other: &Expression,
) -> SerializeResult<bool> {
    let materialized = match kind {
        ExpressionKind::Bool => Expression::Bool(value != 0),
        ExpressionKind::I8 => Expression::I8(value as i64 as i8),
        ExpressionKind::I32 => Expression::I32(value as i64 as i32),
        ExpressionKind::I64 => Expression::I64(value as i64),
        #[allow(clippy::cast_possible_truncation)]
        ExpressionKind::F32 => Expression::F32(f32::from_bits(value as u32)),
        ExpressionKind::F64 => Expression::F64(f64::from_bits(value)),
        ExpressionKind::String => Expression::String(lazy.string_at(value)?.to_owned()),
        ExpressionKind::Symbol => Expression::Symbol(Symbol::new(lazy.string_at(value)?)),
        ExpressionKind::Complex => return Ok(false),
    };
    Ok(materialized.values_equal(other))
}
