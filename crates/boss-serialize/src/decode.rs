//! Walks a wire buffer back into an in-memory `Expression` tree.
//!
//! Mirrors `encode`'s breadth-first slot/descriptor assignment in reverse:
//! descriptor 0 is always the root, and a complex argument's value is the
//! index of the descriptor that describes it.

use boss_core::{Expression, ExpressionKind, Symbol};

use crate::error::{corrupt, SerializeResult};
use crate::wire::{decode_type_word, read_u64, types_offset, values_offset};
use crate::wire::{ExprDescriptor, Header, EXPR_DESC_LEN, TYPE_LEN, VALUE_LEN};

/// Deserializes a full wire buffer into its root `Expression`.
pub fn decode(buf: &[u8]) -> SerializeResult<Expression> {
    let header = Header::read(buf).ok_or_else(|| corrupt(0, "buffer shorter than header"))?;
    let argument_count = header.argument_count as usize;
    let expression_count = header.expression_count as usize;

    let types = read_types(buf, argument_count)?;
    let values_start = values_offset();
    let exprs_start = crate::wire::exprs_offset(argument_count);
    let exprs = read_exprs(buf, exprs_start, expression_count)?;
    let string_pool_start = crate::wire::string_pool_offset(argument_count, expression_count);

    if expression_count == 0 {
        let value = read_u64(buf, values_start);
        return decode_atom(types[0], value, buf, string_pool_start);
    }

    decode_expr(0, buf, values_start, &types, &exprs, string_pool_start)
}

/// Walks the types section one physical word at a time. A run's header (tag
/// word plus run-length word) expands to `run` logical entries, and the
/// remaining `run - 2` filler words belonging to that run are skipped by
/// position without being read as separate entries.
fn read_types(buf: &[u8], argument_count: usize) -> SerializeResult<Vec<ExpressionKind>> {
    let start = types_offset(argument_count);
    let end = start + argument_count * TYPE_LEN;
    if end > buf.len() {
        return Err(corrupt(start, "truncated types section"));
    }
    let mut types = Vec::with_capacity(argument_count);
    let mut pos = start;
    while pos < end {
        let word = read_u64(buf, pos);
        let (kind, rle) = decode_type_word(word);
        if rle {
            let run = read_u64(buf, pos + TYPE_LEN) as usize;
            if run < 2 || pos + run * TYPE_LEN > end {
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
    if types.len() != argument_count {
        return Err(corrupt(pos, "type run overshoots argument count"));
    }
    Ok(types)
}

fn read_exprs(
    buf: &[u8],
    start: usize,
    expression_count: usize,
) -> SerializeResult<Vec<ExprDescriptor>> {
    let mut out = Vec::with_capacity(expression_count);
    for i in 0..expression_count {
        let offset = start + i * EXPR_DESC_LEN;
        if offset + EXPR_DESC_LEN > buf.len() {
            return Err(corrupt(offset, "truncated expression descriptor"));
        }
        out.push(ExprDescriptor::read(buf, offset));
    }
    Ok(out)
}

fn read_string(buf: &[u8], pool_start: usize, offset: u64) -> SerializeResult<String> {
    let start = pool_start + offset as usize;
    let end = buf[start..]
        .iter()
        .position(|&b| b == 0)
        .map(|rel| start + rel)
        .ok_or_else(|| corrupt(start, "unterminated string pool entry"))?;
    std::str::from_utf8(&buf[start..end])
        .map(str::to_owned)
        .map_err(|_| corrupt(start, "string pool entry is not valid UTF-8"))
}

fn decode_atom(
    kind: ExpressionKind,
    value: u64,
    buf: &[u8],
    pool_start: usize,
) -> SerializeResult<Expression> {
    Ok(match kind {
        ExpressionKind::Bool => Expression::Bool(value != 0),
        ExpressionKind::I8 => Expression::I8(value as i64 as i8),
        ExpressionKind::I32 => Expression::I32(value as i64 as i32),
        ExpressionKind::I64 => Expression::I64(value as i64),
        #[allow(clippy::cast_possible_truncation)]
        ExpressionKind::F32 => Expression::F32(f32::from_bits(value as u32)),
        ExpressionKind::F64 => Expression::F64(f64::from_bits(value)),
        ExpressionKind::String => Expression::String(read_string(buf, pool_start, value)?),
        ExpressionKind::Symbol => Expression::Symbol(Symbol::new(read_string(buf, pool_start, value)?)),
        ExpressionKind::Complex => {
            return Err(corrupt(0, "complex tag found where an atom value was expected"))
        }
    })
}

fn decode_expr(
    expr_idx: usize,
    buf: &[u8],
    values_start: usize,
    types: &[ExpressionKind],
    exprs: &[ExprDescriptor],
    pool_start: usize,
) -> SerializeResult<Expression> {
    let descriptor = exprs
        .get(expr_idx)
        .ok_or_else(|| corrupt(0, "expression descriptor index out of range"))?;
    let head = read_string(buf, pool_start, descriptor.symbol_name_offset)?;
    let start = descriptor.start_child_offset as usize;
    let end = descriptor.end_child_offset as usize;

    let mut children = Vec::with_capacity(end.saturating_sub(start));
    for slot in start..end {
        let kind = *types
            .get(slot)
            .ok_or_else(|| corrupt(slot, "argument slot index out of range"))?;
        let value = read_u64(buf, values_start + slot * VALUE_LEN);
        let child = if kind == ExpressionKind::Complex {
            decode_expr(value as usize, buf, values_start, types, exprs, pool_start)?
        } else {
            decode_atom(kind, value, buf, pool_start)?
        };
        children.push(child);
    }

    Ok(Expression::complex(Symbol::new(head), children))
}
