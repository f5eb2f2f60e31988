//! Flattens an in-memory `Expression` tree into the portable wire buffer.
//!
//! Every node, atom or complex, claims exactly one argument slot; complex
//! nodes additionally claim an expression descriptor. Slots and descriptors
//! are assigned breadth-first: a node's children occupy a contiguous run of
//! slots immediately after all of its siblings' own slots have been placed,
//! and a child that is itself complex is queued rather than descended into
//! immediately. `originalAddress` is always written as zero; this buffer has
//! no relationship to wherever the in-memory tree happened to live, and
//! carrying a stale pointer forward would be actively misleading to a
//! reader.

use std::collections::VecDeque;

use boss_core::{ArgumentRef, ComplexExpression, Expression, ExpressionKind};

use crate::wire::{encode_type_word, EXPR_DESC_LEN, HEADER_LEN, RLE_MIN_RUN, VALUE_LEN};
use crate::wire::{ExprDescriptor, Header};

struct Slot {
    kind: ExpressionKind,
    value: u64,
}

struct ExprRecord {
    symbol_name_offset: u64,
    start: usize,
    end: usize,
}

#[derive(Default)]
struct StringPool {
    bytes: Vec<u8>,
}

impl StringPool {
    fn push(&mut self, s: &str) -> u64 {
        let offset = self.bytes.len() as u64;
        self.bytes.extend_from_slice(s.as_bytes());
        self.bytes.push(0);
        offset
    }
}

/// Serializes `root` into a standalone byte buffer.
pub fn encode(root: &Expression) -> Vec<u8> {
    let mut slots: Vec<Slot> = Vec::new();
    let mut exprs: Vec<ExprRecord> = Vec::new();
    let mut pool = StringPool::default();
    let mut queue: VecDeque<(&ComplexExpression, usize)> = VecDeque::new();

    match root {
        Expression::Complex(c) => {
            let symbol_name_offset = pool.push(c.head().as_str());
            slots.push(Slot {
                kind: ExpressionKind::Complex,
                value: 0,
            });
            exprs.push(ExprRecord {
                symbol_name_offset,
                start: 0,
                end: 0,
            });
            queue.push_back((c, 0));
        }
        atom => push_atom_slot(&mut slots, &mut pool, atom),
    }

    while let Some((node, expr_idx)) = queue.pop_front() {
        let start = slots.len();
        let view = node.arguments();
        for i in 0..view.len() {
            let arg = view.get(i).expect("index within len() is always valid");
            push_argument(&mut slots, &mut exprs, &mut pool, &mut queue, arg);
        }
        let end = slots.len();
        exprs[expr_idx].start = start;
        exprs[expr_idx].end = end;
    }

    build_buffer(&slots, &exprs, &pool)
}

fn push_argument<'a>(
    slots: &mut Vec<Slot>,
    exprs: &mut Vec<ExprRecord>,
    pool: &mut StringPool,
    queue: &mut VecDeque<(&'a ComplexExpression, usize)>,
    arg: ArgumentRef<'a>,
) {
    match arg {
        ArgumentRef::Static(e) | ArgumentRef::Dynamic(e) => match e {
            Expression::Complex(c) => {
                let symbol_name_offset = pool.push(c.head().as_str());
                let expr_idx = exprs.len();
                exprs.push(ExprRecord {
                    symbol_name_offset,
                    start: 0,
                    end: 0,
                });
                slots.push(Slot {
                    kind: ExpressionKind::Complex,
                    value: expr_idx as u64,
                });
                queue.push_back((c, expr_idx));
            }
            atom => push_atom_slot(slots, pool, atom),
        },
        ArgumentRef::SpanElement(owned) => push_atom_slot(slots, pool, &owned),
    }
}

fn push_atom_slot(slots: &mut Vec<Slot>, pool: &mut StringPool, atom: &Expression) {
    let (kind, value) = match atom {
        Expression::Bool(v) => (ExpressionKind::Bool, u64::from(*v)),
        Expression::I8(v) => (ExpressionKind::I8, i64::from(*v) as u64),
        Expression::I32(v) => (ExpressionKind::I32, i64::from(*v) as u64),
        Expression::I64(v) => (ExpressionKind::I64, *v as u64),
        Expression::F32(v) => (ExpressionKind::F32, u64::from(v.to_bits())),
        Expression::F64(v) => (ExpressionKind::F64, v.to_bits()),
        Expression::String(s) => (ExpressionKind::String, pool.push(s)),
        Expression::Symbol(s) => (ExpressionKind::Symbol, pool.push(s.as_str())),
        Expression::Complex(_) => unreachable!("complex atoms are queued, not slotted directly"),
    };
    slots.push(Slot { kind, value });
}

fn build_buffer(slots: &[Slot], exprs: &[ExprRecord], pool: &StringPool) -> Vec<u8> {
    let argument_count = slots.len() as u64;
    let expression_count = exprs.len() as u64;

    let mut buf = Vec::with_capacity(
        HEADER_LEN + slots.len() * VALUE_LEN * 2 + exprs.len() * EXPR_DESC_LEN + pool.bytes.len(),
    );

    Header {
        argument_count,
        expression_count,
        original_address: 0,
        string_fill_index: pool.bytes.len() as u64,
    }
    .write(&mut buf);

    for slot in slots {
        buf.extend_from_slice(&slot.value.to_le_bytes());
    }

    write_types(&mut buf, slots);

    for record in exprs {
        ExprDescriptor {
            symbol_name_offset: record.symbol_name_offset,
            start_child_offset: record.start as u64,
            end_child_offset: record.end as u64,
        }
        .write(&mut buf);
    }

    buf.extend_from_slice(&pool.bytes);
    buf
}

/// Writes the types section. A maximal run of `RLE_MIN_RUN` or more identical
/// kinds is still given one physical word per argument -- the section's
/// length never shrinks -- but only the first two words of the run carry
/// information (tag+flag, run length); the remaining `run - 2` words are
/// unused filler. Values were already written individually and are never
/// affected by this.
fn write_types(buf: &mut Vec<u8>, slots: &[Slot]) {
    let mut i = 0;
    while i < slots.len() {
        let kind = slots[i].kind;
        let mut run = 1;
        while i + run < slots.len() && slots[i + run].kind == kind {
            run += 1;
        }
        if run >= RLE_MIN_RUN {
            buf.extend_from_slice(&encode_type_word(kind, true).to_le_bytes());
            buf.extend_from_slice(&(run as u64).to_le_bytes());
            for _ in 0..run - 2 {
                buf.extend_from_slice(&0u64.to_le_bytes());
            }
        } else {
            for slot in &slots[i..i + run] {
                buf.extend_from_slice(&encode_type_word(slot.kind, false).to_le_bytes());
            }
        }
        i += run;
    }
}
