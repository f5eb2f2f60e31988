//! Bit-exact layout of the portable wire format, matching the
//! `PortableBOSSRootExpression` C layout it interoperates with.
//!
//! Layout, in order, little-endian throughout:
//!
//! ```text
//! [ header                      32 B ]  argumentCount, expressionCount,
//!                                        originalAddress, stringFillIndex
//! [ values[argumentCount]        8 B each ]
//! [ types[argumentCount]         8 B each ]
//! [ exprs[expressionCount]      24 B each ]
//! [ stringPool                   variable  ]
//! ```
//!
//! Header size: 32 bytes. Four `u64` fields (`argumentCount`,
//! `expressionCount`, `originalAddress`, `stringArgumentsFillIndex`), no
//! padding. See `DESIGN.md` for why this, and not some other width, is the
//! one implemented here.

use boss_core::ExpressionKind;

pub const HEADER_LEN: usize = 32;
pub const VALUE_LEN: usize = 8;
pub const TYPE_LEN: usize = 8;
pub const EXPR_DESC_LEN: usize = 24;

pub const RLE_BIT: u64 = 0x80;
pub const RLE_MIN_RUN: usize = 5;

pub const fn values_offset() -> usize {
    HEADER_LEN
}

pub const fn types_offset(argument_count: usize) -> usize {
    values_offset() + argument_count * VALUE_LEN
}

/// The types section always reserves one 8-byte word per argument, whether
/// or not a run-length-encoded run leaves some of those words logically
/// unused: an RLE run's header occupies its first two words (tag+flag, run
/// length) and the remaining `run - 2` words sit unread but present, so the
/// section's byte length is always `argument_count * TYPE_LEN`. This keeps
/// every sub-buffer's offset a pure function of the two header counts.
pub const fn exprs_offset(argument_count: usize) -> usize {
    types_offset(argument_count) + argument_count * TYPE_LEN
}

pub const fn string_pool_offset(argument_count: usize, expression_count: usize) -> usize {
    exprs_offset(argument_count) + expression_count * EXPR_DESC_LEN
}

/// Header fields, decoded from the first 32 bytes.
#[derive(Debug, Clone, Copy)]
pub struct Header {
    pub argument_count: u64,
    pub expression_count: u64,
    pub original_address: u64,
    pub string_fill_index: u64,
}

impl Header {
    pub fn write(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.argument_count.to_le_bytes());
        buf.extend_from_slice(&self.expression_count.to_le_bytes());
        buf.extend_from_slice(&self.original_address.to_le_bytes());
        buf.extend_from_slice(&self.string_fill_index.to_le_bytes());
    }

    pub fn read(buf: &[u8]) -> Option<Self> {
        if buf.len() < HEADER_LEN {
            return None;
        }
        Some(Self {
            argument_count: read_u64(buf, 0),
            expression_count: read_u64(buf, 8),
            original_address: read_u64(buf, 16),
            string_fill_index: read_u64(buf, 24),
        })
    }
}

/// An expression descriptor: (symbol name offset, start child offset, end
/// child offset), 24 bytes.
#[derive(Debug, Clone, Copy)]
pub struct ExprDescriptor {
    pub symbol_name_offset: u64,
    pub start_child_offset: u64,
    pub end_child_offset: u64,
}

impl ExprDescriptor {
    pub fn write(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.symbol_name_offset.to_le_bytes());
        buf.extend_from_slice(&self.start_child_offset.to_le_bytes());
        buf.extend_from_slice(&self.end_child_offset.to_le_bytes());
    }

    pub fn read(buf: &[u8], offset: usize) -> Self {
        Self {
            symbol_name_offset: read_u64(buf, offset),
            start_child_offset: read_u64(buf, offset + 8),
            end_child_offset: read_u64(buf, offset + 16),
        }
    }
}

pub fn read_u64(buf: &[u8], offset: usize) -> u64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&buf[offset..offset + 8]);
    u64::from_le_bytes(bytes)
}

/// Decodes the kind and RLE flag out of a raw 8-byte type slot.
pub fn decode_type_word(word: u64) -> (ExpressionKind, bool) {
    let rle = word & RLE_BIT != 0;
    let tag = (word & !RLE_BIT) as u8;
    let kind = ExpressionKind::from_tag(tag).unwrap_or(ExpressionKind::I64);
    (kind, rle)
}

pub fn encode_type_word(kind: ExpressionKind, rle: bool) -> u64 {
    u64::from(kind.tag()) | if rle { RLE_BIT } else { 0 }
}
