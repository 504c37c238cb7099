//! Head-byte tables and the little-endian / LEB128 primitives shared by the
//! reader and the builder.
//!
//! Every value starts with a head byte. For most heads the byte alone decides
//! both the [`ValueType`] and the exact byte size; the remaining heads carry a
//! length field right behind them. The tables below are the single source of
//! truth for that mapping.

use crate::{Error, MalformedError, Result, ValueType};

pub(crate) const NONE: u8 = 0x00;
pub(crate) const EMPTY_ARRAY: u8 = 0x01;
pub(crate) const ARRAY_NO_INDEX: u8 = 0x02;
pub(crate) const ARRAY_INDEXED: u8 = 0x06;
pub(crate) const EMPTY_OBJECT: u8 = 0x0a;
pub(crate) const OBJECT_SORTED: u8 = 0x0b;
pub(crate) const OBJECT_UNSORTED: u8 = 0x0f;
pub(crate) const COMPACT_ARRAY: u8 = 0x13;
pub(crate) const COMPACT_OBJECT: u8 = 0x14;
pub(crate) const ILLEGAL: u8 = 0x17;
pub(crate) const NULL: u8 = 0x18;
pub(crate) const FALSE: u8 = 0x19;
pub(crate) const TRUE: u8 = 0x1a;
pub(crate) const DOUBLE: u8 = 0x1b;
pub(crate) const UTC_DATE: u8 = 0x1c;
pub(crate) const MIN_KEY: u8 = 0x1e;
pub(crate) const MAX_KEY: u8 = 0x1f;
pub(crate) const INT_BASE: u8 = 0x1f;
pub(crate) const UINT_BASE: u8 = 0x27;
pub(crate) const SMALL_INT_ZERO: u8 = 0x30;
pub(crate) const SMALL_INT_MINUS_SIX: u8 = 0x3a;
pub(crate) const SHORT_STRING: u8 = 0x40;
pub(crate) const LONG_STRING: u8 = 0xbf;
pub(crate) const BINARY_BASE: u8 = 0xbf;
pub(crate) const BCD_POSITIVE_BASE: u8 = 0xc7;
pub(crate) const BCD_NEGATIVE_BASE: u8 = 0xcf;
pub(crate) const TAG_SHORT: u8 = 0xee;
pub(crate) const TAG_LONG: u8 = 0xef;

/// Longest string payload that still fits the one-byte short form.
pub(crate) const MAX_SHORT_STRING: usize = 0xbe - SHORT_STRING as usize;

/// Sorted objects with fewer members than this are searched linearly.
pub(crate) const BINARY_SEARCH_THRESHOLD: usize = 4;

const fn value_type_of(head: u8) -> ValueType {
    match head {
        0x01..=0x09 | 0x13 => ValueType::Array,
        0x0a..=0x12 | 0x14 => ValueType::Object,
        0x17 => ValueType::Illegal,
        0x18 => ValueType::Null,
        0x19 | 0x1a => ValueType::Bool,
        0x1b => ValueType::Double,
        0x1c => ValueType::UtcDate,
        0x1d => ValueType::External,
        0x1e => ValueType::MinKey,
        0x1f => ValueType::MaxKey,
        0x20..=0x27 => ValueType::Int,
        0x28..=0x2f => ValueType::UInt,
        0x30..=0x3f => ValueType::SmallInt,
        0x40..=0xbf => ValueType::String,
        0xc0..=0xc7 => ValueType::Binary,
        0xc8..=0xd7 => ValueType::Bcd,
        0xee | 0xef => ValueType::Tagged,
        0xf0..=0xff => ValueType::Custom,
        // 0x00 plus the reserved ranges 0x15-0x16 and 0xd8-0xed
        _ => ValueType::None,
    }
}

const fn fixed_length_of(head: u8) -> u8 {
    match head {
        0x00 | 0x01 | 0x0a | 0x17..=0x1a | 0x1e | 0x1f | 0x30..=0x3f => 1,
        0x1b..=0x1d => 9,
        0x20..=0x27 => head - 0x1f + 1,
        0x28..=0x2f => head - 0x27 + 1,
        0x40..=0xbe => head - 0x40 + 1,
        0xf0 => 2,
        0xf1 => 3,
        0xf2 => 5,
        0xf3 => 9,
        _ => 0,
    }
}

const fn build_type_table() -> [ValueType; 256] {
    let mut table = [ValueType::None; 256];
    let mut i = 0;
    while i < 256 {
        table[i] = value_type_of(i as u8);
        i += 1;
    }
    table
}

const fn build_length_table() -> [u8; 256] {
    let mut table = [0; 256];
    let mut i = 0;
    while i < 256 {
        table[i] = fixed_length_of(i as u8);
        i += 1;
    }
    table
}

static TYPE_TABLE: [ValueType; 256] = build_type_table();
static FIXED_LENGTH: [u8; 256] = build_length_table();

/// Width of the length field, member count and index-table slots of the
/// non-compact compounds 0x01..=0x12.
static OFFSET_SIZE: [u8; 0x13] = [
    0, // 0x00 none
    1, // 0x01 empty array
    1, 2, 4, 8, // 0x02-0x05 array without index table
    1, 2, 4, 8, // 0x06-0x09 array with index table
    1, // 0x0a empty object
    1, 2, 4, 8, // 0x0b-0x0e object, sorted index table
    1, 2, 4, 8, // 0x0f-0x12 object, unsorted index table
];

/// Smallest possible offset of the first member for compounds 0x01..=0x12.
/// Builders may pad with zero bytes, so the real offset is probed at runtime.
static FIRST_SUB_MAP: [u8; 0x13] = [
    0, // 0x00
    1, // 0x01
    2, 3, 5, 9, // 0x02-0x05
    3, 5, 9, 9, // 0x06-0x09
    1, // 0x0a
    3, 5, 9, 9, // 0x0b-0x0e
    3, 5, 9, 9, // 0x0f-0x12
];

#[inline]
pub(crate) fn value_type(head: u8) -> ValueType {
    TYPE_TABLE[head as usize]
}

/// Exact byte size for heads that determine it, `0` otherwise.
#[inline]
pub(crate) fn fixed_length(head: u8) -> usize {
    FIXED_LENGTH[head as usize] as usize
}

#[inline]
pub(crate) fn offset_size(head: u8) -> usize {
    OFFSET_SIZE.get(head as usize).copied().unwrap_or(0) as usize
}

#[inline]
pub(crate) fn first_sub_offset(head: u8) -> usize {
    FIRST_SUB_MAP.get(head as usize).copied().unwrap_or(0) as usize
}

/// `true` for heads whose type bits are reserved by the format.
#[inline]
pub(crate) fn is_reserved(head: u8) -> bool {
    head != NONE && value_type(head) == ValueType::None
}

pub(crate) fn is_sorted_object(head: u8) -> bool {
    (OBJECT_SORTED..OBJECT_UNSORTED).contains(&head)
}

/// Head for a compound of the given base (`0x02`, `0x06`, `0x0b` or `0x0f`)
/// written with `width`-byte offsets.
pub(crate) fn compound_head(base: u8, width: usize) -> u8 {
    base + match width {
        1 => 0,
        2 => 1,
        4 => 2,
        _ => 3,
    }
}

pub(crate) fn ensure_len(data: &[u8], needed: usize) -> Result<()> {
    if needed > data.len() {
        return Err(MalformedError::Truncated {
            needed,
            len: data.len(),
        }
        .into());
    }
    Ok(())
}

pub(crate) fn to_usize(value: u64) -> Result<usize> {
    usize::try_from(value).map_err(|_| Error::from(MalformedError::LengthOverflow(value)))
}

/// Reads a `width`-byte little-endian unsigned integer at `pos`.
pub(crate) fn read_uint(data: &[u8], pos: usize, width: usize) -> Result<u64> {
    debug_assert!(width <= 8);
    let end = pos.checked_add(width).ok_or(MalformedError::LengthOverflow(pos as u64))?;
    ensure_len(data, end)?;
    Ok(data[pos..end]
        .iter()
        .rev()
        .fold(0u64, |acc, &b| (acc << 8) | u64::from(b)))
}

/// Reads a `width`-byte little-endian two's complement integer at `pos`.
pub(crate) fn read_int(data: &[u8], pos: usize, width: usize) -> Result<i64> {
    let raw = read_uint(data, pos, width)?;
    if width >= 8 {
        #[allow(clippy::cast_possible_wrap)]
        return Ok(raw as i64);
    }
    let shift = 64 - 8 * width as u32;
    #[allow(clippy::cast_possible_wrap)]
    Ok(((raw << shift) as i64) >> shift)
}

/// Reads an offset-sized field and converts it to `usize`.
pub(crate) fn read_offset(data: &[u8], pos: usize, width: usize) -> Result<usize> {
    to_usize(read_uint(data, pos, width)?)
}

/// Reads an unsigned LEB128 value. With `reverse` the value is read backwards
/// starting at `pos`, which is how compound member counts are stored.
pub(crate) fn read_varint(data: &[u8], pos: usize, reverse: bool) -> Result<u64> {
    let mut value = 0u64;
    let mut shift = 0u32;
    let mut i = pos;
    loop {
        let byte = *data.get(i).ok_or(MalformedError::Truncated {
            needed: i + 1,
            len: data.len(),
        })?;
        if shift >= 64 {
            return Err(MalformedError::LengthOverflow(value).into());
        }
        value |= u64::from(byte & 0x7f) << shift;
        shift += 7;
        if byte & 0x80 == 0 {
            return Ok(value);
        }
        if reverse {
            i = i.checked_sub(1).ok_or(MalformedError::Truncated {
                needed: 0,
                len: data.len(),
            })?;
        } else {
            i += 1;
        }
    }
}

/// Number of bytes `value` occupies in LEB128.
pub(crate) fn varint_len(mut value: u64) -> usize {
    let mut len = 1;
    while value >= 0x80 {
        value >>= 7;
        len += 1;
    }
    len
}

/// Writes `value` as LEB128 into `out`. With `reverse` the first group lands
/// on the last byte of `out` and the encoding grows towards lower addresses.
pub(crate) fn write_varint(out: &mut [u8], mut value: u64, reverse: bool) {
    let len = out.len();
    for i in 0..len {
        let idx = if reverse { len - 1 - i } else { i };
        #[allow(clippy::cast_possible_truncation)]
        let mut byte = (value & 0x7f) as u8;
        value >>= 7;
        if i + 1 < len {
            byte |= 0x80;
        }
        out[idx] = byte;
    }
}

/// Writes the low `out.len()` bytes of `value` little-endian.
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn write_uint(out: &mut [u8], value: u64) {
    for (i, b) in out.iter_mut().enumerate() {
        *b = (value >> (8 * i)) as u8;
    }
}

#[cfg(test)]
mod tests {
    use quickcheck_macros::quickcheck;

    use super::*;

    #[quickcheck]
    fn varints_round_trip(value: u64, reverse: bool) -> bool {
        let mut buf = [0u8; 10];
        let len = varint_len(value);
        write_varint(&mut buf[..len], value, reverse);
        let at = if reverse { len - 1 } else { 0 };
        read_varint(&buf[..len], at, reverse).ok() == Some(value)
    }

    #[test]
    fn every_head_has_a_type() {
        assert_eq!(value_type(0x00), ValueType::None);
        assert_eq!(value_type(0x05), ValueType::Array);
        assert_eq!(value_type(0x13), ValueType::Array);
        assert_eq!(value_type(0x14), ValueType::Object);
        assert_eq!(value_type(0x3f), ValueType::SmallInt);
        assert_eq!(value_type(0xbf), ValueType::String);
        assert_eq!(value_type(0xd7), ValueType::Bcd);
        assert_eq!(value_type(0xd8), ValueType::None);
        assert_eq!(value_type(0xef), ValueType::Tagged);
        assert!(is_reserved(0x15));
        assert!(is_reserved(0xed));
        assert!(!is_reserved(0x00));
    }

    #[test]
    fn fixed_lengths() {
        assert_eq!(fixed_length(0x18), 1);
        assert_eq!(fixed_length(0x1b), 9);
        assert_eq!(fixed_length(0x20), 2);
        assert_eq!(fixed_length(0x27), 9);
        assert_eq!(fixed_length(0x2f), 9);
        assert_eq!(fixed_length(0x40), 1);
        assert_eq!(fixed_length(0xbe), 63);
        assert_eq!(fixed_length(0xbf), 0);
        assert_eq!(fixed_length(0x0b), 0);
    }

    #[test]
    fn signed_reads_extend_the_sign() {
        assert_eq!(read_int(&[0xff], 0, 1).unwrap(), -1);
        assert_eq!(read_int(&[0x00, 0x80], 0, 2).unwrap(), -32768);
        assert_eq!(read_int(&[0x7f], 0, 1).unwrap(), 127);
        assert_eq!(read_uint(&[0x34, 0x12], 0, 2).unwrap(), 0x1234);
    }

    #[test]
    fn varints_in_both_directions() {
        let mut fwd = [0u8; 2];
        write_varint(&mut fwd, 300, false);
        assert_eq!(fwd, [0xac, 0x02]);
        assert_eq!(read_varint(&fwd, 0, false).unwrap(), 300);

        let mut rev = [0u8; 2];
        write_varint(&mut rev, 300, true);
        assert_eq!(rev, [0x02, 0xac]);
        assert_eq!(read_varint(&rev, 1, true).unwrap(), 300);

        assert_eq!(varint_len(0x7f), 1);
        assert_eq!(varint_len(0x80), 2);
    }

    #[test]
    fn truncated_reads_fail() {
        assert!(matches!(
            read_uint(&[0x01], 0, 2),
            Err(Error::Malformed(MalformedError::Truncated { needed: 2, len: 1 }))
        ));
        assert!(read_varint(&[0x80], 0, false).is_err());
    }
}
