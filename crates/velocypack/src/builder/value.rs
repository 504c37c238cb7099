use alloc::{string::String, vec::Vec};

use crate::{Result, Slice, ValueType, format};

/// A single value handed to the [`Builder`](crate::Builder).
///
/// Integers are always written in their shortest encoding: `-6..=9` as a
/// one-byte small int, everything else with the fewest bytes that hold the
/// value. Strings of up to 62 bytes use the short string form.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value<'v> {
    Null,
    Bool(bool),
    Double(f64),
    Int(i64),
    UInt(u64),
    String(&'v str),
    Binary(&'v [u8]),
    /// Milliseconds since the Unix epoch.
    UtcDate(i64),
    MinKey,
    MaxKey,
    Illegal,
    /// An already encoded value, copied verbatim.
    Slice(Slice<'v>),
}

impl Value<'_> {
    /// The type the encoded value will report.
    #[must_use]
    pub fn value_type(&self) -> ValueType {
        match self {
            Self::Null => ValueType::Null,
            Self::Bool(_) => ValueType::Bool,
            Self::Double(_) => ValueType::Double,
            Self::Int(v) if small_int(*v).is_some() => ValueType::SmallInt,
            Self::Int(_) => ValueType::Int,
            Self::UInt(v) if *v <= 9 => ValueType::SmallInt,
            Self::UInt(_) => ValueType::UInt,
            Self::String(_) => ValueType::String,
            Self::Binary(_) => ValueType::Binary,
            Self::UtcDate(_) => ValueType::UtcDate,
            Self::MinKey => ValueType::MinKey,
            Self::MaxKey => ValueType::MaxKey,
            Self::Illegal => ValueType::Illegal,
            Self::Slice(s) => s.value_type(),
        }
    }

    /// Appends the encoded value to `out`.
    pub(crate) fn write_to(&self, out: &mut Vec<u8>) -> Result<()> {
        match *self {
            Self::Null => out.push(format::NULL),
            Self::Bool(b) => out.push(if b { format::TRUE } else { format::FALSE }),
            Self::Double(v) => {
                out.push(format::DOUBLE);
                out.extend_from_slice(&v.to_bits().to_le_bytes());
            }
            Self::Int(v) => write_int(out, v),
            Self::UInt(v) => write_uint(out, v),
            Self::String(s) => write_string(out, s.as_bytes()),
            Self::Binary(b) => {
                let width = unsigned_width(b.len() as u64);
                out.push(format::BINARY_BASE + width);
                push_le(out, b.len() as u64, width);
                out.extend_from_slice(b);
            }
            Self::UtcDate(ms) => {
                out.push(format::UTC_DATE);
                out.extend_from_slice(&ms.to_le_bytes());
            }
            Self::MinKey => out.push(format::MIN_KEY),
            Self::MaxKey => out.push(format::MAX_KEY),
            Self::Illegal => out.push(format::ILLEGAL),
            Self::Slice(s) => out.extend_from_slice(s.as_bytes()?),
        }
        Ok(())
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn small_int(v: i64) -> Option<u8> {
    match v {
        0..=9 => Some(format::SMALL_INT_ZERO + v as u8),
        -6..=-1 => Some((0x40 + v) as u8),
        _ => None,
    }
}

/// Fewest bytes holding `v` as an unsigned little-endian integer.
#[allow(clippy::cast_possible_truncation)]
fn unsigned_width(v: u64) -> u8 {
    (1..8).find(|w| v >> (8 * w) == 0).unwrap_or(8)
}

/// Fewest bytes holding `v` as a two's complement little-endian integer.
#[allow(clippy::cast_possible_truncation)]
fn signed_width(v: i64) -> u8 {
    (1..8)
        .find(|w| {
            let bits = 8 * w - 1;
            (-(1i64 << bits)..(1i64 << bits)).contains(&v)
        })
        .unwrap_or(8)
}

fn push_le(out: &mut Vec<u8>, v: u64, width: u8) {
    out.extend_from_slice(&v.to_le_bytes()[..usize::from(width)]);
}

#[allow(clippy::cast_sign_loss)]
fn write_int(out: &mut Vec<u8>, v: i64) {
    if let Some(head) = small_int(v) {
        out.push(head);
        return;
    }
    let width = signed_width(v);
    out.push(format::INT_BASE + width);
    push_le(out, v as u64, width);
}

fn write_uint(out: &mut Vec<u8>, v: u64) {
    if v <= 9 {
        #[allow(clippy::cast_possible_truncation)]
        out.push(format::SMALL_INT_ZERO + v as u8);
        return;
    }
    let width = unsigned_width(v);
    out.push(format::UINT_BASE + width);
    push_le(out, v, width);
}

#[allow(clippy::cast_possible_truncation)]
fn write_string(out: &mut Vec<u8>, bytes: &[u8]) {
    if bytes.len() <= format::MAX_SHORT_STRING {
        out.push(format::SHORT_STRING + bytes.len() as u8);
    } else {
        out.push(format::LONG_STRING);
        out.extend_from_slice(&(bytes.len() as u64).to_le_bytes());
    }
    out.extend_from_slice(bytes);
}

impl From<bool> for Value<'_> {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<f64> for Value<'_> {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

impl From<f32> for Value<'_> {
    fn from(v: f32) -> Self {
        Self::Double(v.into())
    }
}

macro_rules! from_signed {
    ($($t:ty),*) => {$(
        impl From<$t> for Value<'_> {
            fn from(v: $t) -> Self {
                Self::Int(v.into())
            }
        }
    )*};
}

macro_rules! from_unsigned {
    ($($t:ty),*) => {$(
        impl From<$t> for Value<'_> {
            fn from(v: $t) -> Self {
                Self::UInt(v.into())
            }
        }
    )*};
}

from_signed!(i8, i16, i32, i64);
from_unsigned!(u8, u16, u32, u64);

impl From<usize> for Value<'_> {
    fn from(v: usize) -> Self {
        Self::UInt(v as u64)
    }
}

impl<'v> From<&'v str> for Value<'v> {
    fn from(v: &'v str) -> Self {
        Self::String(v)
    }
}

impl<'v> From<&'v String> for Value<'v> {
    fn from(v: &'v String) -> Self {
        Self::String(v)
    }
}

impl<'v> From<&'v [u8]> for Value<'v> {
    fn from(v: &'v [u8]) -> Self {
        Self::Binary(v)
    }
}

impl<'v> From<Slice<'v>> for Value<'v> {
    fn from(v: Slice<'v>) -> Self {
        Self::Slice(v)
    }
}

impl<'v, T: Into<Value<'v>>> From<Option<T>> for Value<'v> {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}
