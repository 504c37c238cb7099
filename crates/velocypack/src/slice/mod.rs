//! Zero-copy read access to encoded documents.
//!
//! A [`Slice`] is a borrowed buffer plus the offset of one value inside it.
//! Navigating into arrays and objects produces further slices over the same
//! buffer; nothing is copied and nothing is decoded up front.
//!
//! Equality and hashing are defined over the exact byte range of the value,
//! not over its logical meaning. The integer `5` stored as a small int (one
//! byte) and as a one-byte `int` (two bytes) are different slices. Consumers
//! relying on byte identity (deduplication, caching by encoded form) depend on
//! this, so it is kept as is.

mod iter;
mod lookup;
mod number;

use alloc::{string::String, vec::Vec};
use core::{
    fmt,
    hash::{Hash, Hasher},
};

pub use iter::{ArrayIter, ObjectIter};
pub(crate) use lookup::Layout;
pub use lookup::SliceIndex;
pub use number::Decimal;

use crate::{
    Error, MalformedError, Result, StringSlice, ValueType,
    format::{self, ensure_len, read_offset, read_uint, to_usize},
    options::DEFAULT_MAX_DEPTH,
};

/// A read-only view of one encoded value.
#[derive(Clone, Copy)]
pub struct Slice<'a> {
    buffer: &'a [u8],
    start: usize,
}

impl Slice<'static> {
    /// The absent value, returned by lookups that find nothing.
    pub const NONE: Self = Slice {
        buffer: &[format::NONE],
        start: 0,
    };
}

impl<'a> Slice<'a> {
    /// A slice over the value starting at the first byte of `buffer`.
    ///
    /// An empty buffer yields [`Slice::NONE`].
    #[must_use]
    pub fn new(buffer: &'a [u8]) -> Self {
        if buffer.is_empty() {
            return Slice::NONE;
        }
        Self { buffer, start: 0 }
    }

    /// A slice over the value starting at `start`.
    pub fn with_offset(buffer: &'a [u8], start: usize) -> Result<Self> {
        ensure_len(buffer, start.saturating_add(1))?;
        Ok(Self { buffer, start })
    }

    /// Child slice at an absolute buffer position.
    pub(crate) fn at(&self, pos: usize) -> Result<Self> {
        Self::with_offset(self.buffer, pos)
    }

    /// The head byte.
    #[must_use]
    pub fn head(&self) -> u8 {
        self.buffer[self.start]
    }

    /// The whole underlying buffer, not just this value.
    #[must_use]
    pub fn buffer(&self) -> &'a [u8] {
        self.buffer
    }

    /// Offset of the head byte within [`buffer`](Self::buffer).
    #[must_use]
    pub fn start(&self) -> usize {
        self.start
    }

    #[must_use]
    pub fn value_type(&self) -> ValueType {
        format::value_type(self.head())
    }

    #[must_use]
    pub fn is_type(&self, ty: ValueType) -> bool {
        self.value_type() == ty
    }

    #[must_use]
    pub fn is_none(&self) -> bool {
        self.is_type(ValueType::None)
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        self.is_type(ValueType::Null)
    }

    #[must_use]
    pub fn is_illegal(&self) -> bool {
        self.is_type(ValueType::Illegal)
    }

    #[must_use]
    pub fn is_bool(&self) -> bool {
        self.is_type(ValueType::Bool)
    }

    #[must_use]
    pub fn is_true(&self) -> bool {
        self.head() == format::TRUE
    }

    #[must_use]
    pub fn is_false(&self) -> bool {
        self.head() == format::FALSE
    }

    #[must_use]
    pub fn is_array(&self) -> bool {
        self.is_type(ValueType::Array)
    }

    #[must_use]
    pub fn is_object(&self) -> bool {
        self.is_type(ValueType::Object)
    }

    #[must_use]
    pub fn is_double(&self) -> bool {
        self.is_type(ValueType::Double)
    }

    #[must_use]
    pub fn is_date(&self) -> bool {
        self.is_type(ValueType::UtcDate)
    }

    #[must_use]
    pub fn is_external(&self) -> bool {
        self.is_type(ValueType::External)
    }

    #[must_use]
    pub fn is_min_key(&self) -> bool {
        self.is_type(ValueType::MinKey)
    }

    #[must_use]
    pub fn is_max_key(&self) -> bool {
        self.is_type(ValueType::MaxKey)
    }

    #[must_use]
    pub fn is_int(&self) -> bool {
        self.is_type(ValueType::Int)
    }

    #[must_use]
    pub fn is_uint(&self) -> bool {
        self.is_type(ValueType::UInt)
    }

    #[must_use]
    pub fn is_small_int(&self) -> bool {
        self.is_type(ValueType::SmallInt)
    }

    /// `true` for `int`, `uint` and `smallint`.
    #[must_use]
    pub fn is_integer(&self) -> bool {
        self.value_type().is_integer()
    }

    /// `true` for any integer type and `double`.
    #[must_use]
    pub fn is_number(&self) -> bool {
        self.is_integer() || self.is_double()
    }

    #[must_use]
    pub fn is_string(&self) -> bool {
        self.is_type(ValueType::String)
    }

    #[must_use]
    pub fn is_binary(&self) -> bool {
        self.is_type(ValueType::Binary)
    }

    #[must_use]
    pub fn is_bcd(&self) -> bool {
        self.is_type(ValueType::Bcd)
    }

    #[must_use]
    pub fn is_custom(&self) -> bool {
        self.is_type(ValueType::Custom)
    }

    #[must_use]
    pub fn is_tagged(&self) -> bool {
        self.is_type(ValueType::Tagged)
    }

    fn expect_type(&self, expected: &'static [ValueType]) -> Result<()> {
        let actual = self.value_type();
        if expected.contains(&actual) {
            Ok(())
        } else {
            Err(Error::mismatch(expected, actual))
        }
    }

    /// Total number of bytes this value occupies, tags included.
    ///
    /// The size is derived from the head byte and at most one length field,
    /// so it never depends on what follows the value in the buffer. The whole
    /// range must lie inside the buffer.
    pub fn byte_size(&self) -> Result<usize> {
        let size = byte_size_at(self.buffer, self.start)?;
        ensure_len(self.buffer, self.start.saturating_add(size))?;
        Ok(size)
    }

    /// The exact byte range of this value.
    pub fn as_bytes(&self) -> Result<&'a [u8]> {
        let size = self.byte_size()?;
        Ok(&self.buffer[self.start..self.start + size])
    }

    /// Copies the exact byte range of this value into a new buffer.
    pub fn to_vec(&self) -> Result<Vec<u8>> {
        self.as_bytes().map(<[u8]>::to_vec)
    }

    /// Byte range used by equality and hashing. Falls back to the rest of the
    /// buffer when the value's size cannot be determined.
    fn identity_bytes(&self) -> &'a [u8] {
        self.as_bytes().unwrap_or(&self.buffer[self.start..])
    }

    pub fn as_bool(&self) -> Result<bool> {
        self.expect_type(&[ValueType::Bool])?;
        Ok(self.is_true())
    }

    /// The string payload as a borrowed byte view.
    pub fn as_string_slice(&self) -> Result<StringSlice<'a>> {
        self.expect_type(&[ValueType::String])?;
        let head = self.head();
        if head == format::LONG_STRING {
            let len = read_offset(self.buffer, self.start + 1, 8)?;
            let from = self.start + 9;
            ensure_len(self.buffer, from.saturating_add(len))?;
            Ok(StringSlice::new(self.buffer, from, len))
        } else {
            let len = usize::from(head - format::SHORT_STRING);
            ensure_len(self.buffer, self.start + 1 + len)?;
            Ok(StringSlice::new(self.buffer, self.start + 1, len))
        }
    }

    /// The decoded string, borrowed from the buffer.
    pub fn as_str(&self) -> Result<&'a str> {
        self.as_string_slice()?.to_str()
    }

    /// First character of a string value.
    pub fn as_char(&self) -> Result<char> {
        self.as_str()?
            .chars()
            .next()
            .ok_or(Error::IndexOutOfBounds { index: 0, length: 0 })
    }

    /// Byte length of a string payload.
    pub fn string_byte_length(&self) -> Result<usize> {
        self.as_string_slice().map(|s| s.len())
    }

    /// Milliseconds since the Unix epoch.
    pub fn as_date(&self) -> Result<i64> {
        self.expect_type(&[ValueType::UtcDate])?;
        format::read_int(self.buffer, self.start + 1, 8)
    }

    /// The binary payload, borrowed from the buffer.
    pub fn as_binary(&self) -> Result<&'a [u8]> {
        let len = self.binary_length()?;
        let from = self.start + 1 + usize::from(self.head() - format::BINARY_BASE);
        ensure_len(self.buffer, from.saturating_add(len))?;
        Ok(&self.buffer[from..from + len])
    }

    pub fn binary_length(&self) -> Result<usize> {
        self.expect_type(&[ValueType::Binary])?;
        let width = usize::from(self.head() - format::BINARY_BASE);
        read_offset(self.buffer, self.start + 1, width)
    }

    /// Number of members of an array or object, or number of characters of a
    /// string.
    pub fn length(&self) -> Result<usize> {
        match self.value_type() {
            ValueType::String => Ok(self.as_str()?.chars().count()),
            ValueType::Array | ValueType::Object => Ok(self.layout()?.len()),
            actual => Err(Error::mismatch(
                &[ValueType::Array, ValueType::Object, ValueType::String],
                actual,
            )),
        }
    }

    /// Alias of [`length`](Self::length).
    pub fn size(&self) -> Result<usize> {
        self.length()
    }

    #[must_use]
    pub fn is_empty_array(&self) -> bool {
        self.head() == format::EMPTY_ARRAY
    }

    #[must_use]
    pub fn is_empty_object(&self) -> bool {
        self.head() == format::EMPTY_OBJECT
    }

    /// The first tag id, or `None` for untagged values.
    pub fn first_tag(&self) -> Result<Option<u64>> {
        Ok(tag_prefix(self.buffer, self.start)?.map(|(tag, _)| tag))
    }

    /// All stacked tag ids, outermost first.
    pub fn tags(&self) -> Result<Vec<u64>> {
        let mut tags = Vec::new();
        let mut pos = self.start;
        while let Some((tag, width)) = tag_prefix(self.buffer, pos)? {
            tags.push(tag);
            pos += width;
        }
        Ok(tags)
    }

    pub fn has_tag(&self, id: u64) -> Result<bool> {
        let mut pos = self.start;
        while let Some((tag, width)) = tag_prefix(self.buffer, pos)? {
            if tag == id {
                return Ok(true);
            }
            pos += width;
        }
        Ok(false)
    }

    /// Offset of the first byte after all tag prefixes.
    pub fn value_start(&self) -> Result<usize> {
        let mut pos = self.start;
        while let Some((_, width)) = tag_prefix(self.buffer, pos)? {
            pos += width;
        }
        Ok(pos)
    }

    /// The value with every tag prefix stripped. Untagged values are returned
    /// unchanged.
    pub fn value(&self) -> Result<Self> {
        if !self.is_tagged() {
            return Ok(*self);
        }
        self.at(self.value_start()?)
    }

    /// An indented outline of the value's types, for debugging.
    ///
    /// Objects list every key, arrays only describe their first member.
    /// Values nested deeper than 64 levels fail with
    /// [`MalformedError::DepthExceeded`].
    pub fn schema_description(&self) -> Result<String> {
        let mut out = String::new();
        self.describe(&mut out, 0)?;
        Ok(out)
    }

    fn describe(&self, out: &mut String, level: usize) -> Result<()> {
        if level > DEFAULT_MAX_DEPTH {
            return Err(MalformedError::DepthExceeded(DEFAULT_MAX_DEPTH).into());
        }
        let ty = self.value_type();
        out.push(' ');
        out.push_str(ty.name());
        match ty {
            ValueType::Object => {
                for member in self.object_iter()? {
                    let (key, value) = member?;
                    out.push('\n');
                    for _ in 0..=level {
                        out.push_str(" |----");
                    }
                    out.push(' ');
                    out.push_str(key.as_str()?);
                    value.describe(out, level + 1)?;
                }
            }
            ValueType::Array => {
                if let Some(first) = self.array_iter()?.next() {
                    first?.describe(out, level + 1)?;
                }
            }
            _ => {}
        }
        Ok(())
    }
}

/// Reads the tag at `pos`, if the value there is tagged: `(tag id, prefix
/// width)`.
fn tag_prefix(data: &[u8], pos: usize) -> Result<Option<(u64, usize)>> {
    ensure_len(data, pos + 1)?;
    match data[pos] {
        format::TAG_SHORT => Ok(Some((read_uint(data, pos + 1, 1)?, 2))),
        format::TAG_LONG => Ok(Some((read_uint(data, pos + 1, 8)?, 9))),
        _ => Ok(None),
    }
}

/// Size of the value whose head is at `pos`. Tag chains are walked in a
/// loop so hostile input cannot exhaust the stack.
pub(crate) fn byte_size_at(data: &[u8], mut pos: usize) -> Result<usize> {
    let mut prefix = 0usize;
    loop {
        ensure_len(data, pos + 1)?;
        let head = data[pos];
        let fixed = format::fixed_length(head);
        if fixed != 0 {
            return Ok(prefix + fixed);
        }
        let size = match format::value_type(head) {
            ValueType::Array | ValueType::Object => {
                if head == format::COMPACT_ARRAY || head == format::COMPACT_OBJECT {
                    format::read_varint(data, pos + 1, false)?
                } else {
                    read_uint(data, pos + 1, format::offset_size(head))?
                }
            }
            ValueType::String => sized(data, pos, 8, 0)?,
            ValueType::Binary => sized(data, pos, usize::from(head - format::BINARY_BASE), 0)?,
            ValueType::Bcd => {
                let base = if head <= 0xcf {
                    format::BCD_POSITIVE_BASE
                } else {
                    format::BCD_NEGATIVE_BASE
                };
                sized(data, pos, usize::from(head - base), 4)?
            }
            ValueType::Custom => {
                let width = match head {
                    0xf4..=0xf6 => 1,
                    0xf7..=0xf9 => 2,
                    0xfa..=0xfc => 4,
                    _ => 8,
                };
                sized(data, pos, width, 0)?
            }
            ValueType::Tagged => {
                let width = if head == format::TAG_SHORT { 2 } else { 9 };
                prefix += width;
                pos += width;
                continue;
            }
            _ => return Err(MalformedError::ReservedHead(head).into()),
        };
        let size = to_usize(size)?;
        if size == 0 {
            return Err(MalformedError::Compound {
                offset: pos,
                reason: "zero byte length",
            }
            .into());
        }
        return prefix
            .checked_add(size)
            .ok_or_else(|| Error::from(MalformedError::LengthOverflow(size as u64)));
    }
}

/// `1 + width + len + extra`, where `len` is the `width`-byte field after the
/// head.
fn sized(data: &[u8], pos: usize, width: usize, extra: u64) -> Result<u64> {
    let len = read_uint(data, pos + 1, width)?;
    len.checked_add(1 + width as u64 + extra)
        .ok_or_else(|| Error::from(MalformedError::LengthOverflow(len)))
}

impl PartialEq for Slice<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.identity_bytes() == other.identity_bytes()
    }
}

impl Eq for Slice<'_> {}

impl Hash for Slice<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identity_bytes().hash(state);
    }
}

impl Default for Slice<'_> {
    fn default() -> Self {
        Slice::NONE
    }
}

struct Hex<'a>(&'a [u8]);

impl fmt::Debug for Hex<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, b) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{b:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Slice<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Slice")
            .field("type", &self.value_type())
            .field("start", &self.start)
            .field("bytes", &Hex(self.identity_bytes()))
            .finish()
    }
}
