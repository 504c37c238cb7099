//! Stack-based construction of documents.
//!
//! The builder appends every value to one growing byte buffer. Opening an
//! array or object pushes a frame and reserves nine bytes (head plus the
//! widest possible length field); members are written straight after. Only
//! when the compound is closed are its final layout and offset width known,
//! at which point the members are moved down over the unused header bytes,
//! the index table is appended and head and length are back-patched.

mod value;

use alloc::vec::Vec;

pub use value::Value;

use crate::{
    BuilderError, BuilderOptions, Result, Slice, ValueType,
    format::{self, varint_len, write_uint, write_varint},
};

/// Bytes reserved for the head and length of a compound until it is closed.
const RESERVED_HEADER: usize = 9;

#[derive(Debug, Clone, Copy)]
struct Frame {
    start: usize,
    object: bool,
    compact: bool,
    /// Position in `Builder::offsets` where this frame's member offsets begin.
    first_offset: usize,
    /// Objects only: a key has been written and waits for its value.
    key_written: bool,
}

/// Assembles a document from a sequence of values and open/close calls.
///
/// ```rust
/// use velocypack::Builder;
///
/// let mut b = Builder::new();
/// b.open_object()?;
/// b.add_keyed("name", "Koko")?;
/// b.add_keyed("age", 46)?;
/// b.open_array_keyed("toys")?;
/// b.add("ball")?;
/// b.close()?;
/// b.close()?;
///
/// let doc = b.slice()?;
/// assert_eq!(doc.get("toys")?.get_index(0)?.as_str()?, "ball");
/// # Ok::<(), velocypack::Error>(())
/// ```
///
/// Inside an object, [`add`](Self::add) alternates between keys and values:
/// the first call writes a key (which must be a string), the second its value.
#[derive(Debug, Clone, Default)]
pub struct Builder {
    buffer: Vec<u8>,
    stack: Vec<Frame>,
    /// Member offsets of all open frames, relative to each frame's start.
    offsets: Vec<usize>,
    options: BuilderOptions,
}

impl Builder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_options(options: BuilderOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn options(&self) -> &BuilderOptions {
        &self.options
    }

    /// `true` once a complete top-level value has been written.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.stack.is_empty() && !self.buffer.is_empty()
    }

    /// Number of bytes written so far, including unfinished compounds.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Discards everything written so far but keeps the allocations.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.stack.clear();
        self.offsets.clear();
    }

    fn ensure_closed(&self) -> Result<()> {
        if !self.stack.is_empty() {
            return Err(BuilderError::CompoundStillOpen.into());
        }
        if self.buffer.is_empty() {
            return Err(BuilderError::Empty.into());
        }
        Ok(())
    }

    /// The finished document.
    pub fn slice(&self) -> Result<Slice<'_>> {
        self.ensure_closed()?;
        Ok(Slice::new(&self.buffer))
    }

    /// The encoded bytes of the finished document.
    pub fn bytes(&self) -> Result<&[u8]> {
        self.ensure_closed()?;
        Ok(&self.buffer)
    }

    /// Takes the encoded bytes of the finished document.
    pub fn into_bytes(self) -> Result<Vec<u8>> {
        self.ensure_closed()?;
        Ok(self.buffer)
    }

    /// Bookkeeping before a member of type `ty` is appended at the current end
    /// of the buffer.
    fn before_value(&mut self, ty: ValueType) -> Result<()> {
        let pos = self.buffer.len();
        match self.stack.last_mut() {
            None if !self.buffer.is_empty() => Err(BuilderError::DocumentComplete.into()),
            None => Ok(()),
            Some(frame) if frame.object && frame.key_written => {
                frame.key_written = false;
                Ok(())
            }
            Some(frame) if frame.object => {
                if ty != ValueType::String {
                    return Err(BuilderError::KeyMustBeString(ty).into());
                }
                self.offsets.push(pos - frame.start);
                frame.key_written = true;
                Ok(())
            }
            Some(frame) => {
                self.offsets.push(pos - frame.start);
                Ok(())
            }
        }
    }

    fn before_keyed(&mut self) -> Result<()> {
        match self.stack.last() {
            Some(frame) if frame.object && frame.key_written => {
                Err(BuilderError::ValueMissing.into())
            }
            Some(frame) if frame.object => Ok(()),
            _ => Err(BuilderError::KeyOutsideObject.into()),
        }
    }

    fn append(&mut self, tag: Option<u64>, value: Value<'_>) -> Result<()> {
        if let Value::Slice(slice) = value {
            // reject before touching frame state
            if slice.is_none() {
                return Err(BuilderError::Unencodable("none").into());
            }
            slice.byte_size()?;
            if slice.has_tag(0)? {
                return Err(BuilderError::ReservedTag.into());
            }
        }
        if tag == Some(0) {
            return Err(BuilderError::ReservedTag.into());
        }
        let ty = if tag.is_some() {
            ValueType::Tagged
        } else {
            value.value_type()
        };
        self.before_value(ty)?;
        if let Some(tag) = tag {
            if let Ok(short) = u8::try_from(tag) {
                self.buffer.extend_from_slice(&[format::TAG_SHORT, short]);
            } else {
                self.buffer.push(format::TAG_LONG);
                self.buffer.extend_from_slice(&tag.to_le_bytes());
            }
        }
        value.write_to(&mut self.buffer)
    }

    /// Appends a value. At the top level this is the whole document; inside
    /// an array it is the next member; inside an object it is alternately a
    /// key and a value.
    pub fn add<'v>(&mut self, value: impl Into<Value<'v>>) -> Result<()> {
        self.append(None, value.into())
    }

    /// Appends a `key: value` member to the open object.
    pub fn add_keyed<'v>(&mut self, key: &str, value: impl Into<Value<'v>>) -> Result<()> {
        self.before_keyed()?;
        self.add(key)?;
        self.add(value)
    }

    /// Appends an already encoded value verbatim.
    pub fn add_slice(&mut self, slice: Slice<'_>) -> Result<()> {
        self.add(slice)
    }

    /// Appends `value` prefixed with tag `tag`. Tags up to 255 use the two-byte
    /// prefix, larger ones the nine-byte form. Tag id 0 is reserved and fails
    /// with [`BuilderError::ReservedTag`].
    pub fn add_tagged<'v>(&mut self, tag: u64, value: impl Into<Value<'v>>) -> Result<()> {
        self.append(Some(tag), value.into())
    }

    fn open(&mut self, object: bool, compact: bool) -> Result<()> {
        if let Some(frame) = self.stack.last() {
            if frame.object && !frame.key_written {
                return Err(BuilderError::KeyMissing.into());
            }
        }
        self.before_value(if object {
            ValueType::Object
        } else {
            ValueType::Array
        })?;
        let start = self.buffer.len();
        self.buffer.push(if object {
            format::OBJECT_SORTED
        } else {
            format::ARRAY_INDEXED
        });
        self.buffer.extend_from_slice(&[0; RESERVED_HEADER - 1]);
        self.stack.push(Frame {
            start,
            object,
            compact,
            first_offset: self.offsets.len(),
            key_written: false,
        });
        Ok(())
    }

    fn open_keyed(&mut self, key: &str, object: bool, compact: bool) -> Result<()> {
        self.before_keyed()?;
        self.add(key)?;
        self.open(object, compact)
    }

    pub fn open_array(&mut self) -> Result<()> {
        self.open(false, false)
    }

    pub fn open_object(&mut self) -> Result<()> {
        self.open(true, false)
    }

    /// Opens an array that is written in the compact layout when closed.
    pub fn open_compact_array(&mut self) -> Result<()> {
        self.open(false, true)
    }

    /// Opens an object that is written in the compact layout when closed.
    pub fn open_compact_object(&mut self) -> Result<()> {
        self.open(true, true)
    }

    pub fn open_array_keyed(&mut self, key: &str) -> Result<()> {
        self.open_keyed(key, false, false)
    }

    pub fn open_object_keyed(&mut self, key: &str) -> Result<()> {
        self.open_keyed(key, true, false)
    }

    pub fn open_compact_array_keyed(&mut self, key: &str) -> Result<()> {
        self.open_keyed(key, false, true)
    }

    pub fn open_compact_object_keyed(&mut self, key: &str) -> Result<()> {
        self.open_keyed(key, true, true)
    }

    /// Closes the innermost open array or object, sorting object index tables
    /// according to [`BuilderOptions::sort_attribute_names`].
    pub fn close(&mut self) -> Result<()> {
        self.close_with(self.options.sort_attribute_names)
    }

    /// Closes the innermost open array or object. `sort` decides whether an
    /// object's index table is sorted by key; it is ignored for arrays.
    pub fn close_with(&mut self, sort: bool) -> Result<()> {
        let frame = *self.stack.last().ok_or(BuilderError::NoOpenCompound)?;
        if frame.object && frame.key_written {
            return Err(BuilderError::ValueMissing.into());
        }
        self.stack.pop();
        let offsets = self.offsets.split_off(frame.first_offset);
        let start = frame.start;

        if offsets.is_empty() {
            self.buffer.truncate(start + 1);
            self.buffer[start] = if frame.object {
                format::EMPTY_OBJECT
            } else {
                format::EMPTY_ARRAY
            };
            return Ok(());
        }

        let unindexed = if frame.object {
            self.options.build_unindexed_objects
        } else {
            self.options.build_unindexed_arrays
        };
        if (frame.compact || unindexed) && self.close_compact(start, frame.object, offsets.len()) {
            return Ok(());
        }
        self.close_indexed(start, frame.object, sort, offsets)
    }

    /// Writes the compact layout. Returns `false`, leaving the buffer
    /// untouched, when the byte length would need more than eight LEB128
    /// bytes.
    fn close_compact(&mut self, start: usize, object: bool, n: usize) -> bool {
        let data_len = self.buffer.len() - start - RESERVED_HEADER;
        let count_len = varint_len(n as u64);
        let mut length_len = 1;
        let total = loop {
            let total = 1 + length_len + data_len + count_len;
            if varint_len(total as u64) <= length_len {
                break total;
            }
            length_len += 1;
        };
        if length_len >= RESERVED_HEADER {
            return false;
        }

        let data_start = start + 1 + length_len;
        self.buffer
            .copy_within(start + RESERVED_HEADER.., data_start);
        self.buffer.truncate(data_start + data_len);
        self.buffer[start] = if object {
            format::COMPACT_OBJECT
        } else {
            format::COMPACT_ARRAY
        };
        write_varint(&mut self.buffer[start + 1..data_start], total as u64, false);
        let end = self.buffer.len();
        self.buffer.resize(end + count_len, 0);
        write_varint(&mut self.buffer[end..], n as u64, true);

        #[cfg(feature = "tracing")]
        tracing::trace!(start, members = n, total, object, "closed compact compound");
        true
    }

    fn close_indexed(
        &mut self,
        start: usize,
        object: bool,
        sort: bool,
        mut offsets: Vec<usize>,
    ) -> Result<()> {
        let n = offsets.len();
        let data_len = self.buffer.len() - start - RESERVED_HEADER;

        // arrays whose members all have the same size need no index table
        let indexed = object || !self.equal_member_sizes(start, &offsets);
        let (width, header, total) = choose_width(data_len, n, indexed);

        let shift = RESERVED_HEADER - header;
        if shift > 0 {
            self.buffer
                .copy_within(start + RESERVED_HEADER.., start + header);
            self.buffer.truncate(self.buffer.len() - shift);
            for offset in &mut offsets {
                *offset -= shift;
            }
        }

        let base = if !object {
            if indexed {
                format::ARRAY_INDEXED
            } else {
                format::ARRAY_NO_INDEX
            }
        } else if sort {
            if n > 1 {
                self.sort_by_key(start, &mut offsets)?;
            }
            format::OBJECT_SORTED
        } else {
            format::OBJECT_UNSORTED
        };

        if indexed {
            for &offset in &offsets {
                let at = self.buffer.len();
                self.buffer.resize(at + width, 0);
                write_uint(&mut self.buffer[at..], offset as u64);
            }
            if width == 8 {
                self.buffer.extend_from_slice(&(n as u64).to_le_bytes());
            } else {
                write_uint(&mut self.buffer[start + 1 + width..start + 1 + 2 * width], n as u64);
            }
        }
        self.buffer[start] = format::compound_head(base, width);
        write_uint(&mut self.buffer[start + 1..start + 1 + width], total as u64);
        debug_assert_eq!(self.buffer.len() - start, total);

        #[cfg(feature = "tracing")]
        tracing::trace!(start, members = n, width, indexed, total, "closed compound");
        Ok(())
    }

    fn equal_member_sizes(&self, start: usize, offsets: &[usize]) -> bool {
        let end = self.buffer.len() - start;
        let first = offsets.get(1).unwrap_or(&end) - offsets[0];
        offsets
            .windows(2)
            .map(|w| w[1] - w[0])
            .chain(core::iter::once(end - offsets[offsets.len() - 1]))
            .all(|size| size == first)
    }

    /// Sorts member offsets by the raw bytes of their keys.
    fn sort_by_key(&self, start: usize, offsets: &mut [usize]) -> Result<()> {
        let mut keyed = offsets
            .iter()
            .map(|&offset| {
                let key = Slice::with_offset(&self.buffer, start + offset)?;
                Ok((key.as_string_slice()?.as_bytes(), offset))
            })
            .collect::<Result<Vec<_>>>()?;
        keyed.sort_by(|a, b| a.0.cmp(b.0));
        for (slot, (_, offset)) in offsets.iter_mut().zip(keyed) {
            *slot = offset;
        }
        Ok(())
    }
}

/// Picks the narrowest offset width whose fields can describe the whole
/// compound. Returns `(width, header bytes, total byte size)`.
fn choose_width(data_len: usize, n: usize, indexed: bool) -> (usize, usize, usize) {
    for (width, max) in [(1, 0xff_u64), (2, 0xffff), (4, 0xffff_ffff)] {
        let header = if indexed { 1 + 2 * width } else { 1 + width };
        let total = header + data_len + if indexed { n * width } else { 0 };
        if total as u64 <= max {
            return (width, header, total);
        }
    }
    let total = RESERVED_HEADER + data_len + if indexed { n * 8 + 8 } else { 0 };
    (8, RESERVED_HEADER, total)
}
