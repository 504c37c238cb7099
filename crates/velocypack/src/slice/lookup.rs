//! Member access for arrays and objects.
//!
//! Compounds come in four layouts and every accessor first resolves which one
//! it is looking at:
//!
//! - empty (`0x01`, `0x0a`);
//! - equal-size members without an index table (`0x02..=0x05`), which also
//!   covers any indexed compound with a single member;
//! - indexed (`0x06..=0x12`): offsets relative to the head live in a table at
//!   the end, followed by the member count when offsets are 8 bytes wide;
//! - compact (`0x13`, `0x14`): LEB128 byte length after the head and a
//!   reversed LEB128 member count in the last bytes, no index table.

use core::cmp::Ordering;

use super::Slice;
use crate::{
    AttributeTranslator, Error, MalformedError, Result, ValueType,
    format::{self, read_offset, read_varint},
};

#[derive(Debug, Clone, Copy)]
pub(crate) enum Layout {
    Empty,
    Equal {
        data: usize,
        member_size: usize,
        n: usize,
    },
    Indexed {
        table: usize,
        width: usize,
        n: usize,
    },
    Compact {
        data: usize,
        n: usize,
    },
}

impl Layout {
    pub(crate) fn len(self) -> usize {
        match self {
            Self::Empty => 0,
            Self::Equal { n, .. } | Self::Indexed { n, .. } | Self::Compact { n, .. } => n,
        }
    }
}

fn inconsistent(offset: usize, reason: &'static str) -> Error {
    MalformedError::Compound { offset, reason }.into()
}

impl<'a> Slice<'a> {
    /// Absolute position of the member whose index-table entry sits at
    /// `entry`.
    pub(crate) fn indexed_member(&self, entry: usize, width: usize) -> Result<usize> {
        let offset = read_offset(self.buffer, entry, width)?;
        self.start
            .checked_add(offset)
            .filter(|&pos| pos < self.buffer.len())
            .ok_or_else(|| inconsistent(self.start, "index entry out of range"))
    }

    /// Offset of the first member relative to the head. Builders may leave
    /// zero padding after the length fields; a value never starts with 0x00.
    fn find_data_offset(&self, head: u8) -> usize {
        let fsm = format::first_sub_offset(head);
        let byte = |i: usize| self.buffer.get(self.start + i).copied().unwrap_or(0);
        if fsm <= 2 && byte(2) != 0 {
            2
        } else if fsm <= 3 && byte(3) != 0 {
            3
        } else if fsm <= 5 && byte(5) != 0 {
            5
        } else {
            9
        }
    }

    pub(crate) fn layout(&self) -> Result<Layout> {
        let head = self.head();
        let start = self.start;
        match head {
            format::EMPTY_ARRAY | format::EMPTY_OBJECT => Ok(Layout::Empty),
            format::COMPACT_ARRAY | format::COMPACT_OBJECT => {
                let end = self.byte_size()?;
                let length_bytes = self.buffer[start + 1..start + end]
                    .iter()
                    .position(|b| b & 0x80 == 0)
                    .map_or(end, |i| i + 1);
                let data = start + 1 + length_bytes;
                if data >= start + end {
                    return Err(inconsistent(start, "length prefix overruns value"));
                }
                let n = format::to_usize(read_varint(self.buffer, start + end - 1, true)?)?;
                Ok(Layout::Compact { data, n })
            }
            0x02..=0x12 => {
                let width = format::offset_size(head);
                let end = self.byte_size()?;
                let data_offset = self.find_data_offset(head);
                if data_offset >= end {
                    return Err(inconsistent(start, "no room for members"));
                }
                if head <= 0x05 {
                    let member_size = self.at(start + data_offset)?.byte_size()?;
                    return Ok(Layout::Equal {
                        data: start + data_offset,
                        member_size,
                        n: (end - data_offset) / member_size,
                    });
                }
                let n = if width < 8 {
                    read_offset(self.buffer, start + 1 + width, width)?
                } else {
                    read_offset(self.buffer, start + end - 8, 8)?
                };
                if n == 0 {
                    return Err(inconsistent(start, "indexed compound without members"));
                }
                if n == 1 {
                    return Ok(Layout::Equal {
                        data: start + data_offset,
                        member_size: 0,
                        n,
                    });
                }
                let table_len = n
                    .checked_mul(width)
                    .and_then(|t| t.checked_add(if width == 8 { 8 } else { 0 }))
                    .filter(|&t| t <= end - data_offset)
                    .ok_or_else(|| inconsistent(start, "index table overruns value"))?;
                Ok(Layout::Indexed {
                    table: start + end - table_len,
                    width,
                    n,
                })
            }
            _ => Err(Error::mismatch(
                &[ValueType::Array, ValueType::Object],
                self.value_type(),
            )),
        }
    }

    /// Absolute position of the `index`-th member (the key, for objects).
    fn member_position(&self, layout: Layout, index: usize) -> Result<usize> {
        let length = layout.len();
        if index >= length {
            return Err(Error::IndexOutOfBounds { index, length });
        }
        match layout {
            Layout::Empty => Err(Error::IndexOutOfBounds { index, length }),
            Layout::Equal {
                data, member_size, ..
            } => Ok(data + index * member_size),
            Layout::Indexed { table, width, .. } => self.indexed_member(table + index * width, width),
            Layout::Compact { data, .. } => {
                let object = self.is_object();
                let mut pos = data;
                for _ in 0..index {
                    pos += self.at(pos)?.byte_size()?;
                    if object {
                        pos += self.at(pos)?.byte_size()?;
                    }
                }
                Ok(pos)
            }
        }
    }

    /// The `index`-th member of an array.
    pub fn get_index(&self, index: usize) -> Result<Slice<'a>> {
        if !self.is_array() {
            return Err(Error::mismatch(&[ValueType::Array], self.value_type()));
        }
        let pos = self.member_position(self.layout()?, index)?;
        self.at(pos)
    }

    /// The raw key of the `index`-th member of an object, in storage order.
    ///
    /// Integer keys are returned as stored; see [`make_key`](Self::make_key).
    pub fn key_at(&self, index: usize) -> Result<Slice<'a>> {
        if !self.is_object() {
            return Err(Error::mismatch(&[ValueType::Object], self.value_type()));
        }
        let pos = self.member_position(self.layout()?, index)?;
        self.at(pos)
    }

    /// The value of the `index`-th member of an object, in storage order.
    pub fn value_at(&self, index: usize) -> Result<Slice<'a>> {
        let key = self.key_at(index)?;
        self.at(key.start + key.byte_size()?)
    }

    /// Turns a stored key into its string form: strings are returned as is,
    /// integers go through the [`AttributeTranslator`].
    pub fn make_key(&self) -> Result<Slice<'a>> {
        match self.value_type() {
            ValueType::String => Ok(*self),
            ValueType::SmallInt | ValueType::Int | ValueType::UInt => {
                let code = self.as_big_integer()?;
                let translated = u64::try_from(code)
                    .map(|code| AttributeTranslator.translate(code))
                    .unwrap_or(Slice::NONE);
                if translated.is_none() {
                    return Err(Error::UntranslatableKey(code));
                }
                Ok(translated)
            }
            actual => Err(Error::KeyType(actual)),
        }
    }

    fn compare_key(key: &Slice<'_>, attribute: &[u8]) -> Result<Ordering> {
        Ok(key.make_key()?.as_string_slice()?.compare_bytes(attribute))
    }

    /// The value stored under `attribute`, or [`Slice::NONE`] when the object
    /// has no such member.
    pub fn get_key(&self, attribute: &str) -> Result<Slice<'a>> {
        if !self.is_object() {
            return Err(Error::mismatch(&[ValueType::Object], self.value_type()));
        }
        let attribute = attribute.as_bytes();
        match self.layout()? {
            Layout::Empty => Ok(Slice::NONE),
            Layout::Compact { .. } => {
                for member in self.object_iter()? {
                    let (key, value) = member?;
                    if key.as_string_slice()?.compare_bytes(attribute) == Ordering::Equal {
                        return Ok(value);
                    }
                }
                Ok(Slice::NONE)
            }
            // a single member never has an index table, whatever the head says
            Layout::Equal { data, .. } => {
                let key = self.at(data)?;
                if Self::compare_key(&key, attribute)? == Ordering::Equal {
                    self.at(data + key.byte_size()?)
                } else {
                    Ok(Slice::NONE)
                }
            }
            Layout::Indexed { table, width, n } => {
                if format::is_sorted_object(self.head()) && n >= format::BINARY_SEARCH_THRESHOLD {
                    self.search_binary(attribute, table, width, n)
                } else {
                    self.search_linear(attribute, table, width, n)
                }
            }
        }
    }

    fn key_in_table(&self, table: usize, width: usize, index: usize) -> Result<Slice<'a>> {
        self.at(self.indexed_member(table + index * width, width)?)
    }

    fn value_after(&self, key: &Slice<'a>) -> Result<Slice<'a>> {
        self.at(key.start + key.byte_size()?)
    }

    fn search_linear(
        &self,
        attribute: &[u8],
        table: usize,
        width: usize,
        n: usize,
    ) -> Result<Slice<'a>> {
        for index in 0..n {
            let key = self.key_in_table(table, width, index)?;
            if Self::compare_key(&key, attribute)? == Ordering::Equal {
                return self.value_after(&key);
            }
        }
        Ok(Slice::NONE)
    }

    fn search_binary(
        &self,
        attribute: &[u8],
        table: usize,
        width: usize,
        n: usize,
    ) -> Result<Slice<'a>> {
        let (mut low, mut high) = (0usize, n);
        while low < high {
            let mid = low + (high - low) / 2;
            let key = self.key_in_table(table, width, mid)?;
            match Self::compare_key(&key, attribute)? {
                Ordering::Equal => return self.value_after(&key),
                Ordering::Greater => high = mid,
                Ordering::Less => low = mid + 1,
            }
        }
        Ok(Slice::NONE)
    }

    /// Member lookup by position (arrays) or by key (objects).
    ///
    /// ```rust
    /// use velocypack::Builder;
    ///
    /// let mut b = Builder::new();
    /// b.open_object()?;
    /// b.add_keyed("a", 1)?;
    /// b.close()?;
    /// let doc = b.slice()?;
    /// assert_eq!(doc.get("a")?.as_i64()?, 1);
    /// assert!(doc.get("b")?.is_none());
    /// # Ok::<(), velocypack::Error>(())
    /// ```
    pub fn get<I: SliceIndex>(&self, index: I) -> Result<Slice<'a>> {
        index.lookup(self)
    }

    /// Follows a path of object keys. Stops with [`Slice::NONE`] at the first
    /// missing key.
    pub fn get_path(&self, path: &[&str]) -> Result<Slice<'a>> {
        let mut current = *self;
        for key in path {
            current = current.get_key(key)?;
            if current.is_none() {
                break;
            }
        }
        Ok(current)
    }

    /// `true` if the object has a member named `attribute`.
    pub fn has_key(&self, attribute: &str) -> Result<bool> {
        Ok(!self.get_key(attribute)?.is_none())
    }
}

/// Types usable with [`Slice::get`]: `usize` positions for arrays and string
/// keys for objects.
pub trait SliceIndex: private::Sealed {
    #[doc(hidden)]
    fn lookup<'a>(&self, slice: &Slice<'a>) -> Result<Slice<'a>>;
}

impl SliceIndex for usize {
    fn lookup<'a>(&self, slice: &Slice<'a>) -> Result<Slice<'a>> {
        slice.get_index(*self)
    }
}

impl SliceIndex for &str {
    fn lookup<'a>(&self, slice: &Slice<'a>) -> Result<Slice<'a>> {
        slice.get_key(self)
    }
}

impl SliceIndex for &alloc::string::String {
    fn lookup<'a>(&self, slice: &Slice<'a>) -> Result<Slice<'a>> {
        slice.get_key(self)
    }
}

mod private {
    pub trait Sealed {}
    impl Sealed for usize {}
    impl Sealed for &str {}
    impl Sealed for &alloc::string::String {}
}

#[cfg(test)]
mod tests {
    use super::*;

    // {"a":1,"b":2} with a one-byte sorted index table
    const SORTED_TWO: [u8; 11] = [
        0x0b, 0x0b, 0x02, 0x41, b'a', 0x31, 0x41, b'b', 0x32, 0x03, 0x06,
    ];

    #[test]
    fn reads_hand_built_object() {
        let s = Slice::new(&SORTED_TWO);
        assert_eq!(s.length().unwrap(), 2);
        assert_eq!(s.get_key("a").unwrap().as_i64().unwrap(), 1);
        assert_eq!(s.get_key("b").unwrap().as_i64().unwrap(), 2);
        assert!(s.get_key("c").unwrap().is_none());
        assert_eq!(s.key_at(1).unwrap().as_str().unwrap(), "b");
        assert_eq!(s.value_at(0).unwrap().as_i64().unwrap(), 1);
    }

    #[test]
    fn tolerates_zero_padding_after_header() {
        // [1,2] as 0x06 with data left at offset 9 after eight reserved bytes
        let padded = [
            0x06, 0x0d, 0x02, 0, 0, 0, 0, 0, 0, 0x31, 0x32, 0x09, 0x0a,
        ];
        let s = Slice::new(&padded);
        assert_eq!(s.length().unwrap(), 2);
        assert_eq!(s.get_index(0).unwrap().as_i64().unwrap(), 1);
        assert_eq!(s.get_index(1).unwrap().as_i64().unwrap(), 2);
    }

    #[test]
    fn single_member_object_ignores_index_table() {
        // {"_key":"x"} stored with integer key 1 and a (valid) one-entry table
        let data = [0x0b, 0x07, 0x01, 0x31, 0x41, b'x', 0x03];
        let s = Slice::new(&data);
        assert_eq!(s.get_key("_key").unwrap().as_str().unwrap(), "x");
        assert!(s.get_key("_id").unwrap().is_none());
    }

    #[test]
    fn untranslatable_integer_key_is_an_error() {
        let data = [0x0b, 0x07, 0x01, 0x39, 0x41, b'x', 0x03];
        assert_eq!(
            Slice::new(&data).get_key("x"),
            Err(Error::UntranslatableKey(9))
        );
    }

    #[test]
    fn non_string_key_is_a_key_type_error() {
        let data = [0x0b, 0x06, 0x01, 0x18, 0x18, 0x03];
        assert_eq!(
            Slice::new(&data).get_key("x"),
            Err(Error::KeyType(ValueType::Null))
        );
    }

    #[test]
    fn out_of_bounds_index() {
        let s = Slice::new(&SORTED_TWO);
        assert_eq!(
            s.key_at(2),
            Err(Error::IndexOutOfBounds {
                index: 2,
                length: 2
            })
        );
        let empty = [0x01];
        assert_eq!(
            Slice::new(&empty).get_index(0),
            Err(Error::IndexOutOfBounds {
                index: 0,
                length: 0
            })
        );
    }

    #[test]
    fn wrong_container_type() {
        let s = Slice::new(&SORTED_TWO);
        assert!(matches!(
            s.get_index(0),
            Err(Error::ValueTypeMismatch {
                actual: ValueType::Object,
                ..
            })
        ));
        assert!(matches!(
            Slice::new(&[0x18]).get_key("a"),
            Err(Error::ValueTypeMismatch {
                actual: ValueType::Null,
                ..
            })
        ));
    }
}
