use core::iter::FusedIterator;

use super::{Slice, lookup::Layout};
use crate::{Error, Result, ValueType};

/// Cursor over the member positions of a compound. Indexed layouts are
/// visited in index-table order, the others in storage order.
#[derive(Debug, Clone, Copy)]
struct Cursor<'a> {
    slice: Slice<'a>,
    layout: Layout,
    index: usize,
    next: usize,
    failed: bool,
}

impl<'a> Cursor<'a> {
    fn new(slice: Slice<'a>) -> Result<Self> {
        let layout = slice.layout()?;
        let next = match layout {
            Layout::Equal { data, .. } | Layout::Compact { data, .. } => data,
            Layout::Empty | Layout::Indexed { .. } => 0,
        };
        Ok(Self {
            slice,
            layout,
            index: 0,
            next,
            failed: false,
        })
    }

    fn remaining(&self) -> usize {
        if self.failed {
            0
        } else {
            self.layout.len() - self.index
        }
    }

    /// Position of the next member, advancing past it. `object` members are
    /// a key followed by its value.
    fn advance(&mut self, object: bool) -> Option<Result<usize>> {
        if self.remaining() == 0 {
            return None;
        }
        let result = self.locate(object);
        self.index += 1;
        if result.is_err() {
            self.failed = true;
        }
        Some(result)
    }

    fn locate(&mut self, object: bool) -> Result<usize> {
        if let Layout::Indexed { table, width, .. } = self.layout {
            return self.slice.indexed_member(table + self.index * width, width);
        }
        let pos = self.next;
        let mut end = pos + self.slice.at(pos)?.byte_size()?;
        if object {
            end += self.slice.at(end)?.byte_size()?;
        }
        self.next = end;
        Ok(pos)
    }
}

/// Iterator over the members of an array, see [`Slice::array_iter`].
///
/// Yields an error and stops when the buffer turns out to be malformed.
#[derive(Debug, Clone)]
pub struct ArrayIter<'a> {
    cursor: Cursor<'a>,
}

impl<'a> Iterator for ArrayIter<'a> {
    type Item = Result<Slice<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        let pos = self.cursor.advance(false)?;
        let item = pos.and_then(|pos| self.cursor.slice.at(pos));
        if item.is_err() {
            self.cursor.failed = true;
        }
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.cursor.remaining()))
    }
}

impl FusedIterator for ArrayIter<'_> {}

/// Iterator over the `(key, value)` members of an object, see
/// [`Slice::object_iter`]. Integer keys are translated to their names.
#[derive(Debug, Clone)]
pub struct ObjectIter<'a> {
    cursor: Cursor<'a>,
}

impl<'a> ObjectIter<'a> {
    fn member(&self, pos: usize) -> Result<(Slice<'a>, Slice<'a>)> {
        let key = self.cursor.slice.at(pos)?;
        let value = self.cursor.slice.at(pos + key.byte_size()?)?;
        Ok((key.make_key()?, value))
    }
}

impl<'a> Iterator for ObjectIter<'a> {
    type Item = Result<(Slice<'a>, Slice<'a>)>;

    fn next(&mut self) -> Option<Self::Item> {
        let pos = self.cursor.advance(true)?;
        let item = pos.and_then(|pos| self.member(pos));
        if item.is_err() {
            self.cursor.failed = true;
        }
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.cursor.remaining()))
    }
}

impl FusedIterator for ObjectIter<'_> {}

impl<'a> Slice<'a> {
    /// Iterates over the members of an array.
    ///
    /// ```rust
    /// use velocypack::Builder;
    ///
    /// let mut b = Builder::new();
    /// b.open_array()?;
    /// for i in 1..=3 {
    ///     b.add(i)?;
    /// }
    /// b.close()?;
    ///
    /// let sum = b
    ///     .slice()?
    ///     .array_iter()?
    ///     .map(|m| m?.as_i64())
    ///     .sum::<Result<i64, _>>()?;
    /// assert_eq!(sum, 6);
    /// # Ok::<(), velocypack::Error>(())
    /// ```
    pub fn array_iter(&self) -> Result<ArrayIter<'a>> {
        if !self.is_array() {
            return Err(Error::mismatch(&[ValueType::Array], self.value_type()));
        }
        Ok(ArrayIter {
            cursor: Cursor::new(*self)?,
        })
    }

    /// Iterates over the members of an object.
    ///
    /// Sorted objects are visited in key order, everything else in insertion
    /// order.
    pub fn object_iter(&self) -> Result<ObjectIter<'a>> {
        if !self.is_object() {
            return Err(Error::mismatch(&[ValueType::Object], self.value_type()));
        }
        Ok(ObjectIter {
            cursor: Cursor::new(*self)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use super::*;

    #[test]
    fn walks_equal_size_array() {
        // [1,2,3] without index table
        let data = [0x02, 0x05, 0x31, 0x32, 0x33];
        let items: Vec<i64> = Slice::new(&data)
            .array_iter()
            .unwrap()
            .map(|m| m.unwrap().as_i64().unwrap())
            .collect();
        assert_eq!(items, [1, 2, 3]);
    }

    #[test]
    fn walks_compact_object_key_then_value() {
        // {"a":{"b":1},"c":2} compact, the nested object must be skipped whole
        let data = [
            0x14, 0x0e, 0x41, b'a', 0x14, 0x06, 0x41, b'b', 0x31, 0x01, 0x41, b'c', 0x32, 0x02,
        ];
        let keys: Vec<&str> = Slice::new(&data)
            .object_iter()
            .unwrap()
            .map(|m| m.unwrap().0.as_str().unwrap())
            .collect();
        assert_eq!(keys, ["a", "c"]);
    }

    #[test]
    fn stops_after_first_error() {
        // claims three members but the third is cut off
        let data = [0x13, 0x05, 0x31, 0x32, 0x03];
        let mut it = Slice::new(&data).array_iter().unwrap();
        assert_eq!(it.next().unwrap().unwrap().as_i64().unwrap(), 1);
        assert_eq!(it.next().unwrap().unwrap().as_i64().unwrap(), 2);
        assert!(it.next().unwrap().is_err());
        assert!(it.next().is_none());
    }

    #[test]
    fn rejects_wrong_type() {
        assert!(Slice::new(&[0x01]).object_iter().is_err());
        assert!(Slice::new(&[0x0a]).array_iter().is_err());
        assert_eq!(Slice::new(&[0x0a]).object_iter().unwrap().count(), 0);
    }
}
