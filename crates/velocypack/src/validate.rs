//! Structural validation of untrusted buffers.
//!
//! Accessors on [`Slice`] are bounds-checked and report malformed input as
//! errors, but they only look at the bytes they need. Validation walks the
//! whole value once so that later navigation can assume a consistent layout.

use crate::{
    Error, MalformedError, Result, Slice, ValidatorOptions, ValueType,
    format::{self, varint_len},
    slice::Layout,
};

fn malformed(offset: usize, reason: &'static str) -> Error {
    MalformedError::Compound { offset, reason }.into()
}

struct Validator<'o> {
    options: &'o ValidatorOptions,
}

impl Validator<'_> {
    /// Checks the value at `slice` and returns its byte size.
    fn value(&self, slice: Slice<'_>, depth: usize) -> Result<usize> {
        if depth > self.options.max_depth {
            return Err(MalformedError::DepthExceeded(self.options.max_depth).into());
        }
        let size = slice.byte_size()?;
        match slice.value_type() {
            ValueType::Tagged => self.tagged(slice, depth)?,
            ValueType::String if self.options.check_utf8 => {
                slice.as_str()?;
            }
            ValueType::Array | ValueType::Object => self.compound(slice, size, depth)?,
            _ => {}
        }
        Ok(size)
    }

    fn tagged(&self, slice: Slice<'_>, depth: usize) -> Result<()> {
        let head = slice.head();
        if slice.first_tag()? == Some(0) {
            return Err(MalformedError::InvalidTag(head).into());
        }
        let width = if head == format::TAG_SHORT { 2 } else { 9 };
        let inner = slice.at(slice.start() + width)?;
        if inner.is_none() {
            return Err(MalformedError::InvalidTag(head).into());
        }
        self.value(inner, depth + 1).map(drop)
    }

    /// Checks a member at `pos`, which must end at or before `limit`.
    fn member(&self, parent: Slice<'_>, pos: usize, limit: usize, depth: usize) -> Result<usize> {
        let child = parent.at(pos)?;
        if child.is_none() {
            return Err(malformed(pos, "none inside compound"));
        }
        let size = self.value(child, depth + 1)?;
        if pos + size > limit {
            return Err(malformed(pos, "member overruns compound"));
        }
        Ok(size)
    }

    /// Checks an object key and returns its size and its translated bytes.
    fn key<'a>(
        &self,
        parent: Slice<'a>,
        pos: usize,
        limit: usize,
        depth: usize,
    ) -> Result<(usize, &'a [u8])> {
        let size = self.member(parent, pos, limit, depth)?;
        let name = parent.at(pos)?.make_key()?.as_string_slice()?.as_bytes();
        Ok((size, name))
    }

    fn compound(&self, slice: Slice<'_>, size: usize, depth: usize) -> Result<()> {
        let start = slice.start();
        let end = start + size;
        let object = slice.is_object();
        match slice.layout()? {
            Layout::Empty => Ok(()),
            Layout::Compact { data, n } => {
                let count_len = varint_len(n as u64);
                let limit = end
                    .checked_sub(count_len)
                    .filter(|&l| l >= data)
                    .ok_or_else(|| malformed(start, "member count overruns value"))?;
                let mut pos = data;
                for _ in 0..n {
                    if object {
                        pos += self.key(slice, pos, limit, depth)?.0;
                    }
                    pos += self.member(slice, pos, limit, depth)?;
                }
                if pos != limit {
                    return Err(malformed(start, "compact members do not fill the value"));
                }
                Ok(())
            }
            Layout::Equal {
                data,
                member_size,
                n,
            } => {
                if member_size == 0 {
                    // single member behind a one-entry index table
                    let width = format::offset_size(slice.head());
                    let limit = end - if width == 8 { 16 } else { width };
                    if object {
                        let (key, _) = self.key(slice, data, limit, depth)?;
                        self.member(slice, data + key, limit, depth)?;
                    } else {
                        self.member(slice, data, limit, depth)?;
                    }
                    return Ok(());
                }
                if (end - data) % member_size != 0 {
                    return Err(malformed(start, "members are not of equal size"));
                }
                for i in 0..n {
                    let pos = data + i * member_size;
                    if self.member(slice, pos, end, depth)? != member_size {
                        return Err(malformed(pos, "members are not of equal size"));
                    }
                }
                Ok(())
            }
            Layout::Indexed { table, width, n } => {
                let first = start + format::first_sub_offset(slice.head());
                let sorted = format::is_sorted_object(slice.head());
                let mut previous: Option<&[u8]> = None;
                for i in 0..n {
                    let pos = slice.indexed_member(table + i * width, width)?;
                    if pos < first || pos >= table {
                        return Err(malformed(start, "index entry out of range"));
                    }
                    if object {
                        let (key, name) = self.key(slice, pos, table, depth)?;
                        // binary search relies on this order
                        if sorted && previous.is_some_and(|p| p > name) {
                            return Err(malformed(start, "index table is not sorted"));
                        }
                        previous = Some(name);
                        self.member(slice, pos + key, table, depth)?;
                    } else {
                        self.member(slice, pos, table, depth)?;
                    }
                }
                Ok(())
            }
        }
    }
}

impl Slice<'_> {
    /// Checks that the value and everything reachable from it is well formed.
    ///
    /// Run this once on buffers from untrusted sources. It rejects truncated
    /// values, reserved head bytes, inconsistent compound headers and index
    /// tables, keys that are neither strings nor translatable integers,
    /// invalid UTF-8 (unless disabled) and nesting deeper than
    /// [`ValidatorOptions::max_depth`].
    ///
    /// ```rust
    /// use velocypack::{Error, MalformedError, Slice, ValidatorOptions};
    ///
    /// // a short string claiming three bytes but carrying two
    /// let bytes = [0x43, b'a', b'b'];
    /// let err = Slice::new(&bytes).validate(&ValidatorOptions::default());
    /// assert!(matches!(err, Err(Error::Malformed(MalformedError::Truncated { .. }))));
    /// ```
    pub fn validate(&self, options: &ValidatorOptions) -> Result<()> {
        let result = Validator { options }.value(*self, 0).map(drop);
        #[cfg(feature = "tracing")]
        if let Err(error) = &result {
            tracing::debug!(start = self.start(), %error, "rejected document");
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(bytes: &[u8]) -> Result<()> {
        Slice::new(bytes).validate(&ValidatorOptions::default())
    }

    #[test]
    fn accepts_well_formed_values() {
        check(&[0x18]).unwrap();
        check(&[0x02, 0x05, 0x31, 0x32, 0x33]).unwrap();
        check(&[0x0b, 0x07, 0x01, 0x31, 0x41, b'x', 0x03]).unwrap();
        check(&[0x14, 0x06, 0x41, b'b', 0x31, 0x01]).unwrap();
        check(&[0xee, 0x07, 0x18]).unwrap();
    }

    #[test]
    fn rejects_reserved_heads() {
        assert_eq!(
            check(&[0x15]),
            Err(MalformedError::ReservedHead(0x15).into())
        );
        assert_eq!(
            check(&[0x02, 0x03, 0xd8]),
            Err(MalformedError::ReservedHead(0xd8).into())
        );
    }

    #[test]
    fn rejects_bad_utf8_unless_disabled() {
        let bytes = [0x42, 0xc3, 0x28];
        assert_eq!(check(&bytes), Err(MalformedError::InvalidUtf8.into()));
        let lenient = ValidatorOptions {
            check_utf8: false,
            ..ValidatorOptions::default()
        };
        Slice::new(&bytes).validate(&lenient).unwrap();
    }

    #[test]
    fn rejects_zero_tag() {
        assert_eq!(
            check(&[0xee, 0x00, 0x18]),
            Err(MalformedError::InvalidTag(0xee).into())
        );
    }

    #[test]
    fn rejects_index_entries_outside_the_data_area() {
        // [1, 2] whose second index entry points into the header
        let bytes = [0x06, 0x07, 0x02, 0x31, 0x32, 0x03, 0x01];
        assert!(matches!(
            check(&bytes),
            Err(Error::Malformed(MalformedError::Compound { .. }))
        ));
    }

    #[test]
    fn rejects_unsorted_table_behind_sorted_head() {
        let bytes = [
            0x0b, 0x0b, 0x02, 0x41, b'b', 0x31, 0x41, b'a', 0x32, 0x03, 0x06,
        ];
        assert!(check(&bytes).is_err());
        let mut unsorted = bytes;
        unsorted[0] = 0x0f;
        check(&unsorted).unwrap();
    }

    #[test]
    fn rejects_compact_count_mismatch() {
        // compact [1, 2] claiming three members
        let bytes = [0x13, 0x05, 0x31, 0x32, 0x03];
        assert!(check(&bytes).is_err());
        // compact [1, 2] claiming one member
        let bytes = [0x13, 0x05, 0x31, 0x32, 0x01];
        assert!(check(&bytes).is_err());
    }

    #[test]
    fn enforces_depth_limit() {
        // [[null]] using single-member arrays without index tables
        let bytes = [0x02, 0x05, 0x02, 0x03, 0x18];
        let shallow = ValidatorOptions {
            max_depth: 1,
            ..ValidatorOptions::default()
        };
        assert_eq!(
            Slice::new(&bytes).validate(&shallow),
            Err(MalformedError::DepthExceeded(1).into())
        );
        Slice::new(&bytes)
            .validate(&ValidatorOptions::default())
            .unwrap();
    }
}
