use core::{cmp::Ordering, fmt, str};

use bstr::BStr;

use crate::{Error, MalformedError, Result};

/// A borrowed view onto the raw UTF-8 payload of a string value.
///
/// Comparison is plain lexicographic order over unsigned bytes: the first
/// differing byte decides, and when one payload is a prefix of the other the
/// shorter one sorts first. This is the order in which the builder sorts
/// object keys, so key lookups never need to decode text.
#[derive(Clone, Copy)]
pub struct StringSlice<'a> {
    buffer: &'a [u8],
    start: usize,
    len: usize,
}

impl<'a> StringSlice<'a> {
    /// Callers guarantee `start + len <= buffer.len()`.
    pub(crate) fn new(buffer: &'a [u8], start: usize, len: usize) -> Self {
        debug_assert!(start + len <= buffer.len());
        Self { buffer, start, len }
    }

    /// The raw payload bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &'a [u8] {
        &self.buffer[self.start..self.start + self.len]
    }

    /// Payload length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Decodes the payload, failing on invalid UTF-8.
    pub fn to_str(&self) -> Result<&'a str> {
        str::from_utf8(self.as_bytes()).map_err(|_| Error::from(MalformedError::InvalidUtf8))
    }

    /// Compares the payload against raw bytes without decoding.
    #[must_use]
    pub fn compare_bytes(&self, other: &[u8]) -> Ordering {
        // slice ordering on `[u8]` is exactly the unsigned, shorter-first rule
        self.as_bytes().cmp(other)
    }
}

impl PartialEq for StringSlice<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl Eq for StringSlice<'_> {}

impl PartialEq<[u8]> for StringSlice<'_> {
    fn eq(&self, other: &[u8]) -> bool {
        self.as_bytes() == other
    }
}

impl PartialEq<str> for StringSlice<'_> {
    fn eq(&self, other: &str) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl PartialOrd for StringSlice<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for StringSlice<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare_bytes(other.as_bytes())
    }
}

impl fmt::Debug for StringSlice<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(BStr::new(self.as_bytes()), f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(s: &[u8]) -> StringSlice<'_> {
        StringSlice::new(s, 0, s.len())
    }

    #[test]
    fn orders_by_unsigned_bytes() {
        assert_eq!(view(b"abc").compare_bytes(b"abd"), Ordering::Less);
        assert_eq!(view(b"b").compare_bytes(b"abc"), Ordering::Greater);
        // 0xc3 must sort after ASCII even though it is negative as i8
        assert_eq!(view("é".as_bytes()).compare_bytes(b"z"), Ordering::Greater);
    }

    #[test]
    fn shorter_prefix_sorts_first() {
        assert_eq!(view(b"ab").compare_bytes(b"abc"), Ordering::Less);
        assert_eq!(view(b"abc").compare_bytes(b"ab"), Ordering::Greater);
        assert_eq!(view(b"").compare_bytes(b""), Ordering::Equal);
        assert!(view(b"ab") < view(b"abc"));
    }

    #[test]
    fn windows_into_a_larger_buffer() {
        let buf = b"xxhelloyy";
        let s = StringSlice::new(buf, 2, 5);
        assert_eq!(s.to_str().unwrap(), "hello");
        assert_eq!(&s, "hello");
        assert_eq!(s.len(), 5);
        assert!(!s.is_empty());
    }

    #[test]
    fn rejects_invalid_utf8() {
        assert!(view(&[0xff, 0xfe]).to_str().is_err());
    }
}
