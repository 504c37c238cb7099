//! Reserved integer codes for frequent attribute names.
//!
//! Documents may store well-known keys as small integers instead of strings.
//! On the read path every integer key is mapped back to its canonical name
//! before it is compared or handed out.

use crate::Slice;

// Each entry is an encoded short string: head 0x40 + len, then the bytes.
static KEY: [u8; 5] = [0x44, b'_', b'k', b'e', b'y'];
static REV: [u8; 5] = [0x44, b'_', b'r', b'e', b'v'];
static ID: [u8; 4] = [0x43, b'_', b'i', b'd'];
static FROM: [u8; 6] = [0x45, b'_', b'f', b'r', b'o', b'm'];
static TO: [u8; 4] = [0x43, b'_', b't', b'o'];

/// Maps reserved integer key codes to their canonical attribute names.
#[derive(Debug, Clone, Copy, Default)]
pub struct AttributeTranslator;

impl AttributeTranslator {
    /// Returns the canonical name for `code` as a string slice over static
    /// bytes, or [`Slice::NONE`] when the code is not reserved.
    #[must_use]
    pub fn translate(self, code: u64) -> Slice<'static> {
        let encoded: &'static [u8] = match code {
            1 => &KEY,
            2 => &REV,
            3 => &ID,
            4 => &FROM,
            5 => &TO,
            _ => return Slice::NONE,
        };
        Slice::new(encoded)
    }

    /// Reverse lookup, for producers that want to emit integer keys.
    #[must_use]
    pub fn code_for(self, name: &str) -> Option<u64> {
        match name {
            "_key" => Some(1),
            "_rev" => Some(2),
            "_id" => Some(3),
            "_from" => Some(4),
            "_to" => Some(5),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translates_reserved_codes() {
        let t = AttributeTranslator;
        for code in 1..=5 {
            let name = t.translate(code);
            assert!(name.is_string());
            assert_eq!(t.code_for(name.as_str().unwrap()), Some(code));
        }
        assert_eq!(t.translate(2).as_str().unwrap(), "_rev");
    }

    #[test]
    fn unknown_codes_are_none() {
        assert!(AttributeTranslator.translate(0).is_none());
        assert!(AttributeTranslator.translate(6).is_none());
        assert_eq!(AttributeTranslator.code_for("name"), None);
    }
}
