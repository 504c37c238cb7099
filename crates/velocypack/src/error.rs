use alloc::string::String;
use core::fmt;

use thiserror::Error;

use crate::value_type::{TypeList, ValueType};

/// Errors reported by [`Slice`](crate::Slice) accessors and the
/// [`Builder`](crate::Builder).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("expected {}, found {actual}", TypeList(.expected))]
    ValueTypeMismatch {
        expected: &'static [ValueType],
        actual: ValueType,
    },
    #[error("object key must be a string or an integer, found {0}")]
    KeyType(ValueType),
    #[error("no attribute translation for integer key {0}")]
    UntranslatableKey(i128),
    #[error("index {index} out of bounds for length {length}")]
    IndexOutOfBounds { index: usize, length: usize },
    #[error("{value} does not fit in {target}")]
    NumberOutOfRange { value: NumberRepr, target: &'static str },
    #[error("string {0:?} is not a number")]
    NotANumber(String),
    #[error("builder: {0}")]
    Builder(#[from] BuilderError),
    #[error("malformed input: {0}")]
    Malformed(#[from] MalformedError),
}

impl Error {
    pub(crate) const fn mismatch(expected: &'static [ValueType], actual: ValueType) -> Self {
        Self::ValueTypeMismatch { expected, actual }
    }
}

/// The numeric value carried by [`Error::NumberOutOfRange`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumberRepr {
    Int(i128),
    Double(f64),
}

impl fmt::Display for NumberRepr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Double(v) => write!(f, "{v}"),
        }
    }
}

/// Structural misuse of the [`Builder`](crate::Builder).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuilderError {
    #[error("no compound value is open")]
    NoOpenCompound,
    #[error("a compound value is still open")]
    CompoundStillOpen,
    #[error("a keyed value can only be added inside an object")]
    KeyOutsideObject,
    #[error("object keys must be strings, found {0}")]
    KeyMustBeString(ValueType),
    #[error("a key was added but its value is missing")]
    ValueMissing,
    #[error("an object member needs a key before its value")]
    KeyMissing,
    #[error("top-level value already written")]
    DocumentComplete,
    #[error("nothing has been built yet")]
    Empty,
    #[error("{0} cannot be written as a value")]
    Unencodable(&'static str),
    #[error("tag id 0 is reserved")]
    ReservedTag,
}

/// Reasons a byte buffer is not a well-formed document.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MalformedError {
    #[error("buffer ends at {len} but {needed} bytes are required")]
    Truncated { needed: usize, len: usize },
    #[error("reserved head byte 0x{0:02x}")]
    ReservedHead(u8),
    #[error("invalid tag head byte 0x{0:02x}")]
    InvalidTag(u8),
    #[error("string payload is not valid UTF-8")]
    InvalidUtf8,
    #[error("inconsistent compound at offset {offset}: {reason}")]
    Compound { offset: usize, reason: &'static str },
    #[error("length {0} does not fit in memory")]
    LengthOverflow(u64),
    #[error("nesting exceeds the configured depth of {0}")]
    DepthExceeded(usize),
}
