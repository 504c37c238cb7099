//! Reader and builder for VelocyPack, a compact self-describing binary
//! encoding of JSON-like documents.
//!
//! Reading never copies: a [`Slice`] is a view into a borrowed buffer and
//! every navigation step (array index, object key, iteration) yields another
//! view into the same bytes. Objects carry an optional index table sorted by
//! key, so attribute lookup is a binary search over raw key bytes.
//!
//! Writing goes through the stack-based [`Builder`], which appends values to a
//! single byte arena and back-patches the head, length and index table of each
//! array or object when it is closed.
//!
//! ```rust
//! use velocypack::Builder;
//!
//! let mut b = Builder::new();
//! b.open_object()?;
//! b.add_keyed("name", "velocypack")?;
//! b.add_keyed("tags", 3)?;
//! b.close()?;
//!
//! let doc = b.slice()?;
//! assert_eq!(doc.get("name")?.as_str()?, "velocypack");
//! assert_eq!(doc.length()?, 2);
//! # Ok::<(), velocypack::Error>(())
//! ```

#![no_std]
#![allow(missing_docs)]
extern crate alloc;

#[cfg(test)]
extern crate std;

mod builder;
mod error;
mod format;
mod options;
mod slice;
mod string_slice;
mod translator;
mod validate;
mod value_type;

#[cfg(any(test, feature = "serde"))]
mod serialize;

#[cfg(test)]
mod tests;

pub use builder::{Builder, Value};
pub use error::{BuilderError, Error, MalformedError, NumberRepr};
pub use options::{BuilderOptions, ValidatorOptions};
pub use slice::{ArrayIter, Decimal, ObjectIter, Slice, SliceIndex};
pub use string_slice::StringSlice;
pub use translator::AttributeTranslator;
pub use value_type::ValueType;

/// Result alias used by every fallible operation in this crate.
pub type Result<T, E = Error> = core::result::Result<T, E>;
