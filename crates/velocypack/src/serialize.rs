//! `serde::Serialize` for [`Slice`], so documents can be rendered by any serde
//! data format (`serde_json::to_string(&slice)` being the common case).
//!
//! Arrays and objects nested deeper than 64 levels fail with
//! [`MalformedError::DepthExceeded`] instead of recursing further.

use serde::ser::{Error as _, Serialize, SerializeMap, SerializeSeq, Serializer};

use crate::{MalformedError, Slice, ValueType, options::DEFAULT_MAX_DEPTH};

impl Serialize for Slice<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        Nested {
            slice: *self,
            depth: 0,
        }
        .serialize(serializer)
    }
}

/// A slice together with how deeply it is nested in the value being written.
struct Nested<'a> {
    slice: Slice<'a>,
    depth: usize,
}

impl Nested<'_> {
    fn child<'c>(&self, slice: Slice<'c>) -> Nested<'c> {
        Nested {
            slice,
            depth: self.depth + 1,
        }
    }
}

impl Serialize for Nested<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let fail = |e: crate::Error| S::Error::custom(e);
        if self.depth > DEFAULT_MAX_DEPTH {
            return Err(fail(MalformedError::DepthExceeded(DEFAULT_MAX_DEPTH).into()));
        }
        let s = &self.slice;
        match s.value_type() {
            ValueType::None | ValueType::Null => serializer.serialize_unit(),
            ValueType::Bool => serializer.serialize_bool(s.as_bool().map_err(fail)?),
            ValueType::SmallInt | ValueType::Int => {
                serializer.serialize_i64(s.as_i64().map_err(fail)?)
            }
            ValueType::UInt => serializer.serialize_u64(s.as_u64().map_err(fail)?),
            ValueType::Double => serializer.serialize_f64(s.as_f64().map_err(fail)?),
            ValueType::String => serializer.serialize_str(s.as_str().map_err(fail)?),
            ValueType::Binary => serializer.serialize_bytes(s.as_binary().map_err(fail)?),
            ValueType::UtcDate => serializer.serialize_i64(s.as_date().map_err(fail)?),
            // all tag prefixes are stripped in one step
            ValueType::Tagged => Nested {
                slice: s.value().map_err(fail)?,
                depth: self.depth,
            }
            .serialize(serializer),
            ValueType::Array => {
                let mut seq = serializer.serialize_seq(Some(s.length().map_err(fail)?))?;
                for member in s.array_iter().map_err(fail)? {
                    seq.serialize_element(&self.child(member.map_err(fail)?))?;
                }
                seq.end()
            }
            ValueType::Object => {
                let mut map = serializer.serialize_map(Some(s.length().map_err(fail)?))?;
                for member in s.object_iter().map_err(fail)? {
                    let (key, value) = member.map_err(fail)?;
                    map.serialize_entry(key.as_str().map_err(fail)?, &self.child(value))?;
                }
                map.end()
            }
            other => Err(S::Error::custom(format_args!(
                "{other} values cannot be serialized"
            ))),
        }
    }
}
