use alloc::{string::String, vec::Vec};

use quickcheck::{Arbitrary, Gen};

use crate::{Builder, BuilderOptions, Result, Slice};

/// A document tree mirroring what the builder can produce.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Doc {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Double(f64),
    Str(String),
    Binary(Vec<u8>),
    Date(i64),
    Array(Vec<Doc>),
    Object(Vec<(String, Doc)>),
}

impl Arbitrary for Doc {
    fn arbitrary(g: &mut Gen) -> Self {
        fn scalar(g: &mut Gen) -> Doc {
            match usize::arbitrary(g) % 8 {
                0 => Doc::Null,
                1 => Doc::Bool(bool::arbitrary(g)),
                2 => Doc::Int(i64::arbitrary(g)),
                3 => Doc::UInt(u64::arbitrary(g)),
                4 => {
                    let mut v = f64::arbitrary(g);
                    while v.is_nan() {
                        v = f64::arbitrary(g);
                    }
                    Doc::Double(v)
                }
                5 => Doc::Str(String::arbitrary(g)),
                6 => Doc::Binary(Vec::arbitrary(g)),
                _ => Doc::Date(i64::arbitrary(g)),
            }
        }

        fn gen_doc(g: &mut Gen, depth: usize) -> Doc {
            if depth == 0 {
                return scalar(g);
            }
            match usize::arbitrary(g) % 4 {
                0 | 1 => scalar(g),
                2 => {
                    let len = usize::arbitrary(g) % 12;
                    Doc::Array((0..len).map(|_| gen_doc(g, depth - 1)).collect())
                }
                _ => {
                    let len = usize::arbitrary(g) % 12;
                    let mut members: Vec<(String, Doc)> = Vec::with_capacity(len);
                    for _ in 0..len {
                        let key = String::arbitrary(g);
                        if members.iter().all(|(k, _)| *k != key) {
                            members.push((key, gen_doc(g, depth - 1)));
                        }
                    }
                    Doc::Object(members)
                }
            }
        }

        let depth = usize::arbitrary(g) % 4;
        gen_doc(g, depth)
    }
}

impl Arbitrary for BuilderOptions {
    fn arbitrary(g: &mut Gen) -> Self {
        Self {
            build_unindexed_arrays: bool::arbitrary(g),
            build_unindexed_objects: bool::arbitrary(g),
            sort_attribute_names: bool::arbitrary(g),
        }
    }
}

impl Doc {
    pub(crate) fn write(&self, b: &mut Builder) -> Result<()> {
        match self {
            Self::Null => b.add(crate::Value::Null),
            Self::Bool(v) => b.add(*v),
            Self::Int(v) => b.add(*v),
            Self::UInt(v) => b.add(*v),
            Self::Double(v) => b.add(*v),
            Self::Str(v) => b.add(v),
            Self::Binary(v) => b.add(v.as_slice()),
            Self::Date(v) => b.add(crate::Value::UtcDate(*v)),
            Self::Array(members) => {
                b.open_array()?;
                for m in members {
                    m.write(b)?;
                }
                b.close()
            }
            Self::Object(members) => {
                b.open_object()?;
                for (k, v) in members {
                    b.add(k)?;
                    v.write(b)?;
                }
                b.close()
            }
        }
    }

    pub(crate) fn encode(&self, options: BuilderOptions) -> Result<Vec<u8>> {
        let mut b = Builder::with_options(options);
        self.write(&mut b)?;
        b.into_bytes()
    }

    /// `true` if `s` decodes to exactly this document.
    pub(crate) fn matches(&self, s: Slice<'_>) -> Result<bool> {
        Ok(match self {
            Self::Null => s.is_null(),
            Self::Bool(v) => s.as_bool()? == *v,
            Self::Int(v) => s.is_integer() && s.as_i64()? == *v,
            Self::UInt(v) => s.is_integer() && s.as_u64()? == *v,
            Self::Double(v) => s.as_f64()?.to_bits() == v.to_bits(),
            Self::Str(v) => s.as_str()? == v.as_str(),
            Self::Binary(v) => s.as_binary()? == v.as_slice(),
            Self::Date(v) => s.as_date()? == *v,
            Self::Array(members) => {
                if s.length()? != members.len() {
                    return Ok(false);
                }
                for (i, (m, item)) in members.iter().zip(s.array_iter()?).enumerate() {
                    let item = item?;
                    if item != s.get_index(i)? || !m.matches(item)? {
                        return Ok(false);
                    }
                }
                true
            }
            Self::Object(members) => {
                if s.length()? != members.len() || s.object_iter()?.count() != members.len() {
                    return Ok(false);
                }
                for (k, v) in members {
                    let found = s.get_key(k)?;
                    if found.is_none() || !v.matches(found)? {
                        return Ok(false);
                    }
                }
                true
            }
        })
    }
}
