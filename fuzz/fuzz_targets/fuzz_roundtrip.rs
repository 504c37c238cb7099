#![no_main]
//! Builds documents from arbitrary JSON-like trees under arbitrary layout
//! options and checks that they read back unchanged.

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use serde_json::{Map, Number, Value};
use velocypack::{Builder, BuilderOptions, Slice, ValidatorOptions};

#[derive(Debug)]
struct ArbitraryValue(Value);

impl<'a> Arbitrary<'a> for ArbitraryValue {
    fn arbitrary(u: &mut arbitrary::Unstructured<'a>) -> arbitrary::Result<Self> {
        let value = match u.choose_index(20)? {
            0 => Value::Null,
            1 => Value::Bool(u.arbitrary()?),
            2 => Value::Number(
                Number::from_f64(u.arbitrary()?).ok_or(arbitrary::Error::IncorrectFormat)?,
            ),
            3 => Value::Number(u.arbitrary::<i64>()?.into()),
            4 => Value::Number(u.arbitrary::<u64>()?.into()),
            5..=10 => Value::String(u.arbitrary()?),
            11..=15 => {
                let elems: Vec<ArbitraryValue> = u.arbitrary()?;
                Value::Array(elems.into_iter().map(|v| v.0).collect())
            }
            _ => {
                let m: Vec<(String, ArbitraryValue)> = u.arbitrary()?;
                Value::Object(Map::from_iter(m.into_iter().map(|(k, v)| (k, v.0))))
            }
        };
        Ok(ArbitraryValue(value))
    }
}

#[derive(Debug, Arbitrary)]
struct Input {
    value: ArbitraryValue,
    unindexed_arrays: bool,
    unindexed_objects: bool,
    sort: bool,
}

fn write(b: &mut Builder, value: &Value) -> velocypack::Result<()> {
    match value {
        Value::Null => b.add(velocypack::Value::Null),
        Value::Bool(v) => b.add(*v),
        Value::Number(n) => match (n.as_u64(), n.as_i64(), n.as_f64()) {
            (Some(v), _, _) => b.add(v),
            (None, Some(v), _) => b.add(v),
            (None, None, Some(v)) => b.add(v),
            _ => unreachable!("serde_json numbers are u64, i64 or f64"),
        },
        Value::String(s) => b.add(s),
        Value::Array(items) => {
            b.open_array()?;
            for item in items {
                write(b, item)?;
            }
            b.close()
        }
        Value::Object(map) => {
            b.open_object()?;
            for (k, v) in map {
                b.add(k)?;
                write(b, v)?;
            }
            b.close()
        }
    }
}

/// Nesting depth of arrays and objects, the scalar leaves counting as one.
fn depth(value: &Value) -> usize {
    1 + match value {
        Value::Array(items) => items.iter().map(depth).max().unwrap_or(0),
        Value::Object(map) => map.values().map(depth).max().unwrap_or(0),
        _ => 0,
    }
}

fuzz_target!(|input: Input| {
    let mut b = Builder::with_options(BuilderOptions {
        build_unindexed_arrays: input.unindexed_arrays,
        build_unindexed_objects: input.unindexed_objects,
        sort_attribute_names: input.sort,
    });
    write(&mut b, &input.value.0).expect("builder accepts every JSON value");

    let s: Slice<'_> = b.slice().expect("document is closed");
    s.validate(&ValidatorOptions {
        max_depth: usize::MAX,
        ..ValidatorOptions::default()
    })
    .expect("builder output validates");
    let rendered = serde_json::to_value(s);
    // 64 nested compounds around a leaf is the most serialization walks
    if depth(&input.value.0) > 65 {
        assert!(rendered.is_err());
        return;
    }
    let back = rendered.expect("document renders as JSON");
    assert_eq!(back, input.value.0);
});
