#![no_main]
//! Feeds arbitrary bytes to the reader. Nothing may panic, and a buffer that
//! passes validation must be fully traversable without errors.

use libfuzzer_sys::fuzz_target;
use velocypack::{Slice, ValidatorOptions};

fn walk(s: Slice<'_>) -> velocypack::Result<()> {
    let s = s.value()?;
    if s.is_array() {
        for member in s.array_iter()? {
            walk(member?)?;
        }
    } else if s.is_object() {
        for member in s.object_iter()? {
            let (key, value) = member?;
            // every key must be reachable through the lookup path as well
            let found = s.get_key(key.as_str()?)?;
            assert!(!found.is_none(), "key {key:?} not found by lookup");
            walk(value)?;
        }
    } else if s.is_string() {
        s.as_str()?;
    }
    s.byte_size().map(drop)
}

fn probe(s: Slice<'_>) {
    let _ = s.length();
    let _ = s.get_index(0);
    let _ = s.get_key("a");
    let _ = s.as_big_decimal();
    let _ = s.tags();
    let _ = serde_json::to_string(&s);
}

fuzz_target!(|data: &[u8]| {
    let s = Slice::new(data);
    probe(s);
    if s.validate(&ValidatorOptions::default()).is_ok() {
        walk(s).expect("validated document must be traversable");
    }
});
