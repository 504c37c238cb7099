use alloc::{string::ToString, vec::Vec};

use crate::{Builder, Error, MalformedError, Slice, ValidatorOptions};

/// `levels` compact arrays nested around the integer 1.
fn nested(levels: usize) -> Vec<u8> {
    let mut b = Builder::new();
    for _ in 0..levels {
        b.open_compact_array().unwrap();
    }
    b.add(1).unwrap();
    for _ in 0..levels {
        b.close().unwrap();
    }
    b.into_bytes().unwrap()
}

#[test]
fn recursive_walks_stop_at_the_depth_limit() {
    let bytes = nested(20_000);
    let s = Slice::new(&bytes);
    assert_eq!(s.byte_size().unwrap(), bytes.len());

    let exceeded = Error::from(MalformedError::DepthExceeded(64));
    assert_eq!(s.schema_description(), Err(exceeded.clone()));
    assert_eq!(s.validate(&ValidatorOptions::default()), Err(exceeded));

    let err = serde_json::to_string(&s).unwrap_err();
    assert!(err.to_string().contains("depth"), "{err}");
}

#[test]
fn documents_at_the_limit_are_walked() {
    let bytes = nested(64);
    let s = Slice::new(&bytes);
    s.validate(&ValidatorOptions::default()).unwrap();
    assert!(s.schema_description().unwrap().ends_with("array smallint"));
    let json = serde_json::to_string(&s).unwrap();
    assert_eq!(json.len(), 2 * 64 + 1);

    let deeper = nested(65);
    let s = Slice::new(&deeper);
    assert!(s.schema_description().is_err());
    assert!(serde_json::to_string(&s).is_err());
}
