use alloc::{format, string::String, vec::Vec};

use rstest::rstest;

use crate::{Builder, BuilderOptions, Slice};

#[derive(Debug, Clone, Copy)]
enum Layout {
    Sorted,
    Unsorted,
    Compact,
}

impl Layout {
    fn options(self) -> BuilderOptions {
        match self {
            Self::Sorted => BuilderOptions::default(),
            Self::Unsorted => BuilderOptions {
                sort_attribute_names: false,
                ..BuilderOptions::default()
            },
            Self::Compact => BuilderOptions {
                build_unindexed_objects: true,
                ..BuilderOptions::default()
            },
        }
    }
}

fn key(i: usize) -> String {
    format!("key{i:03}")
}

/// Inserts keys in a scrambled order so sorting actually has work to do.
fn object(n: usize, layout: Layout) -> Vec<u8> {
    let mut b = Builder::with_options(layout.options());
    b.open_object().unwrap();
    // 7 is coprime to every n used here, so each key appears once
    for i in (0..n).map(|i| (i * 7) % n.max(1)) {
        b.add_keyed(&key(i), i).unwrap();
    }
    b.close().unwrap();
    b.into_bytes().unwrap()
}

#[rstest]
fn finds_every_key(
    #[values(0, 1, 2, 3, 4, 10, 100)] n: usize,
    #[values(Layout::Sorted, Layout::Unsorted, Layout::Compact)] layout: Layout,
) {
    let bytes = object(n, layout);
    let s = Slice::new(&bytes);
    assert_eq!(s.length().unwrap(), n);
    for i in 0..n {
        let found = s.get_key(&key(i)).unwrap();
        assert_eq!(found.as_u64().unwrap(), i as u64, "key {i} in {layout:?}");
    }
}

#[rstest]
fn misses_keys_between_and_around(
    #[values(0, 1, 2, 3, 4, 10, 100)] n: usize,
    #[values(Layout::Sorted, Layout::Unsorted, Layout::Compact)] layout: Layout,
) {
    let bytes = object(n, layout);
    let s = Slice::new(&bytes);
    for i in 0..n {
        // sorts strictly between key(i) and key(i + 1)
        assert!(s.get_key(&format!("{}a", key(i))).unwrap().is_none());
    }
    for probe in ["", "key", "kez", "zzz", "key1000"] {
        assert!(s.get_key(probe).unwrap().is_none(), "{probe:?} in {layout:?}");
    }
}

#[rstest]
fn head_reflects_layout(
    #[values(2, 4, 100)] n: usize,
    #[values(Layout::Sorted, Layout::Unsorted, Layout::Compact)] layout: Layout,
) {
    let bytes = object(n, layout);
    let head = Slice::new(&bytes).head();
    match layout {
        Layout::Sorted => assert!((0x0b..=0x0e).contains(&head)),
        Layout::Unsorted => assert!((0x0f..=0x12).contains(&head)),
        Layout::Compact => assert_eq!(head, 0x14),
    }
}

#[rstest]
fn array_positions(
    #[values(1, 2, 3, 4, 10, 100, 1000)] n: usize,
    #[values(false, true)] compact: bool,
) {
    let mut b = Builder::with_options(BuilderOptions {
        build_unindexed_arrays: compact,
        ..BuilderOptions::default()
    });
    b.open_array().unwrap();
    for i in 0..n {
        // alternate small ints and strings so sizes differ
        if i % 2 == 0 {
            b.add(i % 10).unwrap();
        } else {
            b.add(key(i).as_str()).unwrap();
        }
    }
    b.close().unwrap();
    let s = b.slice().unwrap();
    assert_eq!(s.length().unwrap(), n);
    for i in [0, n / 2, n - 1] {
        let member = s.get_index(i).unwrap();
        if i % 2 == 0 {
            assert_eq!(member.as_u64().unwrap(), (i % 10) as u64);
        } else {
            assert_eq!(member.as_str().unwrap(), key(i));
        }
    }
    assert!(s.get_index(n).is_err());
}
