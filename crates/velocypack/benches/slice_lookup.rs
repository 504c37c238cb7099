//! Key lookup and iteration on `velocypack::Slice`.
#![allow(missing_docs)]

use std::{hint::black_box, time::Duration};

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use velocypack::{Builder, BuilderOptions, Slice};

/// An object with `members` keys `k0000`, `k0001`, … and integer values.
fn make_object(members: usize, options: BuilderOptions) -> Vec<u8> {
    let mut b = Builder::with_options(options);
    b.open_object().unwrap();
    for i in 0..members {
        b.add_keyed(&format!("k{i:04}"), i).unwrap();
    }
    b.close().unwrap();
    b.into_bytes().unwrap()
}

fn bench_lookup(c: &mut Criterion) {
    let layouts = [
        ("sorted", BuilderOptions::default()),
        (
            "unsorted",
            BuilderOptions {
                sort_attribute_names: false,
                ..BuilderOptions::default()
            },
        ),
        (
            "compact",
            BuilderOptions {
                build_unindexed_objects: true,
                ..BuilderOptions::default()
            },
        ),
    ];

    let mut group = c.benchmark_group("get_key");
    for members in [4, 64, 1024] {
        // the last key is the worst case for linear scans
        let probe = format!("k{:04}", members - 1);
        for (name, options) in layouts {
            let bytes = make_object(members, options);
            group.bench_with_input(BenchmarkId::new(name, members), &bytes, |bencher, bytes| {
                bencher.iter(|| {
                    let s = Slice::new(black_box(bytes));
                    black_box(s.get_key(&probe).unwrap())
                });
            });
        }
    }
    group.finish();
}

fn bench_iterate(c: &mut Criterion) {
    let bytes = make_object(1024, BuilderOptions::default());
    c.bench_function("object_iter/1024", |bencher| {
        bencher.iter(|| {
            let s = Slice::new(black_box(&bytes));
            s.object_iter()
                .unwrap()
                .map(|m| m.unwrap().1.as_u64().unwrap())
                .sum::<u64>()
        });
    });
}

fn criterion() -> Criterion {
    let c = Criterion::default();
    if cfg!(feature = "bench-fast") {
        c.warm_up_time(Duration::from_millis(10))
            .measurement_time(Duration::from_millis(100))
            .sample_size(10)
    } else {
        c.warm_up_time(Duration::from_secs(3))
            .measurement_time(Duration::from_secs(5))
    }
}

criterion_group! { name = benches; config = criterion(); targets = bench_lookup, bench_iterate }
criterion_main!(benches);
