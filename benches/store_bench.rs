//! Benchmarks for Notekeep directory operations

use criterion::{criterion_group, criterion_main, Criterion};
use notekeep::{BucketKey, Directory};

fn store_benchmarks(c: &mut Criterion) {
    let key = BucketKey::new(1024, 0).expect("valid key");
    let content = vec![0x5a; 1024];

    c.bench_function("add_then_delete", |b| {
        let directory = Directory::default();
        b.iter(|| {
            directory.add_record(key, &content).unwrap();
            directory.delete_record(key, 0).unwrap();
        });
    });

    c.bench_function("read_front_of_deep_bucket", |b| {
        let directory = Directory::default();
        for _ in 0..1000 {
            directory.add_record(key, &content).unwrap();
        }
        b.iter(|| directory.read_record(key, 0).unwrap());
    });

    c.bench_function("overwrite_in_place", |b| {
        let directory = Directory::default();
        directory.add_record(key, &content).unwrap();
        b.iter(|| directory.write_record(key, 0, &content).unwrap());
    });
}

criterion_group!(benches, store_benchmarks);
criterion_main!(benches);
