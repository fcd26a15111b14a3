use std::sync::Arc;

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use overlap_sync::prelude::*;

fn identity_overlap(num_rows: usize) -> Arc<InMemoryOverlap> {
    let mut ov = InMemoryOverlap::new(0, num_rows);
    for n in 0..num_rows {
        ov.try_push_local_row(n, n as u64).unwrap();
    }
    Arc::new(ov)
}

fn bench_assign(c: &mut Criterion) {
    let n = 100_000;
    let mut v: OverlappingBlockVector<[f64; 2], _> =
        OverlappingBlockVector::new(identity_overlap(n), &NoComm).unwrap();
    let native: Vec<[f64; 2]> = (0..n).map(|i| [i as f64, -(i as f64)]).collect();

    c.bench_function("assign_100k_blocks", |b| {
        b.iter(|| v.assign(black_box(&native), &NoComm).unwrap())
    });

    let mut out = Vec::new();
    c.bench_function("assign_to_100k_blocks", |b| {
        b.iter(|| {
            v.assign_to(&mut out);
            black_box(&out);
        })
    });

    c.bench_function("sync_without_peers", |b| {
        b.iter(|| v.sync(&NoComm).unwrap())
    });
}

criterion_group!(benches, bench_assign);
criterion_main!(benches);
