//! Import/export between the native and domestic numberings.

use std::sync::Arc;

use overlap_sync::prelude::*;
use proptest::prelude::*;

fn identity_overlap(num_rows: usize) -> Arc<InMemoryOverlap> {
    let mut ov = InMemoryOverlap::new(0, num_rows);
    for n in 0..num_rows {
        ov.try_push_local_row(n, n as u64).unwrap();
    }
    Arc::new(ov)
}

#[test]
fn missing_counterparts_are_zero_filled() {
    // Native rows 1 and 3 are not held domestically; one domestic row exists
    // only as overlap (no native counterpart).
    let mut ov = InMemoryOverlap::new(0, 4);
    ov.try_push_local_row(0, 10).unwrap();
    ov.try_push_local_row(2, 12).unwrap();
    ov.try_push_overlap_row(99, 0, None).unwrap();
    let ov = Arc::new(ov);

    let mut v = OverlappingBlockVector::new(ov, &NoComm).unwrap();
    v.assign(&[1.0, 2.0, 3.0, 4.0], &NoComm).unwrap();
    // The pure overlap row was zero-initialized by the import.
    assert_eq!(v.as_slice(), &[1.0, 3.0, 0.0]);

    let mut out = Vec::new();
    v.assign_to(&mut out);
    assert_eq!(out, vec![1.0, 0.0, 3.0, 0.0]);
}

#[test]
fn export_resizes_the_target() {
    let ov = identity_overlap(3);
    let mut v = OverlappingBlockVector::new(ov, &NoComm).unwrap();
    v.assign(&[1.0, 2.0, 3.0], &NoComm).unwrap();

    let mut out = vec![0.0f64; 17];
    v.assign_to(&mut out);
    assert_eq!(out, vec![1.0, 2.0, 3.0]);
}

#[test]
fn multi_component_blocks_round_trip() {
    let ov = identity_overlap(2);
    let mut v = OverlappingBlockVector::new(ov, &NoComm).unwrap();
    let native = vec![[1.0f64, -1.0, 0.5], [2.0, -2.0, 0.25]];
    v.assign(&native, &NoComm).unwrap();

    let mut out = Vec::new();
    v.assign_to(&mut out);
    assert_eq!(out, native);
}

#[test]
fn randomized_vectors_round_trip() {
    use rand::{Rng, SeedableRng, rngs::StdRng};

    // Fixed seed for reproducibility.
    let mut rng = StdRng::seed_from_u64(0x5EED);
    for &n in &[1usize, 7, 64, 513] {
        let values: Vec<f64> = (0..n).map(|_| rng.gen_range(-1e6..1e6)).collect();
        let ov = identity_overlap(n);
        let mut v = OverlappingBlockVector::new(ov, &NoComm).unwrap();
        v.assign(&values, &NoComm).unwrap();

        let mut out = Vec::new();
        v.assign_to(&mut out);
        assert_eq!(out, values);
    }
}

proptest! {
    /// Export is a left inverse of import on the native index set.
    #[test]
    fn assign_then_project_is_identity(
        values in proptest::collection::vec(-1e9f64..1e9f64, 0..64)
    ) {
        let ov = identity_overlap(values.len());
        let mut v = OverlappingBlockVector::new(ov, &NoComm).unwrap();
        v.assign(&values, &NoComm).unwrap();

        let mut out = Vec::new();
        v.assign_to(&mut out);
        prop_assert_eq!(out, values);
    }
}
