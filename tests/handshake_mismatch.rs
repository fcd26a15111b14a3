//! Disagreeing descriptors must fail construction with a diagnostic naming
//! the offending peer and global index.

use std::sync::Arc;

use overlap_sync::prelude::*;
use serial_test::serial;

#[test]
#[serial]
fn unresolved_global_index_is_fatal() {
    let tags = ExchangeTags::from_base(CommTag::new(0x4000));

    // Rank 0 believes rank 1 shadows its global row 5.
    let h0 = std::thread::spawn(move || {
        let mut ov = InMemoryOverlap::new(0, 1);
        let d0 = ov.try_push_local_row(0, 5).unwrap();
        ov.try_add_foreign_overlap(1, d0).unwrap();
        let comm = ThreadComm::new(0);
        OverlappingBlockVector::<f64, _>::with_tags(Arc::new(ov), &comm, tags).map(|_| ())
    });
    // Rank 1 holds no copy of global row 5.
    let h1 = std::thread::spawn(move || {
        let mut ov = InMemoryOverlap::new(1, 0);
        ov.try_push_overlap_row(6, 0, None).unwrap();
        let comm = ThreadComm::new(1);
        OverlappingBlockVector::<f64, _>::with_tags(Arc::new(ov), &comm, tags).map(|_| ())
    });

    // Rank 0 only exchanges counts and indices; its handshake completes.
    assert!(h0.join().unwrap().is_ok());

    let err = h1.join().unwrap().unwrap_err();
    match err {
        OverlapSyncError::UnresolvedGlobalIndex { peer, global } => {
            assert_eq!(peer, 0);
            assert_eq!(global, 5);
        }
        other => panic!("expected UnresolvedGlobalIndex, got {other:?}"),
    }
    // The diagnostic names both sides of the mismatch.
    let msg = OverlapSyncError::UnresolvedGlobalIndex { peer: 0, global: 5 }.to_string();
    assert!(msg.contains("peer rank 0"));
    assert!(msg.contains("global index 5"));
}
