//! An overlap-aware block vector.
//!
//! The vector owns one numeric block per domestic row and the per-peer
//! buffer plans derived from its descriptor. Synchronization reconciles the
//! shadow copies across processes; the three variants share one send phase
//! and differ only in how an incoming value is merged into the local row.
//! Picking the wrong variant corrupts a solve without crashing, so the
//! policy is never inferred -- the caller states it by choosing the method.

use std::fmt;
use std::ops::{Index, IndexMut};
use std::sync::Arc;

use bytemuck::Zeroable;

use crate::comm::communicator::{Communicator, Wait};
use crate::comm::tags::ExchangeTags;
use crate::comm::wire;
use crate::debug_invariants::DebugInvariants;
use crate::error::OverlapSyncError;
use crate::overlap::{DomesticIdx, Overlap, Rank};
use crate::vector::block::Block;
use crate::vector::plan::PeerPlans;

/// How an incoming value is merged into the local row.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum MergePolicy {
    /// Keep the incoming value only if the sender is the row's master rank.
    FromMaster,
    /// Add on rows that are border with the sender, overwrite elsewhere.
    AddBorder,
    /// Add unconditionally.
    Add,
}

/// A vector of numeric blocks over the domestic index space of one
/// [`Overlap`] descriptor.
///
/// Construction runs the index handshake with every peer and caches the
/// resulting buffer plans for the vector's lifetime; the synchronization
/// methods reuse them without further allocation.
pub struct OverlappingBlockVector<V, O> {
    blocks: Vec<V>,
    overlap: Arc<O>,
    plans: PeerPlans<V>,
    tags: ExchangeTags,
}

impl<V, O> OverlappingBlockVector<V, O>
where
    V: Block,
    O: Overlap,
{
    /// Create a vector coherent to `overlap`, using the default tag block.
    pub fn new<C: Communicator>(overlap: Arc<O>, comm: &C) -> Result<Self, OverlapSyncError> {
        Self::with_tags(overlap, comm, ExchangeTags::default())
    }

    /// Create a vector coherent to `overlap` on a caller-chosen tag block.
    ///
    /// Distinct tag blocks keep several vectors (or other traffic on the
    /// same transport) from cross-talking.
    pub fn with_tags<C: Communicator>(
        overlap: Arc<O>,
        comm: &C,
        tags: ExchangeTags,
    ) -> Result<Self, OverlapSyncError> {
        let plans = PeerPlans::build(&*overlap, comm, tags)?;
        let blocks = vec![V::zeroed(); overlap.num_domestic()];
        let this = Self {
            blocks,
            overlap,
            plans,
            tags,
        };
        this.debug_assert_invariants();
        Ok(this)
    }

    /// Assign from a non-overlapping vector; overlap rows end up with their
    /// master rank's value.
    pub fn assign<C: Communicator>(
        &mut self,
        native: &[V],
        comm: &C,
    ) -> Result<(), OverlapSyncError> {
        self.copy_native(native)?;
        self.sync(comm)
    }

    /// Assign from a non-overlapping vector; border rows end up with the sum
    /// of every process's contribution, all other overlap rows with their
    /// master rank's value.
    pub fn assign_add_border<C: Communicator>(
        &mut self,
        native: &[V],
        comm: &C,
    ) -> Result<(), OverlapSyncError> {
        self.copy_native(native)?;
        self.sync_add_border(comm)
    }

    /// Project the local values back onto the native numbering. Native rows
    /// with no domestic counterpart are zero-filled. Purely local; no
    /// communication.
    pub fn assign_to(&self, native: &mut Vec<V>) {
        native.clear();
        native.resize(self.overlap.num_native(), V::zeroed());
        for (native_idx, slot) in native.iter_mut().enumerate() {
            if let Some(d) = self.overlap.native_to_domestic(native_idx) {
                *slot = self.blocks[d];
            }
        }
    }

    /// Make every overlap row equal to the copy held by its master rank.
    pub fn sync<C: Communicator>(&mut self, comm: &C) -> Result<(), OverlapSyncError> {
        self.sync_with(comm, MergePolicy::FromMaster)
    }

    /// Add up the contributions of all peers on every overlap row.
    pub fn sync_add<C: Communicator>(&mut self, comm: &C) -> Result<(), OverlapSyncError> {
        self.sync_with(comm, MergePolicy::Add)
    }

    /// Like [`sync`](Self::sync), but rows flagged as border with the sending
    /// peer accumulate instead of being overwritten.
    pub fn sync_add_border<C: Communicator>(&mut self, comm: &C) -> Result<(), OverlapSyncError> {
        self.sync_with(comm, MergePolicy::AddBorder)
    }

    /// Number of domestic rows.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn as_slice(&self) -> &[V] {
        &self.blocks
    }

    pub fn as_mut_slice(&mut self) -> &mut [V] {
        &mut self.blocks
    }

    pub fn iter(&self) -> impl Iterator<Item = &V> + '_ {
        self.blocks.iter()
    }

    /// The descriptor this vector is bound to.
    pub fn overlap(&self) -> &O {
        &self.overlap
    }

    /// Rows shipped to `peer` on every synchronization call (0 for a
    /// non-peer).
    pub fn num_send_rows(&self, peer: Rank) -> usize {
        self.plans.send.get(&peer).map_or(0, |p| p.domestic.len())
    }

    /// Rows accepted from `peer` on every synchronization call (0 for a
    /// non-peer).
    pub fn num_recv_rows(&self, peer: Rank) -> usize {
        self.plans.recv.get(&peer).map_or(0, |p| p.domestic.len())
    }

    fn copy_native(&mut self, native: &[V]) -> Result<(), OverlapSyncError> {
        let expected = self.overlap.num_native();
        if native.len() != expected {
            return Err(OverlapSyncError::NativeSizeMismatch {
                expected,
                got: native.len(),
            });
        }
        for (d, block) in self.blocks.iter_mut().enumerate() {
            *block = match self.overlap.domestic_to_native(d) {
                Some(n) => native[n],
                // Rows that exist only as overlap start from zero, so the
                // additive policies see exactly one local contribution.
                None => V::zeroed(),
            };
        }
        Ok(())
    }

    fn sync_with<C: Communicator>(
        &mut self,
        comm: &C,
        policy: MergePolicy,
    ) -> Result<(), OverlapSyncError> {
        let Self {
            blocks,
            overlap,
            plans,
            tags,
        } = self;

        // Send phase, shared by all policies: post every peer's values
        // before waiting on any receive.
        let mut pending_sends = Vec::with_capacity(plans.send.len());
        for (&peer, plan) in plans.send.iter_mut() {
            if plan.domestic.is_empty() {
                continue;
            }
            for (slot, &d) in plan.values.iter_mut().zip(plan.domestic.iter()) {
                *slot = blocks[d];
            }
            pending_sends.push(comm.isend(
                peer,
                tags.values.as_u16(),
                wire::cast_slice(&plan.values),
            ));
        }

        // Receive phase, ascending peer rank: the only part that differs
        // between the synchronization variants is the per-row merge.
        let mut maybe_err = None;
        for (&peer, plan) in plans.recv.iter_mut() {
            if plan.domestic.is_empty() {
                continue;
            }
            let h = comm.irecv(peer, tags.values.as_u16(), &mut plan.bytes);
            let data = match h.wait() {
                Some(data) => data,
                None => {
                    maybe_err = Some(OverlapSyncError::comm(peer, "no values received"));
                    break;
                }
            };
            if data.len() != plan.bytes.len() {
                maybe_err = Some(OverlapSyncError::PayloadSizeMismatch {
                    peer,
                    expected: plan.bytes.len(),
                    got: data.len(),
                });
                break;
            }
            wire::cast_slice_mut(&mut plan.values).copy_from_slice(&data);

            for (j, &d) in plan.domestic.iter().enumerate() {
                let incoming = &plan.values[j];
                match policy {
                    MergePolicy::FromMaster => {
                        // A row may arrive on several channels; only the
                        // master's copy is kept.
                        if overlap.master_rank(d) == peer {
                            blocks[d] = *incoming;
                        }
                    }
                    MergePolicy::AddBorder => {
                        if overlap.is_border_with(d, peer) {
                            blocks[d].add_assign(incoming);
                        } else {
                            blocks[d] = *incoming;
                        }
                    }
                    MergePolicy::Add => {
                        blocks[d].add_assign(incoming);
                    }
                }
            }
        }

        // Wait until everything we posted has left, even on error.
        for h in pending_sends {
            let _ = h.wait();
        }

        match maybe_err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl<V, O> Index<DomesticIdx> for OverlappingBlockVector<V, O> {
    type Output = V;

    fn index(&self, idx: DomesticIdx) -> &V {
        &self.blocks[idx]
    }
}

impl<V, O> IndexMut<DomesticIdx> for OverlappingBlockVector<V, O> {
    fn index_mut(&mut self, idx: DomesticIdx) -> &mut V {
        &mut self.blocks[idx]
    }
}

impl<V, O> fmt::Display for OverlappingBlockVector<V, O>
where
    V: Block + fmt::Debug,
    O: Overlap,
{
    /// Row dump with a `*` marker on rows mastered by another process.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, block) in self.blocks.iter().enumerate() {
            let marker = if self.overlap.is_local(i) { ' ' } else { '*' };
            writeln!(f, "row {i}{marker}: {block:?}")?;
        }
        Ok(())
    }
}

impl<V, O> DebugInvariants for OverlappingBlockVector<V, O>
where
    V: Block,
    O: Overlap,
{
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "OverlappingBlockVector");
    }

    fn validate_invariants(&self) -> Result<(), OverlapSyncError> {
        if self.blocks.len() != self.overlap.num_domestic() {
            return Err(OverlapSyncError::InvalidDescriptor(format!(
                "{} blocks for {} domestic rows",
                self.blocks.len(),
                self.overlap.num_domestic()
            )));
        }
        self.plans.validate(self.blocks.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comm::communicator::NoComm;
    use crate::overlap::InMemoryOverlap;

    fn serial_overlap(num_rows: usize) -> Arc<InMemoryOverlap> {
        let mut ov = InMemoryOverlap::new(0, num_rows);
        for n in 0..num_rows {
            ov.try_push_local_row(n, n as u64).unwrap();
        }
        Arc::new(ov)
    }

    #[test]
    fn construction_sizes_to_domestic_space() {
        let ov = serial_overlap(5);
        let v: OverlappingBlockVector<f64, _> =
            OverlappingBlockVector::new(ov, &NoComm).unwrap();
        assert_eq!(v.len(), 5);
        assert!(v.iter().all(|b| *b == 0.0));
    }

    #[test]
    fn assign_and_project_round_trip() {
        let ov = serial_overlap(4);
        let mut v = OverlappingBlockVector::new(ov, &NoComm).unwrap();
        let native = vec![1.0f64, 2.0, 3.0, 4.0];
        v.assign(&native, &NoComm).unwrap();

        let mut out = Vec::new();
        v.assign_to(&mut out);
        assert_eq!(out, native);
    }

    #[test]
    fn assign_rejects_wrong_native_size() {
        let ov = serial_overlap(4);
        let mut v: OverlappingBlockVector<f64, _> =
            OverlappingBlockVector::new(ov, &NoComm).unwrap();
        let err = v.assign(&[1.0, 2.0], &NoComm).unwrap_err();
        assert!(matches!(
            err,
            OverlapSyncError::NativeSizeMismatch {
                expected: 4,
                got: 2
            }
        ));
    }

    #[test]
    fn index_and_display() {
        let ov = serial_overlap(2);
        let mut v: OverlappingBlockVector<f64, _> =
            OverlappingBlockVector::new(ov, &NoComm).unwrap();
        v[0] = 1.5f64;
        v[1] = -2.0;
        assert_eq!(v[0], 1.5);
        let dump = v.to_string();
        assert!(dump.contains("row 0 : 1.5"));
        assert!(dump.contains("row 1 : -2.0"));
    }

    #[test]
    fn invariants_hold_after_construction() {
        let ov = serial_overlap(3);
        let v: OverlappingBlockVector<[f64; 2], _> =
            OverlappingBlockVector::new(ov, &NoComm).unwrap();
        assert!(v.validate_invariants().is_ok());
    }
}
