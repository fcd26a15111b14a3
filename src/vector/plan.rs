//! Per-peer buffer plans: which domestic rows travel to and from each peer.
//!
//! Plans are derived once, when a vector is bound to its descriptor, through
//! a blocking index handshake: each side ships the count and the global
//! indices of the rows it will send, and translates the peer's globals into
//! its own domestic numbering. Position in the buffer is the correlation key
//! afterwards -- every synchronization call ships values in exactly this
//! order, so the value and index lists must stay in lockstep.

use std::collections::BTreeMap;
use std::mem::size_of;

use bytemuck::Zeroable;

use crate::comm::communicator::{Communicator, Wait};
use crate::comm::tags::ExchangeTags;
use crate::comm::wire::{self, WireCount, WireGlobal};
use crate::error::OverlapSyncError;
use crate::overlap::{DomesticIdx, Overlap, Rank};
use crate::vector::block::Block;

/// Rows this process ships to one peer, plus the reusable value scratch.
#[derive(Clone, Debug)]
pub(crate) struct SendPlan<V> {
    pub domestic: Vec<DomesticIdx>,
    pub values: Vec<V>,
}

/// Rows this process accepts from one peer, plus the reusable receive
/// scratch (typed values and the raw byte window posted to the transport).
#[derive(Clone, Debug)]
pub(crate) struct RecvPlan<V> {
    pub domestic: Vec<DomesticIdx>,
    pub values: Vec<V>,
    pub bytes: Vec<u8>,
}

/// All buffer plans of one vector, keyed by peer rank. `BTreeMap` keeps peer
/// iteration in ascending rank order, which makes multi-peer accumulation
/// reproducible across runs.
#[derive(Clone, Debug, Default)]
pub(crate) struct PeerPlans<V> {
    pub send: BTreeMap<Rank, SendPlan<V>>,
    pub recv: BTreeMap<Rank, RecvPlan<V>>,
}

impl<V: Block> PeerPlans<V> {
    /// Run the per-peer index handshake and build the plans.
    ///
    /// All count and index-list sends are posted before any receive is
    /// waited on, so the transport can pipeline across peers. A global index
    /// that the local descriptor cannot resolve is a fatal topology mismatch.
    pub fn build<O, C>(
        overlap: &O,
        comm: &C,
        tags: ExchangeTags,
    ) -> Result<Self, OverlapSyncError>
    where
        O: Overlap,
        C: Communicator,
    {
        let peers: Vec<Rank> = overlap.peer_ranks().collect();
        log::trace!(
            "rank {}: building buffer plans for {} peer(s)",
            overlap.rank(),
            peers.len()
        );

        // Post every peer's count and global-index list.
        let mut send = BTreeMap::new();
        let mut pending_sends = Vec::with_capacity(peers.len() * 2);
        let mut send_bufs = Vec::with_capacity(peers.len() * 2);
        for &peer in &peers {
            let n = overlap.foreign_overlap_size(peer);
            let domestic: Vec<DomesticIdx> = (0..n)
                .map(|i| overlap.foreign_overlap_domestic_idx(peer, i))
                .collect();
            let globals: Vec<WireGlobal> = domestic
                .iter()
                .map(|&d| WireGlobal::of(overlap.domestic_to_global(d)))
                .collect();

            let count = WireCount::new(n);
            pending_sends.push(comm.isend(
                peer,
                tags.counts.as_u16(),
                wire::cast_slice(std::slice::from_ref(&count)),
            ));
            pending_sends.push(comm.isend(peer, tags.indices.as_u16(), wire::cast_slice(&globals)));
            send_bufs.push(globals);

            send.insert(
                peer,
                SendPlan {
                    domestic,
                    values: vec![V::zeroed(); n],
                },
            );
        }

        // Receive each peer's count and index list, translating the globals
        // into the domestic numbering.
        let mut recv = BTreeMap::new();
        let mut maybe_err = None;
        for &peer in &peers {
            match Self::receive_plan(overlap, comm, tags, peer) {
                Ok(plan) => {
                    recv.insert(peer, plan);
                }
                Err(e) => {
                    maybe_err = Some(e);
                    break;
                }
            }
        }

        // Always drain the send handles, even on error.
        for h in pending_sends {
            let _ = h.wait();
        }

        if let Some(err) = maybe_err {
            return Err(err);
        }
        Ok(Self { send, recv })
    }

    fn receive_plan<O, C>(
        overlap: &O,
        comm: &C,
        tags: ExchangeTags,
        peer: Rank,
    ) -> Result<RecvPlan<V>, OverlapSyncError>
    where
        O: Overlap,
        C: Communicator,
    {
        // Leg 1: how many rows the peer will ship.
        let mut count = WireCount::zeroed();
        let h = comm.irecv(
            peer,
            tags.counts.as_u16(),
            wire::cast_slice_mut(std::slice::from_mut(&mut count)),
        );
        let data = h
            .wait()
            .ok_or_else(|| OverlapSyncError::comm(peer, "no index count received"))?;
        if data.len() != size_of::<WireCount>() {
            return Err(OverlapSyncError::PayloadSizeMismatch {
                peer,
                expected: size_of::<WireCount>(),
                got: data.len(),
            });
        }
        wire::cast_slice_mut(std::slice::from_mut(&mut count)).copy_from_slice(&data);
        let n = count.get();

        // Leg 2: the global indices themselves.
        let mut globals = vec![WireGlobal::zeroed(); n];
        let h = comm.irecv(peer, tags.indices.as_u16(), wire::cast_slice_mut(&mut globals));
        let data = h
            .wait()
            .ok_or_else(|| OverlapSyncError::comm(peer, "no index list received"))?;
        if data.len() != n * size_of::<WireGlobal>() {
            return Err(OverlapSyncError::PayloadSizeMismatch {
                peer,
                expected: n * size_of::<WireGlobal>(),
                got: data.len(),
            });
        }
        wire::cast_slice_mut(&mut globals).copy_from_slice(&data);

        // Translate into the domestic numbering; an unresolvable index means
        // the two descriptors disagree about the topology.
        let mut domestic = Vec::with_capacity(n);
        for g in &globals {
            let global = g.get();
            let d = overlap
                .global_to_domestic(global)
                .ok_or(OverlapSyncError::UnresolvedGlobalIndex { peer, global })?;
            domestic.push(d);
        }
        log::trace!("accepting {n} overlap row(s) from rank {peer}");

        Ok(RecvPlan {
            domestic,
            values: vec![V::zeroed(); n],
            bytes: vec![0u8; n * size_of::<V>()],
        })
    }

    /// Lockstep and range checks over all plans.
    pub fn validate(&self, num_domestic: usize) -> Result<(), OverlapSyncError> {
        for (&peer, plan) in &self.send {
            if plan.values.len() != plan.domestic.len() {
                return Err(OverlapSyncError::InvalidDescriptor(format!(
                    "send plan for rank {peer} lost lockstep"
                )));
            }
            for &d in &plan.domestic {
                if d >= num_domestic {
                    return Err(OverlapSyncError::DomesticIndexOutOfRange {
                        idx: d,
                        len: num_domestic,
                    });
                }
            }
        }
        for (&peer, plan) in &self.recv {
            if plan.values.len() != plan.domestic.len()
                || plan.bytes.len() != plan.domestic.len() * size_of::<V>()
            {
                return Err(OverlapSyncError::InvalidDescriptor(format!(
                    "receive plan for rank {peer} lost lockstep"
                )));
            }
            for &d in &plan.domestic {
                if d >= num_domestic {
                    return Err(OverlapSyncError::DomesticIndexOutOfRange {
                        idx: d,
                        len: num_domestic,
                    });
                }
            }
        }
        Ok(())
    }
}
