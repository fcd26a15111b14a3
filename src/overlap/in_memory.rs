//! `InMemoryOverlap`: a plain-data overlap descriptor.
//!
//! Serves serial runs, tests, and callers that compute the partition topology
//! elsewhere and hand it over row by row. Rows are registered in domestic
//! order; the struct maintains the translation tables, the peer set, and the
//! per-peer foreign-overlap enumerations.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use crate::debug_invariants::DebugInvariants;
use crate::error::OverlapSyncError;
use crate::overlap::descriptor::{DomesticIdx, GlobalIdx, NativeIdx, Overlap, Rank};

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
struct Row {
    global: GlobalIdx,
    native: Option<NativeIdx>,
    master: Rank,
}

/// In-memory implementation of the [`Overlap`] descriptor contract.
///
/// # Invariants
///
/// - Each global index maps to exactly one domestic row and vice versa.
/// - Each registered native index maps to exactly one domestic row.
/// - Foreign-overlap lists name in-range domestic rows, without duplicates,
///   and never target the local rank.
/// - Border flags name in-range rows and ranks from the peer set.
///
/// These are checked after mutations in debug builds and under the
/// `check-invariants` feature, and can be verified manually via
/// [`validate_invariants`](DebugInvariants::validate_invariants).
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct InMemoryOverlap {
    rank: Rank,
    num_native: usize,
    /// Rows in domestic order.
    rows: Vec<Row>,
    native_to_domestic: HashMap<NativeIdx, DomesticIdx>,
    global_to_domestic: HashMap<GlobalIdx, DomesticIdx>,
    /// Ranks sharing at least one overlap row; ordered for deterministic
    /// iteration.
    peers: BTreeSet<Rank>,
    /// Per peer: the domestic rows shipped to that peer, in send order.
    foreign: BTreeMap<Rank, Vec<DomesticIdx>>,
    /// Shared-sum border classification, per (row, peer) pair.
    borders: HashSet<(DomesticIdx, Rank)>,
}

impl InMemoryOverlap {
    pub fn new(rank: Rank, num_native: usize) -> Self {
        Self {
            rank,
            num_native,
            rows: Vec::new(),
            native_to_domestic: HashMap::new(),
            global_to_domestic: HashMap::new(),
            peers: BTreeSet::new(),
            foreign: BTreeMap::new(),
            borders: HashSet::new(),
        }
    }

    /// Register the next domestic row as locally owned, with a native
    /// counterpart.
    ///
    /// Returns the row's domestic index.
    pub fn try_push_local_row(
        &mut self,
        native: NativeIdx,
        global: GlobalIdx,
    ) -> Result<DomesticIdx, OverlapSyncError> {
        let rank = self.rank;
        self.try_push_row(global, Some(native), rank)
    }

    /// Register the next domestic row as a shadow of a row mastered by
    /// `master`. Border rows that also carry a locally computed contribution
    /// pass their native index; pure overlap rows pass `None`.
    pub fn try_push_overlap_row(
        &mut self,
        global: GlobalIdx,
        master: Rank,
        native: Option<NativeIdx>,
    ) -> Result<DomesticIdx, OverlapSyncError> {
        let domestic = self.try_push_row(global, native, master)?;
        if master != self.rank {
            self.peers.insert(master);
        }
        Ok(domestic)
    }

    /// Register a peer explicitly. Needed for peers that share rows with
    /// this process without any traffic in one direction (the peer relation
    /// is symmetric even when the row flow is not).
    pub fn try_add_peer(&mut self, peer: Rank) -> Result<(), OverlapSyncError> {
        self.check_peer(peer)?;
        self.peers.insert(peer);
        Ok(())
    }

    /// Flag `domestic` as a shared-sum border row with `peer`.
    pub fn try_mark_border(
        &mut self,
        domestic: DomesticIdx,
        peer: Rank,
    ) -> Result<(), OverlapSyncError> {
        self.check_domestic(domestic)?;
        self.check_peer(peer)?;
        self.borders.insert((domestic, peer));
        self.peers.insert(peer);
        self.debug_assert_invariants();
        Ok(())
    }

    /// Append `domestic` to the list of rows shipped to `peer` on every
    /// synchronization call. Order of registration is send order.
    pub fn try_add_foreign_overlap(
        &mut self,
        peer: Rank,
        domestic: DomesticIdx,
    ) -> Result<(), OverlapSyncError> {
        self.check_domestic(domestic)?;
        self.check_peer(peer)?;
        self.foreign.entry(peer).or_default().push(domestic);
        self.peers.insert(peer);
        self.debug_assert_invariants();
        Ok(())
    }

    fn try_push_row(
        &mut self,
        global: GlobalIdx,
        native: Option<NativeIdx>,
        master: Rank,
    ) -> Result<DomesticIdx, OverlapSyncError> {
        if self.global_to_domestic.contains_key(&global) {
            return Err(OverlapSyncError::DuplicateGlobalIndex(global));
        }
        if let Some(n) = native {
            if n >= self.num_native {
                return Err(OverlapSyncError::NativeIndexOutOfRange {
                    idx: n,
                    len: self.num_native,
                });
            }
            if self.native_to_domestic.contains_key(&n) {
                return Err(OverlapSyncError::DuplicateNativeIndex(n));
            }
        }
        let domestic = self.rows.len();
        self.rows.push(Row {
            global,
            native,
            master,
        });
        self.global_to_domestic.insert(global, domestic);
        if let Some(n) = native {
            self.native_to_domestic.insert(n, domestic);
        }
        self.debug_assert_invariants();
        Ok(domestic)
    }

    fn check_domestic(&self, domestic: DomesticIdx) -> Result<(), OverlapSyncError> {
        if domestic >= self.rows.len() {
            return Err(OverlapSyncError::DomesticIndexOutOfRange {
                idx: domestic,
                len: self.rows.len(),
            });
        }
        Ok(())
    }

    fn check_peer(&self, peer: Rank) -> Result<(), OverlapSyncError> {
        if peer == self.rank {
            return Err(OverlapSyncError::InvalidDescriptor(format!(
                "rank {peer} cannot be its own peer"
            )));
        }
        Ok(())
    }
}

impl Overlap for InMemoryOverlap {
    fn rank(&self) -> Rank {
        self.rank
    }

    fn num_domestic(&self) -> usize {
        self.rows.len()
    }

    fn num_native(&self) -> usize {
        self.num_native
    }

    fn domestic_to_native(&self, domestic: DomesticIdx) -> Option<NativeIdx> {
        self.rows[domestic].native
    }

    fn native_to_domestic(&self, native: NativeIdx) -> Option<DomesticIdx> {
        self.native_to_domestic.get(&native).copied()
    }

    fn domestic_to_global(&self, domestic: DomesticIdx) -> GlobalIdx {
        self.rows[domestic].global
    }

    fn global_to_domestic(&self, global: GlobalIdx) -> Option<DomesticIdx> {
        self.global_to_domestic.get(&global).copied()
    }

    fn peer_ranks<'a>(&'a self) -> impl Iterator<Item = Rank> + 'a {
        self.peers.iter().copied()
    }

    fn num_peers(&self) -> usize {
        self.peers.len()
    }

    fn foreign_overlap_size(&self, peer: Rank) -> usize {
        self.foreign.get(&peer).map_or(0, Vec::len)
    }

    fn foreign_overlap_domestic_idx(&self, peer: Rank, offset: usize) -> DomesticIdx {
        self.foreign[&peer][offset]
    }

    fn master_rank(&self, domestic: DomesticIdx) -> Rank {
        self.rows[domestic].master
    }

    fn is_border_with(&self, domestic: DomesticIdx, peer: Rank) -> bool {
        self.borders.contains(&(domestic, peer))
    }
}

impl DebugInvariants for InMemoryOverlap {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "InMemoryOverlap");
    }

    fn validate_invariants(&self) -> Result<(), OverlapSyncError> {
        if self.global_to_domestic.len() != self.rows.len() {
            return Err(OverlapSyncError::InvalidDescriptor(format!(
                "{} global indices for {} rows",
                self.global_to_domestic.len(),
                self.rows.len()
            )));
        }
        for (domestic, row) in self.rows.iter().enumerate() {
            if self.global_to_domestic.get(&row.global) != Some(&domestic) {
                return Err(OverlapSyncError::InvalidDescriptor(format!(
                    "global index {} does not map back to domestic row {domestic}",
                    row.global
                )));
            }
            if let Some(n) = row.native {
                if n >= self.num_native {
                    return Err(OverlapSyncError::NativeIndexOutOfRange {
                        idx: n,
                        len: self.num_native,
                    });
                }
                if self.native_to_domestic.get(&n) != Some(&domestic) {
                    return Err(OverlapSyncError::InvalidDescriptor(format!(
                        "native index {n} does not map back to domestic row {domestic}"
                    )));
                }
            }
        }
        for (&peer, list) in &self.foreign {
            if peer == self.rank {
                return Err(OverlapSyncError::InvalidDescriptor(format!(
                    "foreign overlap registered for the local rank {peer}"
                )));
            }
            let mut seen = HashSet::with_capacity(list.len());
            for &domestic in list {
                self.check_domestic(domestic)?;
                if !seen.insert(domestic) {
                    return Err(OverlapSyncError::InvalidDescriptor(format!(
                        "domestic row {domestic} listed twice for peer {peer}"
                    )));
                }
            }
        }
        for &(domestic, peer) in &self.borders {
            self.check_domestic(domestic)?;
            if !self.peers.contains(&peer) {
                return Err(OverlapSyncError::InvalidDescriptor(format!(
                    "border flag names rank {peer} outside the peer set"
                )));
            }
        }
        Ok(())
    }
}


#[cfg(test)]
mod serde_tests {
    use super::*;

    #[test]
    fn json_roundtrip() {
        let ov = super::tests::two_peer_descriptor();
        let s = serde_json::to_string(&ov).unwrap();
        let back: InMemoryOverlap = serde_json::from_str(&s).unwrap();
        assert_eq!(back.num_domestic(), ov.num_domestic());
        assert_eq!(back.peer_ranks().collect::<Vec<_>>(), vec![0, 2]);
        assert!(back.is_border_with(1, 0));
    }

    #[test]
    fn bincode_roundtrip() {
        let ov = super::tests::two_peer_descriptor();
        let bytes = bincode::serialize(&ov).unwrap();
        let back: InMemoryOverlap = bincode::deserialize(&bytes).unwrap();
        assert_eq!(back.domestic_to_global(2), 12);
        assert_eq!(back.foreign_overlap_size(2), 1);
    }
}
