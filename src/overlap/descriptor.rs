//! The partition-topology contract consumed by the synchronization layer.
//!
//! One process of a domain-decomposed run holds a "domestic" index space:
//! its own interior rows plus shadow copies of rows owned by neighboring
//! processes near the partition boundary. The same logical row is therefore
//! known under up to three numberings: *native* (the caller's non-overlapping
//! vector), *domestic* (local, including shadows), and *global* (shared by
//! every process that references the row). The descriptor answers all
//! translation and ownership questions; it is produced elsewhere and is
//! read-only here.

/// Process rank within the parallel job.
pub type Rank = usize;
/// Index into the domestic (owned + overlap) numbering of one process.
pub type DomesticIdx = usize;
/// Index into the caller's native, non-overlapping numbering.
pub type NativeIdx = usize;
/// Partition-independent row identifier shared by all processes.
pub type GlobalIdx = u64;

/// Read-only view of one process's share of the partition topology.
///
/// Implementations must be stable for the lifetime of any vector bound to
/// them: buffer plans are derived once and reused for every synchronization
/// call afterwards.
pub trait Overlap {
    /// Rank of the process this descriptor belongs to.
    fn rank(&self) -> Rank;

    /// Total number of domestic rows (owned + overlap) on this process.
    fn num_domestic(&self) -> usize;

    /// Total number of rows in the native, non-overlapping numbering.
    fn num_native(&self) -> usize;

    /// Native counterpart of a domestic row, or `None` for rows that exist
    /// only as overlap.
    fn domestic_to_native(&self, domestic: DomesticIdx) -> Option<NativeIdx>;

    /// Domestic counterpart of a native row, or `None` if the row is not held
    /// by this process.
    fn native_to_domestic(&self, native: NativeIdx) -> Option<DomesticIdx>;

    /// Partition-independent identifier of a domestic row.
    fn domestic_to_global(&self, domestic: DomesticIdx) -> GlobalIdx;

    /// Domestic row for a global identifier, or `None` if this process holds
    /// no copy of that row.
    fn global_to_domestic(&self, global: GlobalIdx) -> Option<DomesticIdx>;

    /// Ranks sharing at least one overlap row with this process, in ascending
    /// order. The relation is symmetric: if A lists B, B lists A.
    fn peer_ranks<'a>(&'a self) -> impl Iterator<Item = Rank> + 'a;

    /// Number of peers in [`peer_ranks`](Self::peer_ranks).
    fn num_peers(&self) -> usize;

    /// Number of domestic rows this process ships to `peer` on every
    /// synchronization call.
    fn foreign_overlap_size(&self, peer: Rank) -> usize;

    /// The domestic row sent to `peer` at position `offset` of its
    /// foreign-overlap enumeration.
    ///
    /// # Panics
    /// May panic if `offset >= foreign_overlap_size(peer)`.
    fn foreign_overlap_domestic_idx(&self, peer: Rank, offset: usize) -> DomesticIdx;

    /// Owning process of a row; the master's copy is the authoritative value.
    fn master_rank(&self, domestic: DomesticIdx) -> Rank;

    /// True if `domestic` is a shared-sum border row with `peer`.
    ///
    /// Border classification is a property of the (row, peer) pair, not of
    /// the row alone: a row may be border with one peer and plain overlap
    /// with another.
    fn is_border_with(&self, domestic: DomesticIdx, peer: Rank) -> bool;

    /// True if this process is the master of the row.
    fn is_local(&self, domestic: DomesticIdx) -> bool {
        self.master_rank(domestic) == self.rank()
    }
}
