//! # overlap-sync
//!
//! overlap-sync keeps the redundant shadow copies of a domain-decomposed
//! vector consistent across processes. When a global computational mesh is
//! partitioned, each process holds a "domestic" index space: its own interior
//! rows plus overlap rows owned by neighboring processes. This crate provides
//! the index-translation and communication layer that reconciles those copies
//! under several consistency policies, on top of pluggable point-to-point
//! transports (serial no-op, in-process thread mailbox, MPI).
//!
//! ## Features
//! - [`Overlap`](overlap::Overlap) descriptor contract plus a plain
//!   [`InMemoryOverlap`](overlap::InMemoryOverlap) implementation
//! - [`OverlappingBlockVector`](vector::OverlappingBlockVector) with
//!   overwrite-from-master, border-additive, and fully additive
//!   synchronization
//! - Per-peer buffer plans built once per vector and reused by every call
//! - Pluggable [`Communicator`](comm::Communicator) backends; MPI behind the
//!   `mpi-support` feature
//!
//! ## Determinism
//!
//! Peers are visited in ascending rank order, so multi-peer accumulation on
//! shared border rows produces the same floating-point result on every run.
//!
//! ## Usage
//!
//! ```toml
//! [dependencies]
//! overlap-sync = "0.3"
//! # Optional features:
//! # features = ["mpi-support"]
//! ```
//!
//! A process with an empty peer set (a serial run) pays nothing: every
//! synchronization call is a no-op by construction, no conditional
//! compilation involved.

pub mod comm;
pub mod debug_invariants;
pub mod error;
pub mod overlap;
pub mod vector;

pub use debug_invariants::DebugInvariants;
pub use error::OverlapSyncError;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    pub use crate::comm::communicator::{Communicator, NoComm, ThreadComm, Wait};
    #[cfg(feature = "mpi-support")]
    pub use crate::comm::communicator::MpiComm;
    pub use crate::comm::tags::{CommTag, ExchangeTags};
    pub use crate::debug_invariants::DebugInvariants;
    pub use crate::error::OverlapSyncError;
    pub use crate::overlap::{
        DomesticIdx, GlobalIdx, InMemoryOverlap, NativeIdx, Overlap, Rank,
    };
    pub use crate::vector::{Block, OverlappingBlockVector};
}
