//! OverlapSyncError: Unified error type for overlap-sync public APIs
//!
//! This error type is used throughout the overlap-sync library to provide
//! robust, non-panicking error handling for all public APIs.

use thiserror::Error;

use crate::overlap::{GlobalIdx, Rank};

/// Unified error type for overlap-sync operations.
#[derive(Debug, Error)]
pub enum OverlapSyncError {
    /// A peer reported a global index that has no domestic counterpart on this
    /// process. The overlap descriptors of the two processes disagree; the
    /// topology must be rebuilt before synchronization can work.
    #[error("peer rank {peer} sent global index {global} with no domestic counterpart")]
    UnresolvedGlobalIndex { peer: Rank, global: GlobalIdx },

    /// The transport failed while talking to a peer. Not recoverable within
    /// this layer; a torn synchronization cannot be retried safely.
    #[error("communication with rank {peer} failed: {source}")]
    CommError {
        peer: Rank,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A peer delivered a payload whose size disagrees with the buffer plan
    /// negotiated at construction.
    #[error("payload from rank {peer}: expected {expected} bytes, got {got}")]
    PayloadSizeMismatch {
        peer: Rank,
        expected: usize,
        got: usize,
    },

    /// A value arrived from (or was requested for) a rank that is not in the
    /// peer set the buffer plans were built for.
    #[error("rank {0} is not a peer of this process")]
    UnknownPeer(Rank),

    /// The caller-supplied native vector does not have the descriptor's
    /// native size.
    #[error("native vector has {got} rows, descriptor expects {expected}")]
    NativeSizeMismatch { expected: usize, got: usize },

    /// A global index was registered twice in one descriptor.
    #[error("global index {0} registered twice")]
    DuplicateGlobalIndex(GlobalIdx),

    /// A native index was registered twice in one descriptor.
    #[error("native index {0} registered twice")]
    DuplicateNativeIndex(usize),

    /// A domestic index outside the descriptor's index space.
    #[error("domestic index {idx} out of range (num_domestic = {len})")]
    DomesticIndexOutOfRange { idx: usize, len: usize },

    /// A native index outside the descriptor's native index space.
    #[error("native index {idx} out of range (num_native = {len})")]
    NativeIndexOutOfRange { idx: usize, len: usize },

    /// A descriptor invariant does not hold (border flag for a rank outside
    /// the peer set, translation tables out of step, ...).
    #[error("overlap descriptor invariant violated: {0}")]
    InvalidDescriptor(String),
}

impl OverlapSyncError {
    /// Shorthand for a [`CommError`](Self::CommError) with a message-only source.
    pub fn comm(peer: Rank, msg: impl Into<String>) -> Self {
        OverlapSyncError::CommError {
            peer,
            source: msg.into().into(),
        }
    }
}
