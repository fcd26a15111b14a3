//! Partition topology: the descriptor contract consumed by the
//! synchronization layer, and a plain in-memory implementation of it.

pub mod descriptor;
pub mod in_memory;

pub use descriptor::{DomesticIdx, GlobalIdx, NativeIdx, Overlap, Rank};
pub use in_memory::InMemoryOverlap;
