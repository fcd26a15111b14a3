//! Point-to-point communication: the transport façade, typed tags, and the
//! fixed wire representation used by the synchronization layer.

pub mod communicator;
pub mod tags;
pub mod wire;

pub use communicator::{Communicator, NoComm, ThreadComm, Wait};
#[cfg(feature = "mpi-support")]
pub use communicator::MpiComm;
pub use tags::{CommTag, ExchangeTags};
