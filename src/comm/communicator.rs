//! Thin façade over intra-process (thread mailbox) or inter-process (MPI)
//! message passing.
//!
//! Messages are *contiguous byte slices* (no zero-copy guarantees).
//! All handles are **waitable** but non-blocking -- the synchronization layer
//! calls `.wait()` before it trusts that a buffer is ready.

use std::collections::VecDeque;
use std::sync::Arc;
use std::thread::JoinHandle;

use bytes::Bytes;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use parking_lot::Mutex;

/// Non-blocking communication interface (minimal by design).
///
/// Implementations must deliver messages between a fixed (sender, receiver,
/// tag) triple in FIFO order; no ordering is promised across distinct peers
/// or tags.
pub trait Communicator: Send + Sync + 'static {
    /// Handle returned by `isend`.
    type SendHandle: Wait;
    /// Handle returned by `irecv`.
    type RecvHandle: Wait;

    fn isend(&self, peer: usize, tag: u16, buf: &[u8]) -> Self::SendHandle;
    fn irecv(&self, peer: usize, tag: u16, buf: &mut [u8]) -> Self::RecvHandle;
}

/// Anything that can be waited on.
pub trait Wait {
    /// Wait for completion and return the received data (if any).
    fn wait(self) -> Option<Vec<u8>>;
}

/// Compile-time no-op comm for single-process runs and pure serial unit tests.
#[derive(Clone, Debug, Default)]
pub struct NoComm;

impl Wait for () {
    fn wait(self) -> Option<Vec<u8>> {
        None
    }
}

impl Communicator for NoComm {
    type SendHandle = ();
    type RecvHandle = ();

    fn isend(&self, _peer: usize, _tag: u16, _buf: &[u8]) -> () {
        ()
    }
    fn irecv(&self, _peer: usize, _tag: u16, _buf: &mut [u8]) -> () {
        ()
    }
}

// --- ThreadComm: intra-process, one "rank" per thread ---
type Key = (usize, usize, u16); // (src, dst, tag)

static MAILBOX: Lazy<DashMap<Key, VecDeque<Bytes>>> = Lazy::new(DashMap::new);

pub struct LocalHandle {
    buf: Arc<Mutex<Option<Vec<u8>>>>,
    handle: Option<JoinHandle<()>>,
}

impl Wait for LocalHandle {
    fn wait(mut self) -> Option<Vec<u8>> {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
        self.buf.lock().take()
    }
}

/// Mailbox-backed communicator for running several ranks inside one process.
///
/// Each (src, dst, tag) triple gets its own FIFO queue, so message order
/// between a fixed peer pair matches send order. Sends complete immediately
/// (the payload is copied into the mailbox); receives park a helper thread
/// until a matching message arrives.
#[derive(Clone, Debug)]
pub struct ThreadComm {
    rank: usize,
}

impl ThreadComm {
    pub fn new(rank: usize) -> Self {
        Self { rank }
    }

    pub fn rank(&self) -> usize {
        self.rank
    }
}

impl Communicator for ThreadComm {
    type SendHandle = ();
    type RecvHandle = LocalHandle;

    fn isend(&self, peer: usize, tag: u16, buf: &[u8]) -> Self::SendHandle {
        let key = (self.rank, peer, tag);
        MAILBOX
            .entry(key)
            .or_default()
            .push_back(Bytes::copy_from_slice(buf));
    }

    fn irecv(&self, peer: usize, tag: u16, buf: &mut [u8]) -> Self::RecvHandle {
        let key = (peer, self.rank, tag);
        let cap = buf.len();
        let slot = Arc::new(Mutex::new(None));
        let slot_clone = slot.clone();
        let handle = std::thread::spawn(move || {
            loop {
                let msg = MAILBOX.get_mut(&key).and_then(|mut q| q.pop_front());
                if let Some(bytes) = msg {
                    // Truncate to the posted buffer size, like a real transport.
                    let n = bytes.len().min(cap);
                    *slot_clone.lock() = Some(bytes[..n].to_vec());
                    break;
                }
                std::thread::yield_now();
            }
        });
        LocalHandle {
            buf: slot,
            handle: Some(handle),
        }
    }
}

// --- MPI backend (feature = "mpi-support") ---
#[cfg(feature = "mpi-support")]
mod mpi_backend {
    use super::Wait;
    use mpi::request::StaticScope;
    use mpi::topology::SimpleCommunicator;
    use mpi::traits::*;

    /// MPI-backed communicator. One instance per process; it owns the MPI
    /// universe, so MPI is finalized when the communicator is dropped.
    pub struct MpiComm {
        _universe: mpi::environment::Universe,
        world: SimpleCommunicator,
        rank: usize,
    }

    impl MpiComm {
        pub fn new() -> Self {
            let universe = mpi::initialize().expect("MPI initialization failed");
            let world = universe.world();
            let rank = world.rank() as usize;
            Self {
                _universe: universe,
                world,
                rank,
            }
        }

        pub fn rank(&self) -> usize {
            self.rank
        }

        pub fn size(&self) -> usize {
            self.world.size() as usize
        }
    }

    /// The request plus the leaked transfer buffer; the buffer is reclaimed
    /// once the request has completed.
    pub struct MpiHandle {
        req: mpi::request::Request<'static, StaticScope>,
        buf: *mut [u8],
        deliver: bool,
    }

    impl Wait for MpiHandle {
        fn wait(self) -> Option<Vec<u8>> {
            self.req.wait_without_status();
            let buf = unsafe { Box::from_raw(self.buf) };
            if self.deliver { Some(buf.into_vec()) } else { None }
        }
    }

    impl super::Communicator for MpiComm {
        type SendHandle = MpiHandle;
        type RecvHandle = MpiHandle;

        fn isend(&self, peer: usize, tag: u16, buf: &[u8]) -> MpiHandle {
            let staged: &'static mut [u8] = Box::leak(buf.to_vec().into_boxed_slice());
            let ptr: *mut [u8] = staged;
            let req = self
                .world
                .process_at_rank(peer as i32)
                .immediate_send_with_tag(StaticScope, unsafe { &*ptr }, tag as i32);
            MpiHandle {
                req,
                buf: ptr,
                deliver: false,
            }
        }

        fn irecv(&self, peer: usize, tag: u16, buf: &mut [u8]) -> MpiHandle {
            let staged: &'static mut [u8] = Box::leak(vec![0u8; buf.len()].into_boxed_slice());
            let ptr: *mut [u8] = staged;
            let req = self
                .world
                .process_at_rank(peer as i32)
                .immediate_receive_into_with_tag(StaticScope, unsafe { &mut *ptr }, tag as i32);
            MpiHandle {
                req,
                buf: ptr,
                deliver: true,
            }
        }
    }
}

#[cfg(feature = "mpi-support")]
pub use mpi_backend::MpiComm;
