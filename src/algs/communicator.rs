//! Thin façade over in-process or inter-process (MPI) message passing.
//!
//! Messages are contiguous byte buffers. `send` is buffered (it returns once
//! the payload is queued) and `recv` blocks until a message from `peer` with
//! `tag` is available. Messages between the same (src, dst, tag) triple are
//! delivered in order.
//!
//! Every algorithm in the crate talks to the transport only through this
//! trait and the collectives in [`super::collective`], so single-process and
//! distributed runs share the same code.

use crate::mesh_error::MeshError;
use bytes::Bytes;
use dashmap::DashMap;
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::sync::Arc;

/// Point-to-point transport.
pub trait Communicator {
    fn rank(&self) -> usize;
    fn size(&self) -> usize;
    fn send(&self, peer: usize, tag: u16, buf: &[u8]) -> Result<(), MeshError>;
    fn recv(&self, peer: usize, tag: u16) -> Result<Vec<u8>, MeshError>;

    #[inline]
    fn is_serial(&self) -> bool {
        self.size() == 1
    }
}

type Key = (usize, usize, u16); // (src, dst, tag)

#[derive(Default)]
struct Mailbox {
    slots: DashMap<Key, VecDeque<Bytes>>,
    lock: Mutex<()>,
    ready: Condvar,
}

/// In-process transport: a group of ranks sharing one mailbox.
///
/// Each rank is usually driven by its own thread; `serial()` is the
/// one-rank group used when the whole mesh lives in one process.
#[derive(Clone)]
pub struct LocalComm {
    rank: usize,
    size: usize,
    mailbox: Arc<Mailbox>,
}

impl LocalComm {
    /// One handle per rank of a new `size`-rank group.
    pub fn group(size: usize) -> Vec<LocalComm> {
        let mailbox = Arc::new(Mailbox::default());
        (0..size)
            .map(|rank| LocalComm {
                rank,
                size,
                mailbox: Arc::clone(&mailbox),
            })
            .collect()
    }

    pub fn serial() -> Self {
        LocalComm {
            rank: 0,
            size: 1,
            mailbox: Arc::new(Mailbox::default()),
        }
    }

    fn check_peer(&self, peer: usize) -> Result<(), MeshError> {
        if peer >= self.size {
            return Err(MeshError::Transport(format!(
                "peer {peer} outside group of {}",
                self.size
            )));
        }
        Ok(())
    }
}

impl std::fmt::Debug for LocalComm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalComm")
            .field("rank", &self.rank)
            .field("size", &self.size)
            .finish()
    }
}

impl Communicator for LocalComm {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.size
    }

    fn send(&self, peer: usize, tag: u16, buf: &[u8]) -> Result<(), MeshError> {
        self.check_peer(peer)?;
        let _guard = self.mailbox.lock.lock();
        self.mailbox
            .slots
            .entry((self.rank, peer, tag))
            .or_default()
            .push_back(Bytes::copy_from_slice(buf));
        self.mailbox.ready.notify_all();
        Ok(())
    }

    fn recv(&self, peer: usize, tag: u16) -> Result<Vec<u8>, MeshError> {
        self.check_peer(peer)?;
        let key = (peer, self.rank, tag);
        let mut guard = self.mailbox.lock.lock();
        loop {
            let msg = self
                .mailbox
                .slots
                .get_mut(&key)
                .and_then(|mut q| q.pop_front());
            if let Some(bytes) = msg {
                return Ok(bytes.to_vec());
            }
            self.mailbox.ready.wait(&mut guard);
        }
    }
}

// --- MPI backend (feature = "mpi-support") ---
#[cfg(feature = "mpi-support")]
mod mpi_backend {
    use super::*;
    use mpi::environment::Universe;
    use mpi::topology::SimpleCommunicator;
    use mpi::traits::*;

    pub struct MpiComm {
        // Finalizes MPI on drop.
        _universe: Universe,
        world: SimpleCommunicator,
        rank: usize,
        size: usize,
    }

    impl MpiComm {
        pub fn new() -> Result<Self, MeshError> {
            let universe = mpi::initialize()
                .ok_or_else(|| MeshError::Transport("MPI is already initialized".into()))?;
            let world = universe.world();
            let rank = world.rank() as usize;
            let size = world.size() as usize;
            Ok(Self {
                _universe: universe,
                world,
                rank,
                size,
            })
        }
    }

    impl Communicator for MpiComm {
        fn rank(&self) -> usize {
            self.rank
        }

        fn size(&self) -> usize {
            self.size
        }

        fn send(&self, peer: usize, tag: u16, buf: &[u8]) -> Result<(), MeshError> {
            self.world
                .process_at_rank(peer as i32)
                .send_with_tag(buf, i32::from(tag));
            Ok(())
        }

        fn recv(&self, peer: usize, tag: u16) -> Result<Vec<u8>, MeshError> {
            let (data, _status) = self
                .world
                .process_at_rank(peer as i32)
                .receive_vec_with_tag::<u8>(i32::from(tag));
            Ok(data)
        }
    }
}

#[cfg(feature = "mpi-support")]
pub use mpi_backend::MpiComm;
