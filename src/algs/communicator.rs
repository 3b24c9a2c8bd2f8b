//! Thin façade over intra-process (threads) or inter-process (MPI) collectives.
//!
//! Messages are contiguous byte buffers. Every method except `rank`/`size` is
//! collective: all ranks of the group must call it, in the same order, or the
//! group deadlocks. A rank with nothing to contribute still calls with an
//! empty buffer.

use std::cell::Cell;
use std::sync::Arc;

use bytes::Bytes;
use dashmap::DashMap;

/// Blocking collective communication interface.
pub trait Communicator {
    fn rank(&self) -> usize;
    fn size(&self) -> usize;

    /// Replace `buf` on every rank with the contents `root` passed in.
    fn broadcast(&self, root: usize, buf: &mut Vec<u8>);

    /// Collect every rank's `send` on `root`, in rank order.
    ///
    /// Returns `Some` on `root` and `None` elsewhere.
    fn gather(&self, root: usize, send: &[u8]) -> Option<Vec<Vec<u8>>>;
}

/// Single-rank group; collectives are identity operations.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoComm;

impl Communicator for NoComm {
    fn rank(&self) -> usize {
        0
    }

    fn size(&self) -> usize {
        1
    }

    fn broadcast(&self, _root: usize, _buf: &mut Vec<u8>) {}

    fn gather(&self, _root: usize, send: &[u8]) -> Option<Vec<Vec<u8>>> {
        Some(vec![send.to_vec()])
    }
}

// (src, dst, sequence)
type Key = (usize, usize, u64);

/// N ranks inside one process, one thread per rank.
///
/// Ranks of one group share a mailbox keyed by sender, receiver and a
/// per-rank collective counter, so matching calls on different ranks meet on
/// the same key without any tag negotiation.
#[derive(Debug)]
pub struct ThreadComm {
    rank: usize,
    size: usize,
    mailbox: Arc<DashMap<Key, Bytes>>,
    seq: Cell<u64>,
}

impl ThreadComm {
    /// One handle per rank; move each into its own thread.
    pub fn group(size: usize) -> Vec<ThreadComm> {
        let mailbox = Arc::new(DashMap::new());
        (0..size)
            .map(|rank| ThreadComm {
                rank,
                size,
                mailbox: Arc::clone(&mailbox),
                seq: Cell::new(0),
            })
            .collect()
    }

    fn next_seq(&self) -> u64 {
        let seq = self.seq.get();
        self.seq.set(seq + 1);
        seq
    }

    fn post(&self, dst: usize, seq: u64, data: Bytes) {
        self.mailbox.insert((self.rank, dst, seq), data);
    }

    fn wait_for(&self, src: usize, seq: u64) -> Bytes {
        let key = (src, self.rank, seq);
        loop {
            if let Some((_, bytes)) = self.mailbox.remove(&key) {
                return bytes;
            }
            std::thread::yield_now();
        }
    }
}

impl Communicator for ThreadComm {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.size
    }

    fn broadcast(&self, root: usize, buf: &mut Vec<u8>) {
        let seq = self.next_seq();
        if self.rank == root {
            let data = Bytes::copy_from_slice(buf);
            for dst in (0..self.size).filter(|&dst| dst != root) {
                self.post(dst, seq, data.clone());
            }
        } else {
            let data = self.wait_for(root, seq);
            buf.clear();
            buf.extend_from_slice(&data);
        }
    }

    fn gather(&self, root: usize, send: &[u8]) -> Option<Vec<Vec<u8>>> {
        let seq = self.next_seq();
        if self.rank != root {
            self.post(root, seq, Bytes::copy_from_slice(send));
            return None;
        }
        let gathered = (0..self.size)
            .map(|src| {
                if src == root {
                    send.to_vec()
                } else {
                    self.wait_for(src, seq).to_vec()
                }
            })
            .collect();
        Some(gathered)
    }
}

// --- MPI backend (feature = "mpi-support") ---
#[cfg(feature = "mpi-support")]
mod mpi_backend {
    use super::Communicator;
    use mpi::datatype::PartitionMut;
    use mpi::environment::Universe;
    use mpi::topology::SimpleCommunicator;
    use mpi::traits::*;
    use mpi::Count;

    use crate::mesh_error::MeshLoaderError;

    pub struct MpiComm {
        world: SimpleCommunicator,
        rank: usize,
        size: usize,
        // Finalizes MPI on drop when this handle initialized it.
        _universe: Option<Universe>,
    }

    impl MpiComm {
        /// Initialize MPI and wrap `MPI_COMM_WORLD`.
        pub fn new() -> Result<Self, MeshLoaderError> {
            let universe = mpi::initialize().ok_or_else(|| {
                MeshLoaderError::InvalidConfig("MPI was already initialized".into())
            })?;
            let world = universe.world();
            let mut comm = Self::from_communicator(world);
            comm._universe = Some(universe);
            Ok(comm)
        }

        /// Wrap a communicator owned by the caller's MPI environment.
        pub fn from_communicator(world: SimpleCommunicator) -> Self {
            let rank = world.rank() as usize;
            let size = world.size() as usize;
            Self {
                world,
                rank,
                size,
                _universe: None,
            }
        }
    }

    impl Communicator for MpiComm {
        fn rank(&self) -> usize {
            self.rank
        }

        fn size(&self) -> usize {
            self.size
        }

        fn broadcast(&self, root: usize, buf: &mut Vec<u8>) {
            let root_process = self.world.process_at_rank(root as i32);
            let mut len = buf.len() as u64;
            root_process.broadcast_into(&mut len);
            buf.resize(len as usize, 0);
            root_process.broadcast_into(&mut buf[..]);
        }

        fn gather(&self, root: usize, send: &[u8]) -> Option<Vec<Vec<u8>>> {
            let root_process = self.world.process_at_rank(root as i32);
            let count = send.len() as Count;
            if self.rank != root {
                root_process.gather_into(&count);
                root_process.gather_varcount_into(send);
                return None;
            }

            let mut counts: Vec<Count> = vec![0; self.size];
            root_process.gather_into_root(&count, &mut counts[..]);
            let displs: Vec<Count> = counts
                .iter()
                .scan(0, |offset, &c| {
                    let start = *offset;
                    *offset += c;
                    Some(start)
                })
                .collect();
            let total: usize = counts.iter().map(|&c| c as usize).sum();
            let mut recv = vec![0u8; total];
            {
                let mut partition = PartitionMut::new(&mut recv[..], &counts[..], &displs[..]);
                root_process.gather_varcount_into_root(send, &mut partition);
            }
            Some(
                counts
                    .iter()
                    .zip(&displs)
                    .map(|(&c, &d)| recv[d as usize..(d + c) as usize].to_vec())
                    .collect(),
            )
        }
    }
}

#[cfg(feature = "mpi-support")]
pub use mpi_backend::MpiComm;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_comm_is_identity() {
        let comm = NoComm;
        let mut buf = vec![1, 2, 3];
        comm.broadcast(0, &mut buf);
        assert_eq!(buf, vec![1, 2, 3]);
        assert_eq!(comm.gather(0, &[9]), Some(vec![vec![9]]));
    }

    #[test]
    fn thread_broadcast_and_gather_three_ranks() {
        let comms = ThreadComm::group(3);
        let results: Vec<(Vec<u8>, Option<Vec<Vec<u8>>>)> = std::thread::scope(|s| {
            let handles: Vec<_> = comms
                .into_iter()
                .map(|comm| {
                    s.spawn(move || {
                        let mut buf = if comm.rank() == 1 { vec![7, 8] } else { Vec::new() };
                        comm.broadcast(1, &mut buf);
                        let payload = vec![comm.rank() as u8; comm.rank()];
                        let gathered = comm.gather(0, &payload);
                        (buf, gathered)
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        for (buf, _) in &results {
            assert_eq!(buf, &vec![7, 8]);
        }
        assert_eq!(results[0].1, Some(vec![vec![], vec![1], vec![2, 2]]));
        assert!(results[1].1.is_none());
        assert!(results[2].1.is_none());
    }

    #[test]
    fn thread_collectives_stay_matched_across_calls() {
        let comms = ThreadComm::group(2);
        let seen: Vec<Vec<u8>> = std::thread::scope(|s| {
            let handles: Vec<_> = comms
                .into_iter()
                .map(|comm| {
                    s.spawn(move || {
                        let mut out = Vec::new();
                        for round in 0..5u8 {
                            let mut buf = vec![round; (comm.rank() == 0) as usize];
                            comm.broadcast(0, &mut buf);
                            out.extend(buf);
                        }
                        out
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        assert_eq!(seen[1], vec![0, 1, 2, 3, 4]);
    }
}
