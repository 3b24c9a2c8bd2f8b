//! Process-group messaging.

pub mod collective;
pub mod communicator;
pub mod wire;

pub use collective::{broadcast_count, broadcast_indices, gather_indices};
#[cfg(feature = "mpi-support")]
pub use communicator::MpiComm;
pub use communicator::{Communicator, NoComm, ThreadComm};
