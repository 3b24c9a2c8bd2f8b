//! Typed collectives over a [`Communicator`].
//!
//! Each helper performs exactly one underlying collective, so call counts stay
//! identical across ranks as long as every rank calls the same helpers in the
//! same order.

use crate::algs::communicator::Communicator;
use crate::algs::wire::{decode_indices, encode_indices};
use crate::mesh_error::MeshLoaderError;

/// Broadcast `indices` from `root`; on return every rank holds root's list.
pub fn broadcast_indices<C: Communicator + ?Sized>(
    comm: &C,
    root: usize,
    indices: &mut Vec<usize>,
) -> Result<(), MeshLoaderError> {
    let mut buf = if comm.rank() == root {
        encode_indices(indices)
    } else {
        Vec::new()
    };
    comm.broadcast(root, &mut buf);
    *indices = decode_indices(&buf)?;
    Ok(())
}

/// Broadcast a single count from `root`. Non-root inputs are ignored.
pub fn broadcast_count<C: Communicator + ?Sized>(
    comm: &C,
    root: usize,
    count: usize,
) -> Result<usize, MeshLoaderError> {
    let mut values = vec![count];
    broadcast_indices(comm, root, &mut values)?;
    values.first().copied().ok_or_else(|| {
        MeshLoaderError::InvariantViolation("broadcast count arrived empty".into())
    })
}

/// Gather every rank's `indices` on `root`, in rank order.
pub fn gather_indices<C: Communicator + ?Sized>(
    comm: &C,
    root: usize,
    indices: &[usize],
) -> Result<Option<Vec<Vec<usize>>>, MeshLoaderError> {
    match comm.gather(root, &encode_indices(indices)) {
        Some(parts) => parts
            .iter()
            .map(|part| decode_indices(part))
            .collect::<Result<Vec<_>, _>>()
            .map(Some),
        None => Ok(None),
    }
}
