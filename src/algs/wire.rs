//! Little-endian wire encoding for index lists exchanged between ranks.

use bytemuck::{Pod, Zeroable};

use crate::mesh_error::MeshLoaderError;

/// An index carried on the wire (`u64`, little-endian).
#[repr(transparent)]
#[derive(Copy, Clone, Pod, Zeroable)]
pub struct WireIndex(pub u64);

impl WireIndex {
    pub fn of(index: usize) -> Self {
        Self((index as u64).to_le())
    }

    pub fn get(self) -> usize {
        u64::from_le(self.0) as usize
    }
}

pub const WIRE_INDEX_BYTES: usize = std::mem::size_of::<WireIndex>();

pub fn encode_indices(indices: &[usize]) -> Vec<u8> {
    let words: Vec<WireIndex> = indices.iter().map(|&i| WireIndex::of(i)).collect();
    bytemuck::cast_slice::<WireIndex, u8>(&words).to_vec()
}

/// Decode a buffer produced by [`encode_indices`].
///
/// Works on unaligned input (received buffers carry no alignment guarantee).
pub fn decode_indices(bytes: &[u8]) -> Result<Vec<usize>, MeshLoaderError> {
    if bytes.len() % WIRE_INDEX_BYTES != 0 {
        return Err(MeshLoaderError::InvariantViolation(format!(
            "index buffer of {} bytes is not a multiple of {WIRE_INDEX_BYTES}",
            bytes.len()
        )));
    }
    Ok(bytes
        .chunks_exact(WIRE_INDEX_BYTES)
        .map(|chunk| bytemuck::pod_read_unaligned::<WireIndex>(chunk).get())
        .collect())
}
