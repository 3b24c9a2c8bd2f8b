//! Flattened element → node connectivity in assembler numbering.
//!
//! The node list of element `i` lives in `conn[ptr[i]..ptr[i + 1]]`. The table
//! is append-only: authored elements are pushed first (already reordered per
//! family), synthesized constraint and mass elements after them.

use crate::debug_invariants::DebugInvariants;
use crate::mesh_error::MeshLoaderError;
use crate::model::BulkModel;
use crate::numbering::ModelIdMaps;
use crate::topology::ElementFamily;

#[derive(Clone, Debug)]
pub struct ConnectivityTable {
    conn: Vec<usize>,
    ptr: Vec<usize>,
}

impl Default for ConnectivityTable {
    fn default() -> Self {
        Self {
            conn: Vec::new(),
            ptr: vec![0],
        }
    }
}

impl ConnectivityTable {
    /// Table with room for `elements` elements of about `nodes_per_element` nodes.
    pub fn with_capacity(elements: usize, nodes_per_element: usize) -> Self {
        let mut ptr = Vec::with_capacity(elements + 1);
        ptr.push(0);
        Self {
            conn: Vec::with_capacity(elements * nodes_per_element),
            ptr,
        }
    }

    /// Translate and reorder every authored element of `model`, file order.
    ///
    /// A node missing from `ids.nodes` is fatal.
    pub fn from_model(model: &BulkModel, ids: &ModelIdMaps) -> Result<Self, MeshLoaderError> {
        let mut table = Self::with_capacity(model.num_elements(), 4);
        let mut translated = Vec::new();
        for element in model.elements() {
            translated.clear();
            for &node in &element.nodes {
                let internal = ids.nodes.get(node).ok_or(MeshLoaderError::UnknownNode {
                    element: element.id,
                    node,
                })?;
                translated.push(internal);
            }
            let family = ElementFamily::from_card(&element.card);
            table.push(&family.reorder(&translated));
        }
        table.debug_assert_invariants();
        Ok(table)
    }

    /// Append one element and return its internal element ID.
    pub fn push(&mut self, nodes: &[usize]) -> usize {
        let element = self.len();
        self.conn.extend_from_slice(nodes);
        self.ptr.push(self.conn.len());
        element
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.ptr.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Node list of one element.
    pub fn element(&self, element: usize) -> Option<&[usize]> {
        let start = *self.ptr.get(element)?;
        let end = *self.ptr.get(element + 1)?;
        Some(&self.conn[start..end])
    }

    pub fn iter(&self) -> impl Iterator<Item = &[usize]> + '_ {
        self.ptr.windows(2).map(move |w| &self.conn[w[0]..w[1]])
    }

    /// Flattened node array.
    pub fn flat(&self) -> &[usize] {
        &self.conn
    }

    /// Offset array of length `len() + 1`.
    pub fn offsets(&self) -> &[usize] {
        &self.ptr
    }

    /// Check every entry against a node count.
    pub fn validate_nodes(&self, num_nodes: usize) -> Result<(), MeshLoaderError> {
        match self.conn.iter().position(|&n| n >= num_nodes) {
            Some(pos) => Err(MeshLoaderError::InvariantViolation(format!(
                "connectivity entry {pos} references node {} of {num_nodes}",
                self.conn[pos]
            ))),
            None => Ok(()),
        }
    }
}

impl DebugInvariants for ConnectivityTable {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "ConnectivityTable");
    }

    fn validate_invariants(&self) -> Result<(), MeshLoaderError> {
        if self.ptr.first() != Some(&0) {
            return Err(MeshLoaderError::InvariantViolation(
                "connectivity offsets must start at 0".into(),
            ));
        }
        if self.ptr.windows(2).any(|w| w[0] > w[1]) {
            return Err(MeshLoaderError::InvariantViolation(
                "connectivity offsets must be non-decreasing".into(),
            ));
        }
        if self.ptr.last() != Some(&self.conn.len()) {
            return Err(MeshLoaderError::InvariantViolation(format!(
                "last offset {:?} does not match {} connectivity entries",
                self.ptr.last(),
                self.conn.len()
            )));
        }
        Ok(())
    }
}
