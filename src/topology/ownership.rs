//! Ownership metadata for partitioned entities.
//!
//! [`EntityOwnership`] records, for every dense global ID of one entity class,
//! the owning rank, plus the global ↔ local dictionaries of the calling rank.
//! It is built once per partition and then queried without communication.

use std::collections::BTreeSet;

use hashbrown::HashMap;

use crate::debug_invariants::DebugInvariants;
use crate::mesh_error::MeshLoaderError;
use crate::numbering::NOT_FOUND;

#[derive(Clone, Debug, Default)]
pub struct EntityOwnership {
    rank: usize,
    owners: Vec<Option<usize>>,
    global_to_local: HashMap<usize, usize>,
    local_to_global: Vec<usize>,
}

impl EntityOwnership {
    /// Empty ownership map sized for `count` global IDs.
    pub fn with_capacity(rank: usize, count: usize) -> Self {
        Self {
            rank,
            owners: vec![None; count],
            global_to_local: HashMap::new(),
            local_to_global: Vec::new(),
        }
    }

    /// Build from a complete owner array; local IDs follow ascending global order.
    pub fn from_owners(rank: usize, owners: &[usize]) -> Self {
        let local_to_global: Vec<usize> = owners
            .iter()
            .enumerate()
            .filter_map(|(global, &owner)| (owner == rank).then_some(global))
            .collect();
        let global_to_local = local_to_global
            .iter()
            .enumerate()
            .map(|(local, &global)| (global, local))
            .collect();
        Self {
            rank,
            owners: owners.iter().copied().map(Some).collect(),
            global_to_local,
            local_to_global,
        }
    }

    /// Record `owner` for `global`, keeping the smallest owner when repeated.
    pub fn set_owner_min(&mut self, global: usize, owner: usize) -> Result<(), MeshLoaderError> {
        let slot = self.owners.get_mut(global).ok_or_else(|| {
            MeshLoaderError::InvariantViolation(format!("global ID {global} is out of range"))
        })?;
        *slot = Some(slot.map_or(owner, |existing| existing.min(owner)));
        Ok(())
    }

    /// Install the local numbering reported for this rank.
    ///
    /// Local IDs must cover `0..pairs.len()` exactly once.
    pub fn set_local_ids(&mut self, pairs: &[(usize, usize)]) -> Result<(), MeshLoaderError> {
        let mut local_to_global = vec![usize::MAX; pairs.len()];
        let mut global_to_local = HashMap::with_capacity(pairs.len());
        for &(global, local) in pairs {
            let slot = local_to_global.get_mut(local).ok_or_else(|| {
                MeshLoaderError::InvariantViolation(format!(
                    "local ID {local} exceeds {} owned entities",
                    pairs.len()
                ))
            })?;
            if *slot != usize::MAX {
                return Err(MeshLoaderError::InvariantViolation(format!(
                    "local ID {local} assigned twice"
                )));
            }
            *slot = global;
            global_to_local.insert(global, local);
        }
        self.local_to_global = local_to_global;
        self.global_to_local = global_to_local;
        Ok(())
    }

    pub fn rank(&self) -> usize {
        self.rank
    }

    /// Number of tracked global IDs.
    pub fn len(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }

    /// Owning rank of a global ID.
    pub fn owner(&self, global: usize) -> Option<usize> {
        self.owners.get(global).copied().flatten()
    }

    /// Returns true if the calling rank owns `global`.
    pub fn is_owned(&self, global: usize) -> bool {
        self.global_to_local.contains_key(&global)
    }

    /// Local ID of `global` on this rank, or [`NOT_FOUND`].
    pub fn local_id(&self, global: usize) -> i64 {
        self.global_to_local
            .get(&global)
            .map_or(NOT_FOUND, |&local| local as i64)
    }

    /// Global ID of a local ID on this rank.
    pub fn global_id(&self, local: usize) -> Option<usize> {
        self.local_to_global.get(local).copied()
    }

    pub fn num_owned(&self) -> usize {
        self.local_to_global.len()
    }

    /// Global IDs owned by this rank, in local order.
    pub fn owned_globals(&self) -> &[usize] {
        &self.local_to_global
    }

    /// Global IDs owned by `rank`.
    pub fn owned_by(&self, rank: usize) -> BTreeSet<usize> {
        self.owners
            .iter()
            .enumerate()
            .filter_map(|(global, owner)| (*owner == Some(rank)).then_some(global))
            .collect()
    }

    pub fn global_to_local(&self) -> &HashMap<usize, usize> {
        &self.global_to_local
    }
}

impl DebugInvariants for EntityOwnership {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "EntityOwnership");
    }

    fn validate_invariants(&self) -> Result<(), MeshLoaderError> {
        for (local, &global) in self.local_to_global.iter().enumerate() {
            if self.owner(global) != Some(self.rank) {
                return Err(MeshLoaderError::InvariantViolation(format!(
                    "rank {} numbers global {global} locally but its owner is {:?}",
                    self.rank,
                    self.owner(global)
                )));
            }
            if self.global_to_local.get(&global) != Some(&local) {
                return Err(MeshLoaderError::InvariantViolation(format!(
                    "local {local} and global {global} do not round-trip"
                )));
            }
        }
        Ok(())
    }
}
