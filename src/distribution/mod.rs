//! Post-partition ownership of nodes and elements.
//!
//! [`OwnershipResolver::build`] runs once after the assembler partitions the
//! mesh. It performs a fixed sequence of collectives (identical on every
//! rank) and then answers every ownership query locally:
//!
//! 1. the coordinator validates the assembler's element partition and
//!    broadcasts a status code, then the partition itself;
//! 2. every rank asks the assembler for the local index of each global node
//!    and gathers its owned set on the coordinator;
//! 3. the coordinator resolves one owner per node and broadcasts the owner
//!    array together with the number of ranks whose claims were unusable
//!    (non-dense local numbering, or a node claimed twice).
//!
//! Failures found in steps 1 and 3 are raised on every rank after the
//! corresponding broadcast, never on a subset.

use hashbrown::HashMap;

use crate::algs::collective::{broadcast_count, broadcast_indices, gather_indices};
use crate::algs::communicator::Communicator;
use crate::assembler::PartitionedAssembler;
use crate::debug_invariants::DebugInvariants;
use crate::mesh_error::MeshLoaderError;
use crate::topology::EntityOwnership;

/// Owner marker for a node no rank claimed.
pub const UNOWNED: usize = usize::MAX;

const PARTITION_OK: usize = 0;
const PARTITION_MISSING: usize = 1;
const PARTITION_INVALID: usize = 2;

#[derive(Clone, Debug, Default)]
pub struct OwnershipResolver {
    nodes: EntityOwnership,
    elements: EntityOwnership,
    owned_multiplier_nodes: Vec<usize>,
}

impl OwnershipResolver {
    /// Collective: every rank must call this with the same global sizes.
    pub fn build<C, A>(
        comm: &C,
        coordinator: usize,
        assembler: &A,
        num_nodes: usize,
        num_elements: usize,
        multiplier_nodes: &[usize],
    ) -> Result<Self, MeshLoaderError>
    where
        C: Communicator + ?Sized,
        A: PartitionedAssembler + ?Sized,
    {
        let rank = comm.rank();
        let size = comm.size();
        let elements = resolve_elements(comm, coordinator, assembler, num_elements)?;

        let local_pairs: Vec<(usize, usize)> = (0..num_nodes)
            .filter_map(|global| assembler.local_node_index(global).map(|local| (global, local)))
            .collect();
        let numbering_ok = EntityOwnership::with_capacity(rank, num_nodes)
            .set_local_ids(&local_pairs)
            .is_ok();
        let mut claim = Vec::with_capacity(local_pairs.len() + 1);
        claim.push(numbering_ok as usize);
        claim.extend(local_pairs.iter().map(|&(global, _)| global));

        let mut resolved = Vec::new();
        if let Some(claims) = gather_indices(comm, coordinator, &claim)? {
            resolved = resolve_node_owners(&claims, num_nodes);
        }
        broadcast_indices(comm, coordinator, &mut resolved)?;
        let (bad_ranks, owners) = match resolved.split_first() {
            Some((&bad, owners)) if owners.len() == num_nodes => (bad, owners),
            _ => {
                return Err(MeshLoaderError::InvariantViolation(format!(
                    "node owner array does not cover {num_nodes} node(s)"
                )));
            }
        };
        if bad_ranks > 0 {
            return Err(MeshLoaderError::Assembler(format!(
                "{bad_ranks} rank(s) reported a non-dense local node numbering or claimed nodes owned elsewhere"
            )));
        }

        let mut nodes = EntityOwnership::with_capacity(rank, num_nodes);
        for (global, &owner) in owners.iter().enumerate() {
            if owner != UNOWNED && owner < size {
                nodes.set_owner_min(global, owner)?;
            }
        }
        nodes.set_local_ids(&local_pairs)?;
        nodes.debug_assert_invariants();
        elements.debug_assert_invariants();

        let owned_multiplier_nodes = multiplier_nodes
            .iter()
            .filter_map(|&global| usize::try_from(nodes.local_id(global)).ok())
            .collect();

        Ok(Self {
            nodes,
            elements,
            owned_multiplier_nodes,
        })
    }

    pub fn nodes(&self) -> &EntityOwnership {
        &self.nodes
    }

    pub fn elements(&self) -> &EntityOwnership {
        &self.elements
    }

    /// Local node ID of `global`, or `NOT_FOUND` when another rank owns it.
    pub fn local_node_id(&self, global: usize) -> i64 {
        self.nodes.local_id(global)
    }

    pub fn local_element_id(&self, global: usize) -> i64 {
        self.elements.local_id(global)
    }

    pub fn global_node_id(&self, local: usize) -> Option<usize> {
        self.nodes.global_id(local)
    }

    pub fn global_element_id(&self, local: usize) -> Option<usize> {
        self.elements.global_id(local)
    }

    /// Local IDs of the multiplier nodes owned by this rank.
    pub fn owned_multiplier_nodes(&self) -> &[usize] {
        &self.owned_multiplier_nodes
    }

    pub fn global_to_local_node_map(&self) -> &HashMap<usize, usize> {
        self.nodes.global_to_local()
    }

    pub fn global_to_local_element_map(&self) -> &HashMap<usize, usize> {
        self.elements.global_to_local()
    }

    pub fn num_owned_nodes(&self) -> usize {
        self.nodes.num_owned()
    }

    pub fn num_owned_elements(&self) -> usize {
        self.elements.num_owned()
    }
}

fn resolve_elements<C, A>(
    comm: &C,
    coordinator: usize,
    assembler: &A,
    num_elements: usize,
) -> Result<EntityOwnership, MeshLoaderError>
where
    C: Communicator + ?Sized,
    A: PartitionedAssembler + ?Sized,
{
    let rank = comm.rank();
    let size = comm.size();
    let mut partition = Vec::new();
    let mut status = PARTITION_OK;
    if rank == coordinator {
        match assembler.element_partition() {
            None => status = PARTITION_MISSING,
            Some(owners) if owners.len() != num_elements || owners.iter().any(|&r| r >= size) => {
                log::warn!(
                    "element partition has {} entries for {num_elements} element(s) in a group of {size}",
                    owners.len()
                );
                status = PARTITION_INVALID;
            }
            Some(owners) => partition = owners,
        }
    }
    match broadcast_count(comm, coordinator, status)? {
        PARTITION_OK => {}
        PARTITION_MISSING => return Err(MeshLoaderError::MissingElementPartition),
        _ => {
            return Err(MeshLoaderError::Assembler(
                "element partition does not assign one valid rank per element".into(),
            ));
        }
    }
    broadcast_indices(comm, coordinator, &mut partition)?;
    Ok(EntityOwnership::from_owners(rank, &partition))
}

/// `[bad rank count, owner of node 0, owner of node 1, ...]`.
fn resolve_node_owners(claims: &[Vec<usize>], num_nodes: usize) -> Vec<usize> {
    let mut owners = vec![UNOWNED; num_nodes];
    let mut bad_ranks = 0;
    for (rank, claim) in claims.iter().enumerate() {
        let Some((&ok, globals)) = claim.split_first() else {
            bad_ranks += 1;
            continue;
        };
        let mut conflict = false;
        for &global in globals {
            match owners.get_mut(global) {
                Some(owner) if *owner == UNOWNED => *owner = rank,
                _ => conflict = true,
            }
        }
        if ok == 0 || conflict {
            bad_ranks += 1;
        }
    }
    let mut resolved = Vec::with_capacity(num_nodes + 1);
    resolved.push(bad_ranks);
    resolved.extend(owners);
    resolved
}
