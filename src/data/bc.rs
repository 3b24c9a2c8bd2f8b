//! Boundary-condition consolidation.
//!
//! Every SPC card is walked in file order and each (node, DOF) pair it
//! constrains is upserted into one table, so a later card overwrites an
//! earlier one. Nodes keep first-seen order, DOFs keep first-seen order
//! within a node.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::data::dof::is_dof_in_string;
use crate::model::SpcCard;
use crate::numbering::IdMap;

/// Flattened boundary conditions in the layout the assembler consumes.
///
/// The DOFs and values of `nodes[i]` occupy `ptr[i]..ptr[i + 1]` of
/// `dofs` / `values`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundaryConditionArrays {
    pub nodes: Vec<usize>,
    pub ptr: Vec<usize>,
    pub dofs: Vec<usize>,
    pub values: Vec<f64>,
}

impl BoundaryConditionArrays {
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }
}

/// Per-node, per-DOF enforced values. Free DOFs are absent.
#[derive(Clone, Debug, Default)]
pub struct BoundaryConditionTable {
    entries: Vec<(usize, Vec<(usize, f64)>)>,
    node_index: HashMap<usize, usize>,
}

impl BoundaryConditionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `dof` of `node` to `value`, replacing any earlier value.
    pub fn upsert(&mut self, node: usize, dof: usize, value: f64) {
        let pos = match self.node_index.get(&node) {
            Some(&pos) => pos,
            None => {
                self.entries.push((node, Vec::new()));
                self.node_index.insert(node, self.entries.len() - 1);
                self.entries.len() - 1
            }
        };
        let dofs = &mut self.entries[pos].1;
        match dofs.iter_mut().find(|(d, _)| *d == dof) {
            Some(entry) => entry.1 = value,
            None => dofs.push((dof, value)),
        }
    }

    /// Enforced value of one (node, DOF), or `None` if free.
    pub fn value(&self, node: usize, dof: usize) -> Option<f64> {
        let &pos = self.node_index.get(&node)?;
        self.entries[pos]
            .1
            .iter()
            .find_map(|&(d, v)| (d == dof).then_some(v))
    }

    /// Constrained (DOF, value) pairs of one node.
    pub fn node_constraints(&self, node: usize) -> &[(usize, f64)] {
        self.node_index
            .get(&node)
            .map_or(&[][..], |&pos| &self.entries[pos].1)
    }

    /// Number of constrained nodes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total constrained (node, DOF) pairs.
    pub fn num_constraints(&self) -> usize {
        self.entries.iter().map(|(_, dofs)| dofs.len()).sum()
    }

    pub fn to_arrays(&self) -> BoundaryConditionArrays {
        let mut arrays = BoundaryConditionArrays {
            nodes: Vec::with_capacity(self.entries.len()),
            ptr: Vec::with_capacity(self.entries.len() + 1),
            dofs: Vec::with_capacity(self.num_constraints()),
            values: Vec::with_capacity(self.num_constraints()),
        };
        arrays.ptr.push(0);
        for (node, dofs) in &self.entries {
            arrays.nodes.push(*node);
            for &(dof, value) in dofs {
                arrays.dofs.push(dof);
                arrays.values.push(value);
            }
            arrays.ptr.push(arrays.dofs.len());
        }
        arrays
    }
}

/// Result of consolidating a model's SPC cards.
#[derive(Clone, Debug, Default)]
pub struct ConsolidatedBoundaryConditions {
    pub table: BoundaryConditionTable,
    /// External IDs of nodes referenced by an SPC but absent from the model.
    pub skipped_nodes: Vec<i64>,
}

/// Merge all SPC cards into one table over `vars_per_node` DOFs.
///
/// A card entry naming an unknown node is skipped and reported, never fatal.
pub fn consolidate_boundary_conditions(
    spcs: &[SpcCard],
    nodes: &IdMap,
    vars_per_node: usize,
) -> ConsolidatedBoundaryConditions {
    let mut out = ConsolidatedBoundaryConditions::default();
    for spc in spcs {
        for (j, &external) in spc.nodes().iter().enumerate() {
            let Some(node) = nodes.get(external) else {
                out.skipped_nodes.push(external);
                continue;
            };
            let (components, value) = spc.constraint_for(j);
            for dof in 0..vars_per_node {
                if is_dof_in_string(components, dof + 1) {
                    out.table.upsert(node, dof, value);
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh_error::EntityKind;

    fn nodes() -> IdMap {
        IdMap::compact(EntityKind::Node, [100, 200, 300]).unwrap()
    }

    #[test]
    fn later_card_wins_on_shared_dof() {
        let spcs = vec![
            SpcCard::Spc {
                sid: 1,
                nodes: vec![200],
                components: vec!["12".into()],
                enforced: vec![0.5],
            },
            SpcCard::Spc {
                sid: 1,
                nodes: vec![200],
                components: vec!["2".into()],
                enforced: vec![-1.0],
            },
        ];
        let bc = consolidate_boundary_conditions(&spcs, &nodes(), 6);
        assert_eq!(bc.table.value(1, 0), Some(0.5));
        assert_eq!(bc.table.value(1, 1), Some(-1.0));
        assert_eq!(bc.table.value(1, 2), None);
        assert_eq!(bc.table.num_constraints(), 2);
    }

    #[test]
    fn grouped_cards_enforce_zero() {
        let spcs = vec![
            SpcCard::Spc {
                sid: 1,
                nodes: vec![300],
                components: vec!["3".into()],
                enforced: vec![2.0],
            },
            SpcCard::Spc1 {
                sid: 2,
                components: "123".into(),
                nodes: vec![100, 300],
            },
        ];
        let arrays = consolidate_boundary_conditions(&spcs, &nodes(), 6)
            .table
            .to_arrays();
        assert_eq!(arrays.nodes, vec![2, 0]);
        assert_eq!(arrays.ptr, vec![0, 3, 6]);
        assert_eq!(arrays.dofs, vec![2, 0, 1, 0, 1, 2]);
        assert_eq!(arrays.values, vec![0.0; 6]);
    }

    #[test]
    fn unknown_nodes_are_skipped() {
        let spcs = vec![SpcCard::Spc1 {
            sid: 1,
            components: "1".into(),
            nodes: vec![100, 999],
        }];
        let bc = consolidate_boundary_conditions(&spcs, &nodes(), 6);
        assert_eq!(bc.skipped_nodes, vec![999]);
        assert_eq!(bc.table.len(), 1);
    }

    #[test]
    fn dof_seven_uses_zero_digit() {
        let spcs = vec![SpcCard::Spc1 {
            sid: 1,
            components: "0".into(),
            nodes: vec![100],
        }];
        let bc = consolidate_boundary_conditions(&spcs, &nodes(), 7);
        assert_eq!(bc.table.node_constraints(0), &[(6, 0.0)]);
    }
}
