//! Constraint synthesis: rigid links and point masses become ordinary elements.
//!
//! Every `RBE2`/`RBE3` card is expanded, in file order, into one element whose
//! connectivity carries extra *multiplier* nodes hosting the Lagrange
//! multipliers of the constraint. Multiplier nodes are appended to the model
//! coincident with the dependent node they pair with and receive the next
//! unused external ID. Point masses follow as one-node elements.
//!
//! Synthesized connectivity is stored as written (no family reorder), and the
//! synthesized element IDs continue the element numbering after the authored
//! elements.

use hashbrown::HashSet;

use crate::data::dof::dof_string_to_mask;
use crate::data::mass::{GeneralMassMatrix, PointMassProperties};
use crate::mesh_error::{EntityKind, MeshLoaderError};
use crate::model::{BulkModel, MassCard, RigidElementCard};
use crate::numbering::ModelIdMaps;
use crate::topology::ConnectivityTable;

/// Element object built by the loader rather than supplied by the caller.
#[derive(Clone, Debug, PartialEq)]
pub enum SynthesizedElement {
    /// Rigid link; `dependent_dofs` holds one DOF mask per dependent node.
    Rbe2 {
        num_nodes: usize,
        dependent_dofs: Vec<bool>,
    },
    /// Weighted interpolation; one weight and one DOF mask per independent node.
    Rbe3 {
        num_nodes: usize,
        dependent_dofs: Vec<bool>,
        weights: Vec<f64>,
        independent_dofs: Vec<bool>,
    },
    PointMass(PointMassProperties),
    GeneralMass(GeneralMassMatrix),
}

impl SynthesizedElement {
    pub fn num_nodes(&self) -> usize {
        match self {
            SynthesizedElement::Rbe2 { num_nodes, .. }
            | SynthesizedElement::Rbe3 { num_nodes, .. } => *num_nodes,
            SynthesizedElement::PointMass(_) | SynthesizedElement::GeneralMass(_) => 1,
        }
    }

    /// Name used when describing the element.
    pub fn family(&self) -> &'static str {
        match self {
            SynthesizedElement::Rbe2 { .. } => "RBE2",
            SynthesizedElement::Rbe3 { .. } => "RBE3",
            SynthesizedElement::PointMass(_) => "CONM2",
            SynthesizedElement::GeneralMass(_) => "CONM1",
        }
    }
}

/// One synthesized element and the internal element ID it was given.
#[derive(Clone, Debug, PartialEq)]
pub struct SynthesizedEntry {
    pub eid: i64,
    pub element: usize,
    pub object: SynthesizedElement,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SynthesisOutcome {
    /// Rigid elements in file order, then masses in file order.
    pub elements: Vec<SynthesizedEntry>,
    /// Internal IDs of the appended multiplier nodes, creation order.
    pub multiplier_nodes: Vec<usize>,
}

/// Check every rigid and mass card before the model is touched.
///
/// Rejects card kinds without a synthesis rule, references to nodes absent
/// from the model, and element IDs already in use, so synthesis itself never
/// stops half way.
pub fn validate_constraints(model: &BulkModel) -> Result<(), MeshLoaderError> {
    let mut eids = HashSet::new();
    let mut claim = |eid: i64| {
        if model.element(eid).is_some() || !eids.insert(eid) {
            return Err(MeshLoaderError::DuplicateId {
                kind: EntityKind::Element,
                id: eid,
            });
        }
        Ok(())
    };
    let check_node = |eid: i64, node: i64| {
        if model.has_node(node) {
            Ok(())
        } else {
            Err(MeshLoaderError::UnknownNode { element: eid, node })
        }
    };

    for rigid in model.rigid_elements() {
        match rigid {
            RigidElementCard::Rbe2 {
                eid,
                independent_node,
                dependent_nodes,
                ..
            } => {
                claim(*eid)?;
                check_node(*eid, *independent_node)?;
                for &node in dependent_nodes {
                    check_node(*eid, node)?;
                }
            }
            RigidElementCard::Rbe3 {
                eid,
                dependent_node,
                weight_groups,
                ..
            } => {
                claim(*eid)?;
                check_node(*eid, *dependent_node)?;
                for &node in weight_groups.iter().flat_map(|g| g.nodes.iter()) {
                    check_node(*eid, node)?;
                }
            }
            RigidElementCard::Unsupported { eid, card } => {
                return Err(MeshLoaderError::UnsupportedRigidElement {
                    eid: *eid,
                    card: card.clone(),
                });
            }
        }
    }
    for mass in model.masses() {
        match mass {
            MassCard::Conm2 { eid, node, .. } | MassCard::Conm1 { eid, node, .. } => {
                claim(*eid)?;
                check_node(*eid, *node)?;
            }
            MassCard::Unsupported { eid, card } => {
                return Err(MeshLoaderError::UnsupportedMassElement {
                    eid: *eid,
                    card: card.clone(),
                });
            }
        }
    }
    Ok(())
}

/// Append every rigid and mass element of `model` to `ids` and `connectivity`.
///
/// Multiplier nodes are added to both `model` and `ids.nodes`.
pub fn synthesize_constraints(
    model: &mut BulkModel,
    ids: &mut ModelIdMaps,
    connectivity: &mut ConnectivityTable,
    vars_per_node: usize,
) -> Result<SynthesisOutcome, MeshLoaderError> {
    validate_constraints(model)?;

    let rigid_elements = model.rigid_elements().to_vec();
    let masses = model.masses().to_vec();
    let mut synth = Synthesizer {
        next_node_id: model.max_node_id() + 1,
        model,
        ids,
        connectivity,
        vars_per_node,
        outcome: SynthesisOutcome::default(),
    };
    for rigid in &rigid_elements {
        match rigid {
            RigidElementCard::Rbe2 {
                eid,
                independent_node,
                dependent_nodes,
                components,
            } => synth.rbe2(*eid, *independent_node, dependent_nodes, components)?,
            RigidElementCard::Rbe3 {
                eid,
                dependent_node,
                dependent_components,
                weight_groups,
            } => {
                let dependent_dofs = dof_string_to_mask(dependent_components, vars_per_node);
                let multiplier = synth.add_multiplier_node(*eid, *dependent_node)?;
                let mut conn = vec![synth.resolve(*eid, *dependent_node)?];
                let mut weights = Vec::new();
                let mut independent_dofs = Vec::new();
                for group in weight_groups {
                    let mask = dof_string_to_mask(&group.components, vars_per_node);
                    for &node in &group.nodes {
                        conn.push(synth.resolve(*eid, node)?);
                        weights.push(group.weight);
                        independent_dofs.extend_from_slice(&mask);
                    }
                }
                conn.push(multiplier);
                let object = SynthesizedElement::Rbe3 {
                    num_nodes: conn.len(),
                    dependent_dofs,
                    weights,
                    independent_dofs,
                };
                synth.append(*eid, &conn, object)?;
            }
            RigidElementCard::Unsupported { eid, card } => {
                return Err(MeshLoaderError::UnsupportedRigidElement {
                    eid: *eid,
                    card: card.clone(),
                });
            }
        }
    }

    for mass in &masses {
        let (eid, node, object) = match mass {
            MassCard::Conm2 {
                eid,
                node,
                mass,
                inertia,
            } => (
                *eid,
                *node,
                SynthesizedElement::PointMass(PointMassProperties::from_card(*mass, inertia)),
            ),
            MassCard::Conm1 { eid, node, matrix } => (
                *eid,
                *node,
                SynthesizedElement::GeneralMass(GeneralMassMatrix::from_card(matrix)),
            ),
            MassCard::Unsupported { eid, card } => {
                return Err(MeshLoaderError::UnsupportedMassElement {
                    eid: *eid,
                    card: card.clone(),
                });
            }
        };
        let conn = [synth.resolve(eid, node)?];
        synth.append(eid, &conn, object)?;
    }

    Ok(synth.outcome)
}

struct Synthesizer<'a> {
    model: &'a mut BulkModel,
    ids: &'a mut ModelIdMaps,
    connectivity: &'a mut ConnectivityTable,
    vars_per_node: usize,
    next_node_id: i64,
    outcome: SynthesisOutcome,
}

impl Synthesizer<'_> {
    fn resolve(&self, eid: i64, node: i64) -> Result<usize, MeshLoaderError> {
        self.ids
            .nodes
            .get(node)
            .ok_or(MeshLoaderError::UnknownNode { element: eid, node })
    }

    /// Add a node coincident with `at` and record it as a multiplier node.
    fn add_multiplier_node(&mut self, eid: i64, at: i64) -> Result<usize, MeshLoaderError> {
        let xyz = self
            .model
            .node(at)
            .map(|n| n.xyz)
            .ok_or(MeshLoaderError::UnknownNode { element: eid, node: at })?;
        let external = self.next_node_id;
        self.model.add_grid(external, xyz)?;
        let internal = self.ids.nodes.push(external)?;
        self.next_node_id += 1;
        self.outcome.multiplier_nodes.push(internal);
        Ok(internal)
    }

    fn rbe2(
        &mut self,
        eid: i64,
        independent: i64,
        dependents: &[i64],
        components: &str,
    ) -> Result<(), MeshLoaderError> {
        let mask = dof_string_to_mask(components, self.vars_per_node);
        let mut conn = Vec::with_capacity(1 + 2 * dependents.len());
        conn.push(self.resolve(eid, independent)?);
        for &node in dependents {
            conn.push(self.resolve(eid, node)?);
        }
        let mut dependent_dofs = Vec::with_capacity(mask.len() * dependents.len());
        for &node in dependents {
            dependent_dofs.extend_from_slice(&mask);
            let multiplier = self.add_multiplier_node(eid, node)?;
            conn.push(multiplier);
        }
        let object = SynthesizedElement::Rbe2 {
            num_nodes: conn.len(),
            dependent_dofs,
        };
        self.append(eid, &conn, object)
    }

    fn append(
        &mut self,
        eid: i64,
        conn: &[usize],
        object: SynthesizedElement,
    ) -> Result<(), MeshLoaderError> {
        let element = self.ids.elements.push(eid)?;
        let row = self.connectivity.push(conn);
        if row != element {
            return Err(MeshLoaderError::InvariantViolation(format!(
                "element {eid} numbered {element} but stored as connectivity row {row}"
            )));
        }
        self.outcome.elements.push(SynthesizedEntry {
            eid,
            element,
            object,
        });
        Ok(())
    }
}
