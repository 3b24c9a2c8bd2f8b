//! In-memory interchange model handed to the loader.
//!
//! [`BulkModel`] keeps every card class in file order (a dense `Vec`) next to
//! a sparse external-ID index, so iteration reproduces the authored order
//! while lookups by ID stay O(1). The loader only ever *reads* authored IDs;
//! the one mutation it performs is [`BulkModel::add_grid`] when constraint
//! synthesis appends multiplier nodes.

pub mod cards;

pub use cards::{
    ElementCard, GridPoint, MassCard, MaterialCard, PropertyCard, RigidElementCard, SpcCard,
    WeightGroup,
};

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::mesh_error::{EntityKind, MeshLoaderError};

/// Plain, serializable form of a model: every card list in file order.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BulkModelData {
    pub nodes: Vec<GridPoint>,
    pub elements: Vec<ElementCard>,
    pub properties: Vec<PropertyCard>,
    pub materials: Vec<MaterialCard>,
    pub rigid_elements: Vec<RigidElementCard>,
    pub masses: Vec<MassCard>,
    pub spcs: Vec<SpcCard>,
}

/// Indexed interchange model.
#[derive(Clone, Debug, Default)]
pub struct BulkModel {
    nodes: Vec<GridPoint>,
    node_index: HashMap<i64, usize>,
    elements: Vec<ElementCard>,
    element_index: HashMap<i64, usize>,
    properties: Vec<PropertyCard>,
    property_index: HashMap<i64, usize>,
    materials: Vec<MaterialCard>,
    material_index: HashMap<i64, usize>,
    rigid_elements: Vec<RigidElementCard>,
    masses: Vec<MassCard>,
    spcs: Vec<SpcCard>,
}

impl BulkModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON document shaped like [`BulkModelData`].
    pub fn from_json(text: &str) -> Result<Self, MeshLoaderError> {
        let data: BulkModelData = serde_json::from_str(text)
            .map_err(|e| MeshLoaderError::MalformedModel(e.to_string()))?;
        Self::try_from(data)
    }

    /// Append a grid point. Fails if the ID is already used.
    pub fn add_grid(&mut self, id: i64, xyz: [f64; 3]) -> Result<usize, MeshLoaderError> {
        insert_indexed(
            &mut self.nodes,
            &mut self.node_index,
            GridPoint::new(id, xyz),
            id,
            EntityKind::Node,
        )
    }

    pub fn add_element(&mut self, element: ElementCard) -> Result<usize, MeshLoaderError> {
        if element.nodes.is_empty() {
            return Err(MeshLoaderError::MalformedModel(format!(
                "element {} has no nodes",
                element.id
            )));
        }
        let id = element.id;
        insert_indexed(
            &mut self.elements,
            &mut self.element_index,
            element,
            id,
            EntityKind::Element,
        )
    }

    pub fn add_property(&mut self, property: PropertyCard) -> Result<usize, MeshLoaderError> {
        let id = property.id;
        insert_indexed(
            &mut self.properties,
            &mut self.property_index,
            property,
            id,
            EntityKind::Property,
        )
    }

    pub fn add_material(&mut self, material: MaterialCard) -> Result<usize, MeshLoaderError> {
        let id = material.id;
        insert_indexed(
            &mut self.materials,
            &mut self.material_index,
            material,
            id,
            EntityKind::Material,
        )
    }

    pub fn add_rigid_element(&mut self, rigid: RigidElementCard) {
        self.rigid_elements.push(rigid);
    }

    pub fn add_mass(&mut self, mass: MassCard) {
        self.masses.push(mass);
    }

    pub fn add_spc(&mut self, spc: SpcCard) -> Result<(), MeshLoaderError> {
        if let SpcCard::Spc {
            sid,
            nodes,
            components,
            enforced,
        } = &spc
        {
            if components.len() != nodes.len() || enforced.len() != nodes.len() {
                return Err(MeshLoaderError::MalformedModel(format!(
                    "SPC set {sid} lists {} node(s), {} component string(s) and {} enforced value(s)",
                    nodes.len(),
                    components.len(),
                    enforced.len()
                )));
            }
        }
        self.spcs.push(spc);
        Ok(())
    }

    /// Remove a property card, preserving the order of the rest.
    pub fn remove_property(&mut self, id: i64) -> Option<PropertyCard> {
        let pos = self.property_index.remove(&id)?;
        let removed = self.properties.remove(pos);
        for slot in self.property_index.values_mut() {
            if *slot > pos {
                *slot -= 1;
            }
        }
        Some(removed)
    }

    pub fn nodes(&self) -> &[GridPoint] {
        &self.nodes
    }

    pub fn node(&self, id: i64) -> Option<&GridPoint> {
        self.node_index.get(&id).map(|&i| &self.nodes[i])
    }

    pub fn has_node(&self, id: i64) -> bool {
        self.node_index.contains_key(&id)
    }

    pub fn node_ids(&self) -> impl Iterator<Item = i64> + '_ {
        self.nodes.iter().map(|n| n.id)
    }

    /// Largest external node ID, or 0 for an empty model.
    pub fn max_node_id(&self) -> i64 {
        self.node_ids().max().unwrap_or(0)
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn elements(&self) -> &[ElementCard] {
        &self.elements
    }

    pub fn element(&self, id: i64) -> Option<&ElementCard> {
        self.element_index.get(&id).map(|&i| &self.elements[i])
    }

    pub fn element_ids(&self) -> impl Iterator<Item = i64> + '_ {
        self.elements.iter().map(|e| e.id)
    }

    pub fn num_elements(&self) -> usize {
        self.elements.len()
    }

    pub fn properties(&self) -> &[PropertyCard] {
        &self.properties
    }

    pub fn property(&self, id: i64) -> Option<&PropertyCard> {
        self.property_index.get(&id).map(|&i| &self.properties[i])
    }

    pub fn has_property(&self, id: i64) -> bool {
        self.property_index.contains_key(&id)
    }

    pub fn property_ids(&self) -> impl Iterator<Item = i64> + '_ {
        self.properties.iter().map(|p| p.id)
    }

    pub fn num_properties(&self) -> usize {
        self.properties.len()
    }

    pub fn materials(&self) -> &[MaterialCard] {
        &self.materials
    }

    pub fn has_material(&self, id: i64) -> bool {
        self.material_index.contains_key(&id)
    }

    pub fn rigid_elements(&self) -> &[RigidElementCard] {
        &self.rigid_elements
    }

    pub fn masses(&self) -> &[MassCard] {
        &self.masses
    }

    pub fn spcs(&self) -> &[SpcCard] {
        &self.spcs
    }

    /// Property ID → element IDs referencing it, both in file order.
    /// Every property card appears, possibly with an empty list.
    pub fn property_to_element_ids(&self) -> Vec<(i64, Vec<i64>)> {
        let mut groups: Vec<(i64, Vec<i64>)> =
            self.properties.iter().map(|p| (p.id, Vec::new())).collect();
        for element in &self.elements {
            if let Some(&pos) = self.property_index.get(&element.pid) {
                groups[pos].1.push(element.id);
            }
        }
        groups
    }
}

impl TryFrom<BulkModelData> for BulkModel {
    type Error = MeshLoaderError;

    fn try_from(data: BulkModelData) -> Result<Self, Self::Error> {
        let mut model = BulkModel::new();
        for node in data.nodes {
            model.add_grid(node.id, node.xyz)?;
        }
        for element in data.elements {
            model.add_element(element)?;
        }
        for property in data.properties {
            model.add_property(property)?;
        }
        for material in data.materials {
            model.add_material(material)?;
        }
        for rigid in data.rigid_elements {
            model.add_rigid_element(rigid);
        }
        for mass in data.masses {
            model.add_mass(mass);
        }
        for spc in data.spcs {
            model.add_spc(spc)?;
        }
        Ok(model)
    }
}

fn insert_indexed<T>(
    items: &mut Vec<T>,
    index: &mut HashMap<i64, usize>,
    item: T,
    id: i64,
    kind: EntityKind,
) -> Result<usize, MeshLoaderError> {
    if index.contains_key(&id) {
        return Err(MeshLoaderError::DuplicateId { kind, id });
    }
    let pos = items.len();
    items.push(item);
    index.insert(id, pos);
    Ok(pos)
}
