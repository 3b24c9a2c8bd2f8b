//! Component (property-group) classification and element-object slots.
//!
//! Elements are grouped by the property they reference. Within a component,
//! each distinct element card name (`CQUAD4`, `CTRIA3`, ...) receives one
//! *object slot*: every element of that (component, family) pair shares the
//! physics object later stored in the slot. Slots are dense and handed out in
//! first-seen file order; synthesized constraint and mass elements each get a
//! private slot after all authored ones.

pub mod labels;
pub mod objects;

pub use labels::{default_label, icem_element_label, property_label};
pub use objects::ElementObjectTable;

use crate::mesh_error::MeshLoaderError;
use crate::model::BulkModel;
use crate::numbering::ModelIdMaps;

/// One property group.
#[derive(Clone, Debug, PartialEq)]
pub struct Component {
    /// External property ID.
    pub property_id: i64,
    /// Display label (authoring-tool name or a generated default).
    pub label: String,
    /// Distinct element card names, first-seen order.
    pub families: Vec<String>,
    /// Object slot of each entry in `families`.
    pub object_slots: Vec<usize>,
    /// Internal IDs of the authored elements in this group, file order.
    pub elements: Vec<usize>,
}

/// Where an object slot came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SlotOrigin {
    Component { component: usize, family: String },
    Synthesized { element: usize },
}

#[derive(Clone, Debug, Default)]
pub struct ComponentRegistry {
    components: Vec<Component>,
    element_components: Vec<usize>,
    element_slots: Vec<usize>,
    slot_origins: Vec<SlotOrigin>,
}

impl ComponentRegistry {
    /// Classify every authored element of `model` in file order.
    ///
    /// Every element's property must already be present in `ids.components`
    /// (the loader synthesizes dummy properties beforehand).
    pub fn classify(model: &BulkModel, ids: &ModelIdMaps) -> Result<Self, MeshLoaderError> {
        let mut registry = Self {
            components: model
                .properties()
                .iter()
                .map(|p| Component {
                    property_id: p.id,
                    label: String::new(),
                    families: Vec::new(),
                    object_slots: Vec::new(),
                    elements: Vec::new(),
                })
                .collect(),
            element_components: Vec::with_capacity(model.num_elements()),
            element_slots: Vec::with_capacity(model.num_elements()),
            slot_origins: Vec::new(),
        };
        let mut element_labels: Vec<Option<String>> = vec![None; registry.components.len()];

        for (element_id, element) in model.elements().iter().enumerate() {
            let component = ids.components.get(element.pid).ok_or_else(|| {
                MeshLoaderError::InvariantViolation(format!(
                    "element {} references property {} with no component",
                    element.id, element.pid
                ))
            })?;
            let family = element.card.trim().to_ascii_uppercase();
            let slot = registry.slot_for(component, &family);
            registry.components[component].elements.push(element_id);
            registry.element_components.push(component);
            registry.element_slots.push(slot);

            if let Some(label) = icem_element_label(&element.comment) {
                element_labels[component] = Some(label);
            }
        }

        for ((component, property), element_label) in registry
            .components
            .iter_mut()
            .zip(model.properties())
            .zip(element_labels)
        {
            // an ICEM family comment on any element overrides the property comment
            component.label = element_label
                .or_else(|| property_label(&property.comment))
                .unwrap_or_else(|| default_label(property.id));
        }
        Ok(registry)
    }

    fn slot_for(&mut self, component: usize, family: &str) -> usize {
        let entry = &mut self.components[component];
        if let Some(pos) = entry.families.iter().position(|f| f == family) {
            return entry.object_slots[pos];
        }
        let slot = self.slot_origins.len();
        entry.families.push(family.to_string());
        entry.object_slots.push(slot);
        self.slot_origins.push(SlotOrigin::Component {
            component,
            family: family.to_string(),
        });
        slot
    }

    /// Allocate a private slot for a synthesized element appended as `element`.
    pub fn push_synthesized(&mut self, element: usize) -> usize {
        let slot = self.slot_origins.len();
        self.slot_origins.push(SlotOrigin::Synthesized { element });
        self.element_slots.push(slot);
        slot
    }

    pub fn num_components(&self) -> usize {
        self.components.len()
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    pub fn component(&self, component: usize) -> Result<&Component, MeshLoaderError> {
        self.components
            .get(component)
            .ok_or(MeshLoaderError::UnknownComponent(component))
    }

    /// Object slot for `(component, index)`, `index` into the component's families.
    pub fn slot(&self, component: usize, index: usize) -> Result<usize, MeshLoaderError> {
        self.component(component)?
            .object_slots
            .get(index)
            .copied()
            .ok_or(MeshLoaderError::ObjectIndexOutOfRange { component, index })
    }

    /// Total number of object slots (authored + synthesized).
    pub fn num_slots(&self) -> usize {
        self.slot_origins.len()
    }

    pub fn slot_origin(&self, slot: usize) -> Option<&SlotOrigin> {
        self.slot_origins.get(slot)
    }

    /// Object slot of every element (authored first, then synthesized).
    pub fn element_slots(&self) -> &[usize] {
        &self.element_slots
    }

    /// Component of every authored element.
    pub fn element_components(&self) -> &[usize] {
        &self.element_components
    }

    pub fn labels(&self) -> Vec<String> {
        self.components.iter().map(|c| c.label.clone()).collect()
    }

    pub fn families(&self) -> Vec<Vec<String>> {
        self.components.iter().map(|c| c.families.clone()).collect()
    }
}
