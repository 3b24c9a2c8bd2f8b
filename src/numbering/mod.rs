//! External ↔ internal identifier numbering for nodes, elements and components.

pub mod id_map;

pub use id_map::{IdMap, NOT_FOUND, Translate};

use crate::mesh_error::{EntityKind, MeshLoaderError};
use crate::model::BulkModel;

/// Which numbering a caller's IDs are expressed in.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum NodeOrdering {
    /// Dense, zero-based IDs used by the assembler.
    #[default]
    Internal,
    /// IDs as authored in the interchange file.
    External,
}

/// The three independent maps built from one model.
#[derive(Clone, Debug)]
pub struct ModelIdMaps {
    pub nodes: IdMap,
    pub elements: IdMap,
    pub components: IdMap,
}

impl ModelIdMaps {
    /// Compact node, element and property IDs in the model's natural order.
    pub fn from_model(model: &BulkModel) -> Result<Self, MeshLoaderError> {
        Ok(Self {
            nodes: IdMap::compact(EntityKind::Node, model.node_ids())?,
            elements: IdMap::compact(EntityKind::Element, model.element_ids())?,
            components: IdMap::compact(EntityKind::Property, model.property_ids())?,
        })
    }
}
