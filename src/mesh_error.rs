//! MeshLoaderError: Unified error type for mesh-loader public APIs
//!
//! Every fallible operation in the crate returns this error. Lookups that
//! miss (an unknown external ID, an entity owned by another rank) are *not*
//! errors: they report the [`NOT_FOUND`](crate::numbering::NOT_FOUND)
//! sentinel instead.

use std::fmt;
use thiserror::Error;

/// Entity class an identifier belongs to.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum EntityKind {
    Node,
    Element,
    Property,
    Material,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Node => "node",
            EntityKind::Element => "element",
            EntityKind::Property => "property",
            EntityKind::Material => "material",
        };
        f.write_str(name)
    }
}

/// Unified error type for mesh-loader operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MeshLoaderError {
    /// The model handed to the loader could not be interpreted.
    #[error("Malformed model input: {0}")]
    MalformedModel(String),
    /// Two entities of the same class share an external ID.
    #[error("Duplicate {kind} ID {id}")]
    DuplicateId { kind: EntityKind, id: i64 },
    /// An element or constraint references a node that is not in the model.
    #[error("Element {element} references node {node}, which is not defined in the model")]
    UnknownNode { element: i64, node: i64 },
    /// Rigid element card kind has no synthesis rule.
    #[error("Rigid element of type '{card}' (ID {eid}) is not supported")]
    UnsupportedRigidElement { eid: i64, card: String },
    /// Mass element card kind has no synthesis rule.
    #[error("Mass element of type '{card}' (ID {eid}) is not supported")]
    UnsupportedMassElement { eid: i64, card: String },
    /// Nodes exist that no element references.
    #[error(
        "{count} unattached node(s) were detected in model. \
         Please make sure that all nodes are attached to at least one element."
    )]
    UnattachedNodes { count: usize },
    /// Component index outside `[0, num_components)`.
    #[error("Component index {0} is out of range")]
    UnknownComponent(usize),
    /// Object index outside the element families of a component.
    #[error("Component {component} has no element object at index {index}")]
    ObjectIndexOutOfRange { component: usize, index: usize },
    /// An element-object slot was never filled by the caller.
    #[error("Element object slot {slot} (component {component}, family '{family}') was never assigned")]
    MissingElementObject {
        slot: usize,
        component: usize,
        family: String,
    },
    /// Ownership queries were made before the assembler existed.
    #[error("Assembler has not been created; call `create_assembler` first")]
    AssemblerNotCreated,
    /// `create_assembler` was called twice on the same loader.
    #[error("Assembler was already created for this mesh")]
    AssemblerAlreadyCreated,
    /// The assembler did not report an element partition on the coordinator.
    #[error("Assembler did not report an element partition on the coordinator rank")]
    MissingElementPartition,
    /// Failure raised by the external assembler.
    #[error("Assembler error: {0}")]
    Assembler(String),
    /// Invalid loader configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    /// A data-structure invariant was violated.
    #[error("Invariant violated: {0}")]
    InvariantViolation(String),
}
