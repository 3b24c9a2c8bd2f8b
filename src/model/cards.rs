//! Bulk-data cards as delivered by the interchange-file parser.
//!
//! IDs on every card are the *external* IDs authored in the file. They may be
//! sparse and arrive in any order; nothing in this module renumbers them.

use serde::{Deserialize, Serialize};

/// Grid point: external node ID plus basic-frame coordinates.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridPoint {
    pub id: i64,
    pub xyz: [f64; 3],
}

impl GridPoint {
    pub fn new(id: i64, xyz: [f64; 3]) -> Self {
        Self { id, xyz }
    }
}

/// Element connectivity card (`CQUAD4`, `CTRIA3`, `CHEXA`, ...).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ElementCard {
    pub id: i64,
    /// Card name, e.g. `"CQUAD4"`. Case is normalized by the loader.
    pub card: String,
    /// Referenced property ID.
    pub pid: i64,
    /// Node IDs in interchange-format order.
    pub nodes: Vec<i64>,
    /// Free-text comment lines attached to the card by the authoring tool.
    #[serde(default)]
    pub comment: String,
}

impl ElementCard {
    pub fn new(id: i64, card: impl Into<String>, pid: i64, nodes: Vec<i64>) -> Self {
        Self {
            id,
            card: card.into(),
            pid,
            nodes,
            comment: String::new(),
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }
}

/// Property card (`PSHELL`, `PBAR`, ...). Only what the loader needs is kept.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PropertyCard {
    pub id: i64,
    pub card: String,
    #[serde(default)]
    pub material: Option<i64>,
    #[serde(default)]
    pub comment: String,
}

impl PropertyCard {
    pub fn new(id: i64, card: impl Into<String>) -> Self {
        Self {
            id,
            card: card.into(),
            material: None,
            comment: String::new(),
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }
}

/// Isotropic material (`MAT1`).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MaterialCard {
    pub id: i64,
    pub e: f64,
    pub g: f64,
    pub nu: f64,
}

/// One weighted group of independent nodes on an `RBE3` card.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WeightGroup {
    pub weight: f64,
    /// DOF string coupled for every node in the group.
    pub components: String,
    pub nodes: Vec<i64>,
}

/// Rigid/multi-point constraint cards.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "UPPERCASE")]
pub enum RigidElementCard {
    /// Independent node rigidly driving dependent nodes on a shared DOF set.
    Rbe2 {
        eid: i64,
        independent_node: i64,
        dependent_nodes: Vec<i64>,
        /// Coupled DOF string (`CM` field).
        components: String,
    },
    /// Dependent node following a weighted average of independent nodes.
    Rbe3 {
        eid: i64,
        dependent_node: i64,
        /// Dependent DOF string (`REFC` field).
        dependent_components: String,
        weight_groups: Vec<WeightGroup>,
    },
    /// Any other rigid card the parser recognized but the loader cannot build.
    Unsupported { eid: i64, card: String },
}

impl RigidElementCard {
    pub fn eid(&self) -> i64 {
        match self {
            RigidElementCard::Rbe2 { eid, .. }
            | RigidElementCard::Rbe3 { eid, .. }
            | RigidElementCard::Unsupported { eid, .. } => *eid,
        }
    }
}

/// Concentrated mass cards.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "UPPERCASE")]
pub enum MassCard {
    /// Scalar mass with a symmetric inertia tensor, `[I11, I21, I22, I31, I32, I33]`.
    Conm2 {
        eid: i64,
        node: i64,
        mass: f64,
        inertia: [f64; 6],
    },
    /// Full symmetric 6x6 mass matrix; only the lower triangle is read.
    Conm1 {
        eid: i64,
        node: i64,
        matrix: [[f64; 6]; 6],
    },
    Unsupported { eid: i64, card: String },
}

impl MassCard {
    pub fn eid(&self) -> i64 {
        match self {
            MassCard::Conm2 { eid, .. }
            | MassCard::Conm1 { eid, .. }
            | MassCard::Unsupported { eid, .. } => *eid,
        }
    }
}

/// Single-point constraint cards.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "UPPERCASE")]
pub enum SpcCard {
    /// Per-node DOF strings with (possibly non-zero) enforced values.
    Spc {
        sid: i64,
        nodes: Vec<i64>,
        components: Vec<String>,
        enforced: Vec<f64>,
    },
    /// One DOF string applied to every listed node, enforced to zero.
    Spc1 {
        sid: i64,
        components: String,
        nodes: Vec<i64>,
    },
}

impl SpcCard {
    pub fn nodes(&self) -> &[i64] {
        match self {
            SpcCard::Spc { nodes, .. } | SpcCard::Spc1 { nodes, .. } => nodes,
        }
    }

    /// DOF string and enforced value for the `j`-th listed node.
    pub fn constraint_for(&self, j: usize) -> (&str, f64) {
        match self {
            SpcCard::Spc {
                components,
                enforced,
                ..
            } => (
                components.get(j).map(String::as_str).unwrap_or(""),
                enforced.get(j).copied().unwrap_or(0.0),
            ),
            SpcCard::Spc1 { components, .. } => (components.as_str(), 0.0),
        }
    }
}
