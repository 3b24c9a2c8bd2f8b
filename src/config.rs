//! Loader configuration.

use serde::{Deserialize, Serialize};

use crate::mesh_error::MeshLoaderError;

/// Isotropic material used for dummy properties synthesized for elements
/// whose property card is missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DummyMaterial {
    pub mid: i64,
    pub e: f64,
    pub g: f64,
    pub nu: f64,
}

impl Default for DummyMaterial {
    fn default() -> Self {
        Self {
            mid: 1,
            e: 70.0,
            g: 35.0,
            nu: 0.3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Generalized degrees of freedom carried by every node.
    pub vars_per_node: usize,
    /// Rank that performs root-only work and emits warnings.
    pub coordinator: usize,
    /// Upper bound on unattached node IDs reported before raising.
    pub max_reported_unattached: usize,
    /// Emit per-entity debug logging on the coordinator.
    pub debug_print: bool,
    pub dummy_material: DummyMaterial,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            vars_per_node: 6,
            coordinator: 0,
            max_reported_unattached: 100,
            debug_print: false,
            dummy_material: DummyMaterial::default(),
        }
    }
}

impl LoaderConfig {
    /// Check the configuration against a process group of `comm_size` ranks.
    pub fn validate(&self, comm_size: usize) -> Result<(), MeshLoaderError> {
        if self.vars_per_node == 0 {
            return Err(MeshLoaderError::InvalidConfig(
                "vars_per_node must be at least 1".into(),
            ));
        }
        if self.coordinator >= comm_size {
            return Err(MeshLoaderError::InvalidConfig(format!(
                "coordinator rank {} is outside a group of {comm_size} rank(s)",
                self.coordinator
            )));
        }
        Ok(())
    }
}
