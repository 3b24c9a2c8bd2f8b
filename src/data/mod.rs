//! Per-node data: DOF strings, boundary conditions and mass properties.

/// Boundary-condition consolidation.
pub mod bc;
/// DOF-string decoding.
pub mod dof;
/// Concentrated-mass translation.
pub mod mass;

pub use bc::{
    BoundaryConditionArrays, BoundaryConditionTable, ConsolidatedBoundaryConditions,
    consolidate_boundary_conditions,
};
pub use dof::{constrained_dofs, dof_string_to_mask, is_dof_in_string};
pub use mass::{GeneralMassMatrix, PointMassProperties};
