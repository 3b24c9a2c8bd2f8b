#![cfg_attr(docsrs, feature(doc_cfg))]
//! # mesh-loader
//!
//! mesh-loader turns a parsed finite-element interchange model (grid points,
//! element, property, material, rigid-element, mass and SPC cards with sparse
//! authored IDs) into the dense, reordered input a distributed assembler
//! consumes, and answers ownership queries once the assembler has
//! partitioned the mesh.
//!
//! ## Features
//! - Dense renumbering of nodes, elements and property groups with lookups in
//!   both directions
//! - Connectivity reordered from interchange node order to assembler order
//! - Components (one per property group) labelled from authoring-tool comments
//! - Lagrange-multiplier constraint elements synthesized from `RBE2`/`RBE3`,
//!   point-mass elements from `CONM1`/`CONM2`
//! - SPC consolidation into per-node DOF masks with enforced values
//! - Pluggable communication backends (serial, threads, MPI) for the few
//!   collectives the loader needs
//!
//! ## Usage
//!
//! ```toml
//! [dependencies]
//! mesh-loader = "0.3"
//! # features = ["mpi-support"]
//! ```
//!
//! Call [`MeshLoader::scan`](crate::loader::MeshLoader::scan) on every rank,
//! attach one element object per `(component, family)` slot, then call
//! [`MeshLoader::create_assembler`](crate::loader::MeshLoader::create_assembler)
//! on every rank.

pub mod algs;
pub mod assembler;
pub mod components;
pub mod config;
pub mod constraints;
pub mod data;
pub mod debug_invariants;
pub mod distribution;
pub mod loader;
pub mod mesh_error;
pub mod model;
pub mod numbering;
pub mod topology;

pub use debug_invariants::DebugInvariants;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    pub use crate::algs::communicator::{Communicator, NoComm, ThreadComm};
    #[cfg(feature = "mpi-support")]
    pub use crate::algs::communicator::MpiComm;
    pub use crate::assembler::{
        AssemblerHandoff, AssemblerInput, ElementObject, PartitionedAssembler, SerialAssembler,
    };
    pub use crate::config::LoaderConfig;
    pub use crate::constraints::SynthesizedElement;
    pub use crate::debug_invariants::DebugInvariants;
    pub use crate::loader::{LoadDiagnostics, MeshLoader};
    pub use crate::mesh_error::MeshLoaderError;
    pub use crate::model::BulkModel;
    pub use crate::numbering::{NOT_FOUND, NodeOrdering};
}
