//! Mesh topology in assembler numbering.
//!
//! - [`element_family`]: per-family node-order conventions
//! - [`connectivity`]: the flattened element → node table
//! - [`ownership`]: post-partition owner and local-index bookkeeping

pub mod connectivity;
pub mod element_family;
pub mod ownership;

pub use connectivity::ConnectivityTable;
pub use element_family::ElementFamily;
pub use ownership::EntityOwnership;
