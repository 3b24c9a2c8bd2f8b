//! Element families and their node-order conventions.
//!
//! The interchange format lists corner and mid-side nodes in a different
//! order than the assembler expects for some families. Each table below maps
//! output position `k` to input position `ORDER[k]`.

/// 4-node quadrilateral: interchange `[A, B, C, D]` → `[A, B, D, C]`.
pub const QUAD4_ORDER: [usize; 4] = [0, 1, 3, 2];
/// 9-node quadrilateral.
pub const QUAD9_ORDER: [usize; 9] = [0, 4, 1, 7, 8, 5, 3, 6, 2];
/// 8-node hexahedron.
pub const HEX8_ORDER: [usize; 8] = [0, 1, 3, 2, 4, 5, 7, 6];

/// Element families that need a non-identity node permutation.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum ElementFamily {
    /// `CQUAD4`, `CQUADR`.
    Quad4,
    /// `CQUAD9`, `CQUAD`.
    Quad9,
    /// `CHEXA8`, `CHEXA`.
    Hex8,
    /// Everything else keeps the authored order.
    #[default]
    Other,
}

impl ElementFamily {
    /// Classify a card name (case-insensitive).
    pub fn from_card(card: &str) -> Self {
        match card.trim().to_ascii_uppercase().as_str() {
            "CQUAD4" | "CQUADR" => ElementFamily::Quad4,
            "CQUAD9" | "CQUAD" => ElementFamily::Quad9,
            "CHEXA8" | "CHEXA" => ElementFamily::Hex8,
            _ => ElementFamily::Other,
        }
    }

    /// Permutation table, or `None` for identity families.
    pub fn node_order(self) -> Option<&'static [usize]> {
        match self {
            ElementFamily::Quad4 => Some(&QUAD4_ORDER),
            ElementFamily::Quad9 => Some(&QUAD9_ORDER),
            ElementFamily::Hex8 => Some(&HEX8_ORDER),
            ElementFamily::Other => None,
        }
    }

    /// Reorder an authored node list into assembler order.
    ///
    /// The permutation only applies when the list length matches the table
    /// (a 20-node `CHEXA` keeps its authored order).
    pub fn reorder<T: Copy>(self, nodes: &[T]) -> Vec<T> {
        match self.node_order() {
            Some(order) if order.len() == nodes.len() => order.iter().map(|&k| nodes[k]).collect(),
            _ => nodes.to_vec(),
        }
    }
}
