//! Concentrated-mass data translated into assembler convention.

use serde::{Deserialize, Serialize};

/// Scalar mass with a symmetric inertia tensor (copied field-for-field).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PointMassProperties {
    pub m: f64,
    pub i11: f64,
    pub i22: f64,
    pub i33: f64,
    pub i12: f64,
    pub i13: f64,
    pub i23: f64,
}

impl PointMassProperties {
    /// From a mass and `[I11, I21, I22, I31, I32, I33]`.
    pub fn from_card(mass: f64, inertia: &[f64; 6]) -> Self {
        let [i11, i12, i22, i13, i23, i33] = *inertia;
        Self {
            m: mass,
            i11,
            i22,
            i33,
            i12,
            i13,
            i23,
        }
    }
}

/// Packed lower triangle (column-major) of a symmetric 6x6 mass matrix.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeneralMassMatrix(pub [f64; 21]);

/// Packed positions of the rotational off-diagonal terms `M54`, `M64`, `M65`.
///
/// The interchange format stores products of inertia with the opposite sign
/// to the assembler, so these three entries are negated on translation.
pub const NEGATED_INERTIA_TERMS: [usize; 3] = [16, 17, 19];

impl GeneralMassMatrix {
    /// Pack the lower triangle of `matrix` and flip the inertia-product signs.
    pub fn from_card(matrix: &[[f64; 6]; 6]) -> Self {
        let mut packed = [0.0; 21];
        let mut k = 0;
        for col in 0..6 {
            for row in matrix.iter().skip(col) {
                packed[k] = row[col];
                k += 1;
            }
        }
        for &pos in &NEGATED_INERTIA_TERMS {
            packed[pos] = -packed[pos];
        }
        Self(packed)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }
}
