//! Compact DOF-string decoding (`"123456"`, `"1346"`, ...).
//!
//! A DOF string lists 1-based degree-of-freedom numbers as digits. Digit `0`
//! stands for DOF 7, which the interchange format has no digit for; a `'7'`
//! character is therefore never matched.

/// Returns true if 1-based `dof` appears in `components`.
pub fn is_dof_in_string(components: &str, dof: usize) -> bool {
    let digit = match dof {
        7 => '0',
        1..=6 | 8 | 9 => match char::from_digit(dof as u32, 10) {
            Some(c) => c,
            None => return false,
        },
        _ => return false,
    };
    components.contains(digit)
}

/// Decode `components` into one flag per DOF (`num_dofs` entries).
///
/// `"123"` over 6 DOFs → `[true, true, true, false, false, false]`.
pub fn dof_string_to_mask(components: &str, num_dofs: usize) -> Vec<bool> {
    (1..=num_dofs)
        .map(|dof| is_dof_in_string(components, dof))
        .collect()
}

/// Zero-based indices of the flagged DOFs.
pub fn constrained_dofs(components: &str, num_dofs: usize) -> Vec<usize> {
    (0..num_dofs)
        .filter(|&dof| is_dof_in_string(components, dof + 1))
        .collect()
}
