//! Quadrature rules on the reference cells.
//!
//! A rule is a pair of weights and points. Reference cells are `[-1, 1]^d` for lines, quads
//! and hexes, the unit simplex for triangles and tets, and the unit triangle times `[-1, 1]`
//! for prisms.
pub mod simplex;
pub mod tensor;
pub mod univariate;

pub type Rule<const D: usize> = (Vec<f64>, Vec<[f64; D]>);

/// Embeds the points of a rule in 3D, padding with zeros.
pub fn pad_points<const D: usize>(points: &[[f64; D]]) -> Vec<[f64; 3]> {
    points
        .iter()
        .map(|p| {
            let mut padded = [0.0; 3];
            padded[..D].copy_from_slice(p);
            padded
        })
        .collect()
}
