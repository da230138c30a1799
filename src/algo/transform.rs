//! Dual-element geometric transformation of a hexahedron.
//!
//! One step of the geometric element transformation method (GETMe): the
//! hexahedron is replaced by a regularized copy derived from its dual
//! octahedron, rescaled to preserve the mean edge length, then blended with
//! the original by a relaxation factor. Repeated application drives a cell
//! toward the regular (cubical) shape.
//!
//! # Algorithm
//!
//! 1. Build the dual octahedron: its 6 vertices are averages of 4 hex
//!    vertices each (one per hex face).
//! 2. For each of the octahedron's 8 triangular faces, compute the centroid
//!    and the (unnormalized) face normal. Each face corresponds to one hex
//!    vertex.
//! 3. Offset every face centroid along its normal, scaled by
//!    `offset / √‖normal‖`.
//! 4. Rescale the offset vertices about their centroid so the magnitude of
//!    the mean edge vector matches the original hex.
//! 5. Blend: `(1 − relaxation) · original + relaxation · rescaled`.
//!
//! # Reference
//!
//! Vartziotis, D., Wipper, J. (2011). "A dual element based geometric
//! element transformation method for all-hexahedral mesh smoothing."
//! Computer Methods in Applied Mechanics and Engineering.

use nalgebra::{Point3, Vector3};

use super::quality::EPSILON;

/// Hex-vertex quadruples averaged into the 6 dual-octahedron vertices.
const OCT_VERTICES: [[usize; 4]; 6] = [
    [0, 1, 2, 3],
    [0, 4, 5, 1],
    [1, 5, 6, 2],
    [2, 6, 7, 3],
    [0, 3, 7, 4],
    [4, 7, 6, 5],
];

/// Octahedron-vertex triples forming the face opposite each hex vertex.
const OCT_FACES: [[usize; 3]; 8] = [
    [0, 1, 4],
    [0, 2, 1],
    [0, 3, 2],
    [0, 4, 3],
    [5, 4, 1],
    [5, 1, 2],
    [5, 2, 3],
    [5, 3, 4],
];

/// The 12 hex edges: both quad faces plus the parallel edges joining them.
const EDGES: [(usize, usize); 12] = [
    (0, 1),
    (1, 2),
    (2, 3),
    (3, 0),
    (0, 4),
    (1, 5),
    (2, 6),
    (3, 7),
    (4, 5),
    (5, 6),
    (6, 7),
    (7, 4),
];

/// Mean of the 12 signed edge vectors of a hex.
fn mean_edge(hex: &[Point3<f64>; 8]) -> Vector3<f64> {
    let mut sum = Vector3::zeros();
    for &(a, b) in &EDGES {
        sum += hex[a] - hex[b];
    }
    sum / 12.0
}

/// Apply one dual-element transformation step to a hexahedron.
///
/// `offset` controls how far face centroids are pushed along their normals
/// (larger values regularize more aggressively); `relaxation` in `[0, 1]`
/// blends the result with the input: 0 returns the input unchanged, 1 the
/// fully transformed hex.
///
/// The input must be non-degenerate: zero-magnitude dual-face normals are
/// the caller's responsibility to exclude. A transform whose mean edge
/// vector vanishes cannot be rescaled and yields the input unchanged.
///
/// # Example
///
/// ```
/// use hexsmooth::algo::transform::dual_transform;
/// use nalgebra::Point3;
///
/// let hex = [
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(1.0, 1.0, 0.0),
///     Point3::new(0.0, 1.0, 0.0),
///     Point3::new(0.0, 0.0, 1.0),
///     Point3::new(1.0, 0.0, 1.0),
///     Point3::new(1.0, 1.0, 1.0),
///     Point3::new(0.0, 1.0, 1.0),
/// ];
/// // Zero relaxation is the identity.
/// assert_eq!(dual_transform(&hex, 0.5, 0.0), hex);
/// ```
pub fn dual_transform(
    hex: &[Point3<f64>; 8],
    offset: f64,
    relaxation: f64,
) -> [Point3<f64>; 8] {
    // Dual octahedron vertices.
    let oct: [Point3<f64>; 6] = std::array::from_fn(|i| {
        let [a, b, c, d] = OCT_VERTICES[i];
        Point3::from((hex[a].coords + hex[b].coords + hex[c].coords + hex[d].coords) / 4.0)
    });

    // Offset each dual-face centroid along the face normal.
    let transformed: [Point3<f64>; 8] = std::array::from_fn(|k| {
        let [a, b, c] = OCT_FACES[k];
        let centroid = (oct[a].coords + oct[b].coords + oct[c].coords) / 3.0;
        let normal = (oct[b] - oct[a]).cross(&(oct[c] - oct[a]));
        Point3::from(centroid + offset / normal.norm().sqrt() * normal)
    });

    // Rescale about the transformed centroid to preserve mean edge length.
    let mut center = Vector3::zeros();
    for p in &transformed {
        center += p.coords;
    }
    center /= 8.0;

    let target = mean_edge(hex).norm();
    let current = mean_edge(&transformed).norm();
    if current.is_nan() || current < EPSILON {
        // Vanishing (or NaN, from a fully collapsed input) mean edge: the
        // rescale is undefined, leave the hex alone.
        return *hex;
    }
    let scale = target / current;

    std::array::from_fn(|k| {
        let rescaled = center + scale * (transformed[k].coords - center);
        Point3::from((1.0 - relaxation) * hex[k].coords + relaxation * rescaled)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algo::quality::mean_ratio;
    use approx::assert_relative_eq;

    fn unit_cube() -> [Point3<f64>; 8] {
        [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
            Point3::new(1.0, 0.0, 1.0),
            Point3::new(1.0, 1.0, 1.0),
            Point3::new(0.0, 1.0, 1.0),
        ]
    }

    #[test]
    fn test_zero_relaxation_is_identity() {
        let mut hex = unit_cube();
        hex[0] = Point3::new(0.3, -0.2, 0.1);
        for offset in [0.0, 0.1, 0.5, 2.0] {
            assert_eq!(dual_transform(&hex, offset, 0.0), hex);
        }
    }

    #[test]
    fn test_cube_is_a_fixed_point() {
        // A perfect cube maps onto itself for any offset and relaxation.
        let cube = unit_cube();
        for offset in [0.1, 0.3, 1.0] {
            for relaxation in [0.25, 0.5, 1.0] {
                let out = dual_transform(&cube, offset, relaxation);
                for (a, b) in out.iter().zip(cube.iter()) {
                    assert_relative_eq!(a.coords, b.coords, epsilon = 1e-9);
                }
            }
        }
    }

    #[test]
    fn test_transform_preserves_mean_edge_length() {
        let mut hex = unit_cube();
        hex[0] = Point3::new(0.3, 0.3, 0.3);
        let out = dual_transform(&hex, 0.4, 1.0);
        assert_relative_eq!(
            mean_edge(&out).norm(),
            mean_edge(&hex).norm(),
            epsilon = 1e-10
        );
    }

    #[test]
    fn test_transform_improves_skewed_hex() {
        let mut hex = unit_cube();
        hex[0] = Point3::new(0.3, 0.3, 0.3);
        let before = mean_ratio(&hex);
        let after = mean_ratio(&dual_transform(&hex, 0.4, 0.5));
        assert!(
            after > before,
            "quality did not improve: {} -> {}",
            before,
            after
        );
    }

    #[test]
    fn test_degenerate_transform_returns_input() {
        // All vertices coincident: dual faces have zero normals and the
        // transformed mean edge vanishes, so the input comes back.
        let hex = [Point3::new(1.0, 2.0, 3.0); 8];
        assert_eq!(dual_transform(&hex, 0.3, 0.5), hex);
    }
}
