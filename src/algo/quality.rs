//! Mean-ratio quality metric for hexahedral cells.
//!
//! The mean-ratio metric measures how close a hexahedron is to being
//! affinely equivalent to a cube. It is 1 for a perfect cube (of any size
//! and orientation), decreases toward 0 as the cell degrades, and vanishes
//! for inverted or degenerate cells.
//!
//! # Definition
//!
//! At each of the 8 vertices, the three edge vectors to designated
//! neighbour vertices span a corner frame `A`. The vertex contributes
//! `3·det(A)^(2/3) / ‖A‖²` when `det(A)` is positive (the corner is
//! positively oriented), and 0 otherwise. The cell quality is the mean of
//! the 8 vertex contributions.

use nalgebra::Point3;

use crate::mesh::BlockMesh;

/// Degeneracy threshold.
///
/// Determinants and qualities at or below this value are treated as zero:
/// a cell whose quality falls below it counts as inverted, and it also
/// serves as the tolerance for quality-key lookups and as the denominator
/// guard in weighted averages.
pub const EPSILON: f64 = 1.0e-300;

/// For vertex `k`, the three neighbour vertices spanning its corner frame.
const V1: [usize; 8] = [3, 0, 1, 2, 7, 4, 5, 6];
const V2: [usize; 8] = [4, 5, 6, 7, 5, 6, 7, 4];
const V3: [usize; 8] = [1, 2, 3, 0, 0, 1, 2, 3];

/// Mean-ratio quality of a hexahedron given its 8 vertices in brick order.
///
/// Returns a value in `[0, 1]`: 1 for a cube, 0 for a fully inverted or
/// degenerate cell. Total over all inputs; never fails.
///
/// # Example
///
/// ```
/// use hexsmooth::algo::quality::mean_ratio;
/// use nalgebra::Point3;
///
/// let cube = [
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(1.0, 1.0, 0.0),
///     Point3::new(0.0, 1.0, 0.0),
///     Point3::new(0.0, 0.0, 1.0),
///     Point3::new(1.0, 0.0, 1.0),
///     Point3::new(1.0, 1.0, 1.0),
///     Point3::new(0.0, 1.0, 1.0),
/// ];
/// assert!((mean_ratio(&cube) - 1.0).abs() < 1e-12);
/// ```
pub fn mean_ratio(hex: &[Point3<f64>; 8]) -> f64 {
    let mut sum = 0.0;
    for k in 0..8 {
        let p1 = hex[V1[k]] - hex[k];
        let p2 = hex[V2[k]] - hex[k];
        let p3 = hex[V3[k]] - hex[k];

        // Determinant of the corner frame with rows p1, p2, p3.
        let sigma = p1.dot(&p2.cross(&p3));

        if sigma > EPSILON {
            let norm_sq = p1.norm_squared() + p2.norm_squared() + p3.norm_squared();
            sum += 3.0 * sigma.powf(2.0 / 3.0) / norm_sq;
        }
    }
    sum / 8.0
}

/// Summary of the quality distribution over a set of cells.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QualitySummary {
    /// Smallest cell quality.
    pub min: f64,
    /// Average cell quality.
    pub avg: f64,
    /// Number of cells with quality below [`EPSILON`].
    pub invalid: usize,
}

impl QualitySummary {
    /// Summarize a slice of per-cell qualities.
    ///
    /// An empty slice yields `min = 1.0`, `avg = 0.0`, `invalid = 0`.
    pub fn from_qualities(qualities: &[f64]) -> Self {
        let mut min = 1.0;
        let mut sum = 0.0;
        let mut invalid = 0;
        for &q in qualities {
            if q < EPSILON {
                invalid += 1;
            }
            if q < min {
                min = q;
            }
            sum += q;
        }
        let avg = if qualities.is_empty() {
            0.0
        } else {
            sum / qualities.len() as f64
        };
        Self { min, avg, invalid }
    }
}

/// Quality summary of every cell of a mesh at its current geometry.
pub fn mesh_quality(mesh: &BlockMesh) -> QualitySummary {
    let qualities: Vec<f64> = mesh
        .cell_ids()
        .map(|c| mean_ratio(&mesh.cell_points(c)))
        .collect();
    QualitySummary::from_qualities(&qualities)
}
