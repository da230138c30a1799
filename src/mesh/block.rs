//! Block mesh view: points, hexahedral cells, and boundary patches.
//!
//! A [`BlockMesh`] is the product of decomposing a multi-block topological
//! description into hexahedral cells. The smoothing algorithms consume this
//! view: they read cell connectivity and patch membership, and mutate point
//! positions in place. Cell connectivity and patches are never mutated.
//!
//! # Vertex ordering
//!
//! Each cell is an ordered 8-tuple of point indices in the canonical "brick"
//! ordering: vertices 0–3 form one quadrilateral face, 4–7 the opposite face,
//! with 0–4, 1–5, 2–6 and 3–7 as the parallel edges joining them.
//!
//! ```text
//!        7 ─────── 6
//!       /│        /│
//!      4 ─────── 5 │
//!      │ 3 ──────│─2
//!      │/        │/
//!      0 ─────── 1
//! ```

use nalgebra::Point3;

use super::index::{CellId, PointId};
use crate::error::{MeshError, Result};

/// A hexahedral cell: an ordered 8-tuple of point indices in brick ordering.
#[derive(Debug, Clone, Copy)]
pub struct HexCell {
    points: [PointId; 8],
}

impl HexCell {
    /// Create a cell from its 8 point indices.
    pub fn new(points: [PointId; 8]) -> Self {
        Self { points }
    }

    /// Create a cell from raw `usize` indices.
    pub fn from_indices(indices: [usize; 8]) -> Self {
        Self {
            points: indices.map(PointId::new),
        }
    }

    /// The 8 point indices of this cell, in brick order.
    #[inline]
    pub fn point_ids(&self) -> &[PointId; 8] {
        &self.points
    }

    /// Gather the 8 vertex positions of this cell from the global point array.
    #[inline]
    pub fn points(&self, points: &[Point3<f64>]) -> [Point3<f64>; 8] {
        std::array::from_fn(|i| points[self.points[i].index()])
    }
}

/// A boundary patch: a named list of faces, each face a list of point indices.
///
/// Patches are used only to decide which points are fixed during smoothing;
/// their faces are never walked geometrically.
#[derive(Debug, Clone)]
pub struct Patch {
    name: String,
    faces: Vec<Vec<PointId>>,
}

impl Patch {
    /// Create a patch from a name and its faces.
    pub fn new(name: impl Into<String>, faces: Vec<Vec<PointId>>) -> Self {
        Self {
            name: name.into(),
            faces,
        }
    }

    /// The patch name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The faces of this patch.
    pub fn faces(&self) -> &[Vec<PointId>] {
        &self.faces
    }
}

/// A hexahedral block mesh: a mutable point array, immutable cell
/// connectivity, and the boundary patches.
///
/// # Example
///
/// ```
/// use hexsmooth::mesh::{BlockMesh, HexCell};
/// use nalgebra::Point3;
///
/// let points = vec![
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(1.0, 1.0, 0.0),
///     Point3::new(0.0, 1.0, 0.0),
///     Point3::new(0.0, 0.0, 1.0),
///     Point3::new(1.0, 0.0, 1.0),
///     Point3::new(1.0, 1.0, 1.0),
///     Point3::new(0.0, 1.0, 1.0),
/// ];
/// let cells = vec![HexCell::from_indices([0, 1, 2, 3, 4, 5, 6, 7])];
///
/// let mesh = BlockMesh::new(points, cells, Vec::new()).unwrap();
/// assert_eq!(mesh.num_points(), 8);
/// assert_eq!(mesh.num_cells(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct BlockMesh {
    points: Vec<Point3<f64>>,
    cells: Vec<HexCell>,
    patches: Vec<Patch>,
}

impl BlockMesh {
    /// Create a mesh from points, cells, and patches.
    ///
    /// Every point index referenced by a cell or a patch face must be in
    /// range for the point array.
    pub fn new(
        points: Vec<Point3<f64>>,
        cells: Vec<HexCell>,
        patches: Vec<Patch>,
    ) -> Result<Self> {
        for (ci, cell) in cells.iter().enumerate() {
            for id in cell.point_ids() {
                if id.index() >= points.len() {
                    return Err(MeshError::InvalidPointIndex {
                        cell: ci,
                        point: id.index(),
                    });
                }
            }
        }
        for patch in &patches {
            for face in patch.faces() {
                for id in face {
                    if id.index() >= points.len() {
                        return Err(MeshError::InvalidPatchPoint {
                            patch: patch.name().to_string(),
                            point: id.index(),
                        });
                    }
                }
            }
        }
        Ok(Self {
            points,
            cells,
            patches,
        })
    }

    /// Number of points.
    #[inline]
    pub fn num_points(&self) -> usize {
        self.points.len()
    }

    /// Number of cells.
    #[inline]
    pub fn num_cells(&self) -> usize {
        self.cells.len()
    }

    /// The global point array.
    #[inline]
    pub fn points(&self) -> &[Point3<f64>] {
        &self.points
    }

    /// Position of a single point.
    #[inline]
    pub fn point(&self, id: PointId) -> &Point3<f64> {
        &self.points[id.index()]
    }

    /// Move a point to a new position.
    #[inline]
    pub fn set_point(&mut self, id: PointId, position: Point3<f64>) {
        self.points[id.index()] = position;
    }

    /// All cells.
    #[inline]
    pub fn cells(&self) -> &[HexCell] {
        &self.cells
    }

    /// A single cell.
    #[inline]
    pub fn cell(&self, id: CellId) -> &HexCell {
        &self.cells[id.index()]
    }

    /// Iterate over all cell ids.
    pub fn cell_ids(&self) -> impl Iterator<Item = CellId> + '_ {
        (0..self.cells.len()).map(CellId::new)
    }

    /// The 8 vertex positions of a cell at its current geometry.
    #[inline]
    pub fn cell_points(&self, id: CellId) -> [Point3<f64>; 8] {
        self.cells[id.index()].points(&self.points)
    }

    /// The boundary patches.
    #[inline]
    pub fn patches(&self) -> &[Patch] {
        &self.patches
    }
}
