//! Point-to-cell connectivity and the fixed/mobile point partition.
//!
//! The smoothers need two views of the mesh that the cell array does not
//! give directly: for every point, the cells it belongs to, and whether the
//! point lies on a boundary patch (fixed) or may move (mobile). Both are
//! built once from a [`BlockMesh`] and are immutable afterwards.

use std::collections::BTreeSet;

use super::block::BlockMesh;
use super::index::{CellId, PointId};

/// Point-to-cell incidence plus the fixed/mobile partition of the points.
///
/// Two incidence structures are kept per point:
///
/// - An ordered corner list, one entry per *occurrence* of the point in a
///   cell, carrying the cell and the local corner index. The simultaneous
///   smoother walks this list when averaging the transformed positions each
///   incident cell proposes for the point. A point appearing twice in one
///   cell (not expected for well-formed hexes, but treated as data) yields
///   two entries.
/// - A cell set, used by the sequential smoother to propagate the impact of
///   moving a cell's vertices to every cell sharing one of them.
#[derive(Debug, Clone)]
pub struct Connectivity {
    incident_corners: Vec<Vec<(CellId, u8)>>,
    incident_cell_set: Vec<BTreeSet<CellId>>,
    fixed_points: BTreeSet<PointId>,
    mobile_points: Vec<PointId>,
}

impl Connectivity {
    /// Build the connectivity for a mesh.
    ///
    /// Scans every cell once; unions all patch-face points into the fixed
    /// set, and collects the remaining points, in ascending index order, as
    /// the mobile set.
    pub fn build(mesh: &BlockMesh) -> Self {
        let num_points = mesh.num_points();
        let mut incident_corners = vec![Vec::new(); num_points];
        let mut incident_cell_set = vec![BTreeSet::new(); num_points];

        for (ci, cell) in mesh.cells().iter().enumerate() {
            let cell_id = CellId::new(ci);
            for (corner, id) in cell.point_ids().iter().enumerate() {
                incident_corners[id.index()].push((cell_id, corner as u8));
                incident_cell_set[id.index()].insert(cell_id);
            }
        }

        let mut fixed_points = BTreeSet::new();
        for patch in mesh.patches() {
            for face in patch.faces() {
                fixed_points.extend(face.iter().copied());
            }
        }

        let mobile_points = (0..num_points)
            .map(PointId::new)
            .filter(|p| !fixed_points.contains(p))
            .collect();

        Self {
            incident_corners,
            incident_cell_set,
            fixed_points,
            mobile_points,
        }
    }

    /// The (cell, local corner) occurrences of a point, in cell scan order.
    #[inline]
    pub fn incident_corners(&self, p: PointId) -> &[(CellId, u8)] {
        &self.incident_corners[p.index()]
    }

    /// The set of cells a point belongs to.
    #[inline]
    pub fn incident_cells(&self, p: PointId) -> &BTreeSet<CellId> {
        &self.incident_cell_set[p.index()]
    }

    /// Points lying on at least one patch face.
    #[inline]
    pub fn fixed_points(&self) -> &BTreeSet<PointId> {
        &self.fixed_points
    }

    /// Whether a point is fixed.
    #[inline]
    pub fn is_fixed(&self, p: PointId) -> bool {
        self.fixed_points.contains(&p)
    }

    /// Points free to move, in ascending index order.
    #[inline]
    pub fn mobile_points(&self) -> &[PointId] {
        &self.mobile_points
    }
}
