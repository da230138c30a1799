//! GETMe smoothing of hexahedral block meshes.
//!
//! This module provides the two smoothing passes of the geometric element
//! transformation method and the driver that chains them:
//!
//! - [`simultaneous_smooth`]: every cell proposes transformed positions for
//!   its vertices; every mobile point moves to a quality-weighted average of
//!   the proposals. Runs for a fixed number of sweeps.
//! - [`sequential_smooth`]: repeatedly transforms the globally worst cell,
//!   tracked in a quality-ordered priority structure with penalty-based
//!   reinsertion. Runs until progress stagnates.
//! - [`getme_smooth`]: builds the connectivity, then runs both passes with
//!   parameters taken from a [`SmootherConfig`].
//!
//! Points on boundary patches are fixed during the simultaneous pass; cell
//! connectivity is never modified by either pass.
//!
//! # Example
//!
//! ```
//! use hexsmooth::algo::smooth::{simultaneous_smooth, SimultaneousOptions};
//! use hexsmooth::mesh::{BlockMesh, Connectivity, HexCell};
//! use nalgebra::Point3;
//!
//! let mut points = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(1.0, 1.0, 0.0),
//!     Point3::new(0.0, 1.0, 0.0),
//!     Point3::new(0.0, 0.0, 1.0),
//!     Point3::new(1.0, 0.0, 1.0),
//!     Point3::new(1.0, 1.0, 1.0),
//!     Point3::new(0.0, 1.0, 1.0),
//! ];
//! points[0] = Point3::new(0.2, 0.2, 0.2); // skew one corner
//! let cells = vec![HexCell::from_indices([0, 1, 2, 3, 4, 5, 6, 7])];
//! let mut mesh = BlockMesh::new(points, cells, Vec::new()).unwrap();
//!
//! let connectivity = Connectivity::build(&mesh);
//! let options = SimultaneousOptions::default().with_sweeps(5);
//! simultaneous_smooth(&mut mesh, &connectivity, &options);
//! ```

use std::collections::BTreeSet;

use nalgebra::{Point3, Vector3};
use rayon::prelude::*;

use super::priority::QualityMap;
use super::progress::{Progress, SmoothEvent};
use super::quality::{mean_ratio, QualitySummary, EPSILON};
use super::transform::dual_transform;
use crate::config::SmootherConfig;
use crate::mesh::{BlockMesh, CellId, Connectivity, PointId};

/// Number of consecutive no-progress steps after which the sequential
/// smoother terminates.
pub const NO_EFFECT_LIMIT: usize = 10;

/// Options for the simultaneous smoothing pass.
#[derive(Debug, Clone)]
pub struct SimultaneousOptions {
    /// Transform offset applied to a perfect cell (quality 1).
    pub quality_min: f64,

    /// Transform offset applied to a fully degenerate cell (quality 0).
    /// The offset for intermediate cells is interpolated linearly, so worse
    /// cells are regularized more aggressively.
    pub quality_max: f64,

    /// Relaxation of the per-cell transform (0 = no movement, 1 = full).
    pub relaxation: f64,

    /// Exponent applied to the inverse-quality weights when averaging the
    /// positions proposed by the cells incident to a point. Larger values
    /// let worse cells dominate.
    pub weight_exponent: f64,

    /// Number of sweeps to run.
    pub sweeps: usize,

    /// Whether to run the per-cell and per-point passes in parallel.
    pub parallel: bool,
}

impl Default for SimultaneousOptions {
    fn default() -> Self {
        Self {
            quality_min: 0.1,
            quality_max: 0.4,
            relaxation: 0.5,
            weight_exponent: 2.0,
            sweeps: 10,
            parallel: true,
        }
    }
}

impl SimultaneousOptions {
    /// Set the number of sweeps.
    pub fn with_sweeps(mut self, sweeps: usize) -> Self {
        self.sweeps = sweeps;
        self
    }

    /// Set the transform offset range (perfect cell, degenerate cell).
    pub fn with_quality_range(mut self, quality_min: f64, quality_max: f64) -> Self {
        self.quality_min = quality_min;
        self.quality_max = quality_max;
        self
    }

    /// Set the transform relaxation.
    pub fn with_relaxation(mut self, relaxation: f64) -> Self {
        self.relaxation = relaxation;
        self
    }

    /// Set the weight exponent for the per-point average.
    pub fn with_weight_exponent(mut self, weight_exponent: f64) -> Self {
        self.weight_exponent = weight_exponent;
        self
    }

    /// Set whether to use parallel execution.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Create options for single-threaded execution.
    pub fn single_threaded(mut self) -> Self {
        self.parallel = false;
        self
    }
}

/// Options for the sequential (worst-cell-first) smoothing pass.
#[derive(Debug, Clone)]
pub struct SequentialOptions {
    /// Transform offset applied to the worst cell.
    pub transform_offset: f64,

    /// Relaxation of the worst-cell transform.
    pub relaxation: f64,

    /// Baseline shift added after every step. The minimum quality must grow
    /// by at least this much per step to count as progress, so a stalled
    /// mesh stops within [`NO_EFFECT_LIMIT`] steps.
    pub min_change: f64,

    /// Penalty assigned when the transform would invert an impacted cell.
    /// The move is rolled back and the priority structure is left unchanged,
    /// so the cell is retried once its neighborhood has shifted.
    pub penalty_invalid: f64,

    /// Penalty added to the target's new quality key when the same cell is
    /// smoothed twice in a row.
    pub penalty_repeat: f64,

    /// Penalty added to the target's new quality key otherwise. Burying a
    /// just-improved cell in the queue forces the smoother to diversify.
    pub penalty_step: f64,
}

impl Default for SequentialOptions {
    fn default() -> Self {
        Self {
            transform_offset: 0.3,
            relaxation: 0.5,
            min_change: 1e-4,
            penalty_invalid: 0.1,
            penalty_repeat: 0.4,
            penalty_step: 0.2,
        }
    }
}

impl SequentialOptions {
    /// Set the transform offset.
    pub fn with_transform_offset(mut self, transform_offset: f64) -> Self {
        self.transform_offset = transform_offset;
        self
    }

    /// Set the transform relaxation.
    pub fn with_relaxation(mut self, relaxation: f64) -> Self {
        self.relaxation = relaxation;
        self
    }

    /// Set the per-step baseline shift.
    pub fn with_min_change(mut self, min_change: f64) -> Self {
        self.min_change = min_change;
        self
    }

    /// Set the three penalties (invalid attempt, repeat target, successor).
    pub fn with_penalties(mut self, invalid: f64, repeat: f64, successor: f64) -> Self {
        self.penalty_invalid = invalid;
        self.penalty_repeat = repeat;
        self.penalty_step = successor;
        self
    }
}

/// Outcome of the simultaneous pass.
#[derive(Debug, Clone, Copy)]
pub struct SimultaneousReport {
    /// Number of sweeps run.
    pub sweeps: usize,
    /// Quality distribution measured during the last sweep, if any ran.
    pub final_sweep: Option<QualitySummary>,
}

/// Outcome of the sequential pass.
#[derive(Debug, Clone, Copy)]
pub struct SequentialReport {
    /// Number of worst-cell steps run.
    pub steps: usize,
    /// Smallest key in the priority structure on exit.
    pub min_quality: f64,
}

/// Combined outcome of both passes.
#[derive(Debug, Clone, Copy)]
pub struct SmoothReport {
    /// Simultaneous pass outcome.
    pub simultaneous: SimultaneousReport,
    /// Sequential pass outcome.
    pub sequential: SequentialReport,
}

/// Run the full GETMe smoothing pipeline on a mesh.
///
/// Builds the point-to-cell connectivity, runs the simultaneous pass for
/// the configured number of sweeps, then the sequential pass until it
/// stagnates.
///
/// # Example
///
/// ```
/// use hexsmooth::algo::smooth::getme_smooth;
/// use hexsmooth::config::SmootherConfig;
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
/// let mut mesh = BlockMesh::new(points, cells, Vec::new()).unwrap();
///
/// let config = SmootherConfig {
///     quality_factor_min: 0.1,
///     quality_factor_max: 0.4,
///     relaxation: 0.5,
///     cell_average_exponent: 2.0,
///     max_simultaneous_iterations: 3,
///     sequential_transform: 0.3,
///     sequential_relaxation: 0.5,
///     sequential_minimal_change: 1e-3,
///     penalty_invalid: 0.1,
///     penalty_repeat: 0.4,
///     penalty_step: 0.2,
/// };
/// let report = getme_smooth(&mut mesh, &config);
/// assert_eq!(report.simultaneous.sweeps, 3);
/// ```
pub fn getme_smooth(mesh: &mut BlockMesh, config: &SmootherConfig) -> SmoothReport {
    getme_smooth_with_progress(mesh, config, &Progress::none())
}

/// [`getme_smooth`] with progress reporting.
pub fn getme_smooth_with_progress(
    mesh: &mut BlockMesh,
    config: &SmootherConfig,
    progress: &Progress,
) -> SmoothReport {
    let connectivity = Connectivity::build(mesh);
    let simultaneous = simultaneous_smooth_with_progress(
        mesh,
        &connectivity,
        &config.simultaneous_options(),
        progress,
    );
    let sequential = sequential_smooth_with_progress(
        mesh,
        &connectivity,
        &config.sequential_options(),
        progress,
    );
    SmoothReport {
        simultaneous,
        sequential,
    }
}

/// Run the simultaneous smoothing pass.
///
/// One sweep transforms every cell, then moves every mobile point to the
/// inverse-quality-weighted average of the positions its incident cells
/// propose for it. If the update leaves more points on invalid cells than
/// there were invalid cells before the sweep, those points are rolled back
/// to their pre-sweep positions.
///
/// Fixed points (on any patch) are never moved.
pub fn simultaneous_smooth(
    mesh: &mut BlockMesh,
    connectivity: &Connectivity,
    options: &SimultaneousOptions,
) -> SimultaneousReport {
    simultaneous_smooth_with_progress(mesh, connectivity, options, &Progress::none())
}

/// [`simultaneous_smooth`] with progress reporting.
pub fn simultaneous_smooth_with_progress(
    mesh: &mut BlockMesh,
    connectivity: &Connectivity,
    options: &SimultaneousOptions,
    progress: &Progress,
) -> SimultaneousReport {
    let num_cells = mesh.num_cells();
    let mut final_sweep = None;

    for sweep in 0..options.sweeps {
        // Per-cell pass: quality and transformed hex for every cell. Each
        // cell writes only its own slot, so this parallelizes untouched.
        let (qualities, transformed): (Vec<f64>, Vec<[Point3<f64>; 8]>) = {
            let cell_pass = |ci: usize| {
                let hex = mesh.cell_points(CellId::new(ci));
                let quality = mean_ratio(&hex);
                let offset = options.quality_min
                    + (options.quality_max - options.quality_min) * (1.0 - quality);
                (quality, dual_transform(&hex, offset, options.relaxation))
            };
            if options.parallel {
                (0..num_cells).into_par_iter().map(cell_pass).unzip()
            } else {
                (0..num_cells).map(cell_pass).unzip()
            }
        };

        let stats = QualitySummary::from_qualities(&qualities);
        log::info!(
            "sweep {}: avg quality {:.6}, min quality {:.6}, {} invalid cells",
            sweep,
            stats.avg,
            stats.min,
            stats.invalid
        );
        progress.report(SmoothEvent::SimultaneousSweep {
            sweep,
            total: options.sweeps,
            stats,
        });

        let old_points: Vec<Point3<f64>> = mesh.points().to_vec();

        // Per-point update: weighted average of the positions proposed by
        // the incident cells, worse cells weighted more heavily.
        let new_positions: Vec<(PointId, Point3<f64>)> = {
            let point_pass = |&p: &PointId| {
                let corners = connectivity.incident_corners(p);
                if corners.is_empty() {
                    return (p, *mesh.point(p));
                }
                let mut weight_sum = 0.0;
                let mut weighted = Vector3::zeros();
                for &(cell, corner) in corners {
                    let weight =
                        (1.0 - qualities[cell.index()]).powf(options.weight_exponent);
                    weight_sum += weight;
                    weighted += transformed[cell.index()][corner as usize].coords * weight;
                }
                let n = corners.len() as f64;
                weight_sum /= n;
                weighted /= n;
                (p, Point3::from(weighted / (weight_sum + EPSILON)))
            };
            if options.parallel {
                connectivity.mobile_points().par_iter().map(point_pass).collect()
            } else {
                connectivity.mobile_points().iter().map(point_pass).collect()
            }
        };
        for (p, position) in new_positions {
            mesh.set_point(p, position);
        }

        // Roll back points sitting on invalid cells, but only when the
        // update created invalidity beyond what the sweep started with.
        let mut to_revert = invalid_cell_points(mesh);
        while to_revert.len() > stats.invalid {
            for &p in &to_revert {
                mesh.set_point(p, old_points[p.index()]);
            }
            log::info!(
                "sweep {}: reverted {} points to their previous positions",
                sweep,
                to_revert.len()
            );
            progress.report(SmoothEvent::PointsReverted {
                sweep,
                count: to_revert.len(),
            });

            let recomputed = invalid_cell_points(mesh);
            if recomputed == to_revert {
                // Reverting again cannot change anything: these points sit
                // on cells that were invalid before the sweep as well.
                log::warn!(
                    "sweep {}: {} points remain on invalid cells after revert",
                    sweep,
                    recomputed.len()
                );
                break;
            }
            to_revert = recomputed;
        }

        final_sweep = Some(stats);
    }

    if options.sweeps != 0 {
        log::info!(
            "simultaneous smoothing finished after {} sweeps",
            options.sweeps
        );
    }
    SimultaneousReport {
        sweeps: options.sweeps,
        final_sweep,
    }
}

/// Points belonging to any cell that is currently invalid.
fn invalid_cell_points(mesh: &BlockMesh) -> BTreeSet<PointId> {
    let mut points = BTreeSet::new();
    for c in mesh.cell_ids() {
        if mean_ratio(&mesh.cell_points(c)) < EPSILON {
            points.extend(mesh.cell(c).point_ids().iter().copied());
        }
    }
    points
}

/// Loop state of the sequential pass.
struct SequentialState {
    quality_map: QualityMap,
    cell_quality: Vec<f64>,
    /// Progress baseline: last minimum key plus the configured shift.
    baseline: f64,
    target: CellId,
    previous: Option<CellId>,
    no_effect: usize,
    steps: usize,
    last_min: f64,
}

impl SequentialState {
    /// Build the priority structures from the mesh's current geometry.
    /// Returns `None` for a mesh without cells.
    fn init(mesh: &BlockMesh) -> Option<Self> {
        let mut quality_map = QualityMap::new();
        let mut cell_quality = Vec::with_capacity(mesh.num_cells());
        for c in mesh.cell_ids() {
            let quality = mean_ratio(&mesh.cell_points(c));
            quality_map.insert(quality, c);
            cell_quality.push(quality);
        }
        let (min_key, min_cell) = quality_map.min()?;
        Some(Self {
            quality_map,
            cell_quality,
            baseline: min_key,
            target: min_cell,
            previous: None,
            no_effect: 0,
            steps: 0,
            last_min: min_key,
        })
    }
}

/// Run the sequential smoothing pass.
///
/// Builds a quality-ordered priority structure over all cells, then
/// repeatedly transforms the worst cell. An accepted move re-keys the
/// target with a penalty so the queue diversifies; a move that would invert
/// any impacted cell is rolled back exactly. Terminates once
/// [`NO_EFFECT_LIMIT`] consecutive steps fail to raise the minimum quality
/// past a baseline that itself rises by `min_change` per step.
///
/// Unlike the simultaneous pass, the worst-cell transform moves all 8
/// vertices of the target, whether or not they lie on a patch.
pub fn sequential_smooth(
    mesh: &mut BlockMesh,
    connectivity: &Connectivity,
    options: &SequentialOptions,
) -> SequentialReport {
    sequential_smooth_with_progress(mesh, connectivity, options, &Progress::none())
}

/// [`sequential_smooth`] with progress reporting.
pub fn sequential_smooth_with_progress(
    mesh: &mut BlockMesh,
    connectivity: &Connectivity,
    options: &SequentialOptions,
    progress: &Progress,
) -> SequentialReport {
    let Some(mut state) = SequentialState::init(mesh) else {
        return SequentialReport {
            steps: 0,
            min_quality: 1.0,
        };
    };

    while state.no_effect < NO_EFFECT_LIMIT {
        sequential_step(mesh, connectivity, options, &mut state);
        log::debug!(
            "step {}: min quality {:.6} ({} ineffective steps)",
            state.steps,
            state.last_min,
            state.no_effect
        );
        progress.report(SmoothEvent::SequentialStep {
            step: state.steps - 1,
            min_quality: state.last_min,
            no_effect_steps: state.no_effect,
        });
    }

    log::info!(
        "sequential smoothing finished after {} steps, minimal quality {:.6}",
        state.steps,
        state.last_min
    );
    SequentialReport {
        steps: state.steps,
        min_quality: state.last_min,
    }
}

/// One worst-cell step of the sequential pass.
fn sequential_step(
    mesh: &mut BlockMesh,
    connectivity: &Connectivity,
    options: &SequentialOptions,
    state: &mut SequentialState,
) {
    let target = state.target;
    let point_ids = *mesh.cell(target).point_ids();
    let before = mesh.cell_points(target);

    let moved = dual_transform(&before, options.transform_offset, options.relaxation);
    for (i, &p) in point_ids.iter().enumerate() {
        mesh.set_point(p, moved[i]);
    }

    // Every cell sharing a vertex with the target, the target included.
    let mut impacted: BTreeSet<CellId> = BTreeSet::new();
    for &p in &point_ids {
        impacted.extend(connectivity.incident_cells(p).iter().copied());
    }
    debug_assert!(impacted.contains(&target));

    let mut lower = 1.0;
    let mut target_quality = 0.0;
    for &c in &impacted {
        let quality = mean_ratio(&mesh.cell_points(c));
        if quality < lower {
            lower = quality;
        }
        if c == target {
            target_quality = quality;
        }
    }

    if lower < EPSILON {
        // The move inverted an impacted cell: restore the target's points
        // exactly and leave the priority structures untouched, so the cell
        // comes back once its neighborhood has moved.
        for (i, &p) in point_ids.iter().enumerate() {
            mesh.set_point(p, before[i]);
        }
    } else {
        let penalty = if state.previous == Some(target) {
            options.penalty_repeat
        } else {
            options.penalty_step
        };

        for &c in &impacted {
            let old_key = state.cell_quality[c.index()];
            if !state.quality_map.remove(old_key, c) {
                log::warn!(
                    "cell {:?} not found in quality map near key {:.6}",
                    c,
                    old_key
                );
                continue;
            }
            // Only the target is re-keyed from its measured quality; the
            // other impacted cells keep their stored key even though their
            // geometry changed. Scheduling runs on penalties, not on a
            // fresh quality survey.
            let new_key = if c == target {
                target_quality + penalty
            } else {
                old_key
            };
            state.quality_map.insert(new_key, c);
            state.cell_quality[c.index()] = new_key;
        }
    }

    if let Some((new_min, next_cell)) = state.quality_map.min() {
        if new_min >= state.baseline {
            state.no_effect = 0;
        } else {
            state.no_effect += 1;
        }
        state.baseline = new_min + options.min_change;
        state.previous = Some(target);
        state.target = next_cell;
        state.last_min = new_min;
    }
    state.steps += 1;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{HexCell, Patch};
    use approx::assert_relative_eq;

    fn unit_cube_points() -> Vec<Point3<f64>> {
        vec![
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

    fn single_cell_mesh(points: Vec<Point3<f64>>) -> BlockMesh {
        BlockMesh::new(
            points,
            vec![HexCell::from_indices([0, 1, 2, 3, 4, 5, 6, 7])],
            Vec::new(),
        )
        .unwrap()
    }

    /// Two unit cubes stacked in z, sharing points 4..8.
    fn two_cube_points() -> Vec<Point3<f64>> {
        let mut points = Vec::new();
        for z in 0..3 {
            points.push(Point3::new(0.0, 0.0, z as f64));
            points.push(Point3::new(1.0, 0.0, z as f64));
            points.push(Point3::new(1.0, 1.0, z as f64));
            points.push(Point3::new(0.0, 1.0, z as f64));
        }
        points
    }

    fn two_cube_mesh(patches: Vec<Patch>) -> BlockMesh {
        BlockMesh::new(
            two_cube_points(),
            vec![
                HexCell::from_indices([0, 1, 2, 3, 4, 5, 6, 7]),
                HexCell::from_indices([4, 5, 6, 7, 8, 9, 10, 11]),
            ],
            patches,
        )
        .unwrap()
    }

    fn quad(a: usize, b: usize, c: usize, d: usize) -> Vec<PointId> {
        [a, b, c, d].map(PointId::new).to_vec()
    }

    /// All outer faces of the two-cube stack: every point ends up fixed.
    fn full_boundary_patches() -> Vec<Patch> {
        vec![Patch::new(
            "walls",
            vec![
                quad(0, 1, 2, 3),
                quad(8, 9, 10, 11),
                quad(0, 1, 5, 4),
                quad(1, 2, 6, 5),
                quad(2, 3, 7, 6),
                quad(3, 0, 4, 7),
                quad(4, 5, 9, 8),
                quad(5, 6, 10, 9),
                quad(6, 7, 11, 10),
                quad(7, 4, 8, 11),
            ],
        )]
    }

    /// Only the end caps fixed; the shared layer 4..8 stays mobile.
    fn end_cap_patches() -> Vec<Patch> {
        vec![
            Patch::new("bottom", vec![quad(0, 1, 2, 3)]),
            Patch::new("top", vec![quad(8, 9, 10, 11)]),
        ]
    }

    #[test]
    fn test_fully_fixed_mesh_is_untouched() {
        let mut mesh = two_cube_mesh(full_boundary_patches());
        let connectivity = Connectivity::build(&mesh);
        assert!(connectivity.mobile_points().is_empty());

        let original = mesh.points().to_vec();
        let options = SimultaneousOptions::default().with_sweeps(5);
        let report = simultaneous_smooth(&mut mesh, &connectivity, &options);

        assert_eq!(mesh.points(), &original[..]);
        let stats = report.final_sweep.unwrap();
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.avg, 1.0);
        assert_eq!(stats.invalid, 0);
    }

    #[test]
    fn test_perfect_mesh_mobile_points_unchanged() {
        // The shared-layer points already sit at their optimal positions;
        // sweeps must leave them there.
        let mut mesh = two_cube_mesh(end_cap_patches());
        let connectivity = Connectivity::build(&mesh);
        assert_eq!(connectivity.mobile_points().len(), 4);

        let original = mesh.points().to_vec();
        let options = SimultaneousOptions::default().with_sweeps(5);
        simultaneous_smooth(&mut mesh, &connectivity, &options);

        assert_eq!(mesh.points(), &original[..]);
    }

    #[test]
    fn test_fixed_points_never_move() {
        let mut mesh = two_cube_mesh(end_cap_patches());
        // Perturb a mobile point so the sweeps actually move things.
        mesh.set_point(PointId::new(5), Point3::new(1.15, -0.1, 1.05));
        let connectivity = Connectivity::build(&mesh);

        let original = mesh.points().to_vec();
        let options = SimultaneousOptions::default().with_sweeps(4);
        simultaneous_smooth(&mut mesh, &connectivity, &options);

        for &p in connectivity.fixed_points() {
            assert_eq!(mesh.points()[p.index()], original[p.index()]);
        }
        // At least the perturbed point must have moved.
        assert_ne!(mesh.points()[5], original[5]);
    }

    #[test]
    fn test_skewed_hex_regularizes() {
        let mut points = unit_cube_points();
        points[0] = Point3::new(0.3, 0.3, 0.3);
        let mut mesh = single_cell_mesh(points);
        let connectivity = Connectivity::build(&mesh);

        let options = SimultaneousOptions::default()
            .with_sweeps(10)
            .with_quality_range(0.1, 0.4)
            .with_relaxation(0.5)
            .with_weight_exponent(2.0);
        simultaneous_smooth(&mut mesh, &connectivity, &options);

        let quality = mean_ratio(&mesh.cell_points(CellId::new(0)));
        assert!(quality >= 0.95, "final quality was {}", quality);
    }

    #[test]
    fn test_partially_inverted_hex_improves() {
        // Vertex 0 pushed through the cell: four corner frames invert, the
        // quality drops to 0.5, and the free smoother recovers the cell.
        let mut points = unit_cube_points();
        points[0] = Point3::new(2.0, 2.0, 2.0);
        let mut mesh = single_cell_mesh(points);
        let connectivity = Connectivity::build(&mesh);

        let before = mean_ratio(&mesh.cell_points(CellId::new(0)));
        assert_relative_eq!(before, 0.5, epsilon = 1e-12);

        let options = SimultaneousOptions::default().with_sweeps(10);
        simultaneous_smooth(&mut mesh, &connectivity, &options);

        let after = mean_ratio(&mesh.cell_points(CellId::new(0)));
        assert!(
            after > before,
            "quality did not improve: {} -> {}",
            before,
            after
        );
    }

    #[test]
    fn test_zero_sweeps_do_nothing() {
        let mut mesh = two_cube_mesh(Vec::new());
        let connectivity = Connectivity::build(&mesh);
        let original = mesh.points().to_vec();

        let report = simultaneous_smooth(
            &mut mesh,
            &connectivity,
            &SimultaneousOptions::default().with_sweeps(0),
        );

        assert_eq!(mesh.points(), &original[..]);
        assert_eq!(report.sweeps, 0);
        assert!(report.final_sweep.is_none());
    }

    #[test]
    fn test_serial_matches_parallel() {
        let make = || {
            let mut mesh = two_cube_mesh(end_cap_patches());
            mesh.set_point(PointId::new(4), Point3::new(-0.2, 0.1, 0.9));
            mesh
        };
        let mut parallel = make();
        let mut serial = make();
        let connectivity = Connectivity::build(&parallel);

        let options = SimultaneousOptions::default().with_sweeps(3);
        simultaneous_smooth(&mut parallel, &connectivity, &options);
        simultaneous_smooth(&mut serial, &connectivity, &options.single_threaded());

        assert_eq!(parallel.points(), serial.points());
    }

    #[test]
    fn test_sequential_on_empty_mesh() {
        let mut mesh = BlockMesh::new(Vec::new(), Vec::new(), Vec::new()).unwrap();
        let connectivity = Connectivity::build(&mesh);
        let report =
            sequential_smooth(&mut mesh, &connectivity, &SequentialOptions::default());
        assert_eq!(report.steps, 0);
    }

    #[test]
    fn test_sequential_penalty_reorders_queue() {
        // Three disjoint cubes with artificial keys 0.2 / 0.5 / 0.8: the
        // 0.2 cell is targeted first, and after one accepted step it is
        // reinserted at its measured quality plus the successor penalty,
        // which sends it behind the other two.
        let mut points = Vec::new();
        for cube in 0..3 {
            let dx = 3.0 * cube as f64;
            for p in unit_cube_points() {
                points.push(Point3::new(p.x + dx, p.y, p.z));
            }
        }
        let cells = (0..3)
            .map(|i| HexCell::from_indices(std::array::from_fn(|k| 8 * i + k)))
            .collect();
        let mut mesh = BlockMesh::new(points, cells, Vec::new()).unwrap();
        let connectivity = Connectivity::build(&mesh);

        let mut state = SequentialState::init(&mesh).unwrap();
        state.quality_map = QualityMap::new();
        state.quality_map.insert(0.2, CellId::new(0));
        state.quality_map.insert(0.5, CellId::new(1));
        state.quality_map.insert(0.8, CellId::new(2));
        state.cell_quality = vec![0.2, 0.5, 0.8];
        state.baseline = 0.2;
        state.last_min = 0.2;
        state.target = CellId::new(0);

        let options = SequentialOptions::default().with_penalties(0.1, 0.4, 0.2);
        sequential_step(&mut mesh, &connectivity, &options, &mut state);

        // The cube is a fixed point of the transform, so its measured
        // quality stays 1 and the stored key becomes 1 + 0.2.
        assert_relative_eq!(state.cell_quality[0], 1.2, epsilon = 1e-9);
        assert_eq!(state.quality_map.min(), Some((0.5, CellId::new(1))));
        assert_eq!(state.target, CellId::new(1));
        assert_eq!(state.previous, Some(CellId::new(0)));
    }

    #[test]
    fn test_sequential_non_target_keys_lag() {
        // An accepted step reinserts impacted non-target cells at their
        // stored key even though their geometry changed underneath them.
        let mut mesh = two_cube_mesh(Vec::new());
        mesh.set_point(PointId::new(0), Point3::new(0.2, 0.2, 0.2));
        let connectivity = Connectivity::build(&mesh);

        let mut state = SequentialState::init(&mesh).unwrap();
        assert_eq!(state.target, CellId::new(0));
        assert_eq!(state.cell_quality[1], 1.0);

        let options = SequentialOptions::default();
        sequential_step(&mut mesh, &connectivity, &options, &mut state);

        // Cell 1 shares the moved points 4..8, so its true quality dropped,
        // but its stored key still reads 1.0.
        let true_quality = mean_ratio(&mesh.cell_points(CellId::new(1)));
        assert!(true_quality < 1.0 - 1e-9);
        assert_eq!(state.cell_quality[1], 1.0);
        let stored: Vec<(f64, CellId)> = state.quality_map.iter().collect();
        assert!(stored.contains(&(1.0, CellId::new(1))));
    }

    #[test]
    fn test_sequential_map_invariant_holds() {
        // Exactly one entry per cell, at the stored key, across many steps.
        let mut mesh = two_cube_mesh(Vec::new());
        mesh.set_point(PointId::new(0), Point3::new(0.3, 0.2, 0.1));
        mesh.set_point(PointId::new(9), Point3::new(0.8, 0.1, 2.2));
        let connectivity = Connectivity::build(&mesh);

        let mut state = SequentialState::init(&mesh).unwrap();
        let options = SequentialOptions::default();
        for _ in 0..25 {
            sequential_step(&mut mesh, &connectivity, &options, &mut state);

            assert_eq!(state.quality_map.len(), mesh.num_cells());
            for c in mesh.cell_ids() {
                let entries: Vec<f64> = state
                    .quality_map
                    .iter()
                    .filter(|&(_, cell)| cell == c)
                    .map(|(key, _)| key)
                    .collect();
                assert_eq!(entries.len(), 1, "cell {:?} has {} entries", c, entries.len());
                assert_eq!(entries[0], state.cell_quality[c.index()]);
            }
        }
    }

    #[test]
    fn test_sequential_stagnates_on_hopeless_mesh() {
        // A fully inverted cube with zero relaxation: the transform never
        // changes anything, every step takes the invalid branch, and the
        // ratcheting baseline drives the no-effect counter to the limit.
        let points: Vec<Point3<f64>> = unit_cube_points()
            .into_iter()
            .map(|p| Point3::new(-p.x, p.y, p.z))
            .collect();
        let mut mesh = single_cell_mesh(points);
        let connectivity = Connectivity::build(&mesh);
        let original = mesh.points().to_vec();

        let options = SequentialOptions::default()
            .with_relaxation(0.0)
            .with_min_change(1e-6);
        let report = sequential_smooth(&mut mesh, &connectivity, &options);

        // Step 1 sees no change (min equals the baseline), every later step
        // falls short of the shifted baseline; the counter reaches 10 at
        // step 11.
        assert_eq!(report.steps, 11);
        assert_eq!(report.min_quality, 0.0);
        // The invalid branch restores positions exactly.
        assert_eq!(mesh.points(), &original[..]);
    }

    #[test]
    fn test_sequential_improves_worst_cell() {
        let mut mesh = two_cube_mesh(Vec::new());
        mesh.set_point(PointId::new(0), Point3::new(0.4, 0.4, 0.4));
        let connectivity = Connectivity::build(&mesh);
        let before = crate::algo::quality::mesh_quality(&mesh).min;

        let options = SequentialOptions::default().with_min_change(1e-3);
        let report = sequential_smooth(&mut mesh, &connectivity, &options);
        assert!(report.steps >= 1);

        let after = crate::algo::quality::mesh_quality(&mesh).min;
        assert!(
            after > before,
            "worst quality did not improve: {} -> {}",
            before,
            after
        );
    }

    #[test]
    fn test_full_pipeline() {
        let mut mesh = two_cube_mesh(end_cap_patches());
        mesh.set_point(PointId::new(6), Point3::new(1.2, 1.1, 0.8));
        let config = SmootherConfig {
            quality_factor_min: 0.1,
            quality_factor_max: 0.4,
            relaxation: 0.5,
            cell_average_exponent: 2.0,
            max_simultaneous_iterations: 5,
            sequential_transform: 0.3,
            sequential_relaxation: 0.5,
            sequential_minimal_change: 1e-3,
            penalty_invalid: 0.1,
            penalty_repeat: 0.4,
            penalty_step: 0.2,
        };

        let before = crate::algo::quality::mesh_quality(&mesh).min;
        let report = getme_smooth(&mut mesh, &config);
        let after = crate::algo::quality::mesh_quality(&mesh).min;

        assert_eq!(report.simultaneous.sweeps, 5);
        assert!(report.sequential.steps >= 1);
        assert!(after >= before, "quality regressed: {} -> {}", before, after);
    }
}
