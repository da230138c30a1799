//! # Hexsmooth
//!
//! Hexahedral mesh quality evaluation and GETMe smoothing for multi-block
//! meshes.
//!
//! Hexsmooth takes the hex-cell decomposition of a multi-block mesh (a
//! point array, cells as ordered 8-tuples of point indices, and boundary
//! patches) and improves its geometric quality in place with two passes of
//! the geometric element transformation method (GETMe):
//!
//! - a **simultaneous** pass that transforms every cell and moves each
//!   interior point to a quality-weighted average of the positions its
//!   incident cells propose, and
//! - a **sequential** pass that repeatedly regularizes the globally worst
//!   cell, scheduled through a quality-ordered priority structure with
//!   penalty-based reinsertion, until progress stagnates.
//!
//! ## Features
//!
//! - **Mean-ratio quality metric**: scalar in `[0, 1]`, zero for inverted
//!   cells, invariant under similarity transforms
//! - **Dual-element transform**: per-cell regularization preserving the
//!   mean edge length
//! - **Invertibility protection**: moves that would create inverted cells
//!   are rolled back in both passes
//! - **Boundary preservation**: points on patches never move during the
//!   simultaneous pass
//!
//! ## Quick Start
//!
//! ```
//! use hexsmooth::algo::quality::mean_ratio;
//! use hexsmooth::algo::smooth::{simultaneous_smooth, SimultaneousOptions};
//! use hexsmooth::mesh::{BlockMesh, Connectivity, HexCell};
//! use nalgebra::Point3;
//!
//! // A single hex with one skewed corner, all points free to move.
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
//! points[0] = Point3::new(0.3, 0.3, 0.3);
//! let cells = vec![HexCell::from_indices([0, 1, 2, 3, 4, 5, 6, 7])];
//! let mut mesh = BlockMesh::new(points, cells, Vec::new()).unwrap();
//!
//! let before = mean_ratio(&mesh.cell_points(0.into()));
//!
//! let connectivity = Connectivity::build(&mesh);
//! let options = SimultaneousOptions::default().with_sweeps(10);
//! simultaneous_smooth(&mut mesh, &connectivity, &options);
//!
//! let after = mean_ratio(&mesh.cell_points(0.into()));
//! assert!(after > before);
//! ```
//!
//! ## Configuration
//!
//! Smoothing parameters come from a `smoother` sub-dictionary of the mesh
//! description (see [`config::SmootherConfig`]); [`algo::smooth::getme_smooth`]
//! runs the full pipeline from such a configuration. If the dictionary is
//! absent, no smoothing runs.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algo;
pub mod config;
pub mod error;
pub mod io;
pub mod mesh;

/// Prelude module for convenient imports.
///
/// This module re-exports the most commonly used types and functions:
///
/// ```
/// use hexsmooth::prelude::*;
/// ```
pub mod prelude {
    pub use crate::algo::smooth::{getme_smooth, sequential_smooth, simultaneous_smooth};
    pub use crate::config::SmootherConfig;
    pub use crate::error::{MeshError, Result};
    pub use crate::mesh::{BlockMesh, CellId, Connectivity, HexCell, Patch, PointId};
}

// Re-export nalgebra types for convenience
pub use nalgebra;
