//! Core mesh data structures.
//!
//! This module provides the hexahedral block-mesh view consumed by the
//! smoothing algorithms, together with the connectivity index built on top
//! of it.
//!
//! # Overview
//!
//! The primary type is [`BlockMesh`]: a mutable point array, an immutable
//! array of 8-vertex hexahedral cells, and the boundary patches. Points and
//! cells are addressed through the type-safe [`PointId`] and [`CellId`]
//! wrappers.
//!
//! [`Connectivity`] inverts the cell array into per-point incidence lists
//! and partitions the points into fixed (on a patch) and mobile.
//!
//! # Construction
//!
//! ```
//! use hexsmooth::mesh::{BlockMesh, Connectivity, HexCell};
//! use nalgebra::Point3;
//!
//! let points = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(1.0, 1.0, 0.0),
//!     Point3::new(0.0, 1.0, 0.0),
//!     Point3::new(0.0, 0.0, 1.0),
//!     Point3::new(1.0, 0.0, 1.0),
//!     Point3::new(1.0, 1.0, 1.0),
//!     Point3::new(0.0, 1.0, 1.0),
//! ];
//! let cells = vec![HexCell::from_indices([0, 1, 2, 3, 4, 5, 6, 7])];
//!
//! let mesh = BlockMesh::new(points, cells, Vec::new()).unwrap();
//! let connectivity = Connectivity::build(&mesh);
//! assert_eq!(connectivity.mobile_points().len(), 8);
//! ```

mod block;
mod connectivity;
mod index;

pub use block::{BlockMesh, HexCell, Patch};
pub use connectivity::Connectivity;
pub use index::{CellId, PointId};
