//! Mesh description file I/O.
//!
//! The CLI and the examples exchange meshes as JSON documents: a point
//! array, a cell array of 8-tuples, the boundary patches, and optionally
//! the embedded `smoother` configuration dictionary:
//!
//! ```json
//! {
//!   "points": [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], ...],
//!   "cells": [[0, 1, 2, 3, 4, 5, 6, 7]],
//!   "patches": [{ "name": "walls", "faces": [[0, 1, 2, 3]] }],
//!   "smoother": { "factorQualityMin": 0.1, ... }
//! }
//! ```
//!
//! This is a convenience surface for driving the smoother; downstream
//! volume-mesh assembly consumes the [`BlockMesh`] directly.

use std::fs;
use std::path::Path;

use nalgebra::Point3;
use serde::{Deserialize, Serialize};

use crate::config::SmootherConfig;
use crate::error::{MeshError, Result};
use crate::mesh::{BlockMesh, HexCell, Patch, PointId};

#[derive(Debug, Serialize, Deserialize)]
struct MeshFile {
    points: Vec<[f64; 3]>,
    cells: Vec<[usize; 8]>,
    #[serde(default)]
    patches: Vec<PatchFile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    smoother: Option<serde_json::Value>,
}

#[derive(Debug, Serialize, Deserialize)]
struct PatchFile {
    name: String,
    faces: Vec<Vec<usize>>,
}

fn mesh_from_file(file: MeshFile) -> Result<(BlockMesh, Option<SmootherConfig>)> {
    let points = file
        .points
        .iter()
        .map(|&[x, y, z]| Point3::new(x, y, z))
        .collect();
    let cells = file.cells.into_iter().map(HexCell::from_indices).collect();
    let patches = file
        .patches
        .into_iter()
        .map(|p| {
            let faces = p
                .faces
                .into_iter()
                .map(|f| f.into_iter().map(PointId::new).collect())
                .collect();
            Patch::new(p.name, faces)
        })
        .collect();
    let mesh = BlockMesh::new(points, cells, patches)?;

    let smoother = match file.smoother {
        None => None,
        Some(value) => Some(serde_json::from_value(value)?),
    };
    Ok((mesh, smoother))
}

fn file_from_mesh(mesh: &BlockMesh) -> MeshFile {
    MeshFile {
        points: mesh.points().iter().map(|p| [p.x, p.y, p.z]).collect(),
        cells: mesh
            .cells()
            .iter()
            .map(|c| (*c.point_ids()).map(|id| id.index()))
            .collect(),
        patches: mesh
            .patches()
            .iter()
            .map(|p| PatchFile {
                name: p.name().to_string(),
                faces: p
                    .faces()
                    .iter()
                    .map(|f| f.iter().map(|id| id.index()).collect())
                    .collect(),
            })
            .collect(),
        smoother: None,
    }
}

/// Load a mesh description, and the embedded smoother configuration if the
/// document carries one.
pub fn load(path: impl AsRef<Path>) -> Result<(BlockMesh, Option<SmootherConfig>)> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)?;
    let file: MeshFile = serde_json::from_str(&text).map_err(|e| MeshError::LoadError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    mesh_from_file(file)
}

/// Save a mesh description (without a smoother dictionary).
pub fn save(path: impl AsRef<Path>, mesh: &BlockMesh) -> Result<()> {
    let path = path.as_ref();
    let text =
        serde_json::to_string_pretty(&file_from_mesh(mesh)).map_err(|e| MeshError::SaveError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
    fs::write(path, text)?;
    Ok(())
}
