//! Error types for hexsmooth.
//!
//! This module defines all error types used throughout the library.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using [`MeshError`].
pub type Result<T> = std::result::Result<T, MeshError>;

/// Errors that can occur during mesh construction, configuration, or I/O.
#[derive(Error, Debug)]
pub enum MeshError {
    /// A cell references a point index outside the point array.
    #[error("cell {cell} references invalid point index {point}")]
    InvalidPointIndex {
        /// The cell index.
        cell: usize,
        /// The invalid point index.
        point: usize,
    },

    /// A patch face references a point index outside the point array.
    #[error("patch \"{patch}\" references invalid point index {point}")]
    InvalidPatchPoint {
        /// The patch name.
        patch: String,
        /// The invalid point index.
        point: usize,
    },

    /// The smoother sub-dictionary exists but cannot be parsed.
    #[error("invalid smoother dictionary: {0}")]
    InvalidDictionary(#[from] serde_json::Error),

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error loading a mesh description from file.
    #[error("failed to load mesh from {path}: {message}")]
    LoadError {
        /// The file path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Error saving a mesh description to file.
    #[error("failed to save mesh to {path}: {message}")]
    SaveError {
        /// The file path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Invalid parameter value.
    #[error("invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// The invalid value (as string).
        value: String,
        /// Reason the value is invalid.
        reason: &'static str,
    },
}

impl MeshError {
    /// Create an invalid parameter error.
    pub fn invalid_param<T: std::fmt::Display>(
        name: &'static str,
        value: T,
        reason: &'static str,
    ) -> Self {
        MeshError::InvalidParameter {
            name,
            value: value.to_string(),
            reason,
        }
    }
}
