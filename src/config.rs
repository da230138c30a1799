//! Smoother configuration.
//!
//! Smoothing parameters arrive in a `smoother` sub-dictionary of the mesh
//! description dictionary. The field names below mirror the dictionary
//! keys; [`SmootherConfig::from_dict`] extracts and validates the
//! sub-dictionary, and returns `None` when it is absent; in that case
//! neither smoothing pass runs.
//!
//! ```json
//! {
//!   "smoother": {
//!     "factorQualityMin": 0.1,
//!     "factorQualityMax": 0.4,
//!     "relaxation": 0.5,
//!     "averageMultipleCells": 2.0,
//!     "maxSimultaneousIter": 50,
//!     "sequentialTransformationParam": 0.3,
//!     "sequentialRelaxationParam": 0.5,
//!     "sequentialMinimalChange": 1e-4,
//!     "deltaPiI": 0.1,
//!     "deltaPiR": 0.4,
//!     "deltaPiS": 0.2
//!   }
//! }
//! ```

use serde::Deserialize;

use crate::algo::smooth::{SequentialOptions, SimultaneousOptions};
use crate::error::Result;

/// Parameters of both smoothing passes, as read from the `smoother`
/// sub-dictionary. Every key is required.
///
/// By convention `deltaPiR > deltaPiS > deltaPiI`: revisiting a cell is
/// more expensive than moving on, and invalid attempts carry the smallest
/// penalty because they are rolled back entirely.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SmootherConfig {
    /// Transform offset for perfect cells (simultaneous pass).
    #[serde(rename = "factorQualityMin")]
    pub quality_factor_min: f64,

    /// Transform offset for degenerate cells (simultaneous pass).
    #[serde(rename = "factorQualityMax")]
    pub quality_factor_max: f64,

    /// Transform relaxation of the simultaneous pass.
    #[serde(rename = "relaxation")]
    pub relaxation: f64,

    /// Exponent of the inverse-quality weights in the per-point average.
    #[serde(rename = "averageMultipleCells")]
    pub cell_average_exponent: f64,

    /// Number of simultaneous sweeps.
    #[serde(rename = "maxSimultaneousIter")]
    pub max_simultaneous_iterations: usize,

    /// Transform offset of the sequential pass.
    #[serde(rename = "sequentialTransformationParam")]
    pub sequential_transform: f64,

    /// Transform relaxation of the sequential pass.
    #[serde(rename = "sequentialRelaxationParam")]
    pub sequential_relaxation: f64,

    /// Per-step baseline shift of the sequential stagnation test.
    #[serde(rename = "sequentialMinimalChange")]
    pub sequential_minimal_change: f64,

    /// Penalty for an attempt that would invert a cell.
    #[serde(rename = "deltaPiI")]
    pub penalty_invalid: f64,

    /// Penalty for smoothing the same cell twice in a row.
    #[serde(rename = "deltaPiR")]
    pub penalty_repeat: f64,

    /// Penalty for smoothing a cell once.
    #[serde(rename = "deltaPiS")]
    pub penalty_step: f64,
}

impl SmootherConfig {
    /// Extract the `smoother` sub-dictionary from a mesh description
    /// dictionary.
    ///
    /// Returns `Ok(None)` when the dictionary has no `smoother` entry, and
    /// an error when the entry exists but is malformed or misses a key.
    pub fn from_dict(dict: &serde_json::Value) -> Result<Option<Self>> {
        match dict.get("smoother") {
            None => Ok(None),
            Some(sub) => Ok(Some(serde_json::from_value(sub.clone())?)),
        }
    }

    /// Options for the simultaneous pass.
    pub fn simultaneous_options(&self) -> SimultaneousOptions {
        SimultaneousOptions::default()
            .with_quality_range(self.quality_factor_min, self.quality_factor_max)
            .with_relaxation(self.relaxation)
            .with_weight_exponent(self.cell_average_exponent)
            .with_sweeps(self.max_simultaneous_iterations)
    }

    /// Options for the sequential pass.
    pub fn sequential_options(&self) -> SequentialOptions {
        SequentialOptions::default()
            .with_transform_offset(self.sequential_transform)
            .with_relaxation(self.sequential_relaxation)
            .with_min_change(self.sequential_minimal_change)
            .with_penalties(self.penalty_invalid, self.penalty_repeat, self.penalty_step)
    }
}
