//! Mesh quality and smoothing algorithms.
//!
//! This module contains the building blocks of the GETMe smoothing
//! pipeline:
//!
//! - **Quality**: mean-ratio quality metric for hexahedra
//! - **Transform**: dual-element geometric transformation of one hex
//! - **Priority**: quality-ordered cell queue for worst-cell scheduling
//! - **Smoothing**: simultaneous and sequential smoothing passes
//! - **Progress**: per-sweep / per-step event reporting

pub mod priority;
pub mod progress;
pub mod quality;
pub mod smooth;
pub mod transform;

pub use progress::{Progress, SmoothEvent};
