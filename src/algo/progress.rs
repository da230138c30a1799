//! Progress reporting for the smoothing passes.
//!
//! Smoothing a large mesh can take many sweeps; callers that want to drive
//! a progress display register a [`Progress`] observer and receive one
//! [`SmoothEvent`] per sweep, revert, or sequential step.
//!
//! # Example
//!
//! ```
//! use hexsmooth::algo::{Progress, SmoothEvent};
//!
//! let progress = Progress::new(|event| {
//!     if let SmoothEvent::SimultaneousSweep { sweep, total, stats } = event {
//!         println!("[{}/{}] min quality {:.4}", sweep + 1, total, stats.min);
//!     }
//! });
//! ```

use super::quality::QualitySummary;

/// An observable event emitted while smoothing runs.
#[derive(Debug, Clone, Copy)]
pub enum SmoothEvent {
    /// A simultaneous sweep finished its per-cell pass.
    SimultaneousSweep {
        /// Sweep number (0-based).
        sweep: usize,
        /// Configured number of sweeps.
        total: usize,
        /// Quality distribution measured during the sweep.
        stats: QualitySummary,
    },
    /// A sweep's point update produced new invalid cells and was rolled
    /// back.
    PointsReverted {
        /// Sweep number (0-based).
        sweep: usize,
        /// Number of points restored to their previous positions.
        count: usize,
    },
    /// The sequential smoother finished one worst-cell step.
    SequentialStep {
        /// Step number (0-based).
        step: usize,
        /// Smallest key in the priority structure after the step.
        min_quality: f64,
        /// Consecutive steps without progress so far.
        no_effect_steps: usize,
    },
}

/// An observer that receives [`SmoothEvent`]s during smoothing.
pub struct Progress {
    callback: Box<dyn Fn(&SmoothEvent) + Send + Sync>,
}

impl Progress {
    /// Create a progress observer with the given callback.
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&SmoothEvent) + Send + Sync + 'static,
    {
        Self {
            callback: Box::new(callback),
        }
    }

    /// Report an event.
    #[inline]
    pub fn report(&self, event: SmoothEvent) {
        (self.callback)(&event);
    }

    /// Create a no-op observer that discards all events.
    pub fn none() -> Self {
        Self::new(|_| {})
    }
}

impl Default for Progress {
    fn default() -> Self {
        Self::none()
    }
}

impl std::fmt::Debug for Progress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Progress").finish_non_exhaustive()
    }
}
