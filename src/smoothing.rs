// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Temporal landmark smoothing with One Euro filters.
//!
//! Smooth when a joint is still, responsive when it moves fast. Only used in
//! streaming mode; state is dropped whenever the person is lost.

use std::f32::consts::PI;
use std::time::Duration;

use crate::landmark::{LANDMARK_COUNT, Landmark, LandmarkSet};

/// Minimum cutoff frequency in Hz for normalized coordinates.
pub const MIN_CUTOFF: f32 = 0.05;
/// Speed coefficient.
pub const BETA: f32 = 80.0;
/// Cutoff frequency in Hz of the derivative estimate.
pub const DERIVATIVE_CUTOFF: f32 = 1.0;
/// Step used when two frames carry the same timestamp.
const FALLBACK_STEP: f32 = 1.0 / 30.0;

/// Adaptive low-pass filter for a single scalar.
#[derive(Debug, Clone)]
pub struct OneEuroFilter {
    min_cutoff: f32,
    beta: f32,
    d_cutoff: f32,
    x_prev: f32,
    dx_prev: f32,
    t_prev: f64,
    initialized: bool,
}

impl OneEuroFilter {
    /// Create a filter with the given minimum cutoff and speed coefficient.
    #[must_use]
    pub const fn new(min_cutoff: f32, beta: f32) -> Self {
        Self {
            min_cutoff,
            beta,
            d_cutoff: DERIVATIVE_CUTOFF,
            x_prev: 0.0,
            dx_prev: 0.0,
            t_prev: 0.0,
            initialized: false,
        }
    }

    fn smoothing_factor(t_e: f32, cutoff: f32) -> f32 {
        let r = 2.0 * PI * cutoff * t_e;
        r / (r + 1.0)
    }

    /// Filter one sample taken at `t` seconds.
    #[allow(clippy::cast_possible_truncation)]
    pub fn filter(&mut self, t: f64, x: f32) -> f32 {
        if !self.initialized {
            self.x_prev = x;
            self.dx_prev = 0.0;
            self.t_prev = t;
            self.initialized = true;
            return x;
        }

        let mut t_e = (t - self.t_prev) as f32;
        if t_e <= 0.0 {
            t_e = FALLBACK_STEP;
        }

        let a_d = Self::smoothing_factor(t_e, self.d_cutoff);
        let dx = (x - self.x_prev) / t_e;
        let dx_hat = a_d * dx + (1.0 - a_d) * self.dx_prev;

        let cutoff = self.min_cutoff + self.beta * dx_hat.abs();
        let a = Self::smoothing_factor(t_e, cutoff);
        let x_hat = a * x + (1.0 - a) * self.x_prev;

        self.x_prev = x_hat;
        self.dx_prev = dx_hat;
        self.t_prev = t;
        x_hat
    }

    /// Forget all history; the next sample passes through unchanged.
    pub const fn reset(&mut self) {
        self.initialized = false;
    }
}

impl Default for OneEuroFilter {
    fn default() -> Self {
        Self::new(MIN_CUTOFF, BETA)
    }
}

/// One filter per coordinate of every landmark.
#[derive(Debug, Clone)]
pub struct LandmarkSmoother {
    filters: Vec<[OneEuroFilter; 3]>,
}

impl LandmarkSmoother {
    /// Create a smoother with the default filter parameters.
    #[must_use]
    pub fn new() -> Self {
        Self::with_params(MIN_CUTOFF, BETA)
    }

    /// Create a smoother with custom filter parameters.
    #[must_use]
    pub fn with_params(min_cutoff: f32, beta: f32) -> Self {
        let filter = OneEuroFilter::new(min_cutoff, beta);
        Self {
            filters: vec![[filter.clone(), filter.clone(), filter]; LANDMARK_COUNT],
        }
    }

    /// Smooth the x, y and z coordinates of a landmark set. Visibility is
    /// passed through.
    #[must_use]
    pub fn apply(&mut self, timestamp: Duration, landmarks: &LandmarkSet) -> LandmarkSet {
        let t = timestamp.as_secs_f64();
        let mut out = [Landmark::default(); LANDMARK_COUNT];
        for ((dst, src), [fx, fy, fz]) in out
            .iter_mut()
            .zip(landmarks.iter())
            .zip(self.filters.iter_mut())
        {
            *dst = Landmark::new(
                fx.filter(t, src.x),
                fy.filter(t, src.y),
                fz.filter(t, src.z),
                src.visibility,
            );
        }
        LandmarkSet::new(out)
    }

    /// Drop all filter state.
    pub fn reset(&mut self) {
        for filter in self.filters.iter_mut().flatten() {
            filter.reset();
        }
    }
}

impl Default for LandmarkSmoother {
    fn default() -> Self {
        Self::new()
    }
}
