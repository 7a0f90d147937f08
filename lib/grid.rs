//! Discrete time grids shared by pulses and integrators.

use ndarray as nd;
use serde::Deserialize;
use tracing::warn;
use crate::error::{ PulseError, PulseResult };

/// Fewest grid points accepted by [`TimeGrid`].
///
/// The integrators consume up to three consecutive samples per RK4 stencil and
/// fall back to Euler steps for the last two; anything shorter only produces
/// degenerate propagation.
pub const MIN_GRID_POINTS: usize = 5;

/// Largest relative deviation of any point spacing from the base step before
/// [`TimeGrid::new`] warns about a non-uniform grid.
pub const UNIFORM_RTOL: f64 = 1e-6;

/// Unit in which a caller supplies time coordinates.
///
/// All Hamiltonians in this crate are written with frequencies in GHz, so
/// times are converted to nanoseconds before propagation.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    #[default]
    Nanoseconds,
    Seconds,
}

impl TimeUnit {
    /// Multiplier taking a time in `self` units to nanoseconds.
    pub fn to_ns(self) -> f64 {
        match self {
            Self::Nanoseconds => 1.0,
            Self::Seconds => 1e9,
        }
    }
}

/// A strictly increasing sequence of time points with an associated base step
/// size `dt`, in nanoseconds.
#[derive(Clone, Debug, PartialEq)]
pub struct TimeGrid {
    time: nd::Array1<f64>,
    dt: f64,
}

impl TimeGrid {
    fn validate(time: &nd::Array1<f64>) -> PulseResult<()> {
        if time.len() < MIN_GRID_POINTS {
            return Err(PulseError::GridTooShort {
                len: time.len(),
                min: MIN_GRID_POINTS,
            });
        }
        if let Some(k) = time.iter().position(|t| !t.is_finite()) {
            return Err(PulseError::GridNonFinite(k));
        }
        let maybe_bad
            = time.iter().zip(time.iter().skip(1))
            .position(|(tk, tkp1)| tkp1 <= tk);
        if let Some(k) = maybe_bad {
            return Err(PulseError::GridNotIncreasing(k + 1));
        }
        Ok(())
    }

    // largest |(t[k+1] - t[k]) / dt - 1| over the grid
    fn spacing_deviation(time: &nd::Array1<f64>, dt: f64) -> f64 {
        time.iter().zip(time.iter().skip(1))
            .map(|(tk, tkp1)| ((tkp1 - tk) / dt - 1.0).abs())
            .fold(0.0, f64::max)
    }

    /// Use an explicit array of time points, given in `unit`.
    ///
    /// The base step is taken to be the first spacing, `time[1] - time[0]`,
    /// and is used for every step; a warning is logged if the grid is not
    /// uniform to within [`UNIFORM_RTOL`].
    pub fn new(time: nd::Array1<f64>, unit: TimeUnit) -> PulseResult<Self> {
        let time = time * unit.to_ns();
        Self::validate(&time)?;
        let dt = time[1] - time[0];
        let deviation = Self::spacing_deviation(&time, dt);
        if deviation > UNIFORM_RTOL {
            warn!(dt, deviation, "non-uniform time grid; integrating with the first spacing");
        }
        Ok(Self { time, dt })
    }

    /// Build a grid of `steps` evenly spaced points covering `[0, duration]`
    /// (nanoseconds).
    ///
    /// Note that the base step is `duration / steps`, not the point spacing
    /// `duration / (steps - 1)`, so that `steps` integration steps span exactly
    /// `duration`.
    pub fn from_duration(duration: f64, steps: usize) -> PulseResult<Self> {
        let time = nd::Array1::linspace(0.0, duration, steps);
        Self::validate(&time)?;
        let dt = duration / steps as f64;
        Ok(Self { time, dt })
    }

    /// Number of time points.
    pub fn len(&self) -> usize { self.time.len() }

    /// Always `false`; grids are validated to be non-empty.
    pub fn is_empty(&self) -> bool { self.time.is_empty() }

    /// Base integration step.
    pub fn dt(&self) -> f64 { self.dt }

    /// Time coordinates.
    pub fn time(&self) -> &nd::Array1<f64> { &self.time }

    /// Time at the `k`-th point.
    pub fn at(&self, k: usize) -> f64 { self.time[k] }

    /// Check that a per-sample array matches the grid length.
    pub fn check_len(&self, what: &'static str, len: usize) -> PulseResult<()> {
        if len != self.len() {
            Err(PulseError::LengthMismatch { what, len, expected: self.len() })
        } else {
            Ok(())
        }
    }
}
