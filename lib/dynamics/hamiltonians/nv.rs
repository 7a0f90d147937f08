//! A microwave-driven NV center ground-state triplet.
//!
//! See also [`lindbladians::nv`][super::super::lindbladians::nv].

use std::f64::consts::TAU;
use ndarray as nd;
use num_complex::Complex64 as C64;
use crate::{
    dynamics::{ coupling_matrix, hamiltonians::HBuild, PhysicalModel },
    error::PulseResult,
    grid::TimeGrid,
};

/// Control amplitudes are supplied in units 1000 times larger than the
/// angular-frequency unit used internally.
pub const AMPLITUDE_SCALE: f64 = 1000.0;

/// A single amplitude channel with its carrier.
#[derive(Clone, Debug)]
pub struct NVDrive<'a> {
    /// Drive envelope, one sample per grid point.
    pub amplitude: nd::ArrayView1<'a, f64>,
    /// Instantaneous carrier frequency (GHz), one sample per grid point.
    pub frequency: nd::ArrayView1<'a, f64>,
    /// Carrier phase offset (radians).
    pub phase: f64,
    /// Fractional carrier detuning; every frequency sample is scaled by
    /// `1 + detuning`.
    pub detuning: f64,
}

impl<'a> NVDrive<'a> {
    /// Create a new `NVDrive` with zero phase and detuning.
    pub fn new(
        amplitude: nd::ArrayView1<'a, f64>,
        frequency: nd::ArrayView1<'a, f64>,
    ) -> Self
    {
        Self { amplitude, frequency, phase: 0.0, detuning: 0.0 }
    }

    /// Set the carrier phase.
    pub fn with_phase(mut self, phase: f64) -> Self {
        self.phase = phase;
        self
    }

    /// Set the fractional detuning.
    pub fn with_detuning(mut self, detuning: f64) -> Self {
        self.detuning = detuning;
        self
    }
}

/// Hamiltonian builder for the driven three-level NV system.
///
/// At grid point `k` with time `t = time[k]`,
/// ```text
/// H(k) = 2π (A[k] / 1000) cos(2π f[k] t + φ) M(t)
/// ```
/// where `M(t)` is the [coupling matrix][coupling_matrix] and `f` is the
/// detuned carrier frequency.
#[derive(Clone, Debug)]
pub struct HBuilderNV<'a> {
    grid: &'a TimeGrid,
    amplitude: nd::ArrayView1<'a, f64>,
    frequency: nd::Array1<f64>,
    phase: f64,
    omega_0: f64,
    omega_1: f64,
}

impl<'a> HBuilderNV<'a> {
    /// Create a new `HBuilderNV`.
    ///
    /// Fails if the drive's amplitude or frequency arrays do not match the
    /// length of `grid`.
    pub fn new(grid: &'a TimeGrid, model: &PhysicalModel, drive: NVDrive<'a>)
        -> PulseResult<Self>
    {
        grid.check_len("pulse amplitude", drive.amplitude.len())?;
        grid.check_len("pulse frequency", drive.frequency.len())?;
        let frequency = drive.frequency.mapv(|f| f * (1.0 + drive.detuning));
        Ok(Self {
            grid,
            amplitude: drive.amplitude,
            frequency,
            phase: drive.phase,
            omega_0: model.omega_0(),
            omega_1: model.omega_1(),
        })
    }

    /// Detuned carrier frequencies.
    pub fn frequency(&self) -> &nd::Array1<f64> { &self.frequency }

    /// Scalar drive prefactor `2π (A[k] / 1000) cos(2π f[k] t + φ)`.
    pub fn drive_at(&self, k: usize) -> f64 {
        let t = self.grid.at(k);
        TAU * self.amplitude[k] / AMPLITUDE_SCALE
            * (TAU * self.frequency[k] * t + self.phase).cos()
    }
}

impl<'a> HBuild for HBuilderNV<'a> {
    fn dim(&self) -> usize { 3 }

    fn len(&self) -> usize { self.grid.len() }

    fn build_at(&self, k: usize) -> nd::Array2<C64> {
        let t = self.grid.at(k);
        coupling_matrix(self.omega_0, self.omega_1, t) * self.drive_at(k)
    }
}
