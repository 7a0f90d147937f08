//! TOML descriptions of objectives.
//!
//! Every field has a default, so an empty document describes the standard NV
//! population-transfer problem:
//! ```toml
//! phase = 0.0
//! detunings = [-0.01, 0.0, 0.01]
//! initial_populations = [1.0, 0.0, 0.0]
//! target_populations = [0.0, 1.0, 0.0]
//! metric = "population"
//! sense = "fidelity"
//! method = "runge-kutta"
//! parallel = false
//!
//! [model]
//! zero_field_splitting = 2.87
//! gyromagnetic_ratio = 2.8e-3
//! field = 510.0
//!
//! [decoherence]
//! # lifetime = 1000.0
//! # dephasing_time = 500.0
//! mw_bandwidth = 0.0
//!
//! [grid]
//! kind = "duration"
//! duration = 50.0
//! ```

use std::path::Path;
use ndarray as nd;
use num_complex::Complex64 as C64;
use serde::{ Deserialize, de::DeserializeOwned };
use crate::{
    dynamics::{ Decoherence, PhysicalModel },
    error::{ PulseError, PulseResult },
    fidelity::{ FidelityMetric, FomSense, Scorer },
    grid::TimeUnit,
    nd_utils::diag_density,
    objective::{ ControlObjective, GridSpec, NvObjective },
    rabi::Method,
};

/// Parse a configuration from a TOML string.
pub fn from_toml_str<T>(s: &str) -> PulseResult<T>
where T: DeserializeOwned
{
    Ok(toml::from_str(s)?)
}

/// Read and parse a TOML configuration file.
pub fn load<T, P>(path: P) -> PulseResult<T>
where
    T: DeserializeOwned,
    P: AsRef<Path>,
{
    let s = std::fs::read_to_string(path)?;
    from_toml_str(&s)
}

/// Time grid description.
#[derive(Copy, Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case", deny_unknown_fields)]
pub enum GridConfig {
    /// Pulse samples spread over a fixed duration (ns).
    Duration { duration: f64 },
    /// Caller-supplied time points in the given unit.
    Explicit {
        #[serde(default)]
        unit: TimeUnit,
    },
}

impl Default for GridConfig {
    fn default() -> Self { Self::Duration { duration: 50.0 } }
}

impl From<GridConfig> for GridSpec {
    fn from(grid: GridConfig) -> Self {
        match grid {
            GridConfig::Duration { duration } => Self::Duration(duration),
            GridConfig::Explicit { unit } => Self::Explicit(unit),
        }
    }
}

fn default_detunings() -> Vec<f64> { vec![-0.01, 0.0, 0.01] }

fn default_initial() -> Vec<f64> { vec![1.0, 0.0, 0.0] }

fn default_target() -> Vec<f64> { vec![0.0, 1.0, 0.0] }

/// Configuration for an [`NvObjective`].
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NvObjectiveConfig {
    pub model: PhysicalModel,
    pub decoherence: Decoherence,
    pub phase: f64,
    /// Carrier frequency (GHz); defaults to the `0 ↔ 1` resonance.
    pub carrier: Option<f64>,
    pub detunings: Vec<f64>,
    pub grid: GridConfig,
    pub initial_populations: Vec<f64>,
    pub target_populations: Vec<f64>,
    pub metric: FidelityMetric,
    pub sense: FomSense,
    pub method: Method,
    pub parallel: bool,
}

impl Default for NvObjectiveConfig {
    fn default() -> Self {
        Self {
            model: PhysicalModel::default(),
            decoherence: Decoherence::default(),
            phase: 0.0,
            carrier: None,
            detunings: default_detunings(),
            grid: GridConfig::default(),
            initial_populations: default_initial(),
            target_populations: default_target(),
            metric: FidelityMetric::default(),
            sense: FomSense::default(),
            method: Method::default(),
            parallel: false,
        }
    }
}

fn check_populations(what: &'static str, pops: &[f64]) -> PulseResult<()> {
    if pops.len() != 3 {
        Err(PulseError::BadShape { what, dim: 3, rows: pops.len(), cols: pops.len() })
    } else {
        Ok(())
    }
}

impl NvObjectiveConfig {
    /// Build the described objective.
    ///
    /// Fails if either population vector does not describe a three-level
    /// state.
    pub fn into_objective(self) -> PulseResult<NvObjective> {
        check_populations("initial state", &self.initial_populations)?;
        check_populations("target state", &self.target_populations)?;
        let scorer
            = Scorer::from_populations(&self.target_populations)
            .with_metric(self.metric)
            .with_sense(self.sense);
        let mut obj
            = NvObjective::new(
                self.model,
                diag_density(&self.initial_populations),
                scorer,
                self.grid.into(),
            )
            .with_decoherence(self.decoherence)
            .with_phase(self.phase)
            .with_detunings(self.detunings)
            .with_method(self.method)
            .with_parallel(self.parallel);
        if let Some(carrier) = self.carrier {
            obj = obj.with_carrier(carrier);
        }
        Ok(obj)
    }
}

/// A complex matrix written as separate real and (optional) imaginary parts.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MatrixConfig {
    pub re: Vec<Vec<f64>>,
    #[serde(default)]
    pub im: Option<Vec<Vec<f64>>>,
}

impl MatrixConfig {
    /// Convert to a square complex array.
    pub fn to_array(&self, what: &'static str) -> PulseResult<nd::Array2<C64>> {
        let n = self.re.len();
        let bad_shape = |rows: usize, cols: usize| {
            PulseError::BadShape { what, dim: n, rows, cols }
        };
        if let Some(row) = self.re.iter().find(|row| row.len() != n) {
            return Err(bad_shape(n, row.len()));
        }
        if let Some(im) = &self.im {
            if im.len() != n {
                return Err(bad_shape(im.len(), n));
            }
            if let Some(row) = im.iter().find(|row| row.len() != n) {
                return Err(bad_shape(n, row.len()));
            }
        }
        let im = |i: usize, j: usize| {
            self.im.as_ref().map(|im| im[i][j]).unwrap_or(0.0)
        };
        Ok(nd::Array2::from_shape_fn((n, n), |(i, j)| C64::new(self.re[i][j], im(i, j))))
    }
}

fn default_couplings() -> Vec<f64> { vec![1.0] }

fn default_sense() -> FomSense { FomSense::Infidelity }

fn default_metric() -> FidelityMetric { FidelityMetric::Overlap }

/// Configuration for a [`ControlObjective`].
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ControlObjectiveConfig {
    pub drift: MatrixConfig,
    pub controls: Vec<MatrixConfig>,
    pub initial_populations: Vec<f64>,
    pub target_populations: Vec<f64>,
    #[serde(default = "default_couplings")]
    pub couplings: Vec<f64>,
    #[serde(default)]
    pub unit: TimeUnit,
    #[serde(default = "default_metric")]
    pub metric: FidelityMetric,
    #[serde(default = "default_sense")]
    pub sense: FomSense,
    #[serde(default)]
    pub method: Method,
    #[serde(default)]
    pub parallel: bool,
}

impl ControlObjectiveConfig {
    /// Build the described objective.
    ///
    /// Fails if any matrix is not square or if the state population vectors
    /// do not match the dimension of the drift Hamiltonian.
    pub fn into_objective(self) -> PulseResult<ControlObjective> {
        let drift = self.drift.to_array("drift Hamiltonian")?;
        let dim = drift.nrows();
        let controls: Vec<nd::Array2<C64>>
            = self.controls.iter()
            .map(|h| h.to_array("control Hamiltonian"))
            .collect::<PulseResult<_>>()?;
        for (what, pops) in [
            ("initial state", &self.initial_populations),
            ("target state", &self.target_populations),
        ] {
            if pops.len() != dim {
                return Err(PulseError::BadShape {
                    what,
                    dim,
                    rows: pops.len(),
                    cols: pops.len(),
                });
            }
        }
        let scorer
            = Scorer::from_populations(&self.target_populations)
            .with_metric(self.metric)
            .with_sense(self.sense);
        let obj
            = ControlObjective::new(
                drift,
                controls,
                diag_density(&self.initial_populations),
                diag_density(&self.target_populations),
            )
            .with_scorer(scorer)
            .with_couplings(self.couplings)
            .with_unit(self.unit)
            .with_method(self.method)
            .with_parallel(self.parallel);
        Ok(obj)
    }
}
