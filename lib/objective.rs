//! Figure-of-merit functions in the form consumed by an external pulse
//! optimizer.
//!
//! An objective fixes a physical model, an initial state, a target, and an
//! ensemble of perturbations; each call to [`Objective::fnct`] propagates the
//! supplied pulses once per ensemble member and reduces the final states to a
//! single number.

use ndarray as nd;
use num_complex::Complex64 as C64;
use rayon::iter::{ IntoParallelRefIterator, ParallelIterator };
use tracing::{ debug, trace };
use crate::{
    dynamics::{
        Decoherence,
        HBuilderControl,
        HBuilderNV,
        LOperatorNV,
        NVDrive,
        NoDecay,
        PhysicalModel,
    },
    error::{ PulseError, PulseResult },
    fidelity::{ FidelityMetric, FomSense, Scorer },
    grid::{ TimeGrid, TimeUnit },
    nd_utils::diag_density,
    rabi::{ self, lindblad, Evolution, Method, Track },
};

/// The functional boundary between a pulse optimizer and a propagator.
pub trait Objective {
    /// Compute the figure of merit for one set of pulses.
    ///
    /// `pulses[j]` holds the samples of the `j`-th control channel,
    /// `parameters` are optional scalar auxiliaries, and `time_grid` holds the
    /// time coordinates of the samples.
    fn fnct(
        &self,
        pulses: &[nd::Array1<f64>],
        parameters: &[f64],
        time_grid: &nd::Array1<f64>,
    ) -> PulseResult<f64>;
}

fn check_finite(fom: f64) -> PulseResult<f64> {
    if fom.is_finite() { Ok(fom) } else { Err(PulseError::NonFinite(fom)) }
}

fn collect_members<T, F>(members: &[T], parallel: bool, f: F)
    -> PulseResult<Vec<f64>>
where
    T: Sync,
    F: Fn(&T) -> PulseResult<f64> + Sync + Send,
{
    if parallel {
        members.par_iter().map(f).collect()
    } else {
        members.iter().map(f).collect()
    }
}

/// How an [`NvObjective`] obtains its time grid.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum GridSpec {
    /// Ignore the supplied time grid and spread the pulse samples evenly over a
    /// fixed duration (ns).
    Duration(f64),
    /// Use the supplied time grid, given in the named unit.
    Explicit(TimeUnit),
}

/// A microwave-driven NV center, scored against a target over an ensemble of
/// carrier detunings.
///
/// `pulses[0]` is the drive amplitude; further channels and all `parameters`
/// are ignored.
#[derive(Clone, Debug)]
pub struct NvObjective {
    model: PhysicalModel,
    decoherence: Decoherence,
    rho0: nd::Array2<C64>,
    scorer: Scorer,
    phase: f64,
    carrier: Option<f64>,
    detunings: Vec<f64>,
    grid: GridSpec,
    method: Method,
    parallel: bool,
}

/// Defaults to population transfer `0 → 1` with a resonant carrier over 50 ns,
/// averaged over detunings of -1%, 0, and +1%.
impl Default for NvObjective {
    fn default() -> Self {
        Self {
            model: PhysicalModel::default(),
            decoherence: Decoherence::default(),
            rho0: diag_density(&[1.0, 0.0, 0.0]),
            scorer: Scorer::from_populations(&[0.0, 1.0, 0.0]),
            phase: 0.0,
            carrier: None,
            detunings: vec![-0.01, 0.0, 0.01],
            grid: GridSpec::Duration(50.0),
            method: Method::RungeKutta,
            parallel: false,
        }
    }
}

impl NvObjective {
    /// Create a new `NvObjective`.
    pub fn new(
        model: PhysicalModel,
        rho0: nd::Array2<C64>,
        scorer: Scorer,
        grid: GridSpec,
    ) -> Self
    {
        Self { model, rho0, scorer, grid, ..Self::default() }
    }

    /// Set the decoherence parameters.
    pub fn with_decoherence(mut self, decoherence: Decoherence) -> Self {
        self.decoherence = decoherence;
        self
    }

    /// Set the carrier phase.
    pub fn with_phase(mut self, phase: f64) -> Self {
        self.phase = phase;
        self
    }

    /// Use a fixed carrier frequency (GHz) instead of the `0 ↔ 1` resonance.
    pub fn with_carrier(mut self, carrier: f64) -> Self {
        self.carrier = Some(carrier);
        self
    }

    /// Set the ensemble of fractional detunings.
    pub fn with_detunings(mut self, detunings: Vec<f64>) -> Self {
        self.detunings = detunings;
        self
    }

    /// Set the integration method.
    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Evaluate ensemble members on the rayon thread pool.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn model(&self) -> &PhysicalModel { &self.model }

    pub fn scorer(&self) -> &Scorer { &self.scorer }

    pub fn detunings(&self) -> &[f64] { &self.detunings }

    /// Carrier frequency (GHz) before detuning.
    pub fn carrier(&self) -> f64 {
        self.carrier.unwrap_or_else(|| self.model.resonance_0())
    }

    /// Build the time grid for a pulse of `len` samples.
    pub fn grid_for(&self, len: usize, time_grid: &nd::Array1<f64>)
        -> PulseResult<TimeGrid>
    {
        match self.grid {
            GridSpec::Duration(duration) => TimeGrid::from_duration(duration, len),
            GridSpec::Explicit(unit) => TimeGrid::new(time_grid.clone(), unit),
        }
    }

    /// Propagate a single ensemble member with the fixed-step integrator,
    /// retaining whatever `track` asks for.
    pub fn propagate(
        &self,
        amplitude: &nd::Array1<f64>,
        grid: &TimeGrid,
        detuning: f64,
        track: &Track,
    ) -> PulseResult<Evolution>
    {
        let freq = nd::Array1::from_elem(amplitude.len(), self.carrier());
        let drive
            = NVDrive::new(amplitude.view(), freq.view())
            .with_phase(self.phase)
            .with_detuning(detuning);
        let hbuilder = HBuilderNV::new(grid, &self.model, drive)?;
        let loperator = LOperatorNV::from(self.decoherence);
        lindblad::evolve(&self.rho0, &hbuilder, &loperator, grid, track)
    }

    fn member_fidelity(
        &self,
        amplitude: &nd::Array1<f64>,
        freq: &nd::Array1<f64>,
        grid: &TimeGrid,
        detuning: f64,
    ) -> PulseResult<f64>
    {
        let drive
            = NVDrive::new(amplitude.view(), freq.view())
            .with_phase(self.phase)
            .with_detuning(detuning);
        let hbuilder = HBuilderNV::new(grid, &self.model, drive)?;
        let loperator = LOperatorNV::from(self.decoherence);
        let rho = lindblad::propagate(
            self.method, &self.rho0, &hbuilder, &loperator, grid)?;
        let fid = self.scorer.fidelity(&rho)?;
        debug!(detuning, fidelity = fid, "ensemble member");
        Ok(fid)
    }
}

impl Objective for NvObjective {
    fn fnct(
        &self,
        pulses: &[nd::Array1<f64>],
        parameters: &[f64],
        time_grid: &nd::Array1<f64>,
    ) -> PulseResult<f64>
    {
        let amplitude
            = pulses.first()
            .ok_or(PulseError::MissingChannel { expected: 1, got: 0 })?;
        trace!(channels = pulses.len(), parameters = parameters.len(), "fnct");
        let grid = self.grid_for(amplitude.len(), time_grid)?;
        rabi::check_state(&self.rho0, 3)?;
        let freq = nd::Array1::from_elem(amplitude.len(), self.carrier());
        let fids
            = collect_members(
                self.detunings.as_slice(),
                self.parallel,
                |det| self.member_fidelity(amplitude, &freq, &grid, *det),
            )?;
        let fom = check_finite(self.scorer.combine(fids)?)?;
        debug!(fom, "figure of merit");
        Ok(fom)
    }
}

/// A generic drift-plus-controls system, scored against a target over an
/// ensemble of control coupling scales.
///
/// Every pulse channel drives the control operator of the same index;
/// `parameters` are ignored.
#[derive(Clone, Debug)]
pub struct ControlObjective {
    drift: nd::Array2<C64>,
    controls: Vec<nd::Array2<C64>>,
    rho0: nd::Array2<C64>,
    scorer: Scorer,
    couplings: Vec<f64>,
    unit: TimeUnit,
    method: Method,
    parallel: bool,
}

impl ControlObjective {
    /// Create a new `ControlObjective` with a single unit coupling, scored as
    /// the infidelity under [`FidelityMetric::Overlap`].
    pub fn new(
        drift: nd::Array2<C64>,
        controls: Vec<nd::Array2<C64>>,
        rho0: nd::Array2<C64>,
        target: nd::Array2<C64>,
    ) -> Self
    {
        let scorer
            = Scorer::new(target)
            .with_metric(FidelityMetric::Overlap)
            .with_sense(FomSense::Infidelity);
        Self {
            drift,
            controls,
            rho0,
            scorer,
            couplings: vec![1.0],
            unit: TimeUnit::Nanoseconds,
            method: Method::RungeKutta,
            parallel: false,
        }
    }

    /// Replace the scorer.
    pub fn with_scorer(mut self, scorer: Scorer) -> Self {
        self.scorer = scorer;
        self
    }

    /// Set the ensemble of control coupling scales.
    pub fn with_couplings(mut self, couplings: Vec<f64>) -> Self {
        self.couplings = couplings;
        self
    }

    /// Set the unit of supplied time grids.
    pub fn with_unit(mut self, unit: TimeUnit) -> Self {
        self.unit = unit;
        self
    }

    /// Set the integration method.
    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Evaluate ensemble members on the rayon thread pool.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn scorer(&self) -> &Scorer { &self.scorer }

    pub fn couplings(&self) -> &[f64] { &self.couplings }

    fn member_fidelity(
        &self,
        pulses: &[nd::Array1<f64>],
        grid: &TimeGrid,
        coupling: f64,
    ) -> PulseResult<f64>
    {
        let hbuilder
            = HBuilderControl::new(
                grid,
                &self.drift,
                &self.controls,
                pulses.iter().map(|u| u.view()),
            )?
            .with_scale(coupling);
        let rho = lindblad::propagate(
            self.method, &self.rho0, &hbuilder, &NoDecay, grid)?;
        let fid = self.scorer.fidelity(&rho)?;
        debug!(coupling, fidelity = fid, "ensemble member");
        Ok(fid)
    }
}

impl Objective for ControlObjective {
    fn fnct(
        &self,
        pulses: &[nd::Array1<f64>],
        parameters: &[f64],
        time_grid: &nd::Array1<f64>,
    ) -> PulseResult<f64>
    {
        trace!(channels = pulses.len(), parameters = parameters.len(), "fnct");
        let grid = TimeGrid::new(time_grid.clone(), self.unit)?;
        let fids
            = collect_members(
                self.couplings.as_slice(),
                self.parallel,
                |c| self.member_fidelity(pulses, &grid, *c),
            )?;
        let fom = check_finite(self.scorer.combine(fids)?)?;
        debug!(fom, "figure of merit");
        Ok(fom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use crate::nd_utils::outer_prod;

    #[test]
    fn nv_requires_a_pulse() {
        let obj = NvObjective::default();
        let time = nd::Array1::linspace(0.0, 50.0, 11);
        assert!(matches!(
            obj.fnct(&[], &[], &time),
            Err(PulseError::MissingChannel { expected: 1, got: 0 }),
        ));
    }

    #[test]
    fn nv_zero_pulse_scores_zero() {
        let obj = NvObjective::default();
        let time = nd::Array1::linspace(0.0, 50.0, 101);
        let pulse = nd::Array1::zeros(101);
        let fom = obj.fnct(&[pulse], &[], &time).unwrap();
        assert_eq!(fom, 0.0);
        let obj = obj.with_detunings(Vec::new());
        let pulse = nd::Array1::zeros(101);
        assert!(matches!(
            obj.fnct(&[pulse], &[], &time),
            Err(PulseError::EmptyEnsemble),
        ));
    }

    #[test]
    fn nv_parallel_matches_sequential() {
        let time = nd::Array1::linspace(0.0, 20.0, 201);
        let pulse = nd::Array1::from_elem(201, 10.0);
        let seq = NvObjective::default().with_parallel(false);
        let par = NvObjective::default().with_parallel(true);
        let fom_seq = seq.fnct(&[pulse.clone()], &[], &time).unwrap();
        let fom_par = par.fnct(&[pulse], &[], &time).unwrap();
        assert_eq!(fom_seq, fom_par);
        assert!(fom_seq > 0.0 && fom_seq < 1.0);
    }

    #[test]
    fn control_identity_pulse_has_zero_infidelity() {
        // no drive: the initial state is the target
        let z = C64::from(0.0);
        let drift = nd::array![[z, z], [z, z]];
        let sx = nd::array![[z, C64::from(1.0)], [C64::from(1.0), z]];
        let psi = nd::array![C64::from(1.0), z];
        let rho0 = outer_prod(&psi, &psi);
        let obj
            = ControlObjective::new(drift, vec![sx], rho0.clone(), rho0)
            .with_couplings(vec![0.9, 1.0, 1.1]);
        let time = nd::Array1::linspace(0.0, 1.0, 101);
        let pulse = nd::Array1::zeros(101);
        let fom = obj.fnct(&[pulse], &[], &time).unwrap();
        assert_relative_eq!(fom, 0.0, epsilon = 1e-14);
        assert!(matches!(
            obj.fnct(&[], &[], &time),
            Err(PulseError::MissingChannel { expected: 1, got: 0 }),
        ));
    }
}
