//! Numerical integration of the Liouville and Lindblad master equations over a
//! discrete time grid.
//!
//! Both integrators are built on the same Runge-Kutta stencil: a step of
//! "span" `s` starting at grid index `k` evaluates the right-hand side at
//! indices `k`, `k + s` (twice), and `k + 2 s` with `h = 2 s dt`, and then
//! advances the state by half of the classical RK4 increment. The fixed-step
//! integrator applies this with `s = 1` at every grid index, so that
//! consecutive stencils overlap; the adaptive integrator varies `s`.
//!
//! The state is renormalized to unit trace after every committed step.
//! Where unspecified, all Hamiltonians and decay rates should be in units of
//! angular frequency (rad/ns).

use std::fmt;
use indexmap::IndexMap;
use ndarray as nd;
use num_complex::Complex64 as C64;
use serde::Deserialize;
use tracing::{ debug, trace };
use crate::{
    error::{ PulseError, PulseResult },
    grid::TimeGrid,
    nd_utils::{ max_abs_diff, StateNorm },
};

pub mod liouville;
pub mod lindblad;

/// Error tolerance on the element-wise difference between step-doubling
/// estimates in the adaptive integrator.
pub const ADAPTIVE_TOL: f64 = 1e-6;

/// Integration method.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Method {
    /// Fixed-step Runge-Kutta with optional element tracking.
    #[default]
    RungeKutta,
    /// Step-doubling adaptive Runge-Kutta. Returns the final state only.
    RungeKuttaAdaptive,
}

/// A single density matrix element `ρ[row, col]`.
///
/// Elements are ordered by row, then by column.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Element {
    pub row: usize,
    pub col: usize,
}

impl Element {
    pub const RHO_00: Self = Self::new(0, 0);
    pub const RHO_01: Self = Self::new(0, 1);
    pub const RHO_10: Self = Self::new(1, 0);
    pub const RHO_11: Self = Self::new(1, 1);
    pub const RHO_22: Self = Self::new(2, 2);

    /// Create a new `Element`.
    pub const fn new(row: usize, col: usize) -> Self { Self { row, col } }

    /// Return `true` if `self` lies on the main diagonal.
    pub fn is_population(&self) -> bool { self.row == self.col }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rho_{}{}", self.row, self.col)
    }
}

/// Selection of the outputs to retain from a propagation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Track {
    /// Retain the final density matrix.
    pub rho_end: bool,
    elements: Vec<Element>,
}

impl Default for Track {
    fn default() -> Self { Self::final_state() }
}

impl Track {
    /// Retain nothing.
    pub fn none() -> Self { Self { rho_end: false, elements: Vec::new() } }

    /// Retain only the final density matrix.
    pub fn final_state() -> Self { Self { rho_end: true, elements: Vec::new() } }

    /// Set whether the final density matrix is retained.
    pub fn with_final(mut self, rho_end: bool) -> Self {
        self.rho_end = rho_end;
        self
    }

    /// Additionally record the value of `element` after every step.
    pub fn with(mut self, element: Element) -> Self {
        if let Err(k) = self.elements.binary_search(&element) {
            self.elements.insert(k, element);
        }
        self
    }

    /// Additionally record several elements.
    pub fn with_all<I>(self, elements: I) -> Self
    where I: IntoIterator<Item = Element>
    {
        elements.into_iter().fold(self, |acc, e| acc.with(e))
    }

    /// Tracked elements, in ascending order.
    pub fn elements(&self) -> &[Element] { &self.elements }

    fn check(&self, dim: usize) -> PulseResult<()> {
        match self.elements.iter().find(|e| e.row >= dim || e.col >= dim) {
            Some(e) => Err(PulseError::ElementOutOfRange {
                row: e.row,
                col: e.col,
                dim,
            }),
            None => Ok(()),
        }
    }
}

/// Time series of a single density matrix element, one value per step.
#[derive(Clone, Debug, PartialEq)]
pub enum Trajectory {
    /// Real part of a diagonal element.
    Population(Vec<f64>),
    /// Full complex value of an off-diagonal element.
    Coherence(Vec<C64>),
}

impl Trajectory {
    fn for_element(element: Element, capacity: usize) -> Self {
        if element.is_population() {
            Self::Population(Vec::with_capacity(capacity))
        } else {
            Self::Coherence(Vec::with_capacity(capacity))
        }
    }

    fn record(&mut self, element: Element, rho: &nd::Array2<C64>) {
        let x = rho[[element.row, element.col]];
        match self {
            Self::Population(p) => p.push(x.re),
            Self::Coherence(c) => c.push(x),
        }
    }

    /// Number of recorded steps.
    pub fn len(&self) -> usize {
        match self {
            Self::Population(p) => p.len(),
            Self::Coherence(c) => c.len(),
        }
    }

    /// Return `true` if nothing was recorded.
    pub fn is_empty(&self) -> bool { self.len() == 0 }

    /// Return the population series, if `self` is one.
    pub fn as_population(&self) -> Option<&[f64]> {
        match self {
            Self::Population(p) => Some(p),
            Self::Coherence(_) => None,
        }
    }

    /// Return the coherence series, if `self` is one.
    pub fn as_coherence(&self) -> Option<&[C64]> {
        match self {
            Self::Population(_) => None,
            Self::Coherence(c) => Some(c),
        }
    }

    /// Convert to a real array; coherences are reduced to their magnitudes.
    pub fn to_array(&self) -> nd::Array1<f64> {
        match self {
            Self::Population(p) => p.iter().copied().collect(),
            Self::Coherence(c) => c.iter().map(|x| x.norm()).collect(),
        }
    }
}

/// Output of a propagation.
///
/// Holds the final state if it was requested and one trajectory per tracked
/// element, keyed in ascending element order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Evolution {
    pub rho_end: Option<nd::Array2<C64>>,
    pub trajectories: IndexMap<Element, Trajectory>,
}

impl Evolution {
    /// Get the final state, if retained.
    pub fn rho_end(&self) -> Option<&nd::Array2<C64>> { self.rho_end.as_ref() }

    /// Take the final state, if retained.
    pub fn into_rho_end(self) -> Option<nd::Array2<C64>> { self.rho_end }

    /// Get the trajectory of an element, if it was tracked.
    pub fn trajectory(&self, element: Element) -> Option<&Trajectory> {
        self.trajectories.get(&element)
    }

    /// Get the population series of a diagonal element, if it was tracked.
    pub fn population(&self, element: Element) -> Option<&[f64]> {
        self.trajectory(element).and_then(Trajectory::as_population)
    }

    /// Get the coherence series of an off-diagonal element, if it was tracked.
    pub fn coherence(&self, element: Element) -> Option<&[C64]> {
        self.trajectory(element).and_then(Trajectory::as_coherence)
    }
}

/// Check that `rho0` is a `dim × dim` matrix.
pub(crate) fn check_state(rho0: &nd::Array2<C64>, dim: usize)
    -> PulseResult<()>
{
    let (rows, cols) = rho0.dim();
    if rows != dim || cols != dim {
        Err(PulseError::BadShape { what: "initial state", dim, rows, cols })
    } else {
        Ok(())
    }
}

pub(crate) fn check_inputs(
    rho0: &nd::Array2<C64>,
    dim: usize,
    len: usize,
    grid: &TimeGrid,
    track: &Track,
) -> PulseResult<()>
{
    check_state(rho0, dim)?;
    grid.check_len("Hamiltonian", len)?;
    track.check(dim)
}

/// Apply a single stencil of span `s` starting at grid index `k`.
///
/// *Panics* if `k + 2 s` is out of range for `rhs`.
pub(crate) fn rk4_stencil<F>(
    rhs: &F,
    k: usize,
    s: usize,
    dt: f64,
    rho: &nd::Array2<C64>,
) -> nd::Array2<C64>
where F: Fn(usize, &nd::Array2<C64>) -> nd::Array2<C64>
{
    let h = s as f64 * 2.0 * dt;
    let k1 = rhs(k, rho) * h;
    let k2 = rhs(k + s, &(rho + &(&k1 / 2.0))) * h;
    let k3 = rhs(k + s, &(rho + &(&k2 / 2.0))) * h;
    let k4 = rhs(k + 2 * s, &(rho + &k3)) * h;
    rho + &((k1 / 6.0 + k2 / 3.0 + k3 / 3.0 + k4 / 6.0) * 0.5)
}

fn euler_step<F>(rhs: &F, k: usize, dt: f64, rho: &nd::Array2<C64>)
    -> nd::Array2<C64>
where F: Fn(usize, &nd::Array2<C64>) -> nd::Array2<C64>
{
    rho + &(rhs(k, rho) * dt)
}

/// Run unit-span stencils from grid index `start` to the end of an `n`-point
/// grid, finishing with Euler steps at the last two indices. `on_step` sees
/// the renormalized state after every step.
fn fixed_steps<F, G>(
    rhs: &F,
    start: usize,
    n: usize,
    dt: f64,
    mut rho: nd::Array2<C64>,
    mut on_step: G,
) -> nd::Array2<C64>
where
    F: Fn(usize, &nd::Array2<C64>) -> nd::Array2<C64>,
    G: FnMut(&nd::Array2<C64>),
{
    for k in start..n {
        rho
            = if k + 2 < n {
                rk4_stencil(rhs, k, 1, dt, &rho)
            } else {
                euler_step(rhs, k, dt, &rho)
            };
        rho.renormalize();
        on_step(&rho);
    }
    rho
}

/// Fixed-step integration over every point of `grid`, recording whatever
/// `track` asks for.
pub(crate) fn do_evolve<F>(
    rho0: &nd::Array2<C64>,
    grid: &TimeGrid,
    rhs: F,
    track: &Track,
) -> Evolution
where F: Fn(usize, &nd::Array2<C64>) -> nd::Array2<C64>
{
    let n = grid.len();
    let mut trajectories: IndexMap<Element, Trajectory>
        = track.elements().iter()
        .map(|e| (*e, Trajectory::for_element(*e, n)))
        .collect();
    let rho
        = fixed_steps(
            &rhs, 0, n, grid.dt(), rho0.clone(),
            |rho| {
                trajectories.iter_mut()
                    .for_each(|(e, traj)| traj.record(*e, rho));
            },
        );
    debug!(steps = n, tracked = trajectories.len(), "fixed-step propagation done");
    Evolution {
        rho_end: track.rho_end.then_some(rho),
        trajectories,
    }
}

/// Fixed-step integration over every point of `grid`, returning only the final
/// state.
pub(crate) fn do_evolve_final<F>(
    rho0: &nd::Array2<C64>,
    grid: &TimeGrid,
    rhs: F,
) -> nd::Array2<C64>
where F: Fn(usize, &nd::Array2<C64>) -> nd::Array2<C64>
{
    fixed_steps(&rhs, 0, grid.len(), grid.dt(), rho0.clone(), |_| { })
}

/// Numbers of accepted and rejected iterations of the adaptive loop.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct AdaptiveStats {
    pub(crate) accepted: usize,
    pub(crate) rejected: usize,
}

/// Adaptive step-doubling integration over `grid`, returning only the final
/// state.
///
/// The step span `s` starts at 2. While more than `4 s` grid points remain,
/// the state is advanced both by two stencils of span `s / 2` and by one of
/// span `s`, and the two results are compared element-wise:
/// - if they agree to within [`ADAPTIVE_TOL`], a second span-`s` stencil is
///   taken and the pair is committed, advancing `2 s` points; if that pair
///   also agrees with a single span-`2 s` stencil, `s` is doubled (up to 1% of
///   the grid length);
/// - otherwise the half-span estimate is committed, `s` is halved if greater
///   than 3, and the index advances by the new `s`.
///
/// Every stencil in one iteration samples the drive starting from the same
/// index `k`, including the second stencil of each pair.
///
/// The rest of the grid is covered by the fixed-step scheme.
pub(crate) fn do_evolve_adaptive<F>(
    rho0: &nd::Array2<C64>,
    grid: &TimeGrid,
    rhs: F,
) -> nd::Array2<C64>
where F: Fn(usize, &nd::Array2<C64>) -> nd::Array2<C64>
{
    do_evolve_adaptive_stats(rho0, grid, rhs).0
}

pub(crate) fn do_evolve_adaptive_stats<F>(
    rho0: &nd::Array2<C64>,
    grid: &TimeGrid,
    rhs: F,
) -> (nd::Array2<C64>, AdaptiveStats)
where F: Fn(usize, &nd::Array2<C64>) -> nd::Array2<C64>
{
    let n = grid.len();
    let dt = grid.dt();
    let mut rho = rho0.clone();
    let mut s: usize = 2;
    let mut k: usize = 0;
    let mut stats = AdaptiveStats::default();
    let mut err: f64;
    let mut rho_half: nd::Array2<C64>;
    let mut rho_full: nd::Array2<C64>;
    let mut rho_double: nd::Array2<C64>;
    while k + 4 * s < n {
        let half = (s / 2).max(1);
        rho_half = rk4_stencil(&rhs, k, half, dt, &rho);
        rho_half = rk4_stencil(&rhs, k, half, dt, &rho_half);
        rho_full = rk4_stencil(&rhs, k, s, dt, &rho);
        err = max_abs_diff(&rho_half, &rho_full);
        if err < ADAPTIVE_TOL {
            rho_full = rk4_stencil(&rhs, k, s, dt, &rho_full);
            rho_double = rk4_stencil(&rhs, k, 2 * s, dt, &rho);
            err = max_abs_diff(&rho_full, &rho_double);
            rho = rho_full;
            k += 2 * s;
            stats.accepted += 1;
            if err < ADAPTIVE_TOL && s as f64 <= n as f64 / 100.0 {
                s *= 2;
                trace!(k, s, "adaptive step size increased");
            }
        } else {
            if s > 3 {
                s /= 2;
                trace!(k, s, "adaptive step size decreased");
            }
            rho = rho_half;
            k += s;
            stats.rejected += 1;
        }
        rho.renormalize();
    }
    debug!(
        steps = n,
        accepted = stats.accepted,
        rejected = stats.rejected,
        tail = n.saturating_sub(k),
        "adaptive propagation done",
    );
    (fixed_steps(&rhs, k, n, dt, rho, |_| { }), stats)
}
