//! Reduction of propagated states to a scalar figure of merit.

use ndarray as nd;
use num_complex::Complex64 as C64;
use serde::Deserialize;
use crate::{
    error::{ PulseError, PulseResult },
    nd_utils::{ diag_density, partial_trace, populations, trace, Subsystem },
};

/// Cosine similarity between the real diagonals of `rho` and `aim`.
///
/// This compares populations only: coherences are ignored, and the result is
/// 1 for any two states whose population vectors are parallel. Fails if
/// either population vector is exactly zero.
pub fn population_fidelity(rho: &nd::Array2<C64>, aim: &nd::Array2<C64>)
    -> PulseResult<f64>
{
    let p = populations(rho);
    let q = populations(aim);
    let np = p.dot(&p).sqrt();
    if np == 0.0 { return Err(PulseError::ZeroPopulation("state")); }
    let nq = q.dot(&q).sqrt();
    if nq == 0.0 { return Err(PulseError::ZeroPopulation("target")); }
    Ok((p / np).dot(&(q / nq)))
}

/// `|Tr(aim ρ)|`, which is `⟨ψ|ρ|ψ⟩` when `aim = |ψ⟩⟨ψ|`.
pub fn overlap_fidelity(rho: &nd::Array2<C64>, aim: &nd::Array2<C64>) -> f64 {
    trace(&aim.dot(rho)).norm()
}

/// Definition of the single-state fidelity.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FidelityMetric {
    /// [`population_fidelity`].
    #[default]
    Population,
    /// [`overlap_fidelity`].
    Overlap,
}

impl FidelityMetric {
    /// Compute the fidelity of `rho` to `aim`.
    pub fn eval(self, rho: &nd::Array2<C64>, aim: &nd::Array2<C64>)
        -> PulseResult<f64>
    {
        match self {
            Self::Population => population_fidelity(rho, aim),
            Self::Overlap => Ok(overlap_fidelity(rho, aim)),
        }
    }
}

/// Whether a figure of merit is to be maximized or minimized.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FomSense {
    /// Report the mean fidelity.
    #[default]
    Fidelity,
    /// Report `1 - mean fidelity`.
    Infidelity,
}

impl FomSense {
    /// Convert a mean fidelity into a figure of merit.
    pub fn apply(self, mean: f64) -> f64 {
        match self {
            Self::Fidelity => mean,
            Self::Infidelity => 1.0 - mean,
        }
    }
}

/// Unweighted arithmetic mean of per-member fidelities.
///
/// Fails if `fidelities` is empty.
pub fn ensemble_average<I>(fidelities: I) -> PulseResult<f64>
where I: IntoIterator<Item = f64>
{
    let (n, sum)
        = fidelities.into_iter()
        .fold((0_usize, 0.0_f64), |(n, sum), f| (n + 1, sum + f));
    if n == 0 {
        Err(PulseError::EmptyEnsemble)
    } else {
        Ok(sum / n as f64)
    }
}

/// Scores final states against a fixed target.
#[derive(Clone, Debug, PartialEq)]
pub struct Scorer {
    target: nd::Array2<C64>,
    metric: FidelityMetric,
    sense: FomSense,
    reduction: Option<((usize, usize), Subsystem)>,
}

impl Scorer {
    /// Create a new `Scorer` with the population metric and fidelity sense.
    pub fn new(target: nd::Array2<C64>) -> Self {
        Self {
            target,
            metric: FidelityMetric::default(),
            sense: FomSense::default(),
            reduction: None,
        }
    }

    /// Create a new `Scorer` whose target is the diagonal state with the
    /// given populations.
    pub fn from_populations(populations: &[f64]) -> Self {
        Self::new(diag_density(populations))
    }

    /// Set the single-state metric.
    pub fn with_metric(mut self, metric: FidelityMetric) -> Self {
        self.metric = metric;
        self
    }

    /// Set the sign convention of [`Self::score`].
    pub fn with_sense(mut self, sense: FomSense) -> Self {
        self.sense = sense;
        self
    }

    /// Trace out one subsystem of every state (with subsystem dimensions
    /// `dims`) before comparing it to the target.
    pub fn with_reduction(mut self, dims: (usize, usize), traced: Subsystem)
        -> Self
    {
        self.reduction = Some((dims, traced));
        self
    }

    /// Get a reference to the target.
    pub fn target(&self) -> &nd::Array2<C64> { &self.target }

    /// Get the single-state metric.
    pub fn metric(&self) -> FidelityMetric { self.metric }

    /// Get the sign convention.
    pub fn sense(&self) -> FomSense { self.sense }

    /// Fidelity of a single final state.
    pub fn fidelity(&self, rho: &nd::Array2<C64>) -> PulseResult<f64> {
        match self.reduction {
            Some((dims, traced)) => {
                let red = partial_trace(rho, dims, traced)?;
                self.metric.eval(&red, &self.target)
            },
            None => self.metric.eval(rho, &self.target),
        }
    }

    /// Convert per-member fidelities into the figure of merit.
    pub fn combine<I>(&self, fidelities: I) -> PulseResult<f64>
    where I: IntoIterator<Item = f64>
    {
        ensemble_average(fidelities).map(|mean| self.sense.apply(mean))
    }

    /// Figure of merit for an ensemble of final states.
    pub fn score<'a, I>(&self, states: I) -> PulseResult<f64>
    where I: IntoIterator<Item = &'a nd::Array2<C64>>
    {
        let fidelities: Vec<f64>
            = states.into_iter()
            .map(|rho| self.fidelity(rho))
            .collect::<PulseResult<_>>()?;
        self.combine(fidelities)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::linalg::kron;
    use crate::nd_utils::outer_prod;

    #[test]
    fn self_fidelity_is_one() {
        let rho = diag_density(&[0.2, 0.5, 0.3]);
        assert_relative_eq!(population_fidelity(&rho, &rho).unwrap(), 1.0, epsilon = 1e-15);
        let rho = diag_density(&[1.0, 0.0, 0.0]);
        assert_eq!(population_fidelity(&rho, &rho).unwrap(), 1.0);
    }

    #[test]
    fn orthogonal_populations_score_zero() {
        let rho = diag_density(&[1.0, 0.0, 0.0]);
        let aim = diag_density(&[0.0, 1.0, 0.0]);
        assert_eq!(population_fidelity(&rho, &aim).unwrap(), 0.0);
    }

    #[test]
    fn population_fidelity_ignores_coherences() {
        let psi = nd::array![C64::from(1.0), C64::from(1.0)] / 2.0_f64.sqrt();
        let plus = outer_prod(&psi, &psi);
        let mixed = diag_density(&[0.5, 0.5]);
        assert_relative_eq!(population_fidelity(&plus, &mixed).unwrap(), 1.0, epsilon = 1e-15);
        assert_relative_eq!(overlap_fidelity(&plus, &plus), 1.0, epsilon = 1e-15);
        assert_relative_eq!(overlap_fidelity(&mixed, &plus), 0.5, epsilon = 1e-15);
    }

    #[test]
    fn zero_population_is_an_error() {
        let rho = diag_density(&[0.0, 0.0, 0.0]);
        let aim = diag_density(&[0.0, 1.0, 0.0]);
        assert!(matches!(
            population_fidelity(&rho, &aim),
            Err(PulseError::ZeroPopulation("state")),
        ));
        assert!(matches!(
            population_fidelity(&aim, &rho),
            Err(PulseError::ZeroPopulation("target")),
        ));
    }

    #[test]
    fn identical_members_average_to_single() {
        let scorer = Scorer::from_populations(&[0.0, 1.0, 0.0]);
        let rho = diag_density(&[0.1, 0.8, 0.1]);
        let single = scorer.fidelity(&rho).unwrap();
        let ens = scorer.score([&rho, &rho, &rho]).unwrap();
        assert_relative_eq!(ens, single, epsilon = 1e-15);

        let scorer = scorer.with_sense(FomSense::Infidelity);
        let ens = scorer.score([&rho, &rho, &rho]).unwrap();
        assert_relative_eq!(ens, 1.0 - single, epsilon = 1e-15);
    }

    #[test]
    fn empty_ensemble_is_an_error() {
        let scorer = Scorer::from_populations(&[1.0, 0.0]);
        let states: Vec<nd::Array2<C64>> = Vec::new();
        assert!(matches!(scorer.score(&states), Err(PulseError::EmptyEnsemble)));
    }

    #[test]
    fn reduction_traces_out_subsystem() {
        let a = diag_density(&[0.0, 1.0]);
        let b = diag_density(&[0.5, 0.5]);
        let rho = kron(&a, &b);
        let scorer
            = Scorer::new(a.clone())
            .with_metric(FidelityMetric::Overlap)
            .with_reduction((2, 2), Subsystem::Second);
        assert_relative_eq!(scorer.fidelity(&rho).unwrap(), 1.0, epsilon = 1e-15);
    }
}
