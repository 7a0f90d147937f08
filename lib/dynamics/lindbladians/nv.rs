//! Relaxation and dephasing in the NV ground-state triplet.
//!
//! See also [`hamiltonians::nv`][super::super::hamiltonians::nv].

use std::f64::consts::TAU;
use ndarray as nd;
use num_complex::Complex64 as C64;
use crate::dynamics::{ lindbladians::LOp, Decoherence };

/// Lindbladian operator for the three-level NV system.
///
/// Levels 1 and 2 each decay into level 0 at rate `Γ₁`, and the coherences
/// `ρ₀₁` and `ρ₀₂` decay at rate `Γ₂ / 2 + mw_bandwidth`; both rates are scaled
/// by `2π`. The two decay channels are evaluated as separate terms and summed,
/// so with all rates zero the result is an exact zero matrix.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LOperatorNV {
    gamma_1: f64,
    coherence_rate: f64,
}

impl From<Decoherence> for LOperatorNV {
    fn from(decoherence: Decoherence) -> Self { Self::new(&decoherence) }
}

impl LOperatorNV {
    /// Create a new `LOperatorNV`.
    pub fn new(decoherence: &Decoherence) -> Self {
        Self {
            gamma_1: decoherence.gamma_1(),
            coherence_rate: decoherence.coherence_rate(),
        }
    }

    // decay channel 1 → 0
    fn channel_0(&self, rho: &nd::Array2<C64>) -> nd::Array2<C64> {
        let z = C64::from(0.0);
        let g = self.gamma_1;
        let c = self.coherence_rate;
        nd::array![
            [g * rho[[1, 1]],  -c * rho[[0, 1]], z],
            [-c * rho[[1, 0]], -g * rho[[1, 1]], z],
            [z,                z,                z],
        ] * TAU
    }

    // decay channel 2 → 0
    fn channel_1(&self, rho: &nd::Array2<C64>) -> nd::Array2<C64> {
        let z = C64::from(0.0);
        let g = self.gamma_1;
        let c = self.coherence_rate;
        nd::array![
            [g * rho[[2, 2]],  z, -c * rho[[0, 2]]],
            [z,                z, z               ],
            [-c * rho[[2, 0]], z, -g * rho[[2, 2]]],
        ] * TAU
    }
}

impl LOp for LOperatorNV {
    fn op(&self, rho: &nd::Array2<C64>) -> nd::Array2<C64> {
        self.channel_0(rho) + self.channel_1(rho)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use crate::nd_utils::is_zero;

    fn rho_mixed() -> nd::Array2<C64> {
        nd::array![
            [C64::new(0.5, 0.0), C64::new(0.1, 0.2), C64::new(0.0, 0.1)],
            [C64::new(0.1, -0.2), C64::new(0.3, 0.0), C64::new(0.05, 0.0)],
            [C64::new(0.0, -0.1), C64::new(0.05, 0.0), C64::new(0.2, 0.0)],
        ]
    }

    #[test]
    fn zero_rates_give_zero_operator() {
        let L = LOperatorNV::from(Decoherence::default());
        assert!(is_zero(&L.op(&rho_mixed())));
    }

    #[test]
    fn decay_is_trace_preserving() {
        let L = LOperatorNV::from(Decoherence::new(Some(100.0), Some(50.0), 1e-3));
        let out = L.op(&rho_mixed());
        let tr: C64 = out.diag().iter().sum();
        assert_relative_eq!(tr.re, 0.0, epsilon = 1e-15);
        assert_relative_eq!(tr.im, 0.0, epsilon = 1e-15);
    }

    #[test]
    fn rates_enter_with_two_pi() {
        let dec = Decoherence::new(Some(100.0), Some(50.0), 1e-3);
        let L = LOperatorNV::new(&dec);
        let rho = rho_mixed();
        let out = L.op(&rho);
        let g = 0.01;
        let c = 0.5 * 0.02 + 1e-3;
        assert_relative_eq!(out[[0, 0]].re, TAU * g * (0.3 + 0.2), epsilon = 1e-15);
        assert_relative_eq!(out[[1, 1]].re, -TAU * g * 0.3, epsilon = 1e-15);
        assert_relative_eq!(out[[0, 1]].im, -TAU * c * 0.2, epsilon = 1e-15);
        assert_eq!(out[[1, 2]], C64::from(0.0));
    }
}
