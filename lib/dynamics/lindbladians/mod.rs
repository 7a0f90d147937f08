//! Lindbladian operators for pulse-driven systems.

use ndarray as nd;
use num_complex::Complex64 as C64;

pub mod nv;
pub use nv::LOperatorNV;

/// Basic requirements for any implementation of a Lindbladian operator.
pub trait LOp {
    /// Operate on a density matrix, returning the dissipative part of
    /// `dρ/dt`.
    fn op(&self, rho: &nd::Array2<C64>) -> nd::Array2<C64>;
}

/// A system without dissipation.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct NoDecay;

impl LOp for NoDecay {
    fn op(&self, rho: &nd::Array2<C64>) -> nd::Array2<C64> {
        nd::Array2::zeros(rho.raw_dim())
    }
}
