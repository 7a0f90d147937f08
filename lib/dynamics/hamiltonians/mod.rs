//! Hamiltonian builders for pulse-driven systems.
//!
//! Builders are indexed by the position on a discrete time grid rather than by
//! a continuous time coordinate: the integrators in [`rabi`][crate::rabi] only
//! ever ask for the Hamiltonian at grid points.

use ndarray as nd;
use num_complex::Complex64 as C64;

pub mod nv;
pub use nv::{ HBuilderNV, NVDrive };

pub mod control;
pub use control::HBuilderControl;

/// Basic requirements for any Hamiltonian builder.
pub trait HBuild {
    /// Dimension of the Hilbert space.
    fn dim(&self) -> usize;

    /// Number of time-grid points the builder is defined on.
    fn len(&self) -> usize;

    /// Return `true` if the builder covers no time points.
    fn is_empty(&self) -> bool { self.len() == 0 }

    /// Build the Hamiltonian matrix at the `k`-th grid point.
    fn build_at(&self, k: usize) -> nd::Array2<C64>;

    /// Build the Hamiltonian as a 3D array, with the last axis corresponding
    /// to time.
    fn build(&self) -> nd::Array3<C64> {
        let n = self.dim();
        let nt = self.len();
        let mut H: nd::Array3<C64> = nd::Array3::zeros((n, n, nt));
        for k in 0..nt {
            H.slice_mut(nd::s![.., .., k]).assign(&self.build_at(k));
        }
        H
    }
}
