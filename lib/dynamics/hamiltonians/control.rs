//! A generic system with a fixed drift Hamiltonian and any number of linearly
//! coupled control channels.

use ndarray as nd;
use num_complex::Complex64 as C64;
use crate::{
    dynamics::hamiltonians::HBuild,
    error::{ PulseError, PulseResult },
    grid::TimeGrid,
};

/// Hamiltonian builder for
/// ```text
/// H(k) = H_d + s Σ_j u_j[k] H_j
/// ```
/// where `s` is an overall coupling scale, used to build ensembles over
/// miscalibrated control strengths.
#[derive(Clone, Debug)]
pub struct HBuilderControl<'a> {
    drift: &'a nd::Array2<C64>,
    controls: &'a [nd::Array2<C64>],
    amplitudes: Vec<nd::ArrayView1<'a, f64>>,
    scale: f64,
    len: usize,
}

impl<'a> HBuilderControl<'a> {
    /// Create a new `HBuilderControl`.
    ///
    /// Fails if any operator is not square with the drift's dimension, if
    /// fewer amplitude channels than control operators are given, or if any
    /// channel does not match the length of `grid`.
    pub fn new<I>(
        grid: &TimeGrid,
        drift: &'a nd::Array2<C64>,
        controls: &'a [nd::Array2<C64>],
        amplitudes: I,
    ) -> PulseResult<Self>
    where I: IntoIterator<Item = nd::ArrayView1<'a, f64>>
    {
        let dim = drift.nrows();
        let check_shape = |what: &'static str, op: &nd::Array2<C64>| {
            if op.nrows() != dim || op.ncols() != dim {
                Err(PulseError::BadShape {
                    what,
                    dim,
                    rows: op.nrows(),
                    cols: op.ncols(),
                })
            } else {
                Ok(())
            }
        };
        check_shape("drift Hamiltonian", drift)?;
        controls.iter()
            .try_for_each(|op| check_shape("control Hamiltonian", op))?;
        let amplitudes: Vec<nd::ArrayView1<f64>>
            = amplitudes.into_iter().take(controls.len()).collect();
        if amplitudes.len() < controls.len() {
            return Err(PulseError::MissingChannel {
                expected: controls.len(),
                got: amplitudes.len(),
            });
        }
        amplitudes.iter()
            .try_for_each(|u| grid.check_len("control amplitude", u.len()))?;
        Ok(Self { drift, controls, amplitudes, scale: 1.0, len: grid.len() })
    }

    /// Set the overall coupling scale of the control terms.
    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }
}

impl<'a> HBuild for HBuilderControl<'a> {
    fn dim(&self) -> usize { self.drift.nrows() }

    fn len(&self) -> usize { self.len }

    fn build_at(&self, k: usize) -> nd::Array2<C64> {
        self.controls.iter().zip(&self.amplitudes)
            .fold(self.drift.clone(), |acc, (Hj, uj)| {
                acc + Hj * (self.scale * uj[k])
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(re: f64) -> C64 { C64::from(re) }

    #[test]
    fn sums_drift_and_scaled_controls() {
        let grid = TimeGrid::from_duration(1.0, 5).unwrap();
        let drift = nd::array![[c(1.0), c(0.0)], [c(0.0), c(-1.0)]];
        let controls = vec![
            nd::array![[c(0.0), c(1.0)], [c(1.0), c(0.0)]],
            nd::array![[c(0.0), C64::new(0.0, -1.0)], [C64::new(0.0, 1.0), c(0.0)]],
        ];
        let u1 = nd::array![0.0, 1.0, 2.0, 3.0, 4.0];
        let u2 = nd::array![1.0, 1.0, 1.0, 1.0, 1.0];
        let hbuilder
            = HBuilderControl::new(
                &grid, &drift, &controls, [u1.view(), u2.view()])
            .unwrap()
            .with_scale(0.5);
        assert_eq!(hbuilder.len(), 5);
        let H = hbuilder.build_at(2);
        assert_eq!(H[[0, 0]], c(1.0));
        assert_eq!(H[[0, 1]], C64::new(1.0, -0.5));
        assert_eq!(H[[1, 0]], C64::new(1.0, 0.5));
    }

    #[test]
    fn rejects_missing_channel() {
        let grid = TimeGrid::from_duration(1.0, 5).unwrap();
        let drift: nd::Array2<C64> = nd::Array2::zeros((2, 2));
        let controls = vec![drift.clone(), drift.clone()];
        let u1 = nd::Array1::zeros(5);
        assert!(matches!(
            HBuilderControl::new(&grid, &drift, &controls, [u1.view()]),
            Err(PulseError::MissingChannel { expected: 2, got: 1 }),
        ));
    }

    #[test]
    fn rejects_mismatched_operator() {
        let grid = TimeGrid::from_duration(1.0, 5).unwrap();
        let drift: nd::Array2<C64> = nd::Array2::zeros((2, 2));
        let controls = vec![nd::Array2::zeros((3, 3))];
        let u1 = nd::Array1::zeros(5);
        assert!(matches!(
            HBuilderControl::new(&grid, &drift, &controls, [u1.view()]),
            Err(PulseError::BadShape { dim: 2, rows: 3, .. }),
        ));
    }
}
