//! Small numerical helpers on complex-valued `ndarray` matrices.

use itertools::iproduct;
use ndarray as nd;
use num_complex::Complex64 as C64;
use num_traits::Zero;
use crate::error::{ PulseError, PulseResult };

/// Compute the commutator `[A, B] = A B - B A`.
pub fn commutator<SA, SB>(
    A: &nd::ArrayBase<SA, nd::Ix2>,
    B: &nd::ArrayBase<SB, nd::Ix2>,
) -> nd::Array2<C64>
where
    SA: nd::Data<Elem = C64>,
    SB: nd::Data<Elem = C64>,
{
    A.dot(B) - B.dot(A)
}

/// Compute the (complex) trace of a square matrix.
pub fn trace<S>(A: &nd::ArrayBase<S, nd::Ix2>) -> C64
where S: nd::Data<Elem = C64>
{
    A.diag().iter().sum()
}

/// Compute a "norm" of an object, treating it as a representation of a quantum
/// state.
pub trait StateNorm {
    fn norm(&self) -> C64;

    /// Divide `self` by its own norm.
    fn renormalize(&mut self);
}

/// The norm of a density matrix is its trace.
impl StateNorm for nd::Array2<C64> {
    fn norm(&self) -> C64 { trace(self) }

    fn renormalize(&mut self) {
        let norm = self.norm();
        *self /= norm;
    }
}

/// Extract the real part of the main diagonal.
pub fn populations<S>(rho: &nd::ArrayBase<S, nd::Ix2>) -> nd::Array1<f64>
where S: nd::Data<Elem = C64>
{
    rho.diag().mapv(|p| p.re)
}

/// Largest element-wise absolute difference between two arrays of the same
/// shape.
pub fn max_abs_diff<SA, SB, D>(
    A: &nd::ArrayBase<SA, D>,
    B: &nd::ArrayBase<SB, D>,
) -> f64
where
    SA: nd::Data<Elem = C64>,
    SB: nd::Data<Elem = C64>,
    D: nd::Dimension,
{
    nd::Zip::from(A).and(B)
        .fold(0.0_f64, |acc, a, b| acc.max((*a - *b).norm()))
}

/// Compute the outer product `|a⟩⟨b|`.
pub fn outer_prod(a: &nd::Array1<C64>, b: &nd::Array1<C64>)
    -> nd::Array2<C64>
{
    let n = a.len();
    let m = b.len();
    nd::Array2::from_shape_fn((n, m), |(i, j)| a[i] * b[j].conj())
}

/// Build a diagonal density matrix from real populations.
pub fn diag_density(pops: &[f64]) -> nd::Array2<C64> {
    nd::Array2::from_diag(
        &pops.iter().map(|p| C64::from(*p)).collect::<nd::Array1<C64>>()
    )
}

/// Names one half of a bipartite system.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Subsystem {
    First,
    Second,
}

/// Trace out one subsystem of a bipartite density matrix with subsystem
/// dimensions `(n1, n2)`, returning the reduced matrix of the other.
pub fn partial_trace<S>(
    rho: &nd::ArrayBase<S, nd::Ix2>,
    dims: (usize, usize),
    traced: Subsystem,
) -> PulseResult<nd::Array2<C64>>
where S: nd::Data<Elem = C64>
{
    let (n1, n2) = dims;
    let dim = rho.nrows();
    if !rho.is_square() || n1 * n2 != dim {
        return Err(PulseError::BadPartition { dim, n1, n2 });
    }
    let red = match traced {
        Subsystem::First => {
            let mut red: nd::Array2<C64> = nd::Array2::zeros((n2, n2));
            for (i, j, k) in iproduct!(0..n1, 0..n2, 0..n2) {
                red[[j, k]] += rho[[i * n2 + j, i * n2 + k]];
            }
            red
        },
        Subsystem::Second => {
            let mut red: nd::Array2<C64> = nd::Array2::zeros((n1, n1));
            for (j, k, i) in iproduct!(0..n1, 0..n1, 0..n2) {
                red[[j, k]] += rho[[j * n2 + i, k * n2 + i]];
            }
            red
        },
    };
    Ok(red)
}

/// Return `true` if every element of `A` is exactly zero.
pub fn is_zero<S>(A: &nd::ArrayBase<S, nd::Ix2>) -> bool
where S: nd::Data<Elem = C64>
{
    A.iter().all(|a| a.is_zero())
}
