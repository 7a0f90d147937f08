//! Error types for propagation, scoring, and objective evaluation.

use thiserror::Error;

/// Result type alias for fallible operations in this crate.
pub type PulseResult<T> = Result<T, PulseError>;

#[derive(Debug, Error)]
pub enum PulseError {
    /// The time grid has too few points for the integrators' stencils.
    #[error("time grid has {len} points; at least {min} are required")]
    GridTooShort { len: usize, min: usize },

    /// The time grid is not strictly increasing.
    #[error("time grid is not strictly increasing at index {0}")]
    GridNotIncreasing(usize),

    /// The time grid contains NaN or an infinity.
    #[error("time grid has a non-finite value at index {0}")]
    GridNonFinite(usize),

    /// A per-sample array does not match the length of the time grid.
    #[error("{what} has length {len}; expected {expected}")]
    LengthMismatch { what: &'static str, len: usize, expected: usize },

    /// A density matrix or operator has the wrong shape.
    #[error("{what} must be {dim}×{dim}; got {rows}×{cols}")]
    BadShape {
        what: &'static str,
        dim: usize,
        rows: usize,
        cols: usize,
    },

    /// A tracked matrix element lies outside the density matrix.
    #[error("matrix element ({row}, {col}) is out of range for dimension {dim}")]
    ElementOutOfRange { row: usize, col: usize, dim: usize },

    /// A population vector summed in quadrature to zero.
    #[error("population vector of the {0} has zero norm")]
    ZeroPopulation(&'static str),

    /// An ensemble average was requested over no members.
    #[error("cannot average over an empty ensemble")]
    EmptyEnsemble,

    /// An objective was called with fewer pulse channels than it drives.
    #[error("objective drives {expected} pulse channel(s); got {got}")]
    MissingChannel { expected: usize, got: usize },

    /// The figure of merit came out as NaN or infinite.
    #[error("figure of merit is not finite: {0}")]
    NonFinite(f64),

    /// The dimensions given for a partial trace do not factor the matrix.
    #[error("cannot split dimension {dim} into subsystems {n1}×{n2}")]
    BadPartition { dim: usize, n1: usize, n2: usize },

    /// A configuration file could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    /// A configuration file could not be read.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
