//! Physical models and the Hamiltonian/Lindbladian builders that turn a
//! discretized control pulse into the right-hand side of the master equation.

use std::f64::consts::TAU;
use ndarray as nd;
use num_complex::Complex64 as C64;
use serde::Deserialize;

pub mod hamiltonians;
pub use hamiltonians::{
    control::HBuilderControl,
    nv::{ HBuilderNV, NVDrive },
    HBuild,
};

pub mod lindbladians;
pub use lindbladians::{
    nv::LOperatorNV,
    LOp,
    NoDecay,
};

/// Zero-field splitting of the NV ground state (GHz).
pub const D_GS: f64 = 2.87;

/// Gyromagnetic ratio of the NV electron spin (GHz/G).
pub const GAMMA_NV: f64 = 2.8e-3;

/// Default bias field magnitude (G).
pub const B_FIELD: f64 = 510.0;

/// Static parameters of a driven NV center's ground-state triplet.
///
/// Levels are ordered `m_s = 0, -1, +1`, so that level 0 couples to level 1 at
/// `D_gs - γ B` and to level 2 at `D_gs + γ B`.
#[derive(Copy, Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PhysicalModel {
    /// Zero-field splitting `D_gs` (GHz).
    pub zero_field_splitting: f64,
    /// Gyromagnetic ratio `γ` (GHz/G).
    pub gyromagnetic_ratio: f64,
    /// Magnetic field magnitude `B` (G).
    pub field: f64,
}

impl Default for PhysicalModel {
    fn default() -> Self {
        Self {
            zero_field_splitting: D_GS,
            gyromagnetic_ratio: GAMMA_NV,
            field: B_FIELD,
        }
    }
}

impl PhysicalModel {
    /// Create a new `PhysicalModel`.
    pub fn new(zero_field_splitting: f64, gyromagnetic_ratio: f64, field: f64)
        -> Self
    {
        Self { zero_field_splitting, gyromagnetic_ratio, field }
    }

    /// Transition frequency `0 ↔ 1` (GHz).
    pub fn resonance_0(&self) -> f64 {
        self.zero_field_splitting - self.gyromagnetic_ratio * self.field
    }

    /// Transition frequency `0 ↔ 2` (GHz).
    pub fn resonance_1(&self) -> f64 {
        self.zero_field_splitting + self.gyromagnetic_ratio * self.field
    }

    /// Angular transition frequency `0 ↔ 1` (rad/ns).
    pub fn omega_0(&self) -> f64 {
        TAU * self.resonance_0()
    }

    /// Angular transition frequency `0 ↔ 2` (rad/ns).
    pub fn omega_1(&self) -> f64 {
        TAU * self.resonance_1()
    }
}

/// Decoherence parameters for one propagation.
///
/// Absent (or infinite) lifetimes correspond to vanishing rates.
#[derive(Copy, Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Decoherence {
    /// Population lifetime `T1` (ns).
    pub lifetime: Option<f64>,
    /// Dephasing time `T2` (ns).
    pub dephasing_time: Option<f64>,
    /// Microwave bandwidth broadening (GHz).
    pub mw_bandwidth: f64,
}

impl Decoherence {
    /// Create a new `Decoherence`.
    pub fn new(
        lifetime: Option<f64>,
        dephasing_time: Option<f64>,
        mw_bandwidth: f64,
    ) -> Self
    {
        Self { lifetime, dephasing_time, mw_bandwidth }
    }

    /// Population relaxation rate `Γ₁ = 1 / T1`.
    pub fn gamma_1(&self) -> f64 {
        self.lifetime.map(|t1| 1.0 / t1).unwrap_or(0.0)
    }

    /// Dephasing rate `Γ₂ = 1 / T2`.
    pub fn gamma_2(&self) -> f64 {
        self.dephasing_time.map(|t2| 1.0 / t2).unwrap_or(0.0)
    }

    /// Coherence decay rate `Γ₂ / 2 + mw_bandwidth` applied to off-diagonal
    /// elements.
    pub fn coherence_rate(&self) -> f64 {
        0.5 * self.gamma_2() + self.mw_bandwidth
    }
}

/// The three-level coupling matrix `M(t)` connecting level 0 to levels 1 and 2
/// with the free-evolution phases `exp(∓i ω t)`.
pub fn coupling_matrix(omega_0: f64, omega_1: f64, t: f64) -> nd::Array2<C64> {
    let z = C64::from(0.0);
    let ph0 = C64::cis(-omega_0 * t);
    let ph1 = C64::cis(-omega_1 * t);
    nd::array![
        [z,          ph0, ph1],
        [ph0.conj(), z,   z  ],
        [ph1.conj(), z,   z  ],
    ]
}
