//! Evolution functions for the Lindblad master equation,
//! `dρ/dt = -i [H, ρ] + L(ρ)`.

use super::*;
use crate::{
    dynamics::{ HBuild, LOp },
    nd_utils::commutator,
};

fn rhs_op<L>(h: &nd::Array2<C64>, l: &L, rho: &nd::Array2<C64>)
    -> nd::Array2<C64>
where L: LOp
{
    -C64::i() * commutator(h, rho) + l.op(rho)
}

/// Numerically integrate the Lindblad equation with the fixed-step scheme.
///
/// Fails if `rho0` does not match the dimension of `hbuilder`, if `hbuilder`
/// is not defined on every point of `grid`, or if a tracked element is out of
/// range.
pub fn evolve<H, L>(
    rho0: &nd::Array2<C64>,
    hbuilder: &H,
    loperator: &L,
    grid: &TimeGrid,
    track: &Track,
) -> PulseResult<Evolution>
where
    H: HBuild,
    L: LOp,
{
    check_inputs(rho0, hbuilder.dim(), hbuilder.len(), grid, track)?;
    let res = do_evolve(
        rho0,
        grid,
        |k, rho| rhs_op(&hbuilder.build_at(k), loperator, rho),
        track,
    );
    Ok(res)
}

/// Numerically integrate the Lindblad equation with the adaptive scheme,
/// returning the final state.
pub fn evolve_adaptive<H, L>(
    rho0: &nd::Array2<C64>,
    hbuilder: &H,
    loperator: &L,
    grid: &TimeGrid,
) -> PulseResult<nd::Array2<C64>>
where
    H: HBuild,
    L: LOp,
{
    check_inputs(rho0, hbuilder.dim(), hbuilder.len(), grid, &Track::none())?;
    let res = do_evolve_adaptive(
        rho0,
        grid,
        |k, rho| rhs_op(&hbuilder.build_at(k), loperator, rho),
    );
    Ok(res)
}

/// Numerically integrate the Lindblad equation with a chosen method.
///
/// [`Method::RungeKuttaAdaptive`] only ever produces a final state: element
/// tracking in `track` is ignored for it, and the final state is always
/// returned.
pub fn evolve_with_method<H, L>(
    method: Method,
    rho0: &nd::Array2<C64>,
    hbuilder: &H,
    loperator: &L,
    grid: &TimeGrid,
    track: &Track,
) -> PulseResult<Evolution>
where
    H: HBuild,
    L: LOp,
{
    match method {
        Method::RungeKutta => {
            evolve(rho0, hbuilder, loperator, grid, track)
        },
        Method::RungeKuttaAdaptive => {
            if !track.elements().is_empty() {
                debug!("element tracking is unavailable for adaptive propagation");
            }
            let rho = evolve_adaptive(rho0, hbuilder, loperator, grid)?;
            Ok(Evolution { rho_end: Some(rho), trajectories: IndexMap::new() })
        },
    }
}

/// Propagate to the final state with a chosen method, without tracking.
pub fn propagate<H, L>(
    method: Method,
    rho0: &nd::Array2<C64>,
    hbuilder: &H,
    loperator: &L,
    grid: &TimeGrid,
) -> PulseResult<nd::Array2<C64>>
where
    H: HBuild,
    L: LOp,
{
    match method {
        Method::RungeKutta => {
            check_inputs(
                rho0, hbuilder.dim(), hbuilder.len(), grid, &Track::none())?;
            let res = do_evolve_final(
                rho0,
                grid,
                |k, rho| rhs_op(&hbuilder.build_at(k), loperator, rho),
            );
            Ok(res)
        },
        Method::RungeKuttaAdaptive => {
            evolve_adaptive(rho0, hbuilder, loperator, grid)
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
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
        nd_utils::{ diag_density, max_abs_diff },
        rabi::liouville,
    };

    struct Setup {
        grid: TimeGrid,
        model: PhysicalModel,
        amp: nd::Array1<f64>,
        freq: nd::Array1<f64>,
    }

    impl Setup {
        fn resonant(duration: f64, n: usize, amplitude: f64) -> Self {
            let grid = TimeGrid::from_duration(duration, n).unwrap();
            let model = PhysicalModel::default();
            let amp = nd::Array1::from_elem(n, amplitude);
            let freq = nd::Array1::from_elem(n, model.resonance_0());
            Self { grid, model, amp, freq }
        }

        fn hbuilder(&self) -> HBuilderNV<'_> {
            let drive = NVDrive::new(self.amp.view(), self.freq.view());
            HBuilderNV::new(&self.grid, &self.model, drive).unwrap()
        }
    }

    fn all_elements() -> Track {
        Track::final_state()
            .with_all([
                Element::RHO_00,
                Element::RHO_01,
                Element::RHO_10,
                Element::RHO_11,
                Element::RHO_22,
            ])
    }

    #[test]
    fn zero_decoherence_matches_unitary() {
        let setup = Setup::resonant(20.0, 401, 10.0);
        let hbuilder = setup.hbuilder();
        let rho0 = diag_density(&[1.0, 0.0, 0.0]);
        let track = all_elements();
        let loperator = LOperatorNV::from(Decoherence::default());
        let lind = evolve(&rho0, &hbuilder, &loperator, &setup.grid, &track)
            .unwrap();
        let unit = liouville::evolve(&rho0, &hbuilder, &setup.grid, &track)
            .unwrap();
        assert_eq!(lind, unit);
        let no_decay = evolve(&rho0, &hbuilder, &NoDecay, &setup.grid, &track)
            .unwrap();
        assert_eq!(no_decay, unit);
    }

    #[test]
    fn zero_pulse_leaves_state_unchanged() {
        let setup = Setup::resonant(50.0, 101, 0.0);
        let hbuilder = setup.hbuilder();
        let rho0 = diag_density(&[0.6, 0.3, 0.1]);
        let evo = evolve(
            &rho0, &hbuilder, &NoDecay, &setup.grid, &all_elements()).unwrap();
        for p in evo.population(Element::RHO_11).unwrap() {
            assert_relative_eq!(*p, 0.3, epsilon = 1e-14);
        }
        let rho = evo.rho_end().unwrap();
        for (x, y) in rho.iter().zip(rho0.iter()) {
            assert!((x - y).norm() < 1e-14);
        }
    }

    #[test]
    fn population_decays_into_ground_level() {
        let setup = Setup::resonant(50.0, 1001, 0.0);
        let hbuilder = setup.hbuilder();
        let rho0 = diag_density(&[0.0, 1.0, 0.0]);
        let loperator
            = LOperatorNV::from(Decoherence::new(Some(100.0), None, 0.0));
        let evo = evolve(
            &rho0, &hbuilder, &loperator, &setup.grid, &all_elements()).unwrap();
        let rho = evo.rho_end().unwrap();
        // 2π Γ₁ T = π
        let expected = (-std::f64::consts::PI).exp();
        assert_relative_eq!(rho[[1, 1]].re, expected, epsilon = 5e-3);
        assert_relative_eq!(rho[[0, 0]].re, 1.0 - expected, epsilon = 5e-3);
        assert!(
            evo.population(Element::RHO_11).unwrap()
                .windows(2)
                .all(|w| w[1] <= w[0])
        );
    }

    #[test]
    fn dephasing_damps_coherences() {
        let setup = Setup::resonant(20.0, 401, 10.0);
        let hbuilder = setup.hbuilder();
        let rho0 = diag_density(&[1.0, 0.0, 0.0]);
        let track = Track::final_state().with(Element::RHO_01);
        let clean = evolve(&rho0, &hbuilder, &NoDecay, &setup.grid, &track)
            .unwrap();
        let loperator
            = LOperatorNV::from(Decoherence::new(None, Some(20.0), 0.0));
        let noisy = evolve(&rho0, &hbuilder, &loperator, &setup.grid, &track)
            .unwrap();
        let c_clean = clean.coherence(Element::RHO_01).unwrap();
        let c_noisy = noisy.coherence(Element::RHO_01).unwrap();
        assert!(c_noisy.last().unwrap().norm() < c_clean.last().unwrap().norm());
    }

    #[test]
    fn trace_is_kept_at_one_with_decay() {
        let setup = Setup::resonant(50.0, 1001, 10.0);
        let hbuilder = setup.hbuilder();
        let rho0 = diag_density(&[1.0, 0.0, 0.0]);
        let loperator
            = LOperatorNV::from(Decoherence::new(Some(200.0), Some(100.0), 1e-3));
        let evo = evolve(
            &rho0, &hbuilder, &loperator, &setup.grid, &all_elements()).unwrap();
        let p0 = evo.population(Element::RHO_00).unwrap();
        let p1 = evo.population(Element::RHO_11).unwrap();
        let p2 = evo.population(Element::RHO_22).unwrap();
        for ((a, b), c) in p0.iter().zip(p1).zip(p2) {
            assert!((a + b + c - 1.0).abs() < 1e-12);
        }
        let rho = evolve_adaptive(&rho0, &hbuilder, &loperator, &setup.grid)
            .unwrap();
        let tr: C64 = rho.diag().iter().sum();
        assert!((tr - 1.0).norm() < 1e-12);
    }

    #[test]
    fn method_dispatch() {
        let setup = Setup::resonant(20.0, 401, 10.0);
        let hbuilder = setup.hbuilder();
        let rho0 = diag_density(&[1.0, 0.0, 0.0]);
        let track = Track::none().with(Element::RHO_11);
        let fixed = evolve_with_method(
            Method::RungeKutta, &rho0, &hbuilder, &NoDecay, &setup.grid, &track)
            .unwrap();
        assert!(fixed.rho_end.is_none());
        assert_eq!(fixed.population(Element::RHO_11).unwrap().len(), 401);
        let adaptive = evolve_with_method(
            Method::RungeKuttaAdaptive,
            &rho0, &hbuilder, &NoDecay, &setup.grid, &track,
        ).unwrap();
        assert!(adaptive.rho_end.is_some());
        assert!(adaptive.trajectories.is_empty());
    }

    #[test]
    fn propagate_matches_tracked_evolution() {
        let setup = Setup::resonant(20.0, 401, 10.0);
        let hbuilder = setup.hbuilder();
        let rho0 = diag_density(&[1.0, 0.0, 0.0]);
        let loperator
            = LOperatorNV::from(Decoherence::new(Some(200.0), Some(100.0), 0.0));
        for method in [Method::RungeKutta, Method::RungeKuttaAdaptive] {
            let rho = propagate(method, &rho0, &hbuilder, &loperator, &setup.grid)
                .unwrap();
            let evo = evolve_with_method(
                method, &rho0, &hbuilder, &loperator, &setup.grid, &all_elements())
                .unwrap();
            assert_eq!(Some(rho), evo.rho_end);
        }
    }

    #[test]
    fn adaptive_accepts_steps_on_slow_control() {
        // weak σx drive with a single 50 ns period
        let n = 2001;
        let duration = 50.0;
        let grid = TimeGrid::from_duration(duration, n).unwrap();
        let z = C64::from(0.0);
        let o = C64::from(1.0);
        let drift: nd::Array2<C64> = nd::Array2::zeros((3, 3));
        let controls = vec![nd::array![[z, o, z], [o, z, z], [z, z, z]]];
        let u = grid.time().mapv(|t| 0.02 * (std::f64::consts::TAU * t / duration).sin());
        let hbuilder
            = HBuilderControl::new(&grid, &drift, &controls, [u.view()])
            .unwrap();
        let rho0 = diag_density(&[1.0, 0.0, 0.0]);
        let rhs = |k: usize, rho: &nd::Array2<C64>| {
            rhs_op(&hbuilder.build_at(k), &NoDecay, rho)
        };

        let fixed = do_evolve_final(&rho0, &grid, rhs);
        let (adaptive, stats) = do_evolve_adaptive_stats(&rho0, &grid, rhs);
        assert!(stats.accepted > 0, "{:?}", stats);
        assert!(stats.rejected > 0, "{:?}", stats);
        // the drive is sampled at the start of each adaptive iteration, so the
        // gap is set by that sampling lag rather than by the local tolerance
        let diff = max_abs_diff(&fixed, &adaptive);
        assert!(diff < 2e-4, "diff = {}", diff);
    }
}
