//! Drive a resonant π pulse on the NV `0 ↔ 1` transition, report the figure of
//! merit for both integration methods, and save the population trajectories.
//!
//! Usage: `nv_pi_pulse [config.toml]`

use std::path::PathBuf;
use ndarray as nd;
use tracing::info;
use tracing_subscriber::EnvFilter;
use nv_pulse_sim::{
    mkdir,
    write_npz,
    config::{ self, GridConfig, NvObjectiveConfig },
    dynamics::hamiltonians::nv::AMPLITUDE_SCALE,
    objective::Objective,
    rabi::{ Element, Method, Track },
};

const NSTEPS: usize = 5001;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .init();

    let outdir = PathBuf::from("output");
    mkdir!(outdir);

    let config: NvObjectiveConfig
        = match std::env::args().nth(1) {
            Some(path) => {
                info!(path = %path, "loading configuration");
                config::load(path)?
            },
            None => NvObjectiveConfig::default(),
        };
    let (duration, unit_scale)
        = match config.grid {
            GridConfig::Duration { duration } => (duration, 1.0),
            GridConfig::Explicit { unit } => (50.0, unit.to_ns()),
        };
    let objective = config.into_objective()?;

    // rotating-wave Rabi frequency is π A / 1000; a π pulse needs Ω T = π / 2
    let amplitude = AMPLITUDE_SCALE / (2.0 * duration);
    let pulse: nd::Array1<f64> = nd::Array1::from_elem(NSTEPS, amplitude);
    let time: nd::Array1<f64> = nd::Array1::linspace(0.0, duration, NSTEPS);
    let time_grid = &time / unit_scale;
    info!(amplitude, duration, steps = NSTEPS, "π pulse");

    let fom_rk
        = objective.clone()
        .with_method(Method::RungeKutta)
        .fnct(&[pulse.clone()], &[], &time_grid)?;
    let fom_rka
        = objective.clone()
        .with_method(Method::RungeKuttaAdaptive)
        .fnct(&[pulse.clone()], &[], &time_grid)?;
    info!(fom_rk, fom_rka, "figure of merit");

    let grid = objective.grid_for(NSTEPS, &time_grid)?;
    let track
        = Track::final_state()
        .with_all([Element::RHO_00, Element::RHO_11, Element::RHO_22]);
    let evo = objective.propagate(&pulse, &grid, 0.0, &track)?;
    let [p0, p1, p2]
        = [Element::RHO_00, Element::RHO_11, Element::RHO_22]
        .map(|e| {
            evo.trajectory(e)
                .map(|traj| traj.to_array())
                .unwrap_or_else(|| nd::Array1::zeros(0))
        });
    write_npz!(
        outdir.join("nv_pi_pulse.npz"),
        arrays: {
            "time" => grid.time(),
            "pulse" => &pulse,
            "rho_00" => &p0,
            "rho_11" => &p1,
            "rho_22" => &p2,
            "fom" => &nd::array![fom_rk, fom_rka],
        }
    );

    println!("done");
    Ok(())
}
