//! Evolution functions for the Liouville equation, `dρ/dt = -i [H, ρ]`.

use super::*;
use crate::{ dynamics::HBuild, nd_utils::commutator };

fn rhs(h: &nd::Array2<C64>, rho: &nd::Array2<C64>) -> nd::Array2<C64> {
    -C64::i() * commutator(h, rho)
}

/// Numerically integrate the Liouville equation with the fixed-step scheme.
///
/// Fails if `rho0` does not match the dimension of `hbuilder`, if `hbuilder`
/// is not defined on every point of `grid`, or if a tracked element is out of
/// range.
pub fn evolve<H>(
    rho0: &nd::Array2<C64>,
    hbuilder: &H,
    grid: &TimeGrid,
    track: &Track,
) -> PulseResult<Evolution>
where H: HBuild
{
    check_inputs(rho0, hbuilder.dim(), hbuilder.len(), grid, track)?;
    let res = do_evolve(
        rho0, grid, |k, rho| rhs(&hbuilder.build_at(k), rho), track);
    Ok(res)
}

/// Numerically integrate the Liouville equation with the adaptive scheme,
/// returning the final state.
pub fn evolve_adaptive<H>(
    rho0: &nd::Array2<C64>,
    hbuilder: &H,
    grid: &TimeGrid,
) -> PulseResult<nd::Array2<C64>>
where H: HBuild
{
    check_inputs(rho0, hbuilder.dim(), hbuilder.len(), grid, &Track::none())?;
    let res = do_evolve_adaptive(
        rho0, grid, |k, rho| rhs(&hbuilder.build_at(k), rho));
    Ok(res)
}
