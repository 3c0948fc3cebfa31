//! Ready-made engines for u_t = alpha^2 u_xx. The stencil coefficients only
//! depend on the diffusion number lambda = alpha^2 dt / dx^2.
use crate::errors::PdeError;
use crate::numerical::PDE::finite_difference::{FiniteDifference, StencilCoefficients};
use crate::numerical::PDE::pde_equations::HeatEquation;

/// (lambda, 1 - 2 lambda, lambda); fails with `PdeError::Unstable` if lambda > 0.5
pub fn ftcs(heat: &HeatEquation) -> Result<FiniteDifference, PdeError> {
    FiniteDifference::ftcs_constant(heat, heat.lambda())
}

/// (-lambda, 1 + 2 lambda, -lambda), unconditionally stable
pub fn btcs(heat: &HeatEquation) -> FiniteDifference {
    let l = heat.lambda();
    FiniteDifference::btcs(heat, StencilCoefficients::constant(-l, 1.0 + 2.0 * l, -l))
}

pub fn crank_nicolson(heat: &HeatEquation) -> FiniteDifference {
    let l = heat.lambda();
    FiniteDifference::crank_nicolson(heat, StencilCoefficients::constant(l, l, l))
}
