/// Newton's method for systems of nonlinear equations with Gauss-Seidel inner solves
pub mod Newton_systems;
/// finite-difference solvers for parabolic PDEs
pub mod PDE;
