//! Parabolic PDEs solved by finite differences: FTCS, BTCS and Crank-Nicolson
//! time stepping over equations described by their stencil coefficients.
pub mod pde_equations;
pub mod finite_difference;
/// u_t = alpha^2 u_xx
pub mod heat_equation;
/// Black-Scholes with constant or stochastic volatility
pub mod black_scholes;
/// configuration of solvers from task documents
pub mod pde_task;
