//! runnable examples of RustedPDE
/// linear and nonlinear solvers, heat and Black-Scholes equations, task documents
pub mod pde_examples;
