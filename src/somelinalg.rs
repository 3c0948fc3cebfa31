//! some linear algebra functions used throughout the code
#![allow(non_camel_case_types)]
#![allow(non_snake_case)]
/// Jacobi, Gauss-Seidel and SOR fixed-point solvers for dense systems
pub mod iterative_solvers;
/// assembly of banded (tridiagonal) matrices
pub mod band_matrix;
/// diagnostics for linear systems and matrices: zero pivots and diagonal dominance
pub mod linear_sys_diagnostics;
