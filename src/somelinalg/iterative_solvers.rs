//! Stationary iterative methods for dense square systems `A x = b`:
//! Jacobi, Gauss-Seidel and Successive Over-Relaxation.
//!  Example
//! ```
//! use RustedPDE::somelinalg::iterative_solvers::LinearSystem;
//! use nalgebra::{DMatrix, DVector};
//! let mat = DMatrix::from_row_slice(3, 3, &[4.0, 3.0, 0.0, 3.0, 4.0, -1.0, 0.0, -1.0, 4.0]);
//! let b = DVector::from_vec(vec![24.0, 30.0, -24.0]);
//! let sor = LinearSystem::sor(mat, b, 1.25).unwrap();
//! let solution = sor.solve(&DVector::from_vec(vec![1.0, 1.0, 1.0])).unwrap();
//! assert!(solution.converged);
//! assert!((solution.x[2] + 5.0).abs() < 1e-2);
//! ```
use crate::errors::LinearSystemError;
use crate::somelinalg::linear_sys_diagnostics::{is_diagonally_dominant, zero_pivot};
use enum_dispatch::enum_dispatch;
use log::{debug, warn};
use nalgebra::{DMatrix, DVector};

pub const DEFAULT_TOLERANCE: f64 = 1e-3;
pub const DEFAULT_MAX_ITER: usize = 1000;

////////////////////////////////////////////////////////////////
//  STOPPING CRITERION shared by linear and nonlinear iterations
////////////////////////////////////////////////////////////////
/// tolerance on the Euclidean norm of the step between successive iterates
/// and a hard cap on the number of iterations
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StoppingCriterion {
    pub tolerance: f64,
    pub max_iter: usize,
}

impl StoppingCriterion {
    pub fn new(tolerance: f64, max_iter: usize) -> StoppingCriterion {
        StoppingCriterion {
            tolerance,
            max_iter,
        }
    }
    /// ||xi - x0||_2
    pub fn step_norm(xi: &DVector<f64>, x0: &DVector<f64>) -> f64 {
        (xi - x0).norm()
    }
    /// true while the step is still larger than the tolerance
    pub fn keep_going(&self, step_norm: f64) -> bool {
        step_norm > self.tolerance
    }
    /// emits a warning when the cap was hit before the step dropped below tolerance
    pub fn report(&self, solver: &str, iterations: usize, converged: bool) {
        if !converged && iterations == self.max_iter {
            warn!(
                "{} did not converge in {} iterations (tolerance {:e}), returning the last iterate",
                solver, self.max_iter, self.tolerance
            );
        }
    }
}

impl Default for StoppingCriterion {
    fn default() -> Self {
        StoppingCriterion::new(DEFAULT_TOLERANCE, DEFAULT_MAX_ITER)
    }
}

////////////////////////////////////////////////////////////////
//  UPDATE RULES
////////////////////////////////////////////////////////////////
#[enum_dispatch]
pub trait FixedPointSweep {
    /// overwrites `xi` with the next iterate; `x0` holds the previous one and
    /// `xi` enters the sweep as its copy
    fn sweep(
        &self,
        mat: &DMatrix<f64>,
        b: &DVector<f64>,
        x0: &DVector<f64>,
        xi: &mut DVector<f64>,
    );
    fn name(&self) -> &'static str;
}

/// every component of the new iterate uses old values only
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Jacobi;

/// components below `i` are taken from the iterate being built
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GaussSeidel;

/// Gauss-Seidel sweep blended with the previous value by the relaxation factor
/// `omega`. The range of `omega` is not checked: `0 < omega < 2` is on the caller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sor {
    pub omega: f64,
}

impl Sor {
    pub fn new(omega: f64) -> Sor {
        Sor { omega }
    }
}

// x_i = (b_i - sum_{j<i} A_ij xi_j - sum_{j>i} A_ij x0_j) / A_ii
fn gauss_seidel_component(
    mat: &DMatrix<f64>,
    b: &DVector<f64>,
    x0: &DVector<f64>,
    xi: &DVector<f64>,
    i: usize,
) -> f64 {
    let n = b.len();
    let lower: f64 = (0..i).map(|j| mat[(i, j)] * xi[j]).sum();
    let upper: f64 = (i + 1..n).map(|j| mat[(i, j)] * x0[j]).sum();
    (b[i] - lower - upper) / mat[(i, i)]
}

impl FixedPointSweep for Jacobi {
    fn sweep(
        &self,
        mat: &DMatrix<f64>,
        b: &DVector<f64>,
        x0: &DVector<f64>,
        xi: &mut DVector<f64>,
    ) {
        let n = b.len();
        for i in 0..n {
            let off_diagonal: f64 = (0..n)
                .filter(|&j| j != i)
                .map(|j| mat[(i, j)] * x0[j])
                .sum();
            xi[i] = (b[i] - off_diagonal) / mat[(i, i)];
        }
    }
    fn name(&self) -> &'static str {
        "Jacobi"
    }
}

impl FixedPointSweep for GaussSeidel {
    fn sweep(
        &self,
        mat: &DMatrix<f64>,
        b: &DVector<f64>,
        x0: &DVector<f64>,
        xi: &mut DVector<f64>,
    ) {
        for i in 0..b.len() {
            xi[i] = gauss_seidel_component(mat, b, x0, xi, i);
        }
    }
    fn name(&self) -> &'static str {
        "Gauss-Seidel"
    }
}

impl FixedPointSweep for Sor {
    fn sweep(
        &self,
        mat: &DMatrix<f64>,
        b: &DVector<f64>,
        x0: &DVector<f64>,
        xi: &mut DVector<f64>,
    ) {
        let omega = self.omega;
        for i in 0..b.len() {
            let gs = gauss_seidel_component(mat, b, x0, xi, i);
            xi[i] = (1.0 - omega) * x0[i] + omega * gs;
        }
    }
    fn name(&self) -> &'static str {
        "SOR"
    }
}

#[enum_dispatch(FixedPointSweep)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IterativeMethod {
    Jacobi,
    GaussSeidel,
    Sor,
}

////////////////////////////////////////////////////////////////
//  LINEAR SYSTEM
////////////////////////////////////////////////////////////////
/// outcome of an iterative solve; `converged == false` means the iteration cap
/// was reached and `x` is the last iterate
#[derive(Debug, Clone, PartialEq)]
pub struct IterativeSolution {
    pub x: DVector<f64>,
    pub iterations: usize,
    pub converged: bool,
    /// norm of the last step, infinite if no step was taken
    pub step_norm: f64,
}

#[derive(Debug, Clone)]
pub struct LinearSystem {
    mat: DMatrix<f64>,
    b: DVector<f64>,
    method: IterativeMethod,
    criterion: StoppingCriterion,
}

impl LinearSystem {
    /// fails if `mat` is not square or `b` does not match its size
    pub fn new(
        mat: DMatrix<f64>,
        b: DVector<f64>,
        method: IterativeMethod,
    ) -> Result<LinearSystem, LinearSystemError> {
        let (rows, cols) = mat.shape();
        if rows != cols {
            return Err(LinearSystemError::NotSquare { rows, cols });
        }
        if b.len() != rows {
            return Err(LinearSystemError::DimensionMismatch {
                expected: rows,
                found: b.len(),
            });
        }
        Ok(LinearSystem {
            mat,
            b,
            method,
            criterion: StoppingCriterion::default(),
        })
    }
    pub fn jacobi(mat: DMatrix<f64>, b: DVector<f64>) -> Result<LinearSystem, LinearSystemError> {
        LinearSystem::new(mat, b, Jacobi.into())
    }
    pub fn gauss_seidel(
        mat: DMatrix<f64>,
        b: DVector<f64>,
    ) -> Result<LinearSystem, LinearSystemError> {
        LinearSystem::new(mat, b, GaussSeidel.into())
    }
    pub fn sor(
        mat: DMatrix<f64>,
        b: DVector<f64>,
        omega: f64,
    ) -> Result<LinearSystem, LinearSystemError> {
        LinearSystem::new(mat, b, Sor::new(omega).into())
    }
    ////////////////////////////SETTERS///////////////////////////////////
    pub fn with_tolerance(mut self, tolerance: f64) -> LinearSystem {
        self.criterion.tolerance = tolerance;
        self
    }
    pub fn with_max_iter(mut self, max_iter: usize) -> LinearSystem {
        self.criterion.max_iter = max_iter;
        self
    }
    pub fn with_criterion(mut self, criterion: StoppingCriterion) -> LinearSystem {
        self.criterion = criterion;
        self
    }
    ////////////////////////////GETTERS///////////////////////////////////
    pub fn mat(&self) -> &DMatrix<f64> {
        &self.mat
    }
    pub fn b(&self) -> &DVector<f64> {
        &self.b
    }
    pub fn method(&self) -> IterativeMethod {
        self.method
    }
    pub fn tolerance(&self) -> f64 {
        self.criterion.tolerance
    }
    pub fn max_iter(&self) -> usize {
        self.criterion.max_iter
    }
    /// number of unknowns
    pub fn dim(&self) -> usize {
        self.b.len()
    }
    /////////////////////////////////////////////////////////////////////
    //                ITERATIONS
    /////////////////////////////////////////////////////////////////////
    /// iterate from `x0` until the step norm drops to the tolerance or the cap is hit
    pub fn solve(&self, x0: &DVector<f64>) -> Result<IterativeSolution, LinearSystemError> {
        let n = self.dim();
        if x0.len() != n {
            return Err(LinearSystemError::DimensionMismatch {
                expected: n,
                found: x0.len(),
            });
        }
        if let Some(row) = zero_pivot(&self.mat) {
            return Err(LinearSystemError::SingularMatrix { row });
        }

        let mut x0 = x0.clone();
        let mut xi = x0.clone();
        let mut i = 0;
        let mut step_norm = f64::INFINITY;
        let mut continue_iterate = true;
        while i < self.criterion.max_iter && continue_iterate {
            self.method.sweep(&self.mat, &self.b, &x0, &mut xi);
            step_norm = StoppingCriterion::step_norm(&xi, &x0);
            continue_iterate = self.criterion.keep_going(step_norm);
            i += 1;
            x0.copy_from(&xi);
        }
        let converged = !continue_iterate;
        debug!(
            "{}: {} iterations, last step norm {:e}",
            self.method.name(),
            i,
            step_norm
        );
        if !converged && n > 0 && !is_diagonally_dominant(&self.mat) {
            warn!("the matrix is not diagonally dominant, convergence is not guaranteed");
        }
        self.criterion.report(self.method.name(), i, converged);

        Ok(IterativeSolution {
            x: xi,
            iterations: i,
            converged,
            step_norm,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn dominant_system() -> (DMatrix<f64>, DVector<f64>, DVector<f64>) {
        let mat = DMatrix::from_row_slice(
            4,
            4,
            &[
                10.0, -1.0, 2.0, 0.0, -1.0, 11.0, -1.0, 3.0, 2.0, -1.0, 10.0, -1.0, 0.0, 3.0, -1.0,
                8.0,
            ],
        );
        let b = DVector::from_vec(vec![6.0, 25.0, -11.0, 15.0]);
        let x0 = DVector::zeros(4);
        (mat, b, x0)
    }

    #[test]
    fn test_jacobi() {
        let (mat, b, x0) = dominant_system();
        let jacobi = LinearSystem::jacobi(mat, b).unwrap();
        let solution = jacobi.solve(&x0).unwrap();
        let expected = [0.99994242, 2.00008477, -1.00006833, 1.0001085];
        assert!(solution.converged);
        assert_eq!(solution.iterations, 11);
        for (x, e) in solution.x.iter().zip(expected.iter()) {
            assert_relative_eq!(*x, *e, epsilon = 1e-7);
        }
    }

    #[test]
    fn test_gauss_seidel() {
        let (mat, b, x0) = dominant_system();
        let gauss_seidel = LinearSystem::gauss_seidel(mat, b).unwrap();
        let solution = gauss_seidel.solve(&x0).unwrap();
        let expected = [1.00009128, 2.00002134, -1.00003115, 0.9999881];
        assert!(solution.converged);
        assert_eq!(solution.iterations, 5);
        for (x, e) in solution.x.iter().zip(expected.iter()) {
            assert_relative_eq!(*x, *e, epsilon = 1e-7);
        }
    }

    #[test]
    fn test_jacobi_and_gauss_seidel_agree() {
        let (mat, b, x0) = dominant_system();
        let jacobi = LinearSystem::jacobi(mat.clone(), b.clone())
            .unwrap()
            .with_tolerance(1e-10)
            .solve(&x0)
            .unwrap();
        let gauss_seidel = LinearSystem::gauss_seidel(mat, b)
            .unwrap()
            .with_tolerance(1e-10)
            .solve(&x0)
            .unwrap();
        assert_relative_eq!(jacobi.x, gauss_seidel.x, epsilon = 1e-8);
        assert_relative_eq!(
            jacobi.x,
            DVector::from_vec(vec![1.0, 2.0, -1.0, 1.0]),
            epsilon = 1e-8
        );
    }

    #[test]
    fn test_sor() {
        let mat = DMatrix::from_row_slice(3, 3, &[4.0, 3.0, 0.0, 3.0, 4.0, -1.0, 0.0, -1.0, 4.0]);
        let b = DVector::from_vec(vec![24.0, 30.0, -24.0]);
        let sor = LinearSystem::sor(mat, b, 1.25).unwrap();
        let solution = sor.solve(&DVector::from_vec(vec![1.0, 1.0, 1.0])).unwrap();
        assert!(solution.converged);
        assert_eq!(solution.iterations, 8);
        assert_relative_eq!(
            solution.x,
            DVector::from_vec(vec![3.0, 4.0, -5.0]),
            epsilon = 1e-3
        );
    }

    #[test]
    fn test_sor_with_unit_omega_is_gauss_seidel() {
        let (mat, b, x0) = dominant_system();
        let sor = LinearSystem::sor(mat.clone(), b.clone(), 1.0).unwrap().solve(&x0).unwrap();
        let gs = LinearSystem::gauss_seidel(mat, b).unwrap().solve(&x0).unwrap();
        assert_eq!(sor.iterations, gs.iterations);
        assert_relative_eq!(sor.x, gs.x, epsilon = 1e-14);
    }

    #[test]
    fn test_not_square() {
        let mat = DMatrix::from_row_slice(2, 3, &[1.0, 0.0, 0.0, 0.0, 1.0, 0.0]);
        let b = DVector::from_vec(vec![1.0, 1.0]);
        let err = LinearSystem::jacobi(mat, b).unwrap_err();
        assert_eq!(err, LinearSystemError::NotSquare { rows: 2, cols: 3 });
    }

    #[test]
    fn test_rhs_length_mismatch() {
        let mat = DMatrix::<f64>::identity(3, 3);
        let b = DVector::from_vec(vec![1.0, 1.0]);
        let err = LinearSystem::gauss_seidel(mat, b).unwrap_err();
        assert_eq!(
            err,
            LinearSystemError::DimensionMismatch {
                expected: 3,
                found: 2
            }
        );
    }

    #[test]
    fn test_initial_guess_length_mismatch() {
        let (mat, b, _) = dominant_system();
        let system = LinearSystem::jacobi(mat, b).unwrap();
        let err = system.solve(&DVector::zeros(3)).unwrap_err();
        assert_eq!(
            err,
            LinearSystemError::DimensionMismatch {
                expected: 4,
                found: 3
            }
        );
    }

    #[test]
    fn test_zero_pivot() {
        let mat = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 3.0, 0.0]);
        let b = DVector::from_vec(vec![1.0, 1.0]);
        let system = LinearSystem::sor(mat, b, 1.5).unwrap();
        let err = system.solve(&DVector::zeros(2)).unwrap_err();
        assert_eq!(err, LinearSystemError::SingularMatrix { row: 1 });
    }

    #[test]
    fn test_zero_max_iter_returns_initial_guess() {
        let (mat, b, _) = dominant_system();
        let x0 = DVector::from_vec(vec![0.5, 0.5, 0.5, 0.5]);
        let solution = LinearSystem::jacobi(mat, b)
            .unwrap()
            .with_max_iter(0)
            .solve(&x0)
            .unwrap();
        assert!(!solution.converged);
        assert_eq!(solution.iterations, 0);
        assert_eq!(solution.x, x0);
        assert!(solution.step_norm.is_infinite());
    }

    #[test]
    fn test_iteration_cap_returns_last_iterate() {
        let (mat, b, x0) = dominant_system();
        let solution = LinearSystem::jacobi(mat, b)
            .unwrap()
            .with_max_iter(2)
            .solve(&x0)
            .unwrap();
        assert!(!solution.converged);
        assert_eq!(solution.iterations, 2);
        assert!(solution.step_norm > 1e-3);
        assert_ne!(solution.x, x0);
    }

    #[test]
    fn test_method_names() {
        let methods: [IterativeMethod; 3] =
            [Jacobi.into(), GaussSeidel.into(), Sor::new(1.1).into()];
        let names: Vec<&str> = methods.iter().map(|m| m.name()).collect();
        assert_eq!(names, vec!["Jacobi", "Gauss-Seidel", "SOR"]);
    }
}
