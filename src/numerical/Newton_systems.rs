//!  Example
//! ```
//! use RustedPDE::numerical::Newton_systems::NewtonGS;
//! use RustedPDE::somelinalg::iterative_solvers::StoppingCriterion;
//! use nalgebra::{DMatrix, DVector};
//! // x^2 + y^2 - 10 = 0, x - y - 4 = 0  (no zero pivot along the way from (4, 1))
//! let residual = |x: &DVector<f64>| {
//!     DVector::from_vec(vec![x[0] * x[0] + x[1] * x[1] - 10.0, x[0] - x[1] - 4.0])
//! };
//! let jacobian = |x: &DVector<f64>| {
//!     DMatrix::from_row_slice(2, 2, &[2.0 * x[0], 2.0 * x[1], 1.0, -1.0])
//! };
//! // the inner Gauss-Seidel tolerance bounds the accuracy of every correction
//! let mut newton = NewtonGS::new(residual, jacobian)
//!     .with_tolerance(1e-8)
//!     .with_linear_criterion(StoppingCriterion::new(1e-12, 1000));
//! newton.loglevel = None;
//! let solution = newton.solve(&DVector::from_vec(vec![4.0, 1.0])).unwrap();
//! assert!((solution.x[0] - 3.0).abs() < 1e-6 && (solution.x[1] + 1.0).abs() < 1e-6);
//! ```
use crate::Utils::logger::{init_logger, statistics_table};
use crate::errors::NonlinearSystemError;
use crate::somelinalg::iterative_solvers::{IterativeSolution, LinearSystem, StoppingCriterion};
use log::{debug, info, warn};
use nalgebra::{DMatrix, DVector};
use std::path::{Path, PathBuf};
use std::time::Instant;

pub const DEFAULT_TOLERANCE: f64 = 1e-4;
pub const DEFAULT_MAX_ITER: usize = 1000;

/// F(x): R^n -> R^n
pub type ResidualFn = Box<dyn Fn(&DVector<f64>) -> DVector<f64>>;
/// J(x): R^n -> R^{n x n}
pub type JacobianFn = Box<dyn Fn(&DVector<f64>) -> DMatrix<f64>>;

/// Newton's method for F(x) = 0 where every correction J(x) d = -F(x) is solved
/// by Gauss-Seidel iterations started from the current x.
pub struct NewtonGS {
    residual: ResidualFn,
    jacobian: JacobianFn,
    pub criterion: StoppingCriterion, // outer (Newton) stopping rule
    pub linear_criterion: StoppingCriterion, // stopping rule of every inner Gauss-Seidel solve
    pub loglevel: Option<String>,
    pub log_dir: Option<PathBuf>, // file logging goes there if set

    pub i: usize,                  // Newton iteration counter
    pub linear_iterations: usize,  // Gauss-Seidel sweeps summed over all Newton steps
    pub result: Option<IterativeSolution>,
}

impl NewtonGS {
    pub fn new<F, J>(residual: F, jacobian: J) -> NewtonGS
    where
        F: Fn(&DVector<f64>) -> DVector<f64> + 'static,
        J: Fn(&DVector<f64>) -> DMatrix<f64> + 'static,
    {
        NewtonGS {
            residual: Box::new(residual),
            jacobian: Box::new(jacobian),
            criterion: StoppingCriterion::new(DEFAULT_TOLERANCE, DEFAULT_MAX_ITER),
            linear_criterion: StoppingCriterion::default(),
            loglevel: Some("info".to_string()),
            log_dir: None,
            i: 0,
            linear_iterations: 0,
            result: None,
        }
    }
    ////////////////////////////SETTERS///////////////////////////////////
    pub fn with_tolerance(mut self, tolerance: f64) -> NewtonGS {
        self.criterion.tolerance = tolerance;
        self
    }
    pub fn with_max_iter(mut self, max_iter: usize) -> NewtonGS {
        self.criterion.max_iter = max_iter;
        self
    }
    pub fn with_linear_criterion(mut self, criterion: StoppingCriterion) -> NewtonGS {
        self.linear_criterion = criterion;
        self
    }
    pub fn with_loglevel(mut self, loglevel: Option<&str>) -> NewtonGS {
        self.loglevel = loglevel.map(|l| l.to_string());
        self
    }
    pub fn with_log_dir(mut self, log_dir: Option<&Path>) -> NewtonGS {
        self.log_dir = log_dir.map(Path::to_path_buf);
        self
    }
    pub fn tolerance(&self) -> f64 {
        self.criterion.tolerance
    }
    pub fn max_iter(&self) -> usize {
        self.criterion.max_iter
    }
    /////////////////////////////////////////////////////////////////////
    //                ITERATIONS
    /////////////////////////////////////////////////////////////////////
    /// one Newton step: returns x + d with J(x) d = -F(x)
    pub fn iteration(&mut self, x: &DVector<f64>) -> Result<DVector<f64>, NonlinearSystemError> {
        let fx = (self.residual)(x);
        if fx.len() != x.len() {
            return Err(NonlinearSystemError::ResidualDimension {
                expected: x.len(),
                found: fx.len(),
            });
        }
        let jx = (self.jacobian)(x);
        let gauss_seidel =
            LinearSystem::gauss_seidel(jx, -fx)?.with_criterion(self.linear_criterion);
        let correction = gauss_seidel.solve(x)?;
        if !correction.converged {
            warn!("Newton step {}: linear correction did not converge", self.i + 1);
        }
        self.linear_iterations += correction.iterations;
        Ok(correction.x + x)
    }
    /// Newton iterations from `initial_guess`; reaching the cap is reported
    /// through `converged == false`, not as an error
    pub fn main_loop(
        &mut self,
        initial_guess: &DVector<f64>,
    ) -> Result<IterativeSolution, NonlinearSystemError> {
        self.i = 0;
        self.linear_iterations = 0;
        let mut x = initial_guess.clone();
        let mut step_norm = f64::INFINITY;
        let mut continue_iterate = true;
        while self.i < self.criterion.max_iter && continue_iterate {
            let new_x = self.iteration(&x)?;
            step_norm = StoppingCriterion::step_norm(&new_x, &x);
            continue_iterate = self.criterion.keep_going(step_norm);
            self.i += 1;
            x = new_x;
            debug!("Newton iteration = {}, step norm = {:e}", self.i, step_norm);
        }
        let converged = !continue_iterate;
        self.criterion.report("Newton", self.i, converged);
        let solution = IterativeSolution {
            x,
            iterations: self.i,
            converged,
            step_norm,
        };
        self.result = Some(solution.clone());
        Ok(solution)
    }
    /// wrapper around `main_loop` which sets up logging and reports statistics
    pub fn solve(
        &mut self,
        initial_guess: &DVector<f64>,
    ) -> Result<IterativeSolution, NonlinearSystemError> {
        init_logger(self.loglevel.as_deref(), self.log_dir.as_deref());
        let begin = Instant::now();
        let solution = self.main_loop(initial_guess)?;
        let elapsed = begin.elapsed();
        let table = statistics_table(&[
            ("number of unknowns", initial_guess.len().to_string()),
            ("Newton iterations", self.i.to_string()),
            ("Gauss-Seidel sweeps", self.linear_iterations.to_string()),
            ("converged", solution.converged.to_string()),
            ("last step norm", format!("{:e}", solution.step_norm)),
            ("time elapsed, s", format!("{:.6}", elapsed.as_secs_f64())),
        ]);
        info!("\n \n NEWTON STATISTICS \n \n {}", table);
        Ok(solution)
    }
    pub fn get_result(&self) -> Option<DVector<f64>> {
        self.result.as_ref().map(|s| s.x.clone())
    }
}
