//! Finite-difference time stepping on a (time x space) grid.
//!
//! Row 0 of the grid holds the initial condition, columns 0 and `x_steps` hold
//! the boundary values in every row. `solve` walks the rows `1..=time_steps`
//! and fills the interior of each one from the previous row with one of three
//! schemes built on the stencil coefficients alpha (sub-diagonal), beta
//! (diagonal) and gamma (super-diagonal):
//! - FTCS: `u[i,k] = alpha u[i-1,k-1] + beta u[i-1,k] + gamma u[i-1,k+1]`;
//! - BTCS: `tridiag(alpha, beta, gamma) u[i,:] = u[i-1,:]`, solved by SOR;
//! - Crank-Nicolson: `tridiag(-alpha/2, 1 + beta, -gamma/2) u[i,:] =
//!   tridiag(alpha/2, 1 - beta, gamma/2) u[i-1,:]`, solved by SOR.
//!
//!  Example
//! ```
//! use RustedPDE::numerical::PDE::finite_difference::{FiniteDifference, StencilCoefficients};
//! use RustedPDE::numerical::PDE::pde_equations::PdeDomain;
//! use std::f64::consts::PI;
//! let domain = PdeDomain::new(1.0, 1.0, 0.5, 0.5, (10.0, 10.0), |x| (PI * x).sin()).unwrap();
//! // heat equation with lambda = 0.5
//! let coefficients = StencilCoefficients::constant(0.5, 0.0, 0.5);
//! let mut ftcs = FiniteDifference::ftcs(&domain, coefficients);
//! ftcs.loglevel = None;
//! let grid = ftcs.solve().unwrap();
//! assert_eq!(grid[(2, 1)], 10.0);
//! ```
use crate::Utils::logger::{init_logger, save_grid_to_csv, statistics_table};
use crate::errors::{ExportError, PdeError};
use crate::numerical::PDE::pde_equations::{ParabolicPde, PdeDomain};
use crate::somelinalg::band_matrix::{bandwidth, tridiagonal};
use crate::somelinalg::iterative_solvers::{LinearSystem, Sor, StoppingCriterion};
use enum_dispatch::enum_dispatch;
use log::{debug, info, warn};
use nalgebra::{DMatrix, DVector};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

/// relaxation factor of the SOR solves inside implicit steps
pub const DEFAULT_OMEGA: f64 = 1.5;

/// coefficient(space coordinates of the interior points, time row index)
pub type CoefficientFn = Arc<dyn Fn(&DVector<f64>, usize) -> DVector<f64> + Send + Sync>;

////////////////////////////////////////////////////////////////
//  STENCIL COEFFICIENTS
////////////////////////////////////////////////////////////////
#[derive(Clone)]
pub struct StencilCoefficients {
    pub alpha: CoefficientFn,
    pub beta: CoefficientFn,
    pub gamma: CoefficientFn,
}

impl StencilCoefficients {
    pub fn new<A, B, G>(alpha: A, beta: B, gamma: G) -> StencilCoefficients
    where
        A: Fn(&DVector<f64>, usize) -> DVector<f64> + Send + Sync + 'static,
        B: Fn(&DVector<f64>, usize) -> DVector<f64> + Send + Sync + 'static,
        G: Fn(&DVector<f64>, usize) -> DVector<f64> + Send + Sync + 'static,
    {
        StencilCoefficients {
            alpha: Arc::new(alpha),
            beta: Arc::new(beta),
            gamma: Arc::new(gamma),
        }
    }
    /// the same three numbers at every point and every time row
    pub fn constant(alpha: f64, beta: f64, gamma: f64) -> StencilCoefficients {
        StencilCoefficients::new(
            move |x: &DVector<f64>, _i: usize| DVector::from_element(x.len(), alpha),
            move |x: &DVector<f64>, _i: usize| DVector::from_element(x.len(), beta),
            move |x: &DVector<f64>, _i: usize| DVector::from_element(x.len(), gamma),
        )
    }
    /// evaluates the three coefficients for time row `i`
    pub fn evaluate(&self, x: &DVector<f64>, i: usize) -> Result<RowCoefficients, PdeError> {
        let check = |name: &'static str, values: DVector<f64>| {
            if values.len() == x.len() {
                Ok(values)
            } else {
                Err(PdeError::CoefficientLength {
                    name,
                    expected: x.len(),
                    found: values.len(),
                })
            }
        };
        Ok(RowCoefficients {
            alpha: check("alpha", (self.alpha)(x, i))?,
            beta: check("beta", (self.beta)(x, i))?,
            gamma: check("gamma", (self.gamma)(x, i))?,
        })
    }
}

/// stencil coefficients of one time row, one entry per interior point
#[derive(Debug, Clone, PartialEq)]
pub struct RowCoefficients {
    pub alpha: DVector<f64>,
    pub beta: DVector<f64>,
    pub gamma: DVector<f64>,
}

impl RowCoefficients {
    /// negative explicit weights break the discrete maximum principle
    pub fn has_negative_weight(&self) -> bool {
        self.alpha
            .iter()
            .chain(self.beta.iter())
            .chain(self.gamma.iter())
            .any(|w| *w < 0.0)
    }
}

////////////////////////////////////////////////////////////////
//  SCHEMES
////////////////////////////////////////////////////////////////
/// interior values of the new row and the cost of getting them
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    pub interior: DVector<f64>,
    pub linear_iterations: usize,
    pub converged: bool,
}

impl StepOutcome {
    fn explicit(interior: DVector<f64>) -> StepOutcome {
        StepOutcome {
            interior,
            linear_iterations: 0,
            converged: true,
        }
    }
}

#[enum_dispatch]
pub trait TimeStepper {
    /// computes the interior of the next row from the complete `previous` row
    fn advance(
        &self,
        previous: &DVector<f64>,
        row: &RowCoefficients,
    ) -> Result<StepOutcome, PdeError>;
    fn name(&self) -> &'static str;
}

/// forward time, central space: explicit local update
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Ftcs;

/// backward time, central space: one tridiagonal solve per row
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Btcs {
    pub omega: f64,
    pub criterion: StoppingCriterion,
}

/// average of the explicit and implicit stencils
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CrankNicolson {
    pub omega: f64,
    pub criterion: StoppingCriterion,
}

impl Default for Btcs {
    fn default() -> Self {
        Btcs {
            omega: DEFAULT_OMEGA,
            criterion: StoppingCriterion::default(),
        }
    }
}

impl Default for CrankNicolson {
    fn default() -> Self {
        CrankNicolson {
            omega: DEFAULT_OMEGA,
            criterion: StoppingCriterion::default(),
        }
    }
}

fn interior_of(previous: &DVector<f64>) -> DVector<f64> {
    previous.rows(1, previous.len() - 2).into_owned()
}

fn sor_solve(
    mat: DMatrix<f64>,
    b: DVector<f64>,
    seed: &DVector<f64>,
    omega: f64,
    criterion: StoppingCriterion,
) -> Result<StepOutcome, PdeError> {
    debug_assert!(
        {
            let (kl, ku) = bandwidth(&mat);
            kl <= 1 && ku <= 1
        },
        "implicit step matrix is not tridiagonal"
    );
    let system = LinearSystem::new(mat, b, Sor::new(omega).into())?.with_criterion(criterion);
    let solution = system.solve(seed)?;
    Ok(StepOutcome {
        interior: solution.x,
        linear_iterations: solution.iterations,
        converged: solution.converged,
    })
}

impl TimeStepper for Ftcs {
    fn advance(
        &self,
        previous: &DVector<f64>,
        row: &RowCoefficients,
    ) -> Result<StepOutcome, PdeError> {
        let n = previous.len() - 2;
        let interior = DVector::from_fn(n, |j, _| {
            let k = j + 1;
            row.beta[j] * previous[k]
                + row.gamma[j] * previous[k + 1]
                + row.alpha[j] * previous[k - 1]
        });
        Ok(StepOutcome::explicit(interior))
    }
    fn name(&self) -> &'static str {
        "FTCS"
    }
}

impl TimeStepper for Btcs {
    fn advance(
        &self,
        previous: &DVector<f64>,
        row: &RowCoefficients,
    ) -> Result<StepOutcome, PdeError> {
        let b = interior_of(previous);
        let mat = tridiagonal(&row.alpha, &row.beta, &row.gamma);
        sor_solve(mat, b.clone(), &b, self.omega, self.criterion)
    }
    fn name(&self) -> &'static str {
        "BTCS"
    }
}

impl TimeStepper for CrankNicolson {
    fn advance(
        &self,
        previous: &DVector<f64>,
        row: &RowCoefficients,
    ) -> Result<StepOutcome, PdeError> {
        let lhs = tridiagonal(
            &row.alpha.map(|a| -0.5 * a),
            &row.beta.map(|b| 1.0 + b),
            &row.gamma.map(|g| -0.5 * g),
        );
        let rhs = tridiagonal(
            &row.alpha.map(|a| 0.5 * a),
            &row.beta.map(|b| 1.0 - b),
            &row.gamma.map(|g| 0.5 * g),
        );
        let b = rhs * interior_of(previous);
        sor_solve(lhs, b.clone(), &b, self.omega, self.criterion)
    }
    fn name(&self) -> &'static str {
        "Crank-Nicolson"
    }
}

#[enum_dispatch(TimeStepper)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scheme {
    Ftcs,
    Btcs,
    CrankNicolson,
}

impl Scheme {
    pub fn is_explicit(&self) -> bool {
        matches!(self, Scheme::Ftcs(_))
    }
    /// sets the relaxation factor of implicit schemes, no-op for FTCS
    pub fn with_omega(self, omega: f64) -> Scheme {
        match self {
            Scheme::Ftcs(s) => Scheme::Ftcs(s),
            Scheme::Btcs(s) => Scheme::Btcs(Btcs { omega, ..s }),
            Scheme::CrankNicolson(s) => Scheme::CrankNicolson(CrankNicolson { omega, ..s }),
        }
    }
    /// sets the stopping rule of the SOR solves of implicit schemes, no-op for FTCS
    pub fn with_criterion(self, criterion: StoppingCriterion) -> Scheme {
        match self {
            Scheme::Ftcs(s) => Scheme::Ftcs(s),
            Scheme::Btcs(s) => Scheme::Btcs(Btcs { criterion, ..s }),
            Scheme::CrankNicolson(s) => {
                Scheme::CrankNicolson(CrankNicolson { criterion, ..s })
            }
        }
    }
}

////////////////////////////////////////////////////////////////
//  GRID LOOKUP
////////////////////////////////////////////////////////////////
/// result of `index_grid`
#[derive(Debug, Clone, PartialEq)]
pub enum GridSlice {
    /// all space points at one time
    Row(DVector<f64>),
    /// one space point at all times
    Column(DVector<f64>),
    Cell(f64),
    Full(DMatrix<f64>),
}

/// index of `coord` on a mesh with spacing `step`, None off the mesh
fn mesh_index(coord: f64, step: f64, last: usize) -> Option<usize> {
    if !coord.is_finite() || coord < 0.0 {
        return None;
    }
    let position = coord / step;
    let nearest = position.round();
    if (position - nearest).abs() > 1e-9 || nearest as usize > last {
        return None;
    }
    Some(nearest as usize)
}

////////////////////////////////////////////////////////////////
//  ENGINE
////////////////////////////////////////////////////////////////
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SolveStatistics {
    pub time_rows: usize,
    pub linear_iterations: usize,
    pub non_converged_steps: usize,
    pub elapsed_secs: f64,
}

pub struct FiniteDifference {
    domain: PdeDomain,
    coefficients: StencilCoefficients,
    scheme: Scheme,
    grid: DMatrix<f64>,
    statistics: SolveStatistics,
    pub loglevel: Option<String>,
    /// directory of the `log_<date>_<time>.txt` file, no file logging if None
    pub log_dir: Option<PathBuf>,
}

impl FiniteDifference {
    /// allocates the grid and fills the initial and boundary values
    pub fn new(
        pde: &dyn ParabolicPde,
        coefficients: StencilCoefficients,
        scheme: Scheme,
    ) -> FiniteDifference {
        let mut engine = FiniteDifference {
            domain: pde.domain().clone(),
            coefficients,
            scheme,
            grid: DMatrix::zeros(0, 0),
            statistics: SolveStatistics::default(),
            loglevel: Some("info".to_string()),
            log_dir: None,
        };
        engine.grid = engine.create_grid();
        engine
    }
    pub fn ftcs(pde: &dyn ParabolicPde, coefficients: StencilCoefficients) -> FiniteDifference {
        FiniteDifference::new(pde, coefficients, Ftcs.into())
    }
    pub fn btcs(pde: &dyn ParabolicPde, coefficients: StencilCoefficients) -> FiniteDifference {
        FiniteDifference::new(pde, coefficients, Btcs::default().into())
    }
    pub fn crank_nicolson(
        pde: &dyn ParabolicPde,
        coefficients: StencilCoefficients,
    ) -> FiniteDifference {
        FiniteDifference::new(pde, coefficients, CrankNicolson::default().into())
    }
    /// FTCS for constant coefficients (lambda, 1 - 2 lambda, lambda); refuses
    /// lambda > 0.5, where the explicit scheme diverges
    pub fn ftcs_constant(
        pde: &dyn ParabolicPde,
        lambda: f64,
    ) -> Result<FiniteDifference, PdeError> {
        if lambda > 0.5 {
            return Err(PdeError::Unstable { lambda });
        }
        let coefficients = StencilCoefficients::constant(lambda, 1.0 - 2.0 * lambda, lambda);
        Ok(FiniteDifference::ftcs(pde, coefficients))
    }
    ////////////////////////////SETTERS///////////////////////////////////
    pub fn with_omega(mut self, omega: f64) -> FiniteDifference {
        self.scheme = self.scheme.with_omega(omega);
        self
    }
    pub fn with_linear_criterion(mut self, criterion: StoppingCriterion) -> FiniteDifference {
        self.scheme = self.scheme.with_criterion(criterion);
        self
    }
    pub fn with_loglevel(mut self, loglevel: Option<&str>) -> FiniteDifference {
        self.loglevel = loglevel.map(|l| l.to_string());
        self
    }
    pub fn with_log_dir(mut self, log_dir: Option<&Path>) -> FiniteDifference {
        self.log_dir = log_dir.map(Path::to_path_buf);
        self
    }
    ////////////////////////////GETTERS///////////////////////////////////
    pub fn domain(&self) -> &PdeDomain {
        &self.domain
    }
    pub fn scheme(&self) -> Scheme {
        self.scheme
    }
    /// read-only view of the grid: the initial grid before `solve`, the solved one after
    pub fn grid(&self) -> &DMatrix<f64> {
        &self.grid
    }
    pub fn statistics(&self) -> &SolveStatistics {
        &self.statistics
    }
    /////////////////////////////////////////////////////////////////////
    /// (time_steps + 1) x (x_steps + 1) grid with the initial condition in
    /// row 0 and the boundary values in the first and last column
    pub fn create_grid(&self) -> DMatrix<f64> {
        let rows = self.domain.time_steps() + 1;
        let cols = self.domain.x_steps() + 1;
        let mut grid = DMatrix::zeros(rows, cols);
        grid.row_mut(0).copy_from(&self.domain.initial_values().transpose());
        let (low, high) = self.domain.boundary_conditions();
        grid.column_mut(0).fill(low);
        grid.column_mut(cols - 1).fill(high);
        grid
    }
    /// Recomputes the whole grid from the initial one, row by row. Calling it
    /// twice gives the same grid.
    pub fn solve(&mut self) -> Result<&DMatrix<f64>, PdeError> {
        init_logger(self.loglevel.as_deref(), self.log_dir.as_deref());
        let begin = Instant::now();
        info!(
            "{} started: {} time rows, {} space points",
            self.scheme.name(),
            self.domain.time_steps(),
            self.domain.x_steps() + 1
        );
        let mut grid = self.create_grid();
        let x_interior = self.domain.interior_x();
        let cols = grid.ncols();
        let mut statistics = SolveStatistics::default();
        let mut warned_negative = false;

        for i in 1..grid.nrows() {
            let row = self.coefficients.evaluate(&x_interior, i)?;
            if self.scheme.is_explicit() && !warned_negative && row.has_negative_weight() {
                warn!(
                    "negative explicit stencil weight at time row {}: \
                     FTCS may be unstable for these coefficients",
                    i
                );
                warned_negative = true;
            }
            let previous = DVector::from_iterator(cols, grid.row(i - 1).iter().copied());
            let outcome = self.scheme.advance(&previous, &row)?;
            for (j, value) in outcome.interior.iter().enumerate() {
                grid[(i, j + 1)] = *value;
            }
            statistics.time_rows += 1;
            statistics.linear_iterations += outcome.linear_iterations;
            if !outcome.converged {
                statistics.non_converged_steps += 1;
            }
            debug!("time row {} done, {} linear iterations", i, outcome.linear_iterations);
        }
        statistics.elapsed_secs = begin.elapsed().as_secs_f64();
        if statistics.non_converged_steps > 0 {
            warn!(
                "{} of {} time rows ended without a converged linear solve",
                statistics.non_converged_steps, statistics.time_rows
            );
        }
        self.grid = grid;
        self.statistics = statistics;
        self.log_statistics();
        Ok(&self.grid)
    }
    fn log_statistics(&self) {
        let s = &self.statistics;
        let table = statistics_table(&[
            ("scheme", self.scheme.name().to_string()),
            ("grid shape", format!("{} x {}", self.grid.nrows(), self.grid.ncols())),
            ("time rows computed", s.time_rows.to_string()),
            ("linear iterations", s.linear_iterations.to_string()),
            ("non-converged steps", s.non_converged_steps.to_string()),
            ("time elapsed, s", format!("{:.6}", s.elapsed_secs)),
        ]);
        info!("\n \n CALC STATISTICS \n \n {}", table);
    }
    /// Lookup by physical coordinates: a row for `t` only, a column for `x`
    /// only, a cell for both, the whole grid for neither. Coordinates that are
    /// not (up to rounding) multiples of dt / dx inside the domain give None.
    pub fn index_grid(&self, t: Option<f64>, x: Option<f64>) -> Option<GridSlice> {
        let last_row = self.grid.nrows() - 1;
        let last_col = self.grid.ncols() - 1;
        match (t, x) {
            (Some(t), Some(x)) => {
                let i = mesh_index(t, self.domain.dt(), last_row)?;
                let k = mesh_index(x, self.domain.dx(), last_col)?;
                Some(GridSlice::Cell(self.grid[(i, k)]))
            }
            (Some(t), None) => {
                let i = mesh_index(t, self.domain.dt(), last_row)?;
                Some(GridSlice::Row(DVector::from_iterator(
                    last_col + 1,
                    self.grid.row(i).iter().copied(),
                )))
            }
            (None, Some(x)) => {
                let k = mesh_index(x, self.domain.dx(), last_col)?;
                Some(GridSlice::Column(self.grid.column(k).into_owned()))
            }
            (None, None) => Some(GridSlice::Full(self.grid.clone())),
        }
    }
    /// writes the current grid as csv, see `Utils::logger::save_grid_to_csv`
    pub fn save_to_csv(&self, path: &Path) -> Result<(), ExportError> {
        save_grid_to_csv(&self.grid, &self.domain.t_mesh(), &self.domain.x_mesh(), path)
    }
}
