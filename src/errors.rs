//! Error types shared by the linear, nonlinear and PDE solvers.
//!
//! Configuration problems (wrong shapes, bad domains, unstable explicit
//! schemes) and numerical singularities are errors. Running out of iterations
//! is not: solvers hand back their last iterate and log a warning instead.
use thiserror::Error;

/// Failures of the iterative linear system solvers.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LinearSystemError {
    #[error("the matrix is not square: {rows} rows, {cols} columns")]
    NotSquare { rows: usize, cols: usize },

    #[error("dimension mismatch: expected a vector of length {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("zero pivot on the diagonal at row {row}")]
    SingularMatrix { row: usize },
}

/// Failures of Newton's method for systems of nonlinear equations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NonlinearSystemError {
    #[error("linear correction step failed: {0}")]
    Linear(#[from] LinearSystemError),

    #[error("residual function returned {found} components for {expected} unknowns")]
    ResidualDimension { expected: usize, found: usize },
}

/// Failures of the finite-difference engine and the PDE descriptors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PdeError {
    #[error("invalid domain: {0}")]
    InvalidDomain(String),

    #[error("explicit scheme is unstable: lambda = {lambda} > 0.5")]
    Unstable { lambda: f64 },

    #[error("coefficient `{name}` returned {found} values for {expected} interior points")]
    CoefficientLength {
        name: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("implicit time step failed: {0}")]
    Linear(#[from] LinearSystemError),
}

/// Failures while turning a task document into a configured solver.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TaskError {
    #[error("failed to parse task document: {0}")]
    Parse(String),

    #[error("section `{0}` not found in task document")]
    MissingSection(String),

    #[error("key `{key}` not found in section `{section}`")]
    MissingKey { section: String, key: String },

    #[error("invalid value `{value}` for key `{key}`")]
    InvalidValue { key: String, value: String },

    #[error(transparent)]
    Pde(#[from] PdeError),
}

/// Failures while writing a solved grid to disk.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}
