//! Descriptors of parabolic PDEs: the space-time domain with its boundary and
//! initial conditions, plus the parameters of concrete equation families.
//! Nothing here steps in time, see `finite_difference` for that.
use crate::errors::PdeError;
use nalgebra::DVector;
use std::f64::consts::PI;
use std::fmt;
use std::sync::Arc;

/// u(x, 0) as a function of the space coordinate
pub type InitialCondition = Arc<dyn Fn(f64) -> f64 + Send + Sync>;

/// Number of whole steps of size `step` in `extent`. Quotients within 1e-9 of an
/// integer count as that integer, so that 1.0 / 0.0005 gives 2000 and not 1999.
pub fn whole_steps(extent: f64, step: f64) -> usize {
    let quotient = extent / step;
    let nearest = quotient.round();
    if (quotient - nearest).abs() <= 1e-9 * nearest.max(1.0) {
        nearest as usize
    } else {
        quotient.floor() as usize
    }
}

/// space-time domain [0, max_time] x [0, max_x] with its discretization steps,
/// Dirichlet boundary values (low, high) and the initial condition
#[derive(Clone)]
pub struct PdeDomain {
    max_time: f64,
    max_x: f64,
    dx: f64,
    dt: f64,
    boundary_conditions: (f64, f64),
    initial_condition: InitialCondition,
}

impl PdeDomain {
    pub fn new<F>(
        max_time: f64,
        max_x: f64,
        dx: f64,
        dt: f64,
        boundary_conditions: (f64, f64),
        initial_condition: F,
    ) -> Result<PdeDomain, PdeError>
    where
        F: Fn(f64) -> f64 + Send + Sync + 'static,
    {
        for (name, value) in [("max_time", max_time), ("max_x", max_x), ("dx", dx), ("dt", dt)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(PdeError::InvalidDomain(format!(
                    "{} must be finite and positive, got {}",
                    name, value
                )));
            }
        }
        if !boundary_conditions.0.is_finite() || !boundary_conditions.1.is_finite() {
            return Err(PdeError::InvalidDomain(
                "boundary values must be finite".to_string(),
            ));
        }
        let x_steps = whole_steps(max_x, dx);
        if x_steps < 2 {
            return Err(PdeError::InvalidDomain(format!(
                "max_x / dx = {} leaves no interior space point",
                x_steps
            )));
        }
        Ok(PdeDomain {
            max_time,
            max_x,
            dx,
            dt,
            boundary_conditions,
            initial_condition: Arc::new(initial_condition),
        })
    }
    pub fn max_time(&self) -> f64 {
        self.max_time
    }
    pub fn max_x(&self) -> f64 {
        self.max_x
    }
    pub fn dx(&self) -> f64 {
        self.dx
    }
    pub fn dt(&self) -> f64 {
        self.dt
    }
    pub fn boundary_conditions(&self) -> (f64, f64) {
        self.boundary_conditions
    }
    pub fn initial_condition(&self) -> &InitialCondition {
        &self.initial_condition
    }
    /// floor(max_time / dt)
    pub fn time_steps(&self) -> usize {
        whole_steps(self.max_time, self.dt)
    }
    /// floor(max_x / dx)
    pub fn x_steps(&self) -> usize {
        whole_steps(self.max_x, self.dx)
    }
    /// k * dx for k = 0..=x_steps
    pub fn x_mesh(&self) -> DVector<f64> {
        DVector::from_fn(self.x_steps() + 1, |k, _| k as f64 * self.dx)
    }
    /// i * dt for i = 0..=time_steps
    pub fn t_mesh(&self) -> DVector<f64> {
        DVector::from_fn(self.time_steps() + 1, |i, _| i as f64 * self.dt)
    }
    /// space coordinates strictly between the two boundaries
    pub fn interior_x(&self) -> DVector<f64> {
        DVector::from_fn(self.x_steps() - 1, |k, _| (k + 1) as f64 * self.dx)
    }
    /// the initial condition evaluated on the whole space mesh
    pub fn initial_values(&self) -> DVector<f64> {
        self.x_mesh().map(|x| (self.initial_condition)(x))
    }
}

impl fmt::Debug for PdeDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PdeDomain")
            .field("max_time", &self.max_time)
            .field("max_x", &self.max_x)
            .field("dx", &self.dx)
            .field("dt", &self.dt)
            .field("boundary_conditions", &self.boundary_conditions)
            .finish_non_exhaustive()
    }
}

/// Common read-only view of every equation descriptor.
pub trait ParabolicPde {
    fn domain(&self) -> &PdeDomain;

    fn max_time(&self) -> f64 {
        self.domain().max_time()
    }
    fn max_x(&self) -> f64 {
        self.domain().max_x()
    }
    fn dx(&self) -> f64 {
        self.domain().dx()
    }
    fn dt(&self) -> f64 {
        self.domain().dt()
    }
    fn boundary_conditions(&self) -> (f64, f64) {
        self.domain().boundary_conditions()
    }
}

impl ParabolicPde for PdeDomain {
    fn domain(&self) -> &PdeDomain {
        self
    }
}

/// Black-Scholes type equations: a strike, a risk-free rate and a local
/// volatility sigma(S, t)
pub trait VolatilityModel: ParabolicPde {
    fn strike(&self) -> f64;
    fn risk_free(&self) -> f64;
    fn sigma(&self, s: f64, t: f64) -> f64;
}

fn check_strike(strike: f64) -> Result<(), PdeError> {
    if !strike.is_finite() || strike <= 0.0 {
        return Err(PdeError::InvalidDomain(format!(
            "strike must be finite and positive, got {}",
            strike
        )));
    }
    Ok(())
}

////////////////////////////////////////////////////////////////
//  HEAT EQUATION  u_t = alpha^2 u_xx
////////////////////////////////////////////////////////////////
#[derive(Debug, Clone)]
pub struct HeatEquation {
    domain: PdeDomain,
    alpha: f64,
    lambda: f64,
}

impl HeatEquation {
    pub fn new(domain: PdeDomain, alpha: f64) -> HeatEquation {
        let lambda = alpha.powi(2) * domain.dt() / domain.dx().powi(2);
        HeatEquation {
            domain,
            alpha,
            lambda,
        }
    }
    /// diffusion coefficient
    pub fn alpha(&self) -> f64 {
        self.alpha
    }
    /// diffusion number alpha^2 dt / dx^2
    pub fn lambda(&self) -> f64 {
        self.lambda
    }
}

impl ParabolicPde for HeatEquation {
    fn domain(&self) -> &PdeDomain {
        &self.domain
    }
}

////////////////////////////////////////////////////////////////
//  BLACK-SCHOLES, constant volatility
////////////////////////////////////////////////////////////////
#[derive(Debug, Clone)]
pub struct BlackScholes {
    domain: PdeDomain,
    strike: f64,
    sigma: f64,
    risk_free: f64,
}

impl BlackScholes {
    pub fn new(
        domain: PdeDomain,
        strike: f64,
        sigma: f64,
        risk_free: f64,
    ) -> Result<BlackScholes, PdeError> {
        check_strike(strike)?;
        Ok(BlackScholes {
            domain,
            strike,
            sigma,
            risk_free,
        })
    }
}

impl ParabolicPde for BlackScholes {
    fn domain(&self) -> &PdeDomain {
        &self.domain
    }
}

impl VolatilityModel for BlackScholes {
    fn strike(&self) -> f64 {
        self.strike
    }
    fn risk_free(&self) -> f64 {
        self.risk_free
    }
    fn sigma(&self, _s: f64, _t: f64) -> f64 {
        self.sigma
    }
}

////////////////////////////////////////////////////////////////
//  BLACK-SCHOLES, volatility oscillating in time and peaked at the strike:
//  sigma(S, t) = sigma0 + sigma1 cos(2 pi t / T) exp(-(S/K - 1)^2)
////////////////////////////////////////////////////////////////
#[derive(Debug, Clone)]
pub struct BsmStochasticVol {
    domain: PdeDomain,
    strike: f64,
    sigma0: f64,
    sigma1: f64,
    risk_free: f64,
}

impl BsmStochasticVol {
    pub fn new(
        domain: PdeDomain,
        strike: f64,
        sigma0: f64,
        sigma1: f64,
        risk_free: f64,
    ) -> Result<BsmStochasticVol, PdeError> {
        check_strike(strike)?;
        Ok(BsmStochasticVol {
            domain,
            strike,
            sigma0,
            sigma1,
            risk_free,
        })
    }
    pub fn sigma0(&self) -> f64 {
        self.sigma0
    }
    pub fn sigma1(&self) -> f64 {
        self.sigma1
    }
}

impl ParabolicPde for BsmStochasticVol {
    fn domain(&self) -> &PdeDomain {
        &self.domain
    }
}

impl VolatilityModel for BsmStochasticVol {
    fn strike(&self) -> f64 {
        self.strike
    }
    fn risk_free(&self) -> f64 {
        self.risk_free
    }
    fn sigma(&self, s: f64, t: f64) -> f64 {
        let seasonal = (2.0 * PI * t / self.domain.max_time()).cos();
        let moneyness = s / self.strike - 1.0;
        self.sigma0 + self.sigma1 * seasonal * (-moneyness.powi(2)).exp()
    }
}
