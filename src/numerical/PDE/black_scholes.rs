//! Stencil coefficients of the Black-Scholes equation in time to maturity,
//! V_t = 1/2 sigma^2 S^2 V_SS + r S V_S - r V, for any local volatility model.
//!
//! With S = k dx and sigma = sigma(S, i dt) the three schemes use
//!
//! | scheme         | alpha                       | beta                      | gamma                        |
//! |----------------|-----------------------------|---------------------------|------------------------------|
//! | FTCS           | dt/2 (sigma^2 k^2 - r k)    | 1 - dt (sigma^2 k^2 + r)  | dt/2 (sigma^2 k^2 + r k)     |
//! | BTCS           | -dt/2 (sigma^2 k^2 - r k)   | 1 + dt (sigma^2 k^2 + r)  | -dt/2 (sigma^2 k^2 + r k)    |
//! | Crank-Nicolson | dt/2 (sigma^2 k^2 - r k)    | dt/2 (sigma^2 k^2 + r)    | dt/2 (sigma^2 k^2 + r k)     |
use crate::numerical::PDE::finite_difference::{
    CoefficientFn, FiniteDifference, StencilCoefficients,
};
use crate::numerical::PDE::pde_equations::VolatilityModel;
use nalgebra::DVector;
use std::sync::Arc;

/// weight(dt, sigma^2 k^2, r, k)
fn stencil<M, W>(model: &M, weight: W) -> CoefficientFn
where
    M: VolatilityModel + Clone + Send + Sync + 'static,
    W: Fn(f64, f64, f64, f64) -> f64 + Send + Sync + 'static,
{
    let model = model.clone();
    Arc::new(move |x: &DVector<f64>, i: usize| {
        let dt = model.dt();
        let dx = model.dx();
        let r = model.risk_free();
        let t = i as f64 * dt;
        x.map(|s| {
            let k = s / dx;
            let sigma = model.sigma(s, t);
            weight(dt, sigma * sigma * k * k, r, k)
        })
    })
}

pub fn ftcs_coefficients<M>(model: &M) -> StencilCoefficients
where
    M: VolatilityModel + Clone + Send + Sync + 'static,
{
    StencilCoefficients {
        alpha: stencil(model, |dt, d, r, k| 0.5 * dt * (d - r * k)),
        beta: stencil(model, |dt, d, r, _k| 1.0 - dt * (d + r)),
        gamma: stencil(model, |dt, d, r, k| 0.5 * dt * (d + r * k)),
    }
}

pub fn btcs_coefficients<M>(model: &M) -> StencilCoefficients
where
    M: VolatilityModel + Clone + Send + Sync + 'static,
{
    StencilCoefficients {
        alpha: stencil(model, |dt, d, r, k| -0.5 * dt * (d - r * k)),
        beta: stencil(model, |dt, d, r, _k| 1.0 + dt * (d + r)),
        gamma: stencil(model, |dt, d, r, k| -0.5 * dt * (d + r * k)),
    }
}

pub fn crank_nicolson_coefficients<M>(model: &M) -> StencilCoefficients
where
    M: VolatilityModel + Clone + Send + Sync + 'static,
{
    StencilCoefficients {
        alpha: stencil(model, |dt, d, r, k| 0.5 * dt * (d - r * k)),
        beta: stencil(model, |dt, d, r, _k| 0.5 * dt * (d + r)),
        gamma: stencil(model, |dt, d, r, k| 0.5 * dt * (d + r * k)),
    }
}

pub fn ftcs<M>(model: &M) -> FiniteDifference
where
    M: VolatilityModel + Clone + Send + Sync + 'static,
{
    FiniteDifference::ftcs(model, ftcs_coefficients(model))
}

pub fn btcs<M>(model: &M) -> FiniteDifference
where
    M: VolatilityModel + Clone + Send + Sync + 'static,
{
    FiniteDifference::btcs(model, btcs_coefficients(model))
}

pub fn crank_nicolson<M>(model: &M) -> FiniteDifference
where
    M: VolatilityModel + Clone + Send + Sync + 'static,
{
    FiniteDifference::crank_nicolson(model, crank_nicolson_coefficients(model))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::numerical::PDE::pde_equations::{BlackScholes, BsmStochasticVol, PdeDomain};
    use crate::somelinalg::iterative_solvers::StoppingCriterion;
    use approx::assert_relative_eq;

    /// closed-form price of the at-the-money call, S = K = 10, T = 1
    const ANALYTIC_CALL: f64 = 1.045058;

    fn call_domain() -> PdeDomain {
        PdeDomain::new(1.0, 20.0, 1.0, 0.01, (0.0, 10.0), |s| (s - 10.0_f64).max(0.0)).unwrap()
    }

    fn tight() -> StoppingCriterion {
        StoppingCriterion::new(1e-10, 1000)
    }

    fn at_the_money(mut engine: FiniteDifference) -> f64 {
        engine.loglevel = None;
        let grid = engine.solve().unwrap();
        grid[(grid.nrows() - 1, 10)]
    }

    #[test]
    fn test_constant_volatility_call() {
        let bs = BlackScholes::new(call_domain(), 10.0, 0.2, 0.05).unwrap();
        let explicit = at_the_money(ftcs(&bs));
        let implicit = at_the_money(btcs(&bs).with_linear_criterion(tight()));
        let cn = at_the_money(crank_nicolson(&bs).with_linear_criterion(tight()));
        assert_relative_eq!(explicit, 1.02007, epsilon = 1e-4);
        assert_relative_eq!(implicit, 1.00264, epsilon = 1e-4);
        assert_relative_eq!(cn, 1.00504, epsilon = 1e-4);
        for price in [explicit, implicit, cn] {
            assert_relative_eq!(price, ANALYTIC_CALL, epsilon = 0.05);
        }
    }

    #[test]
    fn test_default_linear_tolerance_is_close_enough() {
        let bs = BlackScholes::new(call_domain(), 10.0, 0.2, 0.05).unwrap();
        assert_relative_eq!(at_the_money(btcs(&bs)), 1.00342, epsilon = 1e-4);
        assert_relative_eq!(at_the_money(crank_nicolson(&bs)), 1.00528, epsilon = 1e-4);
    }

    #[test]
    fn test_stochastic_volatility_call() {
        let sv = BsmStochasticVol::new(call_domain(), 10.0, 0.2, 0.1, 0.05).unwrap();
        let explicit = at_the_money(ftcs(&sv));
        let implicit = at_the_money(btcs(&sv).with_linear_criterion(tight()));
        assert_relative_eq!(explicit, 1.06789, epsilon = 1e-4);
        assert_relative_eq!(implicit, 1.04417, epsilon = 1e-4);
        assert_relative_eq!(implicit, ANALYTIC_CALL, epsilon = 0.05);
    }

    #[test]
    fn test_coefficients_follow_time_row() {
        let sv = BsmStochasticVol::new(call_domain(), 10.0, 0.2, 0.1, 0.05).unwrap();
        let coefficients = ftcs_coefficients(&sv);
        let x = DVector::from_vec(vec![10.0]);
        let at_start = coefficients.evaluate(&x, 0).unwrap();
        let half_way = coefficients.evaluate(&x, 50).unwrap();
        // sigma = 0.3 at t = 0 and 0.1 at t = 0.5, k = 10
        assert_relative_eq!(at_start.gamma[0], 0.005 * (9.0 + 0.5), epsilon = 1e-12);
        assert_relative_eq!(half_way.gamma[0], 0.005 * (1.0 + 0.5), epsilon = 1e-12);
        assert_relative_eq!(at_start.beta[0], 1.0 - 0.01 * (9.0 + 0.05), epsilon = 1e-12);
    }

    #[test]
    fn test_schemes_share_the_stencil() {
        let bs = BlackScholes::new(call_domain(), 10.0, 0.2, 0.05).unwrap();
        let x = DVector::from_vec(vec![1.0, 5.0]);
        let explicit = ftcs_coefficients(&bs).evaluate(&x, 3).unwrap();
        let implicit = btcs_coefficients(&bs).evaluate(&x, 3).unwrap();
        let cn = crank_nicolson_coefficients(&bs).evaluate(&x, 3).unwrap();
        assert_eq!(implicit.alpha, -&explicit.alpha);
        assert_eq!(cn.gamma, explicit.gamma);
        assert_relative_eq!(implicit.beta[1] - 1.0, 1.0 - explicit.beta[1], epsilon = 1e-15);
        assert_relative_eq!(cn.beta[1] * 2.0, implicit.beta[1] - 1.0, epsilon = 1e-15);
        // sigma^2 k^2 < r k near S = 0: the explicit weight turns negative
        assert!(explicit.alpha[0] < 0.0);
    }
}
