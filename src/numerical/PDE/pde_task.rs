//! Builds a finite-difference solver from a task document (see
//! `Utils::task_parser` for the format):
//!
//! ```text
//! pde
//! equation: black_scholes
//! max_time: 1.0
//! max_x: 20
//! dx: 1
//! dt: 0.01
//! boundary: 0.0, 10.0
//! initial: call_payoff
//! strike: 10
//! sigma: 0.2
//! risk_free: 0.05
//!
//! solver
//! scheme: btcs
//! omega: 1.5
//! tolerance: 1e-6
//! max_iter: 1000
//! loglevel: info
//! log_dir: logs
//! ```
//! The `solver` section and each of its keys may be left out; `log_dir` adds a
//! log file in that directory.
use crate::Utils::task_parser::{DocumentMap, Section, parse_document};
use crate::errors::TaskError;
use crate::numerical::PDE::black_scholes;
use crate::numerical::PDE::finite_difference::FiniteDifference;
use crate::numerical::PDE::heat_equation;
use crate::numerical::PDE::pde_equations::{
    BlackScholes, BsmStochasticVol, HeatEquation, InitialCondition, PdeDomain, VolatilityModel,
};
use crate::somelinalg::iterative_solvers::{DEFAULT_MAX_ITER, DEFAULT_TOLERANCE, StoppingCriterion};
use log::info;
use std::f64::consts::PI;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use strum_macros::{Display, EnumIter, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum SchemeKind {
    Ftcs,
    Btcs,
    CrankNicolson,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum EquationKind {
    Heat,
    BlackScholes,
    BsmStochasticVol,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum InitialProfile {
    /// sin(pi x)
    SinPi,
    /// max(S - strike, 0)
    CallPayoff,
    /// max(strike - S, 0)
    PutPayoff,
    /// `initial_value` everywhere
    Constant,
}

/// scheme used when the document does not name one
pub const DEFAULT_SCHEME: SchemeKind = SchemeKind::CrankNicolson;

fn parse_kind<T: FromStr>(section: &Section, key: &str) -> Result<T, TaskError> {
    let name = section.str(key)?;
    T::from_str(name).map_err(|_| TaskError::InvalidValue {
        key: key.to_string(),
        value: name.to_string(),
    })
}

fn initial_condition(pde: &Section) -> Result<InitialCondition, TaskError> {
    let profile: InitialProfile = parse_kind(pde, "initial")?;
    let initial: InitialCondition = match profile {
        InitialProfile::SinPi => Arc::new(|x: f64| (PI * x).sin()),
        InitialProfile::CallPayoff => {
            let strike = pde.f64("strike")?;
            Arc::new(move |s: f64| (s - strike).max(0.0))
        }
        InitialProfile::PutPayoff => {
            let strike = pde.f64("strike")?;
            Arc::new(move |s: f64| (strike - s).max(0.0))
        }
        InitialProfile::Constant => {
            let value = pde.f64("initial_value")?;
            Arc::new(move |_x: f64| value)
        }
    };
    Ok(initial)
}

fn domain(pde: &Section) -> Result<PdeDomain, TaskError> {
    let initial = initial_condition(pde)?;
    let domain = PdeDomain::new(
        pde.f64("max_time")?,
        pde.f64("max_x")?,
        pde.f64("dx")?,
        pde.f64("dt")?,
        pde.f64_pair("boundary")?,
        move |x| initial(x),
    )?;
    Ok(domain)
}

fn volatility_engine<M>(model: &M, scheme: SchemeKind) -> FiniteDifference
where
    M: VolatilityModel + Clone + Send + Sync + 'static,
{
    match scheme {
        SchemeKind::Ftcs => black_scholes::ftcs(model),
        SchemeKind::Btcs => black_scholes::btcs(model),
        SchemeKind::CrankNicolson => black_scholes::crank_nicolson(model),
    }
}

/// Configured, not yet solved engine for the equation and scheme in `document`.
pub fn build_solver(document: &DocumentMap) -> Result<FiniteDifference, TaskError> {
    let pde = Section::of(document, "pde")?;
    let solver = Section::optional(document, "solver");
    let equation: EquationKind = parse_kind(&pde, "equation")?;
    let scheme = match solver {
        Some(section) if section.contains("scheme") => parse_kind(&section, "scheme")?,
        _ => DEFAULT_SCHEME,
    };
    let domain = domain(&pde)?;
    let engine = match equation {
        EquationKind::Heat => {
            let heat = HeatEquation::new(domain, pde.f64("alpha")?);
            match scheme {
                SchemeKind::Ftcs => heat_equation::ftcs(&heat)?,
                SchemeKind::Btcs => heat_equation::btcs(&heat),
                SchemeKind::CrankNicolson => heat_equation::crank_nicolson(&heat),
            }
        }
        EquationKind::BlackScholes => {
            let bs = BlackScholes::new(
                domain,
                pde.f64("strike")?,
                pde.f64("sigma")?,
                pde.f64("risk_free")?,
            )?;
            volatility_engine(&bs, scheme)
        }
        EquationKind::BsmStochasticVol => {
            let sv = BsmStochasticVol::new(
                domain,
                pde.f64("strike")?,
                pde.f64("sigma0")?,
                pde.f64("sigma1")?,
                pde.f64("risk_free")?,
            )?;
            volatility_engine(&sv, scheme)
        }
    };
    let Some(solver) = solver else {
        return Ok(engine);
    };
    apply_solver_settings(engine, &solver)
}

fn apply_solver_settings(
    mut engine: FiniteDifference,
    solver: &Section,
) -> Result<FiniteDifference, TaskError> {
    if let Some(omega) = solver.optional_f64("omega")? {
        // SOR diverges outside (0, 2)
        if omega <= 0.0 || omega >= 2.0 {
            return Err(TaskError::InvalidValue {
                key: "omega".to_string(),
                value: omega.to_string(),
            });
        }
        engine = engine.with_omega(omega);
    }
    let tolerance = solver.optional_f64("tolerance")?.unwrap_or(DEFAULT_TOLERANCE);
    let max_iter = solver.optional_usize("max_iter")?.unwrap_or(DEFAULT_MAX_ITER);
    engine = engine.with_linear_criterion(StoppingCriterion::new(tolerance, max_iter));
    if let Some(loglevel) = solver.optional_str("loglevel")? {
        engine = engine.with_loglevel(Some(loglevel));
    }
    if let Some(log_dir) = solver.optional_str("log_dir")? {
        engine = engine.with_log_dir(Some(Path::new(log_dir)));
    }
    Ok(engine)
}

/// parses `input`, builds the engine and solves it
pub fn solve_task(input: &str) -> Result<FiniteDifference, TaskError> {
    let document = parse_document(input)?;
    let mut engine = build_solver(&document)?;
    info!("task document accepted, solving with {:?}", engine.scheme());
    engine.solve()?;
    Ok(engine)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::PdeError;
    use crate::numerical::PDE::finite_difference::Scheme;
    use approx::assert_relative_eq;
    use std::path::PathBuf;
    use strum::IntoEnumIterator;

    fn heat_task(scheme: &str, dt: f64) -> String {
        format!(
            "pde
equation: heat
max_time: 0.5
max_x: 1
dx: 0.1
dt: {}
boundary: 0.0, 0.0
initial: sin_pi
alpha: 1.0

solver
scheme: {}
tolerance: 1e-10
loglevel: off
",
            dt, scheme
        )
    }

    fn option_task(equation: &str, scheme: &str) -> String {
        format!(
            "pde
equation: {}
max_time: 1.0
max_x: 20
dx: 1
dt: 0.01
boundary: 0.0, 10.0
initial: call_payoff
strike: 10
sigma: 0.2
sigma0: 0.2
sigma1: 0.1
risk_free: 0.05
solver
scheme: {}
tolerance: 1e-10
loglevel: off
",
            equation, scheme
        )
    }

    fn center(engine: &FiniteDifference, column: usize) -> f64 {
        let grid = engine.grid();
        grid[(grid.nrows() - 1, column)]
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(SchemeKind::CrankNicolson.to_string(), "crank_nicolson");
        assert_eq!(
            EquationKind::from_str("bsm_stochastic_vol"),
            Ok(EquationKind::BsmStochasticVol)
        );
        assert_eq!(InitialProfile::from_str("sin_pi"), Ok(InitialProfile::SinPi));
        assert!(SchemeKind::from_str("leapfrog").is_err());
    }

    #[test]
    fn test_heat_task_crank_nicolson() {
        let engine = solve_task(&heat_task("crank_nicolson", 0.01)).unwrap();
        assert!(matches!(engine.scheme(), Scheme::CrankNicolson(_)));
        assert_relative_eq!(center(&engine, 5), 0.007459535932322865, epsilon = 1e-8);
    }

    #[test]
    fn test_every_scheme_name_builds() {
        for kind in SchemeKind::iter() {
            let dt = if kind == SchemeKind::Ftcs { 0.001 } else { 0.01 };
            let engine = solve_task(&heat_task(&kind.to_string(), dt)).unwrap();
            assert_eq!(engine.grid().ncols(), 11);
            assert_relative_eq!(center(&engine, 5), (-PI * PI * 0.5).exp(), epsilon = 2.5e-3);
        }
    }

    #[test]
    fn test_option_tasks() {
        let bs = solve_task(&option_task("black_scholes", "btcs")).unwrap();
        assert_relative_eq!(center(&bs, 10), 1.00264, epsilon = 1e-4);
        let sv = solve_task(&option_task("bsm_stochastic_vol", "ftcs")).unwrap();
        assert_relative_eq!(center(&sv, 10), 1.06789, epsilon = 1e-4);
    }

    #[test]
    fn test_default_scheme_without_solver_section() {
        let task = "pde\nequation: heat\nmax_time: 0.1\nmax_x: 1\ndx: 0.5\ndt: 0.05\n\
                    boundary: 0, 0\ninitial: constant\ninitial_value: 3\nalpha: 1";
        let engine = build_solver(&parse_document(task).unwrap()).unwrap();
        assert!(matches!(engine.scheme(), Scheme::CrankNicolson(_)));
        assert_eq!(engine.grid()[(0, 1)], 3.0);
        assert_eq!(engine.grid()[(0, 0)], 0.0);
    }

    #[test]
    fn test_solver_settings_applied() {
        let task = heat_task("btcs", 0.01).replace(
            "tolerance: 1e-10",
            "omega: 1.2\nmax_iter: 7\nlog_dir: /tmp/rusted_pde_logs",
        );
        let engine = build_solver(&parse_document(&task).unwrap()).unwrap();
        match engine.scheme() {
            Scheme::Btcs(s) => {
                assert_eq!(s.omega, 1.2);
                assert_eq!(s.criterion, StoppingCriterion::new(DEFAULT_TOLERANCE, 7));
            }
            other => panic!("unexpected scheme {:?}", other),
        }
        assert_eq!(engine.loglevel, Some("off".to_string()));
        assert_eq!(engine.log_dir, Some(PathBuf::from("/tmp/rusted_pde_logs")));
    }

    #[test]
    fn test_unstable_explicit_heat_task() {
        let err = solve_task(&heat_task("ftcs", 0.01)).err();
        assert!(matches!(err, Some(TaskError::Pde(PdeError::Unstable { .. }))));
    }

    #[test]
    fn test_invalid_names() {
        assert_eq!(
            solve_task(&heat_task("leapfrog", 0.01)).err(),
            Some(TaskError::InvalidValue {
                key: "scheme".to_string(),
                value: "leapfrog".to_string()
            })
        );
        let task = heat_task("btcs", 0.01).replace("equation: heat", "equation: wave");
        assert_eq!(
            solve_task(&task).err(),
            Some(TaskError::InvalidValue {
                key: "equation".to_string(),
                value: "wave".to_string()
            })
        );
        let task = heat_task("btcs", 0.01).replace("loglevel: off", "omega: 2.5");
        assert!(matches!(
            solve_task(&task).err(),
            Some(TaskError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_missing_entries() {
        let task = heat_task("btcs", 0.01).replace("dx: 0.1\n", "");
        assert_eq!(
            solve_task(&task).err(),
            Some(TaskError::MissingKey {
                section: "pde".to_string(),
                key: "dx".to_string()
            })
        );
        let task = heat_task("btcs", 0.01).replace("initial: sin_pi", "initial: put_payoff");
        assert_eq!(
            solve_task(&task).err(),
            Some(TaskError::MissingKey {
                section: "pde".to_string(),
                key: "strike".to_string()
            })
        );
        assert_eq!(
            solve_task("solver\nscheme: btcs").err(),
            Some(TaskError::MissingSection("pde".to_string()))
        );
    }
}
