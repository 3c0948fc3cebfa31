use crate::numerical::Newton_systems::NewtonGS;
use crate::numerical::PDE::black_scholes;
use crate::numerical::PDE::finite_difference::GridSlice;
use crate::numerical::PDE::heat_equation;
use crate::numerical::PDE::pde_equations::{
    BlackScholes, BsmStochasticVol, HeatEquation, PdeDomain,
};
use crate::numerical::PDE::pde_task::solve_task;
use crate::somelinalg::iterative_solvers::{LinearSystem, StoppingCriterion};
use nalgebra::{DMatrix, DVector};
use std::f64::consts::PI;

pub fn pde_examples(example: usize) {
    match example {
        0 => {
            // iterative linear solvers on a diagonally dominant system
            let A = DMatrix::from_row_slice(
                4,
                4,
                &[
                    10.0, -1.0, 2.0, 0.0, -1.0, 11.0, -1.0, 3.0, 2.0, -1.0, 10.0, -1.0, 0.0, 3.0,
                    -1.0, 8.0,
                ],
            );
            let b = DVector::from_vec(vec![6.0, 25.0, -11.0, 15.0]);
            let x0 = DVector::zeros(4);
            for system in [
                LinearSystem::jacobi(A.clone(), b.clone()),
                LinearSystem::gauss_seidel(A.clone(), b.clone()),
                LinearSystem::sor(A.clone(), b.clone(), 1.25),
            ] {
                let system = system.unwrap().with_tolerance(1e-8);
                let solution = system.solve(&x0).unwrap();
                println!(
                    "{:?}: x = {:?} after {} iterations",
                    system.method(),
                    solution.x.as_slice(),
                    solution.iterations
                );
            }
        }
        1 => {
            // x^2 + y^2 - 10 = 0, x - y - 4 = 0
            let residual = |x: &DVector<f64>| {
                DVector::from_vec(vec![x[0] * x[0] + x[1] * x[1] - 10.0, x[0] - x[1] - 4.0])
            };
            let jacobian = |x: &DVector<f64>| {
                DMatrix::from_row_slice(2, 2, &[2.0 * x[0], 2.0 * x[1], 1.0, -1.0])
            };
            let mut newton = NewtonGS::new(residual, jacobian)
                .with_tolerance(1e-8)
                .with_linear_criterion(StoppingCriterion::new(1e-12, 1000));
            let solution = newton.solve(&DVector::from_vec(vec![4.0, 1.0])).unwrap();
            println!("result = {:?} \n", solution.x.as_slice());
        }
        2 => {
            // heat equation u_t = u_xx, u(x, 0) = sin(pi x), exact exp(-pi^2 t) sin(pi x)
            let domain =
                PdeDomain::new(0.5, 1.0, 0.1, 0.01, (0.0, 0.0), |x| (PI * x).sin()).unwrap();
            let heat = HeatEquation::new(domain, 1.0);
            let mut implicit = heat_equation::btcs(&heat);
            implicit.solve().unwrap();
            let mut cn = heat_equation::crank_nicolson(&heat);
            cn.solve().unwrap();
            if let (Some(GridSlice::Cell(u_btcs)), Some(GridSlice::Cell(u_cn))) = (
                implicit.index_grid(Some(0.5), Some(0.5)),
                cn.index_grid(Some(0.5), Some(0.5)),
            ) {
                println!(
                    "u(0.5, 0.5): BTCS {}, Crank-Nicolson {}, exact {}",
                    u_btcs,
                    u_cn,
                    (-PI * PI * 0.5).exp()
                );
            }
        }
        3 => {
            // European call, K = 10, sigma = 0.2, r = 0.05, T = 1
            let payoff = |s: f64| (s - 10.0_f64).max(0.0);
            let domain = PdeDomain::new(1.0, 20.0, 1.0, 0.01, (0.0, 10.0), payoff).unwrap();
            let bs = BlackScholes::new(domain.clone(), 10.0, 0.2, 0.05).unwrap();
            let sv = BsmStochasticVol::new(domain, 10.0, 0.2, 0.1, 0.05).unwrap();
            let mut engines = vec![
                ("FTCS", black_scholes::ftcs(&bs)),
                ("BTCS", black_scholes::btcs(&bs)),
                ("Crank-Nicolson", black_scholes::crank_nicolson(&bs)),
                ("BTCS, stochastic vol", black_scholes::btcs(&sv)),
            ];
            for (name, engine) in engines.iter_mut() {
                engine.loglevel = Some("warn".to_string());
                let grid = engine.solve().unwrap();
                println!("{}: V(S = 10, T = 1) = {}", name, grid[(grid.nrows() - 1, 10)]);
            }
        }
        4 => {
            // the same heat problem from a task document, saved as csv
            let task = "
pde
equation: heat
max_time: 0.5
max_x: 1
dx: 0.1
dt: 0.01
boundary: 0.0, 0.0
initial: sin_pi
alpha: 1.0

solver
scheme: crank_nicolson
tolerance: 1e-8
loglevel: info
";
            let engine = solve_task(task).unwrap();
            let path = std::env::temp_dir().join("heat_crank_nicolson.csv");
            match engine.save_to_csv(&path) {
                Ok(()) => println!("grid saved to {}", path.display()),
                Err(e) => println!("failed to save grid: {}", e),
            }
        }
        _ => {
            println!("example {} not found", example);
        }
    }
}
