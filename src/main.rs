#![allow(non_snake_case)]
use RustedPDE::Examples::pde_examples::pde_examples;

fn main() {
    // 0 linear solvers, 1 Newton, 2 heat equation, 3 Black-Scholes, 4 task document
    let example = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse::<usize>().ok())
        .unwrap_or(2);
    pde_examples(example);
}
