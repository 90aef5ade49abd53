//! Top-level driver loop (spec.md §4.5 `run()`): construct the Clarke-Wright
//! initial solution, improve it, then alternate perturbation and
//! improvement until an abort condition fires, tracking the best solution
//! seen by raw cost.
//!
//! Grounded on the teacher's `src/solver/solver.rs` (`Solver<M>::run`'s
//! "loop until terminated, log and stop" shape) and
//! `original_source/kgls/kgls.py` (`KGLS.run`, `_update_run_stats`,
//! `print_time_distribution`).

use crate::abort::{AbortConditions, RunState};
use crate::config::RunParameters;
use crate::construction::clarke_wright_route_reduction;
use crate::cost::CostEvaluator;
use crate::model::{Problem, Solution};
use crate::perturbation::perturbate_solution;
use crate::search::driver::improve_solution;
use crate::stats::Stats;

/// Runs KGLS to completion and reports the best solution found plus run
/// statistics.
pub struct Solver<'a> {
    problem: &'a Problem,
    params: RunParameters,
    abort_conditions: AbortConditions,
}

/// The best solution seen during a run, its raw cost, and the stats
/// accumulated along the way.
pub struct RunResult {
    pub best_solution: Solution,
    pub best_cost: i64,
    pub stats: Stats,
}

impl<'a> Solver<'a> {
    pub fn new(problem: &'a Problem, params: RunParameters, abort_conditions: AbortConditions) -> Self {
        Self {
            problem,
            params,
            abort_conditions,
        }
    }

    pub fn run(&self) -> RunResult {
        log::info!("Abort conditions: {}", self.abort_conditions.describe());

        let mut cost = CostEvaluator::new(self.problem, self.params.neighborhood_size);
        let mut stats = Stats::new();

        let mut solution = clarke_wright_route_reduction(self.problem, &cost);
        log::info!("Initial solution cost: {}", cost.get_solution_costs(&solution, true));

        let all_routes: Vec<usize> = (0..solution.routes.len()).collect();
        improve_solution(&mut solution, &cost, &all_routes, &self.params, &mut stats);

        let mut best_cost = cost.get_solution_costs(&solution, true);
        let mut best_solution = solution.clone();
        let mut run_state = RunState {
            iteration: 0,
            best_iteration: 0,
            start_time: std::time::Instant::now(),
            best_time: std::time::Instant::now(),
        };
        stats.note_candidate(0, best_cost);

        while !self.abort_conditions.should_abort(&run_state) {
            run_state.iteration += 1;

            let perturbed_routes = perturbate_solution(&mut solution, &mut cost, &self.params, &mut stats);
            let mut seed: Vec<usize> = perturbed_routes.into_iter().collect();
            seed.sort_unstable();
            improve_solution(&mut solution, &cost, &seed, &self.params, &mut stats);

            let current_cost = cost.get_solution_costs(&solution, true);
            if stats.note_candidate(run_state.iteration, current_cost) {
                best_cost = current_cost;
                best_solution = solution.clone();
                run_state.best_iteration = run_state.iteration;
                run_state.best_time = std::time::Instant::now();
            } else if self.params.log_interval > 0 && run_state.iteration % self.params.log_interval == 0 {
                log::info!(
                    "iteration {}: current cost {}, best cost {}",
                    run_state.iteration,
                    current_cost,
                    best_cost
                );
            }
        }

        log::info!("Finished after {} iterations, best cost {}", run_state.iteration, best_cost);
        log::info!("{}", stats.time_distribution());

        RunResult {
            best_solution,
            best_cost,
            stats,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Node, ProblemBuilder};

    fn small_problem() -> Problem {
        ProblemBuilder::new()
            .nodes(vec![
                Node::depot(0, 50.0, 50.0),
                Node::customer(1, 0.0, 0.0, 3),
                Node::customer(2, 0.0, 100.0, 3),
                Node::customer(3, 100.0, 0.0, 3),
                Node::customer(4, 100.0, 100.0, 3),
            ])
            .capacity(5)
            .build()
            .unwrap()
    }

    #[test]
    fn run_terminates_and_returns_a_feasible_solution() {
        let problem = small_problem();
        let mut abort = AbortConditions::new();
        abort.set("max_iterations", 3).unwrap();

        let solver = Solver::new(&problem, RunParameters::default(), abort);
        let result = solver.run();

        result.best_solution.validate();
        assert!(result.best_cost > 0);
        assert_eq!(result.stats.best_iteration <= 3, true);
    }

    #[test]
    fn best_cost_never_regresses_across_iterations() {
        let problem = small_problem();
        let mut abort = AbortConditions::new();
        abort.set("max_iterations", 5).unwrap();
        let mut params = RunParameters::default();
        params.num_perturbations = 2;

        let solver = Solver::new(&problem, params, abort);
        let result = solver.run();
        assert!(result.best_cost <= 10_000);
    }
}
