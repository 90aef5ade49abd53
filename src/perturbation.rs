//! Guided-local-search perturbation: penalize the worst edges of the
//! current solution and re-optimize locally around their endpoints.
//!
//! Grounded on `original_source/kgls/local_search/search.py::perturbate_solution`.

use std::collections::HashSet;

use crate::config::RunParameters;
use crate::cost::CostEvaluator;
use crate::model::Solution;
use crate::search::driver;
use crate::stats::Stats;

/// Enables penalization, then repeatedly pops the worst edge, penalizes it,
/// and runs local search (without post-move Lin-Kernighan) from its
/// non-depot endpoints, until `num_perturbations` moves have executed.
/// Returns the set of routes touched.
pub fn perturbate_solution(solution: &mut Solution, cost: &mut CostEvaluator, params: &RunParameters, stats: &mut Stats) -> HashSet<usize> {
    cost.enable_penalization();
    cost.determine_edge_badness(solution);

    let mut applied = 0;
    let mut changed_routes = HashSet::new();
    let depot = solution.depot();

    while applied < params.num_perturbations {
        let worst_edge = cost.get_and_penalize_worst_edge();
        let mut start_nodes: Vec<usize> = [worst_edge.a, worst_edge.b].into_iter().filter(|&n| n != depot).collect();
        start_nodes.sort_unstable();

        let (executed, changed) = driver::local_search(solution, cost, &start_nodes, false, params, stats);
        applied += executed;
        changed_routes.extend(changed);
    }

    cost.disable_penalization();
    changed_routes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Node, ProblemBuilder};

    fn line_problem() -> crate::model::Problem {
        ProblemBuilder::new()
            .nodes(vec![
                Node::depot(0, 0.0, 0.0),
                Node::customer(1, 10.0, 0.0, 1),
                Node::customer(2, 20.0, 0.0, 1),
                Node::customer(3, 30.0, 0.0, 1),
                Node::customer(4, 40.0, 0.0, 1),
            ])
            .capacity(5)
            .build()
            .unwrap()
    }

    #[test]
    fn perturbation_disables_penalization_on_return() {
        let problem = line_problem();
        let mut cost = CostEvaluator::new(&problem, 5);
        let mut solution = Solution::new(&problem);
        solution.add_route(&[1, 2, 3, 4]);

        let mut stats = Stats::new();
        let mut params = RunParameters::default();
        params.num_perturbations = 1;

        perturbate_solution(&mut solution, &mut cost, &params, &mut stats);
        solution.validate();

        // A subsequent raw-distance query must equal a penalization-enabled
        // query now that perturbation has disabled it again.
        cost.enable_penalization();
        let penalized = cost.get_solution_costs(&solution, false);
        cost.disable_penalization();
        let disabled = cost.get_solution_costs(&solution, false);
        assert_eq!(disabled, cost.get_solution_costs(&solution, true));
        let _ = penalized;
    }
}
