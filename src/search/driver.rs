//! Orchestrates the three inter-route operators and intra-route
//! Lin-Kernighan cleanup into one improvement pass.
//!
//! Grounded on `original_source/kgls/local_search/search.py`
//! (`improve_route`, `get_disjunct_moves`, `find_best_improving_moves`,
//! `local_search`, `improve_solution`).

use std::collections::HashSet;
use std::time::Instant;

use crate::config::{MoveKind, RunParameters};
use crate::cost::CostEvaluator;
use crate::model::Solution;
use crate::search::ops::{cross_exchange, relocation_chain, segment_move};
use crate::search::{lk, Move};
use crate::stats::Stats;

/// Runs Lin-Kernighan on `route_index` if it holds more than two customers
/// (spec.md §4.5 step 1); a smaller route has no interior edge to exchange.
pub fn improve_route(solution: &mut Solution, cost: &CostEvaluator, route_index: usize, params: &RunParameters, stats: &mut Stats) {
    if solution.routes[route_index].size > 2 {
        let start = Instant::now();
        lk::improve_route(solution, cost, route_index, params.depth_lin_kernighan);
        stats.record_lin_kernighan_time(start.elapsed());
    }
}

/// Greedily keeps moves that touch no route in common with any move already
/// kept, in the caller's given order (descending improvement).
fn get_disjoint_moves(moves: Vec<Box<dyn Move>>) -> Vec<Box<dyn Move>> {
    let mut kept: Vec<Box<dyn Move>> = Vec::new();
    for candidate in moves {
        let disjoint = kept.iter().all(|k| candidate.is_disjoint(k.as_ref()));
        if disjoint {
            kept.push(candidate);
        }
    }
    kept
}

fn candidate_moves(
    kind: MoveKind,
    solution: &Solution,
    cost: &CostEvaluator,
    start_nodes: &[usize],
    params: &RunParameters,
) -> Vec<Box<dyn Move>> {
    match kind {
        MoveKind::SegmentMove => segment_move::search_segment_moves(solution, cost, start_nodes)
            .into_iter()
            .map(|m| Box::new(m) as Box<dyn Move>)
            .collect(),
        MoveKind::CrossExchange => cross_exchange::search_cross_exchanges(solution, cost, start_nodes)
            .into_iter()
            .map(|m| Box::new(m) as Box<dyn Move>)
            .collect(),
        MoveKind::RelocationChain => {
            relocation_chain::search_relocation_chains(solution, cost, start_nodes, params.depth_relocation_chain)
                .into_iter()
                .map(|m| Box::new(m) as Box<dyn Move>)
                .collect()
        }
    }
}

/// Searches one operator, executes its greedy disjoint batch, and (when
/// `intra_route_opt`) runs Lin-Kernighan on every route the batch touched.
/// Returns the number of moves executed and the set of changed routes.
fn find_best_improving_moves(
    solution: &mut Solution,
    cost: &CostEvaluator,
    start_nodes: &[usize],
    intra_route_opt: bool,
    kind: MoveKind,
    params: &RunParameters,
    stats: &mut Stats,
) -> (usize, HashSet<usize>) {
    let search_start = Instant::now();
    let candidates = candidate_moves(kind, solution, cost, start_nodes, params);
    stats.record_search_time(kind, search_start.elapsed());

    if candidates.is_empty() {
        return (0, HashSet::new());
    }

    let disjoint = get_disjoint_moves(candidates);
    let mut changed_routes = HashSet::new();

    for mv in &disjoint {
        changed_routes.extend(mv.routes());

        let before = cost.get_solution_costs(solution, false);
        mv.execute(solution);
        stats.record_move(kind);
        let after = cost.get_solution_costs(solution, false);

        assert_eq!(
            before - after,
            mv.improvement(),
            "{kind} move declared improvement {} but observed {}",
            mv.improvement(),
            before - after
        );
        solution.validate();
    }

    if intra_route_opt {
        let mut routes: Vec<usize> = changed_routes.iter().copied().collect();
        routes.sort_unstable();
        for route in routes {
            improve_route(solution, cost, route, params, stats);
        }
    }

    (disjoint.len(), changed_routes)
}

/// Runs every configured operator, in `params.moves` order, once each.
pub(crate) fn local_search(
    solution: &mut Solution,
    cost: &CostEvaluator,
    start_nodes: &[usize],
    intra_route_opt: bool,
    params: &RunParameters,
    stats: &mut Stats,
) -> (usize, HashSet<usize>) {
    let mut total_moves = 0;
    let mut all_changed = HashSet::new();

    for &kind in &params.moves {
        let (found, changed) = find_best_improving_moves(solution, cost, start_nodes, intra_route_opt, kind, params, stats);
        total_moves += found;
        all_changed.extend(changed);
    }

    (total_moves, all_changed)
}

/// Improves `start_routes` to a local optimum: Lin-Kernighan first, then
/// repeated inter-route passes until a full round finds nothing (spec.md
/// §4.5).
pub fn improve_solution(solution: &mut Solution, cost: &CostEvaluator, start_routes: &[usize], params: &RunParameters, stats: &mut Stats) {
    for &route in start_routes {
        improve_route(solution, cost, route, params, stats);
    }

    let mut start_nodes: Vec<usize> = start_routes.iter().flat_map(|&r| solution.customers(r)).collect();
    start_nodes.sort_unstable();
    start_nodes.dedup();

    loop {
        let (executed, _) = local_search(solution, cost, &start_nodes, true, params, stats);
        if executed == 0 {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Node, ProblemBuilder};

    fn cross_problem() -> crate::model::Problem {
        ProblemBuilder::new()
            .nodes(vec![
                Node::depot(0, 50.0, 20.0),
                Node::customer(1, 0.0, 10.0, 1),
                Node::customer(2, 0.0, 20.0, 1),
                Node::customer(3, 0.0, 30.0, 1),
                Node::customer(4, 100.0, 10.0, 1),
                Node::customer(5, 100.0, 20.0, 1),
            ])
            .capacity(3)
            .build()
            .unwrap()
    }

    #[test]
    fn improve_solution_finds_the_segment_move() {
        let problem = cross_problem();
        let cost = CostEvaluator::new(&problem, 5);
        let mut solution = Solution::new(&problem);
        solution.add_route(&[1, 2, 3, 4]);
        solution.add_route(&[5]);

        let mut stats = Stats::new();
        let mut params = RunParameters::default();
        params.moves = vec![MoveKind::SegmentMove];

        let before = cost.get_solution_costs(&solution, true);
        improve_solution(&mut solution, &cost, &[0, 1], &params, &mut stats);
        let after = cost.get_solution_costs(&solution, true);

        assert!(after < before);
        solution.validate();
    }
}
