//! Relocation chain: one ejection may leave its destination route
//! temporarily infeasible; a bounded-depth chain of further ejections
//! restores feasibility while keeping cumulative improvement positive.
//!
//! Grounded on `original_source/kgls/local_search/operator_relocation_chain.py`
//! (`Relocation`, `RelocationChain`, `insert_node`,
//! `search_relocation_chains_from`).

use std::collections::{HashMap, HashSet};

use crate::cost::CostEvaluator;
use crate::model::{Edge, Solution};
use crate::search::Move;

#[derive(Clone, Debug)]
struct Relocation {
    node_to_move: usize,
    from_route: usize,
    move_to_route: usize,
    move_after: usize,
    move_before: usize,
    improvement: i64,
    forbidden_nodes: [usize; 5],
}

/// A chain of one or more [`Relocation`]s, applied in order. Bookkeeping
/// (`forbidden_nodes`, `forbidden_insertion`, `relocated_nodes`,
/// `demand_changes`) mirrors the Python chain's running state, preventing a
/// later step from undoing or re-using an edge a prior step just created.
#[derive(Clone, Debug, Default)]
pub struct RelocationChainMove {
    relocations: Vec<Relocation>,
    forbidden_nodes: HashSet<usize>,
    forbidden_insertion: HashSet<Edge>,
    relocated_nodes: HashSet<usize>,
    demand_changes: HashMap<usize, i64>,
    pub improvement: i64,
}

impl RelocationChainMove {
    fn can_insert_between(&self, node1: usize, node2: usize) -> bool {
        !self.forbidden_insertion.contains(&Edge::new(node1, node2))
            && !self.relocated_nodes.contains(&node1)
            && !self.relocated_nodes.contains(&node2)
    }

    fn extend(&self, solution: &Solution, relocation: Relocation) -> Self {
        let mut chain = self.clone();

        chain
            .forbidden_insertion
            .insert(Edge::new(relocation.move_after, relocation.move_before));
        chain
            .forbidden_insertion
            .insert(Edge::new(solution.prev(relocation.node_to_move), relocation.node_to_move));
        chain
            .forbidden_insertion
            .insert(Edge::new(relocation.node_to_move, solution.next(relocation.node_to_move)));

        for &n in &relocation.forbidden_nodes {
            chain.forbidden_nodes.insert(n);
        }

        let demand = solution.demand(relocation.node_to_move) as i64;
        *chain.demand_changes.entry(relocation.from_route).or_insert(0) -= demand;
        *chain.demand_changes.entry(relocation.move_to_route).or_insert(0) += demand;

        chain.relocated_nodes.insert(relocation.node_to_move);
        chain.improvement += relocation.improvement;
        chain.relocations.push(relocation);
        chain
    }
}

impl Move for RelocationChainMove {
    fn improvement(&self) -> i64 {
        self.improvement
    }

    fn routes(&self) -> Vec<usize> {
        let mut routes: Vec<usize> = self
            .relocations
            .iter()
            .flat_map(|r| [r.from_route, r.move_to_route])
            .collect();
        routes.sort_unstable();
        routes.dedup();
        routes
    }

    fn execute(&self, solution: &mut Solution) {
        for relocation in &self.relocations {
            solution.remove(&[relocation.node_to_move]);
            solution.insert_after(&[relocation.node_to_move], relocation.move_after, relocation.move_to_route);
        }
    }
}

fn removal_gain(solution: &Solution, cost: &CostEvaluator, node: usize) -> i64 {
    let prev = solution.prev(node);
    let next = solution.next(node);
    cost.get_distance(node, prev) + cost.get_distance(node, next) - cost.get_distance(prev, next)
}

/// Cheaper of "insert before" and "insert after" `insert_next_to`; `None` if
/// the resulting chain improvement would not stay positive or the edge it
/// would use is forbidden by an earlier step in `chain`.
fn insert_node(
    solution: &Solution,
    cost: &CostEvaluator,
    node_to_move: usize,
    removal_gain: i64,
    insert_next_to: usize,
    chain: &RelocationChainMove,
) -> Option<Relocation> {
    let prev = solution.prev(insert_next_to);
    let next = solution.next(insert_next_to);

    let insertion_cost_before =
        cost.get_distance(node_to_move, prev) + cost.get_distance(node_to_move, insert_next_to) - cost.get_distance(prev, insert_next_to);
    let insertion_cost_after =
        cost.get_distance(node_to_move, next) + cost.get_distance(node_to_move, insert_next_to) - cost.get_distance(insert_next_to, next);

    let (insertion_cost, move_after, move_before) = if insertion_cost_before <= insertion_cost_after {
        (insertion_cost_before, prev, insert_next_to)
    } else {
        (insertion_cost_after, insert_next_to, next)
    };

    let cost_change = removal_gain - insertion_cost;
    if chain.improvement + cost_change <= 0 {
        return None;
    }
    if !chain.can_insert_between(move_after, move_before) {
        return None;
    }

    Some(Relocation {
        node_to_move,
        from_route: solution.route_of(node_to_move),
        move_to_route: solution.route_of(insert_next_to),
        move_after,
        move_before,
        improvement: cost_change,
        forbidden_nodes: [
            node_to_move,
            solution.prev(node_to_move),
            solution.next(node_to_move),
            move_after,
            move_before,
        ],
    })
}

fn extend_from(
    solution: &Solution,
    cost: &CostEvaluator,
    node_to_move: usize,
    max_depth: usize,
    current_depth: usize,
    chain: &RelocationChainMove,
    found: &mut Vec<RelocationChainMove>,
) {
    if current_depth >= max_depth {
        return;
    }

    let gain = removal_gain(solution, cost, node_to_move);
    let own_route = solution.route_of(node_to_move);

    let mut route_order = Vec::new();
    let mut grouped: HashMap<usize, Vec<Relocation>> = HashMap::new();

    for &neighbour in cost.neighborhood(node_to_move) {
        if solution.route_of(neighbour) == own_route || chain.relocated_nodes.contains(&neighbour) {
            continue;
        }
        if let Some(relocation) = insert_node(solution, cost, node_to_move, gain, neighbour, chain) {
            let route = relocation.move_to_route;
            if !grouped.contains_key(&route) {
                route_order.push(route);
            }
            grouped.entry(route).or_default().push(relocation);
        }
    }

    for destination_route in route_order {
        let candidates = &grouped[&destination_route];
        let mut best = candidates[0].clone();
        for candidate in &candidates[1..] {
            if candidate.improvement > best.improvement {
                best = candidate.clone();
            }
        }

        let extended = chain.extend(solution, best);
        let demand_change = extended.demand_changes.get(&destination_route).copied().unwrap_or(0);
        let new_volume = solution.routes[destination_route].volume as i64 + demand_change;

        if new_volume >= 0 && cost.is_feasible(new_volume as u32) {
            found.push(extended);
        } else if extended.relocations.len() < max_depth {
            for &candidate_node in &solution.customers(destination_route) {
                if extended.forbidden_nodes.contains(&candidate_node) {
                    continue;
                }
                let remaining = new_volume - solution.demand(candidate_node) as i64;
                if remaining >= 0 && cost.is_feasible(remaining as u32) {
                    extend_from(solution, cost, candidate_node, max_depth, current_depth + 1, &extended, found);
                }
            }
        }
    }
}

/// Searches, from `start_node`, every valid relocation chain up to
/// `max_depth` steps (spec.md §4.4).
pub fn search_relocation_chains_from(
    solution: &Solution,
    cost: &CostEvaluator,
    start_node: usize,
    max_depth: usize,
) -> Vec<RelocationChainMove> {
    let mut found = Vec::new();
    extend_from(solution, cost, start_node, max_depth, 0, &RelocationChainMove::default(), &mut found);
    found
}

/// Runs [`search_relocation_chains_from`] over every node in `start_nodes`,
/// in the given order.
pub fn search_relocation_chains(
    solution: &Solution,
    cost: &CostEvaluator,
    start_nodes: &[usize],
    max_depth: usize,
) -> Vec<RelocationChainMove> {
    let mut found = Vec::new();
    for &start_node in start_nodes {
        found.extend(search_relocation_chains_from(solution, cost, start_node, max_depth));
    }
    found.sort_by(|a, b| b.improvement.cmp(&a.improvement));
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Node, ProblemBuilder};

    fn chain_problem() -> crate::model::Problem {
        ProblemBuilder::new()
            .nodes(vec![
                Node::depot(0, 50.0, 20.0),
                Node::customer(1, 0.0, 10.0, 1),
                Node::customer(2, 0.0, 20.0, 1),
                Node::customer(3, 0.0, 30.0, 1),
                Node::customer(4, 100.0, 10.0, 1),
                Node::customer(5, 100.0, 20.0, 1),
                Node::customer(6, 100.0, 20.0, 1),
            ])
            .capacity(3)
            .build()
            .unwrap()
    }

    #[test]
    fn finds_two_step_chain_restoring_feasibility() {
        let problem = chain_problem();
        let cost = CostEvaluator::new(&problem, 5);
        let mut solution = Solution::new(&problem);
        solution.add_route(&[1, 2, 4]);
        solution.add_route(&[5, 3, 6]);

        let chains = search_relocation_chains_from(&solution, &cost, 4, 2);
        assert_eq!(chains.len(), 1);

        let chain = &chains[0];
        assert_eq!(chain.relocations.len(), 2);
        assert_eq!(chain.relocations[0].node_to_move, 4);
        assert_eq!(chain.relocations[0].move_after, 0);
        assert_eq!(chain.relocations[0].improvement, 90);
        assert_eq!(chain.relocations[1].node_to_move, 3);
        assert_eq!(chain.relocations[1].move_after, 0);
        assert_eq!(chain.relocations[1].improvement, 180);
        assert_eq!(chain.improvement, 270);
    }

    #[test]
    fn depth_one_rejects_infeasible_single_step() {
        let problem = chain_problem();
        let cost = CostEvaluator::new(&problem, 5);
        let mut solution = Solution::new(&problem);
        solution.add_route(&[1, 2, 4]);
        solution.add_route(&[5, 3, 6]);

        let chains = search_relocation_chains_from(&solution, &cost, 4, 1);
        assert!(chains.is_empty());
    }
}
