//! Segment move (inter-route 3-opt): relocates a contiguous run of
//! customers from one route to a position next to one of its candidate
//! neighbours in another route.
//!
//! Grounded on `original_source/kgls/local_search/operator_3_opt.py`
//! (`SegmentMove`, `search_3_opt_moves_from`), translated from the
//! intrusive `node.get_neighbour()`/`.route` API onto
//! `Solution::neighbour`/`route_of`.

use crate::cost::CostEvaluator;
use crate::model::Solution;
use crate::search::Move;

#[derive(Clone, Debug)]
pub struct SegmentMove {
    pub segment: Vec<usize>,
    pub move_after: usize,
    pub improvement: i64,
    pub from_route: usize,
    pub to_route: usize,
}

impl Move for SegmentMove {
    fn improvement(&self) -> i64 {
        self.improvement
    }

    fn routes(&self) -> Vec<usize> {
        vec![self.from_route, self.to_route]
    }

    fn execute(&self, solution: &mut Solution) {
        solution.remove(&self.segment);
        solution.insert_after(&self.segment, self.move_after, self.to_route);
    }
}

/// Searches, from `start_node`, every (segment_direction, insert_direction)
/// combination for a profitable relocation next to one of `start_node`'s
/// candidate neighbours (spec.md §4.4).
pub fn search_segment_moves_from(solution: &Solution, cost: &CostEvaluator, start_node: usize) -> Vec<SegmentMove> {
    let mut candidates = Vec::new();
    let from_route = solution.route_of(start_node);

    for segment_direction in [0usize, 1] {
        for insert_direction in [0usize, 1] {
            let segment_1_prev = solution.neighbour(start_node, 1 - segment_direction);

            for &insert_next_to in cost.neighborhood(start_node) {
                let to_route = solution.route_of(insert_next_to);
                if to_route == from_route {
                    continue;
                }

                let insert_next_to_2 = solution.neighbour(insert_next_to, insert_direction);

                let move_start_improvement = cost.get_distance(start_node, segment_1_prev)
                    + cost.get_distance(insert_next_to, insert_next_to_2)
                    - cost.get_distance(insert_next_to, start_node);

                if move_start_improvement <= 0 {
                    continue;
                }

                let mut segment_end = start_node;
                let mut segment_list = vec![segment_end];
                let mut route_2_new_volume = solution.routes[to_route].volume + solution.demand(segment_end);

                loop {
                    if solution.is_depot(segment_end) || !cost.is_feasible(route_2_new_volume) {
                        break;
                    }

                    let segment_disconnect_2 = solution.neighbour(segment_end, segment_direction);

                    let move_end_improvement = cost.get_distance(segment_end, segment_disconnect_2)
                        - cost.get_distance(segment_1_prev, segment_disconnect_2)
                        - cost.get_distance(segment_end, insert_next_to_2);

                    let improvement = move_start_improvement + move_end_improvement;
                    if improvement > 0 {
                        let move_after = if insert_direction == 1 { insert_next_to } else { insert_next_to_2 };
                        candidates.push(SegmentMove {
                            segment: segment_list.clone(),
                            move_after,
                            improvement,
                            from_route,
                            to_route,
                        });
                    }

                    segment_end = solution.neighbour(segment_end, segment_direction);
                    if insert_direction == 1 {
                        segment_list.push(segment_end);
                    } else {
                        segment_list.insert(0, segment_end);
                    }
                    route_2_new_volume += solution.demand(segment_end);
                }
            }
        }
    }

    candidates
}

/// Runs [`search_segment_moves_from`] over every node in `start_nodes`, in
/// the given order (deterministic per spec.md §5).
pub fn search_segment_moves(solution: &Solution, cost: &CostEvaluator, start_nodes: &[usize]) -> Vec<SegmentMove> {
    let mut candidates = Vec::new();
    for &start_node in start_nodes {
        candidates.extend(search_segment_moves_from(solution, cost, start_node));
    }
    candidates.sort_by(|a, b| b.improvement.cmp(&a.improvement));
    candidates
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
    fn selects_single_node_relocation() {
        let problem = cross_problem();
        let cost = CostEvaluator::new(&problem, 5);
        let mut solution = Solution::new(&problem);
        solution.add_route(&[1, 2, 3, 4]);
        solution.add_route(&[5]);

        let candidates = search_segment_moves_from(&solution, &cost, 4);
        let best = candidates.into_iter().max_by_key(|m| m.improvement).unwrap();

        assert_eq!(best.improvement, 91);
        assert_eq!(best.segment, vec![4]);
    }

    #[test]
    fn selects_two_node_relocation() {
        let problem = cross_problem();
        let cost = CostEvaluator::new(&problem, 5);
        let mut solution = Solution::new(&problem);
        solution.add_route(&[1]);
        solution.add_route(&[2, 3, 4, 5]);

        let candidates = search_segment_moves_from(&solution, &cost, 2);
        let best = candidates.into_iter().max_by_key(|m| m.improvement).unwrap();

        assert_eq!(best.segment, vec![3, 2]);
    }
}
