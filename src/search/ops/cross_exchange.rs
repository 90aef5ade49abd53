//! Cross-exchange: swaps a contiguous segment of one route for a contiguous
//! segment of another, reconnecting both ends ("crosses") at once.
//!
//! Grounded on `original_source/kgls/local_search/operator_cross_exchange.py`
//! (`CrossExchange`, `search_cross_exchanges_from`) — already written
//! against the side-table `solution.neighbour(...)`/`solution.route_of(...)`
//! API, confirming it as the authoritative variant (spec.md §9).

use crate::cost::CostEvaluator;
use crate::model::Solution;
use crate::search::Move;

#[derive(Clone, Debug)]
pub struct CrossExchangeMove {
    pub segment1: Vec<usize>,
    pub segment2: Vec<usize>,
    pub segment1_insert_after: usize,
    pub segment2_insert_after: usize,
    pub route1: usize,
    pub route2: usize,
    pub improvement: i64,
}

impl Move for CrossExchangeMove {
    fn improvement(&self) -> i64 {
        self.improvement
    }

    fn routes(&self) -> Vec<usize> {
        vec![self.route1, self.route2]
    }

    fn execute(&self, solution: &mut Solution) {
        solution.remove(&self.segment1);
        solution.remove(&self.segment2);

        solution.insert_after(&self.segment1, self.segment1_insert_after, self.route2);
        solution.insert_after(&self.segment2, self.segment2_insert_after, self.route1);
    }
}

/// Searches, from `start_node`, a profitable swap of a segment starting at
/// `start_node` with a segment starting next to one of its candidate
/// neighbours in another route (spec.md §4.4).
pub fn search_cross_exchanges_from(solution: &Solution, cost: &CostEvaluator, start_node: usize) -> Vec<CrossExchangeMove> {
    let route1 = solution.route_of(start_node);
    let mut candidates = Vec::new();

    for segment1_direction in [0usize, 1] {
        for segment2_direction in [0usize, 1] {
            let route1_segment_connection_start = solution.neighbour(start_node, 1 - segment1_direction);

            for &route2_segment_connection_start in cost.neighborhood(start_node) {
                let route2 = solution.route_of(route2_segment_connection_start);
                if route2 == route1 {
                    continue;
                }

                let segment2_start = solution.neighbour(route2_segment_connection_start, segment2_direction);
                if solution.is_depot(segment2_start) {
                    continue;
                }

                let improvement_first_cross = cost.get_distance(start_node, route1_segment_connection_start)
                    + cost.get_distance(segment2_start, route2_segment_connection_start)
                    - cost.get_distance(start_node, route2_segment_connection_start)
                    - cost.get_distance(segment2_start, route1_segment_connection_start);

                if improvement_first_cross <= 0 {
                    continue;
                }

                let mut segment1_end = start_node;
                let mut segment1_list = vec![segment1_end];
                let mut segment1_volume = solution.demand(segment1_end);

                while !solution.is_depot(segment1_end) {
                    let mut segment2_end = segment2_start;
                    let mut segment2_list = vec![segment2_end];
                    let mut segment2_volume = solution.demand(segment2_end);

                    while !solution.is_depot(segment2_end)
                        && cost.is_feasible(solution.routes[route1].volume - segment1_volume + segment2_volume)
                    {
                        if cost.is_feasible(solution.routes[route2].volume - segment2_volume + segment1_volume) {
                            let route1_segment_connection_end = solution.neighbour(segment1_end, segment1_direction);
                            let route2_segment_connection_end = solution.neighbour(segment2_end, segment2_direction);

                            let improvement_second_cross = cost.get_distance(segment1_end, route1_segment_connection_end)
                                + cost.get_distance(segment2_end, route2_segment_connection_end)
                                - cost.get_distance(segment1_end, route2_segment_connection_end)
                                - cost.get_distance(segment2_end, route1_segment_connection_end);

                            let improvement = improvement_first_cross + improvement_second_cross;
                            if improvement > 0 {
                                let segment1_insert_after = if segment2_direction == 1 {
                                    route2_segment_connection_start
                                } else {
                                    route2_segment_connection_end
                                };
                                let segment2_insert_after = if segment1_direction == 1 {
                                    route1_segment_connection_start
                                } else {
                                    route1_segment_connection_end
                                };

                                candidates.push(CrossExchangeMove {
                                    segment1: segment1_list.clone(),
                                    segment2: segment2_list.clone(),
                                    segment1_insert_after,
                                    segment2_insert_after,
                                    route1,
                                    route2,
                                    improvement,
                                });
                            }
                        }

                        segment2_end = solution.neighbour(segment2_end, segment2_direction);
                        if (segment2_direction == 1 && segment1_direction == 0) || segment1_direction + segment2_direction == 0 {
                            segment2_list.insert(0, segment2_end);
                        } else {
                            segment2_list.push(segment2_end);
                        }
                        segment2_volume += solution.demand(segment2_end);
                    }

                    segment1_end = solution.neighbour(segment1_end, segment1_direction);
                    if (segment1_direction == 1 && segment2_direction == 0) || segment1_direction + segment2_direction == 0 {
                        segment1_list.insert(0, segment1_end);
                    } else {
                        segment1_list.push(segment1_end);
                    }
                    segment1_volume += solution.demand(segment1_end);
                }
            }
        }
    }

    candidates
}

/// Runs [`search_cross_exchanges_from`] over every node in `start_nodes`, in
/// the given order.
pub fn search_cross_exchanges(solution: &Solution, cost: &CostEvaluator, start_nodes: &[usize]) -> Vec<CrossExchangeMove> {
    let mut candidates = Vec::new();
    for &start_node in start_nodes {
        candidates.extend(search_cross_exchanges_from(solution, cost, start_node));
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
    fn exchanges_single_customers() {
        let problem = cross_problem();
        let cost = CostEvaluator::new(&problem, 5);
        let mut solution = Solution::new(&problem);
        solution.add_route(&[1, 4, 3]);
        solution.add_route(&[2, 5]);

        let candidates = search_cross_exchanges_from(&solution, &cost, 4);
        let best = candidates.into_iter().max_by_key(|m| m.improvement).unwrap();

        assert_eq!(best.improvement, 271);
        assert_eq!(best.segment1, vec![4]);
        assert_eq!(best.segment2, vec![2]);
    }
}
