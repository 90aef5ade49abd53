pub mod driver;
pub mod lk;
pub mod ops;

use crate::cost::CostEvaluator;
use crate::model::Solution;

/// A candidate local-search move: knows its own improvement, which routes
/// it touches (for the disjoint-move batching in the driver), and how to
/// apply itself to a [`Solution`].
pub trait Move {
    fn improvement(&self) -> i64;
    fn routes(&self) -> Vec<usize>;
    fn execute(&self, solution: &mut Solution);

    /// Two moves are disjoint if they touch no route in common; applying a
    /// batch of pairwise-disjoint moves in one pass is always safe.
    fn is_disjoint(&self, other: &dyn Move) -> bool {
        let mine = self.routes();
        !other.routes().iter().any(|r| mine.contains(r))
    }
}

pub(crate) fn route_cost(solution: &Solution, cost: &CostEvaluator, route_index: usize) -> i64 {
    solution
        .route_edges(route_index)
        .iter()
        .map(|&(a, b)| cost.get_distance(a, b))
        .sum()
}
