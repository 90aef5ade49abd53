use serde::{Deserialize, Serialize};

use crate::errors::KglsError;
use crate::model::Node;

/// Builds a [`Problem`], validating the single-depot invariant before the
/// immutable value is handed to the rest of the crate.
#[derive(Debug, Default)]
pub struct ProblemBuilder {
    nodes: Vec<Node>,
    capacity: u32,
    best_known_cost: Option<i64>,
}

impl ProblemBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nodes(mut self, nodes: Vec<Node>) -> Self {
        self.nodes = nodes;
        self
    }

    pub fn capacity(mut self, capacity: u32) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn best_known_cost(mut self, cost: Option<i64>) -> Self {
        self.best_known_cost = cost;
        self
    }

    pub fn build(self) -> Result<Problem, KglsError> {
        if self.capacity == 0 {
            return Err(KglsError::Input("capacity must be positive".into()));
        }

        let depots: Vec<usize> = self
            .nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.is_depot)
            .map(|(i, _)| i)
            .collect();

        if depots.len() != 1 {
            return Err(KglsError::Input(format!(
                "instance must have exactly one depot, found {}",
                depots.len()
            )));
        }

        for (index, node) in self.nodes.iter().enumerate() {
            if node.id != index {
                return Err(KglsError::Input(format!(
                    "node ids must be a dense 0-based range matching their position; \
                     node at position {} has id {}",
                    index, node.id
                )));
            }
        }

        Ok(Problem {
            nodes: self.nodes,
            capacity: self.capacity,
            depot: depots[0],
            best_known_cost: self.best_known_cost,
        })
    }
}

/// Immutable customer/depot set plus vehicle capacity.
///
/// `depot` is the index into `nodes` of the single depot; node `id`s need
/// not be contiguous with their index, callers address nodes by id via
/// [`Problem::node`].
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Problem {
    pub nodes: Vec<Node>,
    pub capacity: u32,
    pub depot: usize,
    pub best_known_cost: Option<i64>,
}

impl Problem {
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn num_customers(&self) -> usize {
        self.nodes.len() - 1
    }

    pub fn depot_id(&self) -> usize {
        self.nodes[self.depot].id
    }

    pub fn node(&self, id: usize) -> &Node {
        &self.nodes[id]
    }

    pub fn customers(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(|n| !n.is_depot)
    }

    pub fn total_demand(&self) -> u32 {
        self.customers().map(|n| n.demand).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_missing_depot() {
        let result = ProblemBuilder::new()
            .nodes(vec![Node::customer(1, 0.0, 0.0, 1)])
            .capacity(10)
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn rejects_two_depots() {
        let result = ProblemBuilder::new()
            .nodes(vec![
                Node::depot(0, 0.0, 0.0),
                Node::depot(1, 1.0, 1.0),
            ])
            .capacity(10)
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn rejects_non_dense_ids() {
        let result = ProblemBuilder::new()
            .nodes(vec![Node::depot(0, 0.0, 0.0), Node::customer(2, 1.0, 0.0, 1)])
            .capacity(10)
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn builds_valid_problem() {
        let problem = ProblemBuilder::new()
            .nodes(vec![
                Node::depot(0, 0.0, 0.0),
                Node::customer(1, 1.0, 0.0, 2),
            ])
            .capacity(10)
            .build()
            .unwrap();
        assert_eq!(problem.num_customers(), 1);
        assert_eq!(problem.total_demand(), 2);
    }
}
