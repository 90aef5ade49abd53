use crate::model::Problem;

/// Sentinel used in the side tables for "no node" (an empty route's anchor,
/// or a customer not yet assigned to a route).
pub const NONE: usize = usize::MAX;

/// A route's own state: its stable identity, its cached size/volume, and an
/// anchor into the shared `prev`/`next` arenas.
///
/// The depot is a single shared node visited by every route, so a global
/// `next[depot]`/`prev[depot]` slot cannot exist (it would be re-written by
/// every route). `first` is the one piece of per-route topology state this
/// implies: the id of the route's first customer (or [`NONE`] if the route
/// is empty), used to seed a walk over `Solution::next`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Route {
    pub index: usize,
    pub first: usize,
    pub size: usize,
    pub volume: u32,
}

impl Route {
    fn new(index: usize) -> Self {
        Self {
            index,
            first: NONE,
            size: 0,
            volume: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }
}

/// Doubly side-tabled routing solution: a set of [`Route`]s over one
/// [`Problem`], plus `prev`/`next`/`route_of` arenas indexed by node id.
///
/// `prev`/`next` are only ever read or written at customer indices; the
/// depot index is never dereferenced (see [`Route::first`]).
#[derive(Clone, Debug)]
pub struct Solution {
    pub routes: Vec<Route>,
    prev: Vec<usize>,
    next: Vec<usize>,
    route_of: Vec<usize>,
    demand: Vec<u32>,
    depot: usize,
    capacity: u32,
}

impl Solution {
    pub fn new(problem: &Problem) -> Self {
        let n = problem.num_nodes();
        let demand = problem.nodes.iter().map(|node| node.demand).collect();
        Self {
            routes: Vec::new(),
            prev: vec![NONE; n],
            next: vec![NONE; n],
            route_of: vec![NONE; n],
            demand,
            depot: problem.depot,
            capacity: problem.capacity,
        }
    }

    pub fn depot(&self) -> usize {
        self.depot
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn is_depot(&self, node: usize) -> bool {
        node == self.depot
    }

    pub fn prev(&self, node: usize) -> usize {
        self.prev[node]
    }

    pub fn next(&self, node: usize) -> usize {
        self.next[node]
    }

    pub fn route_of(&self, node: usize) -> usize {
        self.route_of[node]
    }

    pub fn demand(&self, node: usize) -> u32 {
        self.demand[node]
    }

    /// `direction` 0 = prev, 1 = next (matches the Python `get_neighbour`
    /// convention the local-search operators enumerate over).
    pub fn neighbour(&self, node: usize, direction: usize) -> usize {
        if direction == 0 {
            self.prev(node)
        } else {
            self.next(node)
        }
    }

    /// Ordered customer ids of a route, walking `next` from its anchor.
    pub fn customers(&self, route_index: usize) -> Vec<usize> {
        let route = &self.routes[route_index];
        let mut result = Vec::with_capacity(route.size);
        if route.first == NONE {
            return result;
        }
        let mut node = route.first;
        loop {
            result.push(node);
            let nxt = self.next[node];
            if nxt == self.depot {
                break;
            }
            node = nxt;
        }
        result
    }

    /// Every consecutive pair (including the depot-bounding edges) in route
    /// order: `(depot, c1), (c1, c2), ..., (ck, depot)`. Empty for an empty
    /// route.
    pub fn route_edges(&self, route_index: usize) -> Vec<(usize, usize)> {
        let customers = self.customers(route_index);
        if customers.is_empty() {
            return Vec::new();
        }
        let mut edges = Vec::with_capacity(customers.len() + 1);
        edges.push((self.depot, customers[0]));
        for w in customers.windows(2) {
            edges.push((w[0], w[1]));
        }
        edges.push((*customers.last().unwrap(), self.depot));
        edges
    }

    /// Creates a new route from a customer sequence (depot implied at both
    /// ends) and returns its index.
    pub fn add_route(&mut self, customers: &[usize]) -> usize {
        let index = self.routes.len();
        let mut route = Route::new(index);

        if !customers.is_empty() {
            route.first = customers[0];
            self.prev[customers[0]] = self.depot;
            for w in customers.windows(2) {
                self.next[w[0]] = w[1];
                self.prev[w[1]] = w[0];
            }
            let last = *customers.last().unwrap();
            self.next[last] = self.depot;

            for &c in customers {
                self.route_of[c] = index;
                route.size += 1;
                route.volume += self.demand[c];
            }
        }

        self.routes.push(route);
        index
    }

    /// Removes a consecutive run of customers (possibly given in reverse
    /// traversal order) from whichever route currently holds them. Pre:
    /// none of `nodes` is the depot.
    pub fn remove(&mut self, nodes: &[usize]) {
        debug_assert!(!nodes.is_empty());
        debug_assert!(nodes.iter().all(|&n| n != self.depot));

        let route_index = self.route_of[nodes[0]];
        let reversed = nodes.len() > 1 && self.next[nodes[0]] != nodes[1];

        let (left_outside, right_outside) = if reversed {
            (self.prev[*nodes.last().unwrap()], self.next[nodes[0]])
        } else {
            (self.prev[nodes[0]], self.next[*nodes.last().unwrap()])
        };

        if left_outside != self.depot {
            self.next[left_outside] = right_outside;
        }
        if right_outside != self.depot {
            self.prev[right_outside] = left_outside;
        }

        let route = &mut self.routes[route_index];
        if nodes.contains(&route.first) {
            route.first = if right_outside != self.depot {
                right_outside
            } else {
                NONE
            };
        }

        for &n in nodes {
            self.route_of[n] = NONE;
            route.size -= 1;
            route.volume -= self.demand[n];
        }
    }

    /// Splices `nodes` (already linked in the order they should appear)
    /// immediately after `anchor` in `route_index`. `anchor` may be the
    /// depot, meaning "insert at the front of the route".
    pub fn insert_after(&mut self, nodes: &[usize], anchor: usize, route_index: usize) {
        debug_assert!(!nodes.is_empty());

        for w in nodes.windows(2) {
            self.next[w[0]] = w[1];
            self.prev[w[1]] = w[0];
        }
        for &n in nodes {
            self.route_of[n] = route_index;
            self.routes[route_index].size += 1;
            self.routes[route_index].volume += self.demand[n];
        }

        let old_next = if anchor == self.depot {
            self.routes[route_index].first
        } else {
            self.next[anchor]
        };

        if anchor == self.depot {
            self.routes[route_index].first = nodes[0];
        } else {
            self.next[anchor] = nodes[0];
        }
        self.prev[nodes[0]] = anchor;

        let last = *nodes.last().unwrap();
        if old_next == NONE {
            self.next[last] = self.depot;
        } else {
            self.next[last] = old_next;
            if old_next != self.depot {
                self.prev[old_next] = last;
            }
        }
    }

    /// Replaces the customer order of a route outright. Used exclusively
    /// by the Lin-Kernighan operator, which reconstructs a whole route's
    /// cycle at once rather than splicing.
    pub fn rearrange(&mut self, route_index: usize, order: &[usize]) {
        if order.is_empty() {
            self.routes[route_index].first = NONE;
            return;
        }

        self.routes[route_index].first = order[0];
        self.prev[order[0]] = self.depot;
        for w in order.windows(2) {
            self.next[w[0]] = w[1];
            self.prev[w[1]] = w[0];
        }
        self.next[*order.last().unwrap()] = self.depot;
    }

    /// Debug-only invariant check (spec.md §3/§7/§8). Compiles to nothing
    /// in release builds.
    pub fn validate(&self) {
        #[cfg(debug_assertions)]
        self.validate_invariants();
    }

    #[cfg(debug_assertions)]
    fn validate_invariants(&self) {
        let mut seen = vec![false; self.route_of.len()];
        let mut total_customers = 0;

        for route in &self.routes {
            assert!(
                route.volume <= self.capacity,
                "route {} exceeds capacity: {} > {}",
                route.index,
                route.volume,
                self.capacity
            );

            let customers = self.customers(route.index);
            assert_eq!(customers.len(), route.size, "route {} size mismatch", route.index);
            let volume: u32 = customers.iter().map(|&c| self.demand[c]).sum();
            assert_eq!(volume, route.volume, "route {} volume mismatch", route.index);

            if !customers.is_empty() {
                assert_eq!(self.prev[customers[0]], self.depot);
                assert_eq!(self.next[*customers.last().unwrap()], self.depot);
            }

            for &c in &customers {
                assert_eq!(self.route_of[c], route.index, "node {} route_of mismatch", c);
                assert!(!seen[c], "node {} appears in more than one route", c);
                seen[c] = true;
                total_customers += 1;
            }
        }

        for (id, &assigned) in self.route_of.iter().enumerate() {
            if id == self.depot {
                continue;
            }
            assert!(assigned != NONE, "customer {} not assigned to any route", id);
        }

        for route in &self.routes {
            for &c in &self.customers(route.index) {
                if self.prev[c] != self.depot {
                    assert_eq!(self.next[self.prev[c]], c);
                }
                if self.next[c] != self.depot {
                    assert_eq!(self.prev[self.next[c]], c);
                }
            }
        }

        assert_eq!(total_customers, self.route_of.len() - 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Node, ProblemBuilder};

    fn line_problem() -> Problem {
        ProblemBuilder::new()
            .nodes(vec![
                Node::depot(0, 0.0, 0.0),
                Node::customer(1, 0.0, 0.0, 1),
                Node::customer(2, 0.0, 0.0, 1),
                Node::customer(3, 0.0, 0.0, 1),
                Node::customer(4, 0.0, 0.0, 1),
            ])
            .capacity(5)
            .build()
            .unwrap()
    }

    #[test]
    fn insert_nodes_after() {
        let problem = line_problem();
        let mut solution = Solution::new(&problem);
        let r = solution.add_route(&[1, 2]);

        solution.insert_after(&[3, 4], 1, r);
        solution.validate();

        assert_eq!(solution.customers(r), vec![1, 3, 4, 2]);
    }

    #[test]
    fn remove_nodes() {
        let problem = line_problem();
        let mut solution = Solution::new(&problem);
        let r = solution.add_route(&[1, 2, 3, 4]);

        solution.remove(&[3, 2]);
        solution.validate();
        assert_eq!(solution.customers(r), vec![1, 4]);

        solution.remove(&[1]);
        solution.validate();
        assert_eq!(solution.customers(r), vec![4]);
    }

    #[test]
    fn insert_at_front_via_depot_anchor() {
        let problem = line_problem();
        let mut solution = Solution::new(&problem);
        let r = solution.add_route(&[2]);
        solution.insert_after(&[1], solution.depot(), r);
        solution.validate();
        assert_eq!(solution.customers(r), vec![1, 2]);
    }
}
