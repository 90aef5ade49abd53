use std::collections::BinaryHeap;
use std::collections::HashMap;

use ordered_float::OrderedFloat;

use crate::model::{Edge, Problem, Solution};

/// Rotating penalization criterion used to rank edges by "badness" during
/// perturbation: edge length, perpendicular width from the route center, or
/// their sum, cycling on every rebuild of the badness heap.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Criterion {
    Length,
    Width,
    WidthLength,
}

impl Criterion {
    fn next(self) -> Self {
        match self {
            Criterion::Length => Criterion::Width,
            Criterion::Width => Criterion::WidthLength,
            Criterion::WidthLength => Criterion::Length,
        }
    }
}

fn euclidean_round(a: (f64, f64), b: (f64, f64)) -> i64 {
    (((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt()).round() as i64
}

/// Distance matrix, penalized-distance mirror, per-node candidate
/// neighborhoods, and an edge-badness max-heap over one [`Problem`].
///
/// Grounded on `original_source/kgls/datastructure/cost_evaluator.py`.
pub struct CostEvaluator {
    n: usize,
    depot: usize,
    capacity: u32,
    neighborhood_size: usize,
    coords: Vec<(f64, f64)>,
    distance: Vec<i64>,
    penalized: Vec<i64>,
    neighborhood: Vec<Vec<usize>>,
    penalty: HashMap<Edge, u32>,
    baseline: i64,
    penalization_enabled: bool,
    criterion: Criterion,
    heap: BinaryHeap<(OrderedFloat<f64>, Edge)>,
}

impl CostEvaluator {
    pub fn new(problem: &Problem, neighborhood_size: usize) -> Self {
        let n = problem.num_nodes();
        let coords: Vec<(f64, f64)> = problem.nodes.iter().map(|node| (node.x, node.y)).collect();

        let mut distance = vec![0i64; n * n];
        for i in 0..n {
            for j in 0..n {
                distance[i * n + j] = euclidean_round(coords[i], coords[j]);
            }
        }
        let penalized = distance.clone();

        let mut neighborhood = vec![Vec::new(); n];
        for node in problem.customers() {
            let mut candidates: Vec<(i64, usize)> = problem
                .customers()
                .filter(|other| other.id != node.id)
                .map(|other| (distance[node.id * n + other.id], other.id))
                .collect();
            candidates.sort_unstable();
            candidates.truncate(neighborhood_size);
            neighborhood[node.id] = candidates.into_iter().map(|(_, id)| id).collect();
        }

        let total: i64 = problem
            .customers()
            .map(|node| {
                neighborhood[node.id]
                    .iter()
                    .map(|&m| distance[node.id * n + m])
                    .sum::<i64>()
            })
            .sum();
        let baseline = total / (neighborhood_size as i64 * n as i64);

        Self {
            n,
            depot: problem.depot,
            capacity: problem.capacity,
            neighborhood_size,
            coords,
            distance,
            penalized,
            neighborhood,
            penalty: HashMap::new(),
            baseline,
            penalization_enabled: false,
            criterion: Criterion::Length,
            heap: BinaryHeap::new(),
        }
    }

    pub fn neighborhood_size(&self) -> usize {
        self.neighborhood_size
    }

    pub fn neighborhood(&self, node: usize) -> &[usize] {
        &self.neighborhood[node]
    }

    pub fn raw_distance(&self, a: usize, b: usize) -> i64 {
        self.distance[a * self.n + b]
    }

    pub fn get_distance(&self, a: usize, b: usize) -> i64 {
        if self.penalization_enabled {
            self.penalized[a * self.n + b]
        } else {
            self.distance[a * self.n + b]
        }
    }

    pub fn is_feasible(&self, volume: u32) -> bool {
        volume <= self.capacity
    }

    pub fn enable_penalization(&mut self) {
        self.penalization_enabled = true;
    }

    pub fn disable_penalization(&mut self) {
        self.penalization_enabled = false;
    }

    fn route_center(&self, solution: &Solution, route_index: usize) -> (f64, f64) {
        let mut customers = solution.customers(route_index);
        customers.push(self.depot);
        let n = customers.len() as f64;
        let (sx, sy) = customers
            .iter()
            .fold((0.0, 0.0), |(sx, sy), &c| (sx + self.coords[c].0, sy + self.coords[c].1));
        (sx / n, sy / n)
    }

    /// Signed perpendicular offset of a node from the line through the
    /// depot and `center`, normalized by the depot-center distance.
    fn signed_offset(&self, node: usize, center: (f64, f64)) -> f64 {
        let depot = self.coords[self.depot];
        let dist_depot_center = ((depot.0 - center.0).powi(2) + (depot.1 - center.1).powi(2)).sqrt();
        if dist_depot_center == 0.0 {
            return 0.0;
        }
        let (nx, ny) = self.coords[node];
        let value = (center.1 - depot.1) * nx - (center.0 - depot.0) * ny + center.0 * depot.1
            - center.1 * depot.0;
        value / dist_depot_center
    }

    fn edge_width(&self, a: usize, b: usize, center: (f64, f64)) -> f64 {
        (self.signed_offset(a, center) - self.signed_offset(b, center)).abs()
    }

    fn edge_value(&self, a: usize, b: usize, center: (f64, f64)) -> f64 {
        match self.criterion {
            Criterion::Length => self.raw_distance(a, b) as f64,
            Criterion::Width => self.edge_width(a, b, center),
            Criterion::WidthLength => self.edge_width(a, b, center) + self.raw_distance(a, b) as f64,
        }
    }

    /// Rebuilds the edge-badness heap from the current solution under the
    /// active criterion, then rotates to the next criterion.
    pub fn determine_edge_badness(&mut self, solution: &Solution) {
        self.heap.clear();

        for route in &solution.routes {
            if route.is_empty() {
                continue;
            }
            let center = if self.criterion != Criterion::Length {
                self.route_center(solution, route.index)
            } else {
                (0.0, 0.0)
            };

            for (a, b) in solution.route_edges(route.index) {
                let edge = Edge::new(a, b);
                let penalty = *self.penalty.get(&edge).unwrap_or(&0) as f64;
                let badness = self.edge_value(a, b, center) / (1.0 + penalty);
                self.heap.push((OrderedFloat(badness), edge));
            }
        }

        self.criterion = self.criterion.next();
    }

    /// Pops the worst edge, increments its penalty, updates the penalized
    /// distance matrix, and reinserts it with reduced badness.
    pub fn get_and_penalize_worst_edge(&mut self) -> Edge {
        let (_, edge) = self.heap.pop().expect("edge badness heap is empty");
        let penalty_count = self.penalty.entry(edge).or_insert(0);
        *penalty_count += 1;
        let penalty_count = *penalty_count;

        let raw = self.raw_distance(edge.a, edge.b);
        let penalized_cost = (raw as f64 + 0.1 * self.baseline as f64 * penalty_count as f64).round() as i64;
        self.penalized[edge.a * self.n + edge.b] = penalized_cost;
        self.penalized[edge.b * self.n + edge.a] = penalized_cost;

        let requeue_badness = raw as f64 / (1.0 + penalty_count as f64);
        self.heap.push((OrderedFloat(requeue_badness), edge));

        edge
    }

    pub fn penalize(&mut self, edge: Edge) {
        *self.penalty.entry(edge).or_insert(0) += 1;
    }

    pub fn get_solution_costs(&self, solution: &Solution, ignore_penalties: bool) -> i64 {
        solution
            .routes
            .iter()
            .filter(|r| !r.is_empty())
            .flat_map(|r| solution.route_edges(r.index))
            .map(|(a, b)| {
                if ignore_penalties {
                    self.raw_distance(a, b)
                } else {
                    self.get_distance(a, b)
                }
            })
            .sum()
    }
}
