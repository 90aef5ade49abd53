//! Run statistics: per-operator cumulative search time and move count, plus
//! best-cost/gap tracking across the outer loop.
//!
//! Grounded on the teacher's `solver/history.rs` (a struct accumulating
//! timestamped state over a run, logged via `log::info!` on every
//! improvement) and `original_source/kgls/kgls.py`'s `solution_stats` dict
//! (`time_*`, `move_count_*` keys) and `_update_run_stats`/
//! `print_time_distribution`.

use std::time::{Duration, Instant};

use log::info;

use crate::config::MoveKind;

#[derive(Clone, Copy, Debug, Default)]
pub struct OperatorStats {
    pub search_time: Duration,
    pub move_count: u64,
}

/// Accumulated timing and progress for one run of the driver loop.
#[derive(Debug)]
pub struct Stats {
    start_time: Instant,
    lin_kernighan_time: Duration,
    segment_move: OperatorStats,
    cross_exchange: OperatorStats,
    relocation_chain: OperatorStats,
    pub iteration: u64,
    pub best_iteration: u64,
    pub best_cost: i64,
}

impl Stats {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            lin_kernighan_time: Duration::ZERO,
            segment_move: OperatorStats::default(),
            cross_exchange: OperatorStats::default(),
            relocation_chain: OperatorStats::default(),
            iteration: 0,
            best_iteration: 0,
            best_cost: i64::MAX,
        }
    }

    pub fn record_lin_kernighan_time(&mut self, elapsed: Duration) {
        self.lin_kernighan_time += elapsed;
    }

    pub fn record_search_time(&mut self, kind: MoveKind, elapsed: Duration) {
        self.operator_mut(kind).search_time += elapsed;
    }

    pub fn record_move(&mut self, kind: MoveKind) {
        self.operator_mut(kind).move_count += 1;
    }

    fn operator_mut(&mut self, kind: MoveKind) -> &mut OperatorStats {
        match kind {
            MoveKind::SegmentMove => &mut self.segment_move,
            MoveKind::CrossExchange => &mut self.cross_exchange,
            MoveKind::RelocationChain => &mut self.relocation_chain,
        }
    }

    pub fn operator(&self, kind: MoveKind) -> OperatorStats {
        match kind {
            MoveKind::SegmentMove => self.segment_move,
            MoveKind::CrossExchange => self.cross_exchange,
            MoveKind::RelocationChain => self.relocation_chain,
        }
    }

    pub fn lin_kernighan_time(&self) -> Duration {
        self.lin_kernighan_time
    }

    /// Records a candidate cost at `iteration`; if it strictly improves on
    /// the best seen so far, updates the best-cost bookkeeping and logs it.
    pub fn note_candidate(&mut self, iteration: u64, cost: i64) -> bool {
        self.iteration = iteration;
        if cost < self.best_cost {
            self.best_cost = cost;
            self.best_iteration = iteration;
            info!("iteration {iteration}: new best cost {cost}");
            true
        } else {
            false
        }
    }

    pub fn total_runtime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// `100 * (best_cost - bks) / bks`, or `None` without a best-known cost.
    pub fn gap(&self, best_known_cost: Option<i64>) -> Option<f64> {
        best_known_cost.map(|bks| 100.0 * (self.best_cost - bks) as f64 / bks as f64)
    }

    /// Percentage of total runtime spent in each operator, teacher-style
    /// fixed-width table (`kgls.py::print_time_distribution`).
    pub fn time_distribution(&self) -> String {
        let total = self.total_runtime().as_secs_f64().max(f64::EPSILON);
        let entries = [
            ("lin_kernighan", self.lin_kernighan_time),
            ("segment_move", self.segment_move.search_time),
            ("cross_exchange", self.cross_exchange.search_time),
            ("relocation_chain", self.relocation_chain.search_time),
        ];

        let mut report = String::new();
        let mut accounted = 0.0;
        for (name, duration) in entries {
            let percentage = 100.0 * duration.as_secs_f64() / total;
            accounted += percentage;
            report.push_str(&format!("{name:<20}{percentage:5.1}%\n"));
        }
        report.push_str(&format!("{:<20}{:5.1}%\n", "other", (100.0 - accounted).max(0.0)));
        report
    }
}

impl Default for Stats {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn note_candidate_only_improves_on_strict_decrease() {
        let mut stats = Stats::new();
        assert!(stats.note_candidate(0, 100));
        assert_eq!(stats.best_cost, 100);
        assert!(!stats.note_candidate(1, 100));
        assert!(stats.note_candidate(2, 90));
        assert_eq!(stats.best_iteration, 2);
    }

    #[test]
    fn gap_is_none_without_best_known_cost() {
        let stats = Stats::new();
        assert!(stats.gap(None).is_none());
    }

    #[test]
    fn gap_computes_percentage_above_best_known() {
        let mut stats = Stats::new();
        stats.note_candidate(0, 110);
        assert_eq!(stats.gap(Some(100)), Some(10.0));
    }

    #[test]
    fn records_move_counts_per_operator() {
        let mut stats = Stats::new();
        stats.record_move(MoveKind::SegmentMove);
        stats.record_move(MoveKind::SegmentMove);
        stats.record_move(MoveKind::CrossExchange);
        assert_eq!(stats.operator(MoveKind::SegmentMove).move_count, 2);
        assert_eq!(stats.operator(MoveKind::CrossExchange).move_count, 1);
        assert_eq!(stats.operator(MoveKind::RelocationChain).move_count, 0);
    }
}
