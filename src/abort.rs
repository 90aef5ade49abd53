//! Abort conditions for the top-level search loop.
//!
//! 1:1 port of `original_source/kgls/abortion_condition.py`: four condition
//! kinds, each with a one-line human description, combined by OR.

use std::time::{Duration, Instant};

use crate::errors::KglsError;

/// One abort condition. `describe()` mirrors the Python classes' `msg`
/// attribute, built once from the condition's parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AbortCondition {
    MaxIterations(u64),
    MaxRuntimeSecs(u64),
    IterationsWithoutImprovement(u64),
    RuntimeWithoutImprovementSecs(u64),
}

impl AbortCondition {
    pub fn from_name(name: &str, param: u64) -> Result<Self, KglsError> {
        match name {
            "max_iterations" => Ok(AbortCondition::MaxIterations(param)),
            "max_runtime" => Ok(AbortCondition::MaxRuntimeSecs(param)),
            "iterations_without_improvement" => Ok(AbortCondition::IterationsWithoutImprovement(param)),
            "runtime_without_improvement" => Ok(AbortCondition::RuntimeWithoutImprovementSecs(param)),
            other => Err(KglsError::Configuration(format!(
                "unknown abort condition: {other}"
            ))),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            AbortCondition::MaxIterations(n) => format!("Stops after {n} iterations."),
            AbortCondition::MaxRuntimeSecs(n) => format!("Stops after {n} seconds."),
            AbortCondition::IterationsWithoutImprovement(n) => {
                format!("Stops after {n} iterations without improvement.")
            }
            AbortCondition::RuntimeWithoutImprovementSecs(n) => {
                format!("Stops after {n} seconds without improvement.")
            }
        }
    }

    fn should_abort(&self, state: &RunState) -> bool {
        match *self {
            AbortCondition::MaxIterations(n) => state.iteration >= n,
            AbortCondition::MaxRuntimeSecs(n) => state.start_time.elapsed() >= Duration::from_secs(n),
            AbortCondition::IterationsWithoutImprovement(n) => state.iteration - state.best_iteration >= n,
            AbortCondition::RuntimeWithoutImprovementSecs(n) => state.best_time.elapsed() >= Duration::from_secs(n),
        }
    }
}

/// Snapshot of the driver loop's progress, consulted at each outer-loop
/// iteration (spec.md §5: cancellation is polled between iterations only).
pub struct RunState {
    pub iteration: u64,
    pub best_iteration: u64,
    pub start_time: Instant,
    pub best_time: Instant,
}

/// A set of conditions, ORed together.
#[derive(Debug, Default)]
pub struct AbortConditions(Vec<AbortCondition>);

impl AbortConditions {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Matches the teacher's default: stop after 100 iterations without
    /// improvement (`kgls.py`'s `KGLS.__init__`).
    pub fn default_conditions() -> Self {
        Self(vec![AbortCondition::IterationsWithoutImprovement(100)])
    }

    pub fn set(&mut self, name: &str, param: u64) -> Result<(), KglsError> {
        self.0 = vec![AbortCondition::from_name(name, param)?];
        Ok(())
    }

    pub fn add(&mut self, name: &str, param: u64) -> Result<(), KglsError> {
        self.0.push(AbortCondition::from_name(name, param)?);
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn should_abort(&self, state: &RunState) -> bool {
        self.0.iter().any(|c| c.should_abort(state))
    }

    pub fn describe(&self) -> String {
        self.0.iter().map(|c| c.describe()).collect::<Vec<_>>().join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unknown_condition_name() {
        assert!(AbortCondition::from_name("bogus", 1).is_err());
    }

    #[test]
    fn max_iterations_fires_at_bound() {
        let now = Instant::now();
        let state = RunState {
            iteration: 5,
            best_iteration: 0,
            start_time: now,
            best_time: now,
        };
        let condition = AbortCondition::MaxIterations(5);
        assert!(condition.should_abort(&state));
        assert!(!AbortCondition::MaxIterations(6).should_abort(&state));
    }

    #[test]
    fn iterations_without_improvement_fires_at_bound() {
        let now = Instant::now();
        let state = RunState {
            iteration: 110,
            best_iteration: 10,
            start_time: now,
            best_time: now,
        };
        assert!(AbortCondition::IterationsWithoutImprovement(100).should_abort(&state));
        assert!(!AbortCondition::IterationsWithoutImprovement(101).should_abort(&state));
    }

    #[test]
    fn conditions_are_ored() {
        let mut conditions = AbortConditions::new();
        conditions.set("max_iterations", 10).unwrap();
        conditions.add("iterations_without_improvement", 100).unwrap();

        let now = Instant::now();
        let state = RunState {
            iteration: 10,
            best_iteration: 0,
            start_time: now,
            best_time: now,
        };
        assert!(conditions.should_abort(&state));
    }
}
