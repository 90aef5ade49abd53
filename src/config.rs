//! Run parameters (spec.md §6) plus the teacher's YAML-load-then-patch
//! config idiom (`original src/config.rs::Config::patch`), trimmed to the
//! five parameters the KGLS driver actually recognizes and the ambient
//! fields every teacher `Config` carries (time limit, log interval).

use std::fs::File;
use std::io::BufReader;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::KglsError;

/// One of the three inter-route neighborhoods the driver can run, in the
/// order given by `RunParameters::moves`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveKind {
    SegmentMove,
    CrossExchange,
    RelocationChain,
}

impl std::fmt::Display for MoveKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            MoveKind::SegmentMove => "segment_move",
            MoveKind::CrossExchange => "cross_exchange",
            MoveKind::RelocationChain => "relocation_chain",
        };
        write!(f, "{name}")
    }
}

/// Parameters recognized by the search driver (spec.md §6), plus ambient
/// run bookkeeping the teacher's `Config` always carries.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct RunParameters {
    pub depth_lin_kernighan: usize,
    pub depth_relocation_chain: usize,
    pub num_perturbations: usize,
    pub neighborhood_size: usize,
    pub moves: Vec<MoveKind>,

    pub time_limit_secs: u64,
    pub log_interval: u64,
}

impl Default for RunParameters {
    fn default() -> Self {
        Self {
            depth_lin_kernighan: 4,
            depth_relocation_chain: 3,
            num_perturbations: 3,
            neighborhood_size: 20,
            moves: vec![MoveKind::SegmentMove, MoveKind::CrossExchange, MoveKind::RelocationChain],
            time_limit_secs: 60,
            log_interval: 100,
        }
    }
}

impl RunParameters {
    fn read_yaml_file(filepath: &str) -> Result<Value, KglsError> {
        let file = File::open(filepath).map_err(|e| KglsError::Configuration(format!("cannot open {filepath}: {e}")))?;
        let reader = BufReader::new(file);
        serde_yaml::from_reader(reader).map_err(|e| KglsError::Configuration(format!("failed to parse {filepath}: {e}")))
    }

    pub fn load_yaml_file(filepath: &str) -> Result<Self, KglsError> {
        let mut config = Self::default();
        config.patch(&Self::read_yaml_file(filepath)?)?;
        Ok(config)
    }

    pub fn patch_from_yaml_file(&mut self, filepath: &str) -> Result<(), KglsError> {
        self.patch(&Self::read_yaml_file(filepath)?)
    }

    /// Merges a partial JSON object into this config, field by field,
    /// teacher-style (`Config::patch`'s `serde_json::Value::pointer_mut`
    /// idiom). Unknown keys and values of the wrong kind are configuration
    /// errors (spec.md §7), not panics.
    pub fn patch(&mut self, values: &Value) -> Result<(), KglsError> {
        let mut config: Value = serde_json::to_value(&self).expect("RunParameters always serializes");

        let values_map = values
            .as_object()
            .ok_or_else(|| KglsError::Configuration("config patch must be a JSON object".into()))?;

        for (key, value) in values_map {
            let pointer = format!("/{key}");
            match config.pointer_mut(&pointer) {
                Some(slot) => *slot = value.clone(),
                None => return Err(KglsError::Configuration(format!("unknown parameter key: {key}"))),
            }
        }

        *self = serde_json::from_value(config).map_err(|e| KglsError::Configuration(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_overrides_a_known_key() {
        let mut params = RunParameters::default();
        params.patch(&serde_json::json!({"neighborhood_size": 30})).unwrap();
        assert_eq!(params.neighborhood_size, 30);
        assert_eq!(params.depth_lin_kernighan, 4);
    }

    #[test]
    fn patch_rejects_unknown_key() {
        let mut params = RunParameters::default();
        let result = params.patch(&serde_json::json!({"bogus_key": 1}));
        assert!(result.is_err());
    }

    #[test]
    fn patch_rejects_unknown_move_name() {
        let mut params = RunParameters::default();
        let result = params.patch(&serde_json::json!({"moves": ["teleport"]}));
        assert!(result.is_err());
    }

    #[test]
    fn patch_restricts_moves_subset_and_order() {
        let mut params = RunParameters::default();
        params
            .patch(&serde_json::json!({"moves": ["relocation_chain", "segment_move"]}))
            .unwrap();
        assert_eq!(params.moves, vec![MoveKind::RelocationChain, MoveKind::SegmentMove]);
    }
}
