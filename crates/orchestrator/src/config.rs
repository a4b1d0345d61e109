// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Optimizer configuration loaded from TOML files or constructed programmatically.
//!
//! # TOML Format
//! ```toml
//! algorithm = "auto"
//! optimization_level = "medium"
//! iteration_cap = 10000
//! time_budget_ms = 2000
//! random_seed = 42
//! dp_object_limit = 48
//! history_path = "./defrag-history.jsonl"
//! ```
//!
//! Every key except `algorithm` and `optimization_level` is optional; the
//! level supplies the defaults. Job requests can override the algorithm,
//! the level and the search knobs per job.

use crate::OrchestratorError;
use defrag_planner::{auto_select, Algorithm, OptimizationLevel, SearchParams, Strategy};
use placement_model::{Snapshot, Validated};
use std::path::{Path, PathBuf};

/// Configuration for the orchestrator and the strategies it runs.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct OptimizerConfig {
    /// `"auto"`, `"greedy"`, `"dp"` / `"dynamic-programming"`, or
    /// `"heuristic"` / `"annealing"`.
    #[serde(default = "default_algorithm")]
    pub algorithm: String,
    #[serde(default)]
    pub optimization_level: OptimizationLevel,
    /// Overrides the level's heuristic iteration cap.
    pub iteration_cap: Option<u64>,
    /// Wall-clock budget for the heuristic search.
    pub time_budget_ms: Option<u64>,
    pub random_seed: Option<u64>,
    /// Overrides the level's DP object limit.
    pub dp_object_limit: Option<usize>,
    /// JSON-lines file every finished job is appended to.
    pub history_path: Option<PathBuf>,
}

fn default_algorithm() -> String {
    "auto".to_string()
}

/// Algorithm requested by a config or a job: a fixed one or automatic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlgorithmChoice {
    Auto,
    Fixed(Algorithm),
}

impl AlgorithmChoice {
    pub fn parse(s: &str) -> Result<Self, OrchestratorError> {
        if s.trim().eq_ignore_ascii_case("auto") {
            return Ok(AlgorithmChoice::Auto);
        }
        s.parse::<Algorithm>()
            .map(AlgorithmChoice::Fixed)
            .map_err(|e| OrchestratorError::ConfigError(e.to_string()))
    }

    /// Builds the strategy, consulting the snapshot when automatic.
    pub fn resolve(&self, snapshot: &Snapshot<Validated>, params: &SearchParams) -> Strategy {
        match self {
            AlgorithmChoice::Auto => auto_select(snapshot, params),
            AlgorithmChoice::Fixed(alg) => Strategy::new(*alg, params),
        }
    }
}

impl OptimizerConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, OrchestratorError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            OrchestratorError::ConfigError(format!("cannot read config '{}': {e}", path.display()))
        })?;
        Self::from_toml(&content)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, OrchestratorError> {
        let config: Self = toml::from_str(toml_str)
            .map_err(|e| OrchestratorError::ConfigError(format!("TOML parse error: {e}")))?;
        config.algorithm_choice()?;
        Ok(config)
    }

    /// Serialises configuration to TOML.
    pub fn to_toml(&self) -> Result<String, OrchestratorError> {
        toml::to_string_pretty(self)
            .map_err(|e| OrchestratorError::ConfigError(format!("TOML serialise error: {e}")))
    }

    pub fn algorithm_choice(&self) -> Result<AlgorithmChoice, OrchestratorError> {
        AlgorithmChoice::parse(&self.algorithm)
    }

    /// Resolves the search parameters: level defaults, then overrides.
    pub fn search_params(&self) -> SearchParams {
        let mut params = SearchParams::for_level(self.optimization_level);
        if let Some(cap) = self.iteration_cap {
            params = params.with_iteration_cap(cap);
        }
        if let Some(ms) = self.time_budget_ms {
            params = params.with_time_budget_ms(ms);
        }
        if let Some(seed) = self.random_seed {
            params = params.with_seed(seed);
        }
        if let Some(limit) = self.dp_object_limit {
            params = params.with_dp_object_limit(limit);
        }
        params
    }

    /// Creates the strategy specified by this config for a snapshot.
    pub fn create_strategy(
        &self,
        snapshot: &Snapshot<Validated>,
    ) -> Result<Strategy, OrchestratorError> {
        let params = self.search_params();
        Ok(self.algorithm_choice()?.resolve(snapshot, &params))
    }
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            algorithm: default_algorithm(),
            optimization_level: OptimizationLevel::Medium,
            iteration_cap: None,
            time_budget_ms: None,
            random_seed: None,
            dp_object_limit: None,
            history_path: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use defrag_planner::DefragStrategy;
    use placement_model::{StorageObject, StorageSystem};

    fn snapshot(n: u64) -> Snapshot<Validated> {
        let objects = (0..n)
            .map(|i| StorageObject::new(i + 1, 2, 0.5, i * 4))
            .collect();
        Snapshot::new(StorageSystem::new(1000, 3), objects)
            .validate()
            .unwrap()
    }

    #[test]
    fn test_default() {
        let c = OptimizerConfig::default();
        assert_eq!(c.algorithm, "auto");
        assert_eq!(c.optimization_level, OptimizationLevel::Medium);
        assert!(c.history_path.is_none());
    }

    #[test]
    fn test_from_toml() {
        let toml = r#"
algorithm = "annealing"
optimization_level = "high"
iteration_cap = 1234
time_budget_ms = 50
random_seed = 9
history_path = "/tmp/history.jsonl"
"#;
        let c = OptimizerConfig::from_toml(toml).unwrap();
        assert_eq!(c.algorithm_choice().unwrap(), AlgorithmChoice::Fixed(Algorithm::Heuristic));
        let p = c.search_params();
        assert_eq!(p.level, OptimizationLevel::High);
        assert_eq!(p.iteration_cap, 1234);
        assert_eq!(p.time_budget_ms, Some(50));
        assert_eq!(p.random_seed, 9);
        assert_eq!(p.dp_object_limit, 256);
        assert_eq!(c.history_path, Some(PathBuf::from("/tmp/history.jsonl")));
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let c = OptimizerConfig::from_toml("").unwrap();
        assert_eq!(c.algorithm, "auto");
        assert_eq!(c.search_params(), SearchParams::default());
    }

    #[test]
    fn test_to_toml_roundtrip() {
        let c = OptimizerConfig {
            algorithm: "dp".into(),
            dp_object_limit: Some(12),
            ..Default::default()
        };
        let back = OptimizerConfig::from_toml(&c.to_toml().unwrap()).unwrap();
        assert_eq!(back.algorithm, "dp");
        assert_eq!(back.dp_object_limit, Some(12));
    }

    #[test]
    fn test_unknown_algorithm_rejected() {
        assert!(OptimizerConfig::from_toml("algorithm = \"bogus\"").is_err());
        assert!(OptimizerConfig::from_toml("optimization_level = \"max\"").is_err());
    }

    #[test]
    fn test_create_strategy_auto() {
        let c = OptimizerConfig::default();
        let s = c.create_strategy(&snapshot(5)).unwrap();
        assert_eq!(s.algorithm(), Algorithm::DynamicProgramming);

        let c = OptimizerConfig {
            dp_object_limit: Some(4),
            ..Default::default()
        };
        let s = c.create_strategy(&snapshot(5)).unwrap();
        assert_eq!(s.algorithm(), Algorithm::Heuristic);
    }

    #[test]
    fn test_create_strategy_fixed() {
        let c = OptimizerConfig {
            algorithm: "greedy".into(),
            ..Default::default()
        };
        assert_eq!(c.create_strategy(&snapshot(5)).unwrap().name(), "greedy");
    }
}
