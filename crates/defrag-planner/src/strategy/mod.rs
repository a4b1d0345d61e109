// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The [`DefragStrategy`] trait, the [`Algorithm`] selector and strategy
//! implementations.

pub mod dynamic;
pub mod greedy;
pub mod heuristic;

use crate::{OptimizationPlan, OptimizerError, RunControl, SearchParams};
use placement_model::{Snapshot, Validated};
use std::fmt;
use std::str::FromStr;

pub use dynamic::DynamicProgramming;
pub use greedy::GreedyCompaction;
pub use heuristic::SimulatedAnnealing;

/// Trait for defragmentation strategies.
///
/// Each strategy takes a validated snapshot and produces an
/// [`OptimizationPlan`] that uses at most the snapshot's token budget.
///
/// Strategies are purely algorithmic and work on their own copy of the
/// layout, so the caller's records are never touched.
pub trait DefragStrategy: Send + Sync {
    /// Human-readable name of this strategy.
    fn name(&self) -> &str;

    fn algorithm(&self) -> Algorithm;

    /// Produces a plan for the given snapshot.
    fn optimize(
        &self,
        snapshot: &Snapshot<Validated>,
        control: &RunControl,
    ) -> Result<OptimizationPlan, OptimizerError>;
}

/// The closed set of available algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Algorithm {
    #[serde(alias = "GREEDY")]
    Greedy,
    #[serde(alias = "dp", alias = "DYNAMIC_PROGRAMMING")]
    DynamicProgramming,
    #[serde(alias = "annealing", alias = "HEURISTIC")]
    Heuristic,
}

impl Algorithm {
    pub const ALL: [Algorithm; 3] = [
        Algorithm::Greedy,
        Algorithm::DynamicProgramming,
        Algorithm::Heuristic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Algorithm::Greedy => "greedy",
            Algorithm::DynamicProgramming => "dynamic-programming",
            Algorithm::Heuristic => "heuristic",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Algorithm {
    type Err = OptimizerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "greedy" => Ok(Algorithm::Greedy),
            "dp" | "dynamic-programming" => Ok(Algorithm::DynamicProgramming),
            "heuristic" | "annealing" => Ok(Algorithm::Heuristic),
            other => Err(OptimizerError::InvalidConfiguration(format!(
                "unknown algorithm '{other}' (expected greedy, dp or heuristic)"
            ))),
        }
    }
}

/// A ready-to-run strategy.
#[derive(Debug, Clone)]
pub enum Strategy {
    Greedy(GreedyCompaction),
    DynamicProgramming(DynamicProgramming),
    Heuristic(SimulatedAnnealing),
}

impl Strategy {
    /// Builds the strategy for `algorithm` with the given parameters.
    pub fn new(algorithm: Algorithm, params: &SearchParams) -> Self {
        match algorithm {
            Algorithm::Greedy => Strategy::Greedy(GreedyCompaction::new()),
            Algorithm::DynamicProgramming => {
                Strategy::DynamicProgramming(DynamicProgramming::new(params.dp_object_limit))
            }
            Algorithm::Heuristic => Strategy::Heuristic(SimulatedAnnealing::new(params.clone())),
        }
    }

    fn inner(&self) -> &dyn DefragStrategy {
        match self {
            Strategy::Greedy(s) => s,
            Strategy::DynamicProgramming(s) => s,
            Strategy::Heuristic(s) => s,
        }
    }
}

impl DefragStrategy for Strategy {
    fn name(&self) -> &str {
        self.inner().name()
    }

    fn algorithm(&self) -> Algorithm {
        self.inner().algorithm()
    }

    fn optimize(
        &self,
        snapshot: &Snapshot<Validated>,
        control: &RunControl,
    ) -> Result<OptimizationPlan, OptimizerError> {
        self.inner().optimize(snapshot, control)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_aliases() {
        assert_eq!("greedy".parse::<Algorithm>().unwrap(), Algorithm::Greedy);
        assert_eq!("dp".parse::<Algorithm>().unwrap(), Algorithm::DynamicProgramming);
        assert_eq!(
            "DYNAMIC_PROGRAMMING".parse::<Algorithm>().unwrap(),
            Algorithm::DynamicProgramming
        );
        assert_eq!("annealing".parse::<Algorithm>().unwrap(), Algorithm::Heuristic);
        assert!("genetic".parse::<Algorithm>().is_err());
    }

    #[test]
    fn test_display_round_trips() {
        for alg in Algorithm::ALL {
            assert_eq!(alg.to_string().parse::<Algorithm>().unwrap(), alg);
        }
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(
            serde_json::to_string(&Algorithm::DynamicProgramming).unwrap(),
            "\"dynamic-programming\""
        );
        let alg: Algorithm = serde_json::from_str("\"dp\"").unwrap();
        assert_eq!(alg, Algorithm::DynamicProgramming);
        let alg: Algorithm = serde_json::from_str("\"HEURISTIC\"").unwrap();
        assert_eq!(alg, Algorithm::Heuristic);
    }

    #[test]
    fn test_strategy_for_each_algorithm() {
        let params = SearchParams::default();
        for alg in Algorithm::ALL {
            let strategy = Strategy::new(alg, &params);
            assert_eq!(strategy.algorithm(), alg);
            assert_eq!(strategy.name(), alg.as_str());
        }
    }
}
