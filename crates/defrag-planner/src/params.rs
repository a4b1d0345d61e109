// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Optimization levels and the search parameters derived from them.
//!
//! | Level | Heuristic iterations | Convergence window | DP object limit |
//! |---|---|---|---|
//! | `low` | 500 | 100 | 24 |
//! | `medium` | 5 000 | 500 | 64 |
//! | `high` | 50 000 | 2 000 | 256 |

use crate::OptimizerError;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Coarse effort knob exposed to callers.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum OptimizationLevel {
    Low,
    #[default]
    Medium,
    High,
}

impl OptimizationLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            OptimizationLevel::Low => "low",
            OptimizationLevel::Medium => "medium",
            OptimizationLevel::High => "high",
        }
    }
}

impl fmt::Display for OptimizationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OptimizationLevel {
    type Err = OptimizerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(OptimizationLevel::Low),
            "medium" => Ok(OptimizationLevel::Medium),
            "high" => Ok(OptimizationLevel::High),
            other => Err(OptimizerError::InvalidConfiguration(format!(
                "unknown optimization level '{other}' (expected low, medium or high)"
            ))),
        }
    }
}

/// Default seed for the heuristic search when the caller gives none.
pub const DEFAULT_SEED: u64 = 42;

/// Tunables shared by the strategies.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SearchParams {
    /// Level these parameters were derived from.
    pub level: OptimizationLevel,
    /// Maximum annealing iterations.
    pub iteration_cap: u64,
    /// Stop after this many iterations without a new best.
    pub convergence_window: u64,
    /// Largest object count the DP strategy accepts.
    pub dp_object_limit: usize,
    /// Wall-clock budget for the heuristic search.
    pub time_budget_ms: Option<u64>,
    /// Seed for the heuristic search.
    pub random_seed: u64,
    /// Starting annealing temperature, in energy units.
    pub initial_temperature: f64,
    /// Temperature reached at the iteration cap.
    pub min_temperature: f64,
}

impl SearchParams {
    /// Parameters for an optimization level.
    pub fn for_level(level: OptimizationLevel) -> Self {
        let (iteration_cap, convergence_window, dp_object_limit) = match level {
            OptimizationLevel::Low => (500, 100, 24),
            OptimizationLevel::Medium => (5_000, 500, 64),
            OptimizationLevel::High => (50_000, 2_000, 256),
        };
        Self {
            level,
            iteration_cap,
            convergence_window,
            dp_object_limit,
            time_budget_ms: None,
            random_seed: DEFAULT_SEED,
            initial_temperature: 10.0,
            min_temperature: 0.01,
        }
    }

    pub fn with_iteration_cap(mut self, cap: u64) -> Self {
        self.iteration_cap = cap;
        self
    }

    pub fn with_convergence_window(mut self, window: u64) -> Self {
        self.convergence_window = window;
        self
    }

    pub fn with_dp_object_limit(mut self, limit: usize) -> Self {
        self.dp_object_limit = limit;
        self
    }

    pub fn with_time_budget_ms(mut self, ms: u64) -> Self {
        self.time_budget_ms = Some(ms);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.random_seed = seed;
        self
    }

    pub fn time_budget(&self) -> Option<Duration> {
        self.time_budget_ms.map(Duration::from_millis)
    }

    /// Checks the parameters for values no strategy can run with.
    pub fn validate(&self) -> Result<(), OptimizerError> {
        if self.iteration_cap == 0 {
            return Err(OptimizerError::InvalidConfiguration(
                "iteration cap must be positive".into(),
            ));
        }
        if self.convergence_window == 0 {
            return Err(OptimizerError::InvalidConfiguration(
                "convergence window must be positive".into(),
            ));
        }
        let temps_ok = self.min_temperature.is_finite()
            && self.initial_temperature.is_finite()
            && self.min_temperature > 0.0
            && self.initial_temperature >= self.min_temperature;
        if !temps_ok {
            return Err(OptimizerError::InvalidConfiguration(format!(
                "temperatures must satisfy 0 < min ({}) <= initial ({})",
                self.min_temperature, self.initial_temperature
            )));
        }
        Ok(())
    }
}

impl Default for SearchParams {
    fn default() -> Self {
        Self::for_level(OptimizationLevel::default())
    }
}
