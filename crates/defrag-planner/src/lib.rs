// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # defrag-planner
//!
//! Plans token-budgeted relocations that reduce the fragmentation of a
//! validated [`Snapshot`], using interchangeable strategies.
//!
//! # Strategies
//!
//! | Strategy | Cost | Quality | Limits |
//! |---|---|---|---|
//! | [`GreedyCompaction`] | Lowest | Good | None |
//! | [`DynamicProgramming`] | O(n × budget) states | Never worse than greedy | `dp_object_limit` objects |
//! | [`SimulatedAnnealing`] | Iteration cap / time budget | Varies with effort | None |
//!
//! All strategies minimise the same [`placement_model::Objective`]:
//! fragmentation first, access cost as the tie-breaker.
//!
//! # Closed Strategy Set
//!
//! [`Algorithm`] names the three strategies and [`Strategy`] wraps a
//! configured instance. Both implement or produce a [`DefragStrategy`]:
//!
//! ```ignore
//! fn optimize(&self, snapshot: &Snapshot<Validated>, control: &RunControl)
//!     -> Result<OptimizationPlan, OptimizerError>;
//! ```
//!
//! # Example
//! ```
//! use defrag_planner::{DefragStrategy, GreedyCompaction, RunControl};
//! use placement_model::{Snapshot, StorageObject, StorageSystem};
//!
//! let snapshot = Snapshot::new(
//!     StorageSystem::new(100, 2),
//!     vec![
//!         StorageObject::new(1, 10, 1.0, 0),
//!         StorageObject::new(2, 10, 1.0, 50),
//!         StorageObject::new(3, 10, 1.0, 90),
//!     ],
//! )
//! .validate()
//! .unwrap();
//!
//! let plan = GreedyCompaction::new()
//!     .optimize(&snapshot, &RunControl::new())
//!     .unwrap();
//! assert!(plan.after_fragmentation() < plan.before_fragmentation());
//! println!("{}", plan.summary());
//! ```

mod control;
mod error;
mod params;
pub(crate) mod plan;
pub mod strategy;

pub use control::{CancellationToken, ProgressFn, RunControl};
pub use error::{ErrorKind, OptimizerError};
pub use params::{OptimizationLevel, SearchParams, DEFAULT_SEED};
pub use plan::{Move, OptimizationPlan};
pub use strategy::dynamic::DynamicProgramming;
pub use strategy::greedy::GreedyCompaction;
pub use strategy::heuristic::SimulatedAnnealing;
pub use strategy::{Algorithm, DefragStrategy, Strategy};

use placement_model::{Snapshot, Validated};

/// Picks a strategy for the snapshot.
///
/// Heuristic:
/// - At [`OptimizationLevel::Low`], use [`GreedyCompaction`].
/// - If the object count is within the DP limit, use
///   [`DynamicProgramming`].
/// - Otherwise, use [`SimulatedAnnealing`].
pub fn auto_select(snapshot: &Snapshot<Validated>, params: &SearchParams) -> Strategy {
    let n = snapshot.num_objects();
    let algorithm = if params.level == OptimizationLevel::Low {
        tracing::info!("level low → using greedy strategy");
        Algorithm::Greedy
    } else if n <= params.dp_object_limit {
        tracing::info!(
            "{n} objects within dp limit {} → using dynamic-programming strategy",
            params.dp_object_limit
        );
        Algorithm::DynamicProgramming
    } else {
        tracing::info!(
            "{n} objects above dp limit {} → using heuristic strategy",
            params.dp_object_limit
        );
        Algorithm::Heuristic
    };
    Strategy::new(algorithm, params)
}

/// Selects a strategy with [`auto_select`] and runs it.
pub fn auto_optimize(
    snapshot: &Snapshot<Validated>,
    params: &SearchParams,
    control: &RunControl,
) -> Result<OptimizationPlan, OptimizerError> {
    auto_select(snapshot, params).optimize(snapshot, control)
}
