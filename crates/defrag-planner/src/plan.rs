// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Optimization plan: the output of a defragmentation strategy.
//!
//! A plan is an ordered list of [`Move`]s. Replaying them one by one on
//! the snapshot's layout must succeed and produce `new_placement`. The
//! plan is the contract between the planner and whoever applies it.

use crate::strategy::Algorithm;
use crate::OptimizerError;
use placement_model::{
    improvement, performance_score, Layout, ObjectId, Objective, PerformanceScore, Snapshot,
    Validated,
};
use std::collections::BTreeMap;
use std::time::Instant;

/// A single relocation. Consumes one token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Move {
    pub object_id: ObjectId,
    pub from: u64,
    pub to: u64,
}

/// The complete plan produced by a [`crate::DefragStrategy`].
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationPlan {
    /// Strategy that produced this plan.
    pub algorithm: Algorithm,
    /// Ordered relocations.
    pub moves: Vec<Move>,
    /// Token budget the plan was computed under.
    pub token_budget: usize,
    pub before: Objective,
    pub after: Objective,
    pub before_score: PerformanceScore,
    pub after_score: PerformanceScore,
    /// Relative change of the composite score, in percent.
    pub improvement: f64,
    /// Final position of every object.
    pub new_placement: BTreeMap<ObjectId, u64>,
    /// `true` if the run was cancelled before it finished.
    pub partial: bool,
    /// Search iterations (heuristic), DP rows, or greedy steps.
    pub iterations: u64,
    pub elapsed_ms: f64,
}

impl OptimizationPlan {
    pub fn moves_used(&self) -> usize {
        self.moves.len()
    }

    pub fn before_fragmentation(&self) -> f64 {
        self.before.fragmentation
    }

    pub fn after_fragmentation(&self) -> f64 {
        self.after.fragmentation
    }

    /// Fragmentation removed, in percentage points.
    pub fn fragmentation_reduction(&self) -> f64 {
        self.before.fragmentation - self.after.fragmentation
    }

    /// Validates the plan against the snapshot it was computed from.
    ///
    /// Checks:
    /// - No more moves than the token budget.
    /// - Every move starts from the object's position at that point and
    ///   lands on a free, in-range extent.
    /// - Replaying all moves yields `new_placement`.
    /// - The result is no worse than the starting layout.
    pub fn validate(&self, snapshot: &Snapshot<Validated>) -> Result<(), OptimizerError> {
        if self.moves.len() > self.token_budget {
            return Err(self.failure(format!(
                "{} moves exceed the token budget of {}",
                self.moves.len(),
                self.token_budget
            )));
        }

        let layout = self.replay(snapshot)?;

        if layout.placement() != self.new_placement {
            return Err(self.failure("replayed placement differs from new_placement".into()));
        }
        if self.before.is_better_than(&self.after) {
            return Err(self.failure(format!(
                "result is worse than the start: fragmentation {:.4}% -> {:.4}%",
                self.before.fragmentation, self.after.fragmentation
            )));
        }
        Ok(())
    }

    /// Applies the moves to a copy of the snapshot's layout.
    pub fn replay(&self, snapshot: &Snapshot<Validated>) -> Result<Layout, OptimizerError> {
        let mut layout = snapshot.layout();
        for mv in &self.moves {
            let index = layout
                .index_of(mv.object_id)
                .ok_or_else(|| OptimizerError::InvalidMove {
                    object_id: mv.object_id,
                    position: mv.to,
                    detail: "unknown object".into(),
                })?;
            let previous = layout.move_in_place(index, mv.to)?;
            if previous != mv.from {
                return Err(OptimizerError::InvalidMove {
                    object_id: mv.object_id,
                    position: mv.to,
                    detail: format!("expected object at {}, found it at {previous}", mv.from),
                });
            }
        }
        Ok(layout)
    }

    /// Returns a human-readable summary of the plan.
    pub fn summary(&self) -> String {
        format!(
            "Plan '{}': {}/{} moves, fragmentation {:.2}% -> {:.2}%, \
             access cost {:.2} -> {:.2}, score {:.1} -> {:.1} ({:+.1}%), \
             {} iterations in {:.1} ms{}",
            self.algorithm,
            self.moves_used(),
            self.token_budget,
            self.before.fragmentation,
            self.after.fragmentation,
            self.before.access_cost,
            self.after.access_cost,
            self.before_score.total,
            self.after_score.total,
            self.improvement,
            self.iterations,
            self.elapsed_ms,
            if self.partial { " (partial)" } else { "" },
        )
    }

    fn failure(&self, detail: String) -> OptimizerError {
        OptimizerError::StrategyFailed {
            strategy: self.algorithm.to_string(),
            detail,
        }
    }
}

/// Builder helper for assembling an `OptimizationPlan`.
///
/// Used internally by strategy implementations.
pub(crate) struct PlanBuilder {
    algorithm: Algorithm,
    token_budget: usize,
    before: Objective,
    before_score: PerformanceScore,
    started: Instant,
    moves: Vec<Move>,
    iterations: u64,
    partial: bool,
}

impl PlanBuilder {
    /// Starts a plan for `snapshot`, capturing its starting metrics.
    pub fn new(algorithm: Algorithm, snapshot: &Snapshot<Validated>) -> Self {
        let layout = snapshot.layout();
        Self {
            algorithm,
            token_budget: snapshot.token_budget(),
            before: layout.objective(),
            before_score: performance_score(&layout),
            started: Instant::now(),
            moves: Vec::new(),
            iterations: 0,
            partial: false,
        }
    }

    pub fn push_move(&mut self, mv: Move) {
        self.moves.push(mv);
    }

    pub fn set_moves(&mut self, moves: Vec<Move>) {
        self.moves = moves;
    }

    pub fn set_iterations(&mut self, iterations: u64) {
        self.iterations = iterations;
    }

    pub fn mark_partial(&mut self) {
        self.partial = true;
    }

    pub fn moves_used(&self) -> usize {
        self.moves.len()
    }

    /// Consumes the builder; `result` is the layout after all moves.
    pub fn build(self, result: &Layout) -> OptimizationPlan {
        let after_score = performance_score(result);
        OptimizationPlan {
            algorithm: self.algorithm,
            moves: self.moves,
            token_budget: self.token_budget,
            before: self.before,
            after: result.objective(),
            before_score: self.before_score,
            after_score,
            improvement: improvement(self.before_score.total, after_score.total),
            new_placement: result.placement(),
            partial: self.partial,
            iterations: self.iterations,
            elapsed_ms: self.started.elapsed().as_secs_f64() * 1000.0,
        }
    }
}
