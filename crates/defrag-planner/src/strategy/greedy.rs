// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Greedy compaction strategy.
//!
//! Each step tries every object that has not moved yet, relocating it to
//! the lowest free offset below its current position where it fits, and
//! keeps the single move that removes the most fragmentation. One token
//! per move.
//!
//! # Tie-break
//!
//! Equal reductions (within [`METRIC_EPSILON`]) go to the object with the
//! higher access frequency, then to the lower object id.
//!
//! # Stopping
//!
//! The run ends when the budget is spent or no candidate reduces
//! fragmentation. Cost is `O(budget × n × n log n)`.
//!
//! # When to use
//! - Fast and predictable. A good default for large inventories and small
//!   budgets.

use crate::plan::PlanBuilder;
use crate::strategy::{Algorithm, DefragStrategy};
use crate::{Move, OptimizationPlan, OptimizerError, RunControl};
use placement_model::{Layout, Snapshot, Validated, METRIC_EPSILON};

/// Greedy compaction: always take the locally best move.
#[derive(Debug, Clone, Default)]
pub struct GreedyCompaction;

impl GreedyCompaction {
    pub fn new() -> Self {
        Self
    }
}

/// A candidate relocation and the fragmentation it removes.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    index: usize,
    to: u64,
    reduction: f64,
}

impl DefragStrategy for GreedyCompaction {
    fn name(&self) -> &str {
        "greedy"
    }

    fn algorithm(&self) -> Algorithm {
        Algorithm::Greedy
    }

    fn optimize(
        &self,
        snapshot: &Snapshot<Validated>,
        control: &RunControl,
    ) -> Result<OptimizationPlan, OptimizerError> {
        let mut builder = PlanBuilder::new(self.algorithm(), snapshot);
        let mut layout = snapshot.layout();
        let budget = snapshot.token_budget();
        let mut moved = vec![false; layout.len()];
        let mut steps = 0u64;

        while builder.moves_used() < budget {
            if control.is_cancelled() {
                tracing::warn!("greedy run cancelled after {} moves", builder.moves_used());
                builder.mark_partial();
                break;
            }
            steps += 1;

            let Some(best) = best_candidate(&mut layout, &moved)? else {
                tracing::debug!("no move reduces fragmentation, stopping");
                break;
            };

            let from = layout.move_in_place(best.index, best.to)?;
            moved[best.index] = true;
            let object_id = layout.slots()[best.index].id;
            tracing::debug!(
                "move {}: object {object_id} {from} -> {} (-{:.3}%)",
                builder.moves_used() + 1,
                best.to,
                best.reduction,
            );
            builder.push_move(Move {
                object_id,
                from,
                to: best.to,
            });
            if budget > 0 {
                control.report_progress(builder.moves_used() as f64 / budget as f64 * 100.0);
            }
        }

        builder.set_iterations(steps);
        let plan = builder.build(&layout);
        plan.validate(snapshot)?;
        tracing::info!("{}", plan.summary());
        Ok(plan)
    }
}

/// Evaluates every unmoved object and returns the best move, if any
/// reduces fragmentation. `layout` is restored before returning.
fn best_candidate(layout: &mut Layout, moved: &[bool]) -> Result<Option<Candidate>, OptimizerError> {
    let current = layout.fragmentation();
    let mut best: Option<Candidate> = None;

    for index in 0..layout.len() {
        if moved[index] {
            continue;
        }
        let Some(to) = layout.lowest_fit_below(index) else {
            continue;
        };

        let from = layout.move_in_place(index, to)?;
        let reduction = current - layout.fragmentation();
        layout.move_in_place(index, from)?;

        if reduction <= METRIC_EPSILON {
            continue;
        }
        let candidate = Candidate {
            index,
            to,
            reduction,
        };
        best = match best {
            Some(b) if !beats(layout, &candidate, &b) => Some(b),
            _ => Some(candidate),
        };
    }
    Ok(best)
}

/// Returns `true` if `a` should be preferred over `b`.
fn beats(layout: &Layout, a: &Candidate, b: &Candidate) -> bool {
    if (a.reduction - b.reduction).abs() > METRIC_EPSILON {
        return a.reduction > b.reduction;
    }
    let (sa, sb) = (&layout.slots()[a.index], &layout.slots()[b.index]);
    if (sa.access_frequency - sb.access_frequency).abs() > METRIC_EPSILON {
        return sa.access_frequency > sb.access_frequency;
    }
    sa.id < sb.id
}
