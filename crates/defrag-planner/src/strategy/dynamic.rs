// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Dynamic-programming strategy over (object, tokens used).
//!
//! Objects are processed top-down: by current end offset, descending,
//! ties by id. At row `i` each state either relocates object `i` to the
//! lowest free offset below it (one token) or leaves it in place.
//!
//! ```text
//!            tokens used →
//!           0     1     2   …  T
//! row 0   [ s ]
//! row 1   [ L ] [ M ]
//! row 2   [ L ] [L/M] [ M ]
//!  …
//! row n   best cell over all token counts is the answer
//! ```
//!
//! The arena stores, for each cell, the best objective reaching it, the
//! decision taken and the token count of its parent. Layouts are kept for
//! the frontier row only; moves are recovered by walking back-pointers.
//!
//! # Limitation
//!
//! A state's layout depends on which earlier objects moved, and only the
//! best path into each cell survives. The result is optimal only under
//! that simplification. It is never worse than [`GreedyCompaction`]: the
//! greedy trajectory is one of the paths, and "leave" keeps a path's
//! objective.
//!
//! # When to use
//! - Small inventories (up to the configured object limit) where the best
//!   plan for a tight budget matters.
//!
//! [`GreedyCompaction`]: crate::GreedyCompaction

use crate::plan::PlanBuilder;
use crate::strategy::{Algorithm, DefragStrategy};
use crate::{Move, OptimizationPlan, OptimizerError, RunControl};
use placement_model::{Layout, Objective, Snapshot, Validated};

/// Exact search over relocate/leave decisions for small inventories.
#[derive(Debug, Clone)]
pub struct DynamicProgramming {
    object_limit: usize,
}

impl DynamicProgramming {
    pub fn new(object_limit: usize) -> Self {
        Self { object_limit }
    }

    pub fn object_limit(&self) -> usize {
        self.object_limit
    }
}

impl Default for DynamicProgramming {
    fn default() -> Self {
        Self::new(64)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Decision {
    Leave,
    Relocate { to: u64 },
}

#[derive(Debug, Clone, Copy)]
struct Cell {
    objective: Objective,
    decision: Decision,
    parent_tokens: usize,
}

/// Memo table indexed by `(row, tokens used)`.
struct Arena {
    width: usize,
    cells: Vec<Option<Cell>>,
}

impl Arena {
    fn new(rows: usize, width: usize) -> Self {
        Self {
            width,
            cells: vec![None; rows * width],
        }
    }

    fn get(&self, row: usize, tokens: usize) -> Option<&Cell> {
        self.cells.get(row * self.width + tokens)?.as_ref()
    }

    fn set(&mut self, row: usize, tokens: usize, cell: Cell) {
        self.cells[row * self.width + tokens] = Some(cell);
    }

    /// Token count of the best cell in `row` (fewest tokens on ties).
    fn best_in_row(&self, row: usize) -> Option<usize> {
        let mut best: Option<(usize, Objective)> = None;
        for tokens in 0..self.width {
            if let Some(cell) = self.get(row, tokens) {
                match best {
                    Some((_, obj)) if !cell.objective.is_better_than(&obj) => {}
                    _ => best = Some((tokens, cell.objective)),
                }
            }
        }
        best.map(|(tokens, _)| tokens)
    }
}

/// Offers a candidate state for `(row, tokens)`; keeps it if strictly
/// better than what the cell already holds.
fn offer(
    arena: &mut Arena,
    next: &mut [Option<Layout>],
    row: usize,
    tokens: usize,
    layout: Layout,
    decision: Decision,
    parent_tokens: usize,
) {
    let objective = layout.objective();
    let better = arena
        .get(row, tokens)
        .map_or(true, |cell| objective.is_better_than(&cell.objective));
    if better {
        arena.set(
            row,
            tokens,
            Cell {
                objective,
                decision,
                parent_tokens,
            },
        );
        next[tokens] = Some(layout);
    }
}

/// Slot indices ordered by end offset descending, ties by id.
fn top_down_order(layout: &Layout) -> Vec<usize> {
    let mut order: Vec<usize> = (0..layout.len()).collect();
    let slots = layout.slots();
    order.sort_by(|&a, &b| {
        slots[b]
            .end()
            .cmp(&slots[a].end())
            .then(slots[a].id.cmp(&slots[b].id))
    });
    order
}

impl DefragStrategy for DynamicProgramming {
    fn name(&self) -> &str {
        "dynamic-programming"
    }

    fn algorithm(&self) -> Algorithm {
        Algorithm::DynamicProgramming
    }

    fn optimize(
        &self,
        snapshot: &Snapshot<Validated>,
        control: &RunControl,
    ) -> Result<OptimizationPlan, OptimizerError> {
        let n = snapshot.num_objects();
        if n > self.object_limit {
            return Err(OptimizerError::ProblemTooLarge {
                objects: n,
                limit: self.object_limit,
            });
        }

        let mut builder = PlanBuilder::new(self.algorithm(), snapshot);
        let initial = snapshot.layout();
        let max_tokens = snapshot.token_budget().min(n);
        let width = max_tokens + 1;
        let order = top_down_order(&initial);

        tracing::debug!("dp: {n} objects, up to {max_tokens} moves, {} cells", (n + 1) * width);

        let mut arena = Arena::new(n + 1, width);
        arena.set(
            0,
            0,
            Cell {
                objective: initial.objective(),
                decision: Decision::Leave,
                parent_tokens: 0,
            },
        );
        let mut frontier: Vec<Option<Layout>> = vec![None; width];
        frontier[0] = Some(initial.clone());
        let mut rows_done = 0;

        for (row, &index) in order.iter().enumerate() {
            if control.is_cancelled() {
                tracing::warn!("dp run cancelled at row {row}/{n}");
                builder.mark_partial();
                break;
            }

            let mut next: Vec<Option<Layout>> = vec![None; width];
            for tokens in 0..width {
                let Some(layout) = frontier[tokens].take() else {
                    continue;
                };
                if tokens < max_tokens {
                    if let Some(to) = layout.lowest_fit_below(index) {
                        let moved = layout.apply_move(index, to)?;
                        offer(
                            &mut arena,
                            &mut next,
                            row + 1,
                            tokens + 1,
                            moved,
                            Decision::Relocate { to },
                            tokens,
                        );
                    }
                }
                offer(
                    &mut arena,
                    &mut next,
                    row + 1,
                    tokens,
                    layout,
                    Decision::Leave,
                    tokens,
                );
            }
            frontier = next;
            rows_done = row + 1;
            control.report_progress(rows_done as f64 / n as f64 * 100.0);
        }

        let failed = |detail: &str| OptimizerError::StrategyFailed {
            strategy: self.name().to_string(),
            detail: detail.to_string(),
        };

        let best_tokens = arena
            .best_in_row(rows_done)
            .ok_or_else(|| failed("no reachable state"))?;
        let result = frontier
            .get_mut(best_tokens)
            .and_then(Option::take)
            .ok_or_else(|| failed("frontier lost the best layout"))?;

        let mut moves = Vec::with_capacity(best_tokens);
        let mut tokens = best_tokens;
        for row in (1..=rows_done).rev() {
            let cell = arena
                .get(row, tokens)
                .ok_or_else(|| failed("broken back-pointer"))?;
            if let Decision::Relocate { to } = cell.decision {
                let slot = initial.slots()[order[row - 1]];
                moves.push(Move {
                    object_id: slot.id,
                    from: slot.position,
                    to,
                });
            }
            tokens = cell.parent_tokens;
        }
        moves.reverse();

        builder.set_moves(moves);
        builder.set_iterations(rows_done as u64);
        let plan = builder.build(&result);
        plan.validate(snapshot)?;
        tracing::info!("{}", plan.summary());
        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CancellationToken, GreedyCompaction};
    use placement_model::{StorageObject, StorageSystem};

    fn snapshot(capacity: u64, budget: usize, objs: &[(u64, u64, f64, u64)]) -> Snapshot<Validated> {
        let objects = objs
            .iter()
            .map(|&(id, size, freq, pos)| StorageObject::new(id, size, freq, pos))
            .collect();
        Snapshot::new(StorageSystem::new(capacity, budget), objects)
            .validate()
            .unwrap()
    }

    fn scenario(budget: usize) -> Snapshot<Validated> {
        snapshot(100, budget, &[(1, 10, 1.0, 0), (2, 10, 1.0, 50), (3, 10, 1.0, 90)])
    }

    #[test]
    fn test_dp_scenario() {
        let plan = DynamicProgramming::default()
            .optimize(&scenario(2), &RunControl::new())
            .unwrap();
        assert!(plan.moves_used() <= 2);
        assert_eq!(plan.after_fragmentation(), 0.0);
        assert_eq!(plan.iterations, 3);
    }

    #[test]
    fn test_dp_zero_budget() {
        let plan = DynamicProgramming::default()
            .optimize(&scenario(0), &RunControl::new())
            .unwrap();
        assert_eq!(plan.moves_used(), 0);
        assert_eq!(plan.before, plan.after);
    }

    #[test]
    fn test_dp_empty_snapshot() {
        let plan = DynamicProgramming::default()
            .optimize(&snapshot(10, 3, &[]), &RunControl::new())
            .unwrap();
        assert_eq!(plan.moves_used(), 0);
        assert_eq!(plan.iterations, 0);
    }

    #[test]
    fn test_dp_too_large() {
        let err = DynamicProgramming::new(2)
            .optimize(&scenario(2), &RunControl::new())
            .unwrap_err();
        assert!(matches!(
            err,
            OptimizerError::ProblemTooLarge {
                objects: 3,
                limit: 2
            }
        ));
    }

    #[test]
    fn test_dp_beats_greedy_on_access_cost() {
        // Greedy stops once fragmentation stops falling; the second token
        // still pulls object 1 down to offset 0.
        let snap = snapshot(100, 2, &[(1, 10, 1.0, 5), (2, 10, 1.0, 20)]);
        let greedy = GreedyCompaction::new().optimize(&snap, &RunControl::new()).unwrap();
        let dp = DynamicProgramming::default().optimize(&snap, &RunControl::new()).unwrap();

        assert!((greedy.after_fragmentation() - 5.0).abs() < 1e-9);
        assert!((dp.after_fragmentation() - 5.0).abs() < 1e-9);
        assert!(dp.after.is_better_than(&greedy.after));
        assert_eq!(dp.new_placement[&1], 0);
        assert_eq!(dp.new_placement[&2], 15);
    }

    #[test]
    fn test_dp_never_worse_than_greedy() {
        let cases: &[&[(u64, u64, f64, u64)]] = &[
            &[(1, 4, 0.2, 3), (2, 7, 0.9, 12), (3, 3, 0.5, 30), (4, 6, 0.1, 41)],
            &[(1, 20, 0.5, 10), (2, 5, 0.5, 35), (3, 15, 0.7, 60), (4, 2, 0.3, 97)],
            &[(1, 30, 0.4, 0), (2, 30, 0.6, 40), (3, 25, 0.9, 75)],
        ];
        for objs in cases {
            for budget in 0..4 {
                let snap = snapshot(100, budget, objs);
                let greedy = GreedyCompaction::new().optimize(&snap, &RunControl::new()).unwrap();
                let dp = DynamicProgramming::default()
                    .optimize(&snap, &RunControl::new())
                    .unwrap();
                assert!(!greedy.after.is_better_than(&dp.after), "{objs:?} budget {budget}");
            }
        }
    }

    #[test]
    fn test_dp_cancelled_returns_partial() {
        let token = CancellationToken::new();
        token.cancel();
        let control = RunControl::new().with_cancellation(token);
        let plan = DynamicProgramming::default().optimize(&scenario(2), &control).unwrap();
        assert!(plan.partial);
        assert_eq!(plan.moves_used(), 0);
    }

    #[test]
    fn test_top_down_order() {
        let layout = scenario(1).layout();
        assert_eq!(top_down_order(&layout), vec![2, 1, 0]);
    }
}
