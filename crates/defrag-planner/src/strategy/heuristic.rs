// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Simulated annealing over move sequences.
//!
//! The search state is a sequence of at most `token_budget` relocations,
//! always applied to a private copy of the layout, so every state is an
//! executable plan. Each iteration proposes one of:
//!
//! - **extend**: relocate an object to the start of a random free gap
//!   that fits it. Objects are picked top-biased (near the high-water
//!   mark) or weighted by access frequency.
//! - **undo**: drop the last move.
//! - **replace**: drop the last move and extend with a new one.
//!
//! Improvements are always accepted; worse states with probability
//! `exp(−Δenergy / T)`. The temperature cools geometrically from
//! `initial_temperature` to `min_temperature` over the iteration cap.
//!
//! # Termination
//!
//! Iteration cap, time budget, or `convergence_window` iterations with no
//! new best. Cancellation returns the best state so far as partial.
//!
//! The RNG is ChaCha8 seeded from `random_seed`, so runs without a time
//! budget are reproducible.

use crate::plan::PlanBuilder;
use crate::strategy::{Algorithm, DefragStrategy};
use crate::{Move, OptimizationPlan, OptimizerError, RunControl, SearchParams};
use placement_model::{Layout, Objective, Snapshot, Validated, METRIC_EPSILON};
use rand::distributions::{Distribution, WeightedIndex};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::time::Instant;

/// Randomised search for large inventories.
#[derive(Debug, Clone)]
pub struct SimulatedAnnealing {
    params: SearchParams,
}

impl SimulatedAnnealing {
    pub fn new(params: SearchParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &SearchParams {
        &self.params
    }
}

impl Default for SimulatedAnnealing {
    fn default() -> Self {
        Self::new(SearchParams::default())
    }
}

/// The current sequence and the layout it produces.
#[derive(Clone)]
struct SearchState {
    layout: Layout,
    moves: Vec<Move>,
}

impl SearchState {
    fn push(&mut self, index: usize, to: u64) -> Result<(), OptimizerError> {
        let from = self.layout.move_in_place(index, to)?;
        let object_id = self.layout.slots()[index].id;
        self.moves.push(Move { object_id, from, to });
        Ok(())
    }

    /// Reverts the last move. The object's old range is free again
    /// because later moves have already been undone.
    fn pop(&mut self) -> Result<Option<Move>, OptimizerError> {
        let Some(mv) = self.moves.pop() else {
            return Ok(None);
        };
        let index = self
            .layout
            .index_of(mv.object_id)
            .ok_or_else(|| OptimizerError::InvalidMove {
                object_id: mv.object_id,
                position: mv.from,
                detail: "object vanished from layout".into(),
            })?;
        self.layout.move_in_place(index, mv.from)?;
        Ok(Some(mv))
    }
}

/// Picks which object to relocate next.
struct Picker {
    by_frequency: Option<WeightedIndex<f64>>,
}

impl Picker {
    fn new(layout: &Layout) -> Self {
        let weights: Vec<f64> = layout.slots().iter().map(|s| s.access_frequency).collect();
        Self {
            by_frequency: WeightedIndex::new(weights).ok(),
        }
    }

    fn pick(&self, layout: &Layout, rng: &mut ChaCha8Rng) -> usize {
        if let Some(dist) = &self.by_frequency {
            if rng.gen_bool(0.5) {
                return dist.sample(rng);
            }
        }
        // Top-biased: squaring a uniform sample favours the highest ends.
        let mut order: Vec<usize> = (0..layout.len()).collect();
        let slots = layout.slots();
        order.sort_by(|&a, &b| slots[b].end().cmp(&slots[a].end()));
        let u: f64 = rng.gen();
        let rank = ((u * u) * order.len() as f64) as usize;
        order[rank.min(order.len() - 1)]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Proposal {
    Extend,
    Undo,
    Replace,
}

impl SimulatedAnnealing {
    fn choose(&self, len: usize, budget: usize, rng: &mut ChaCha8Rng) -> Proposal {
        if len == 0 {
            return Proposal::Extend;
        }
        if len >= budget {
            return if rng.gen_bool(0.5) {
                Proposal::Undo
            } else {
                Proposal::Replace
            };
        }
        match rng.gen_range(0..10) {
            0..=5 => Proposal::Extend,
            6 | 7 => Proposal::Undo,
            _ => Proposal::Replace,
        }
    }

    /// Adds a random relocation. Returns `false` if the picked object has
    /// nowhere else to go.
    fn extend(
        state: &mut SearchState,
        picker: &Picker,
        rng: &mut ChaCha8Rng,
    ) -> Result<bool, OptimizerError> {
        let index = picker.pick(&state.layout, rng);
        let slot = state.layout.slots()[index];
        let targets: Vec<u64> = state
            .layout
            .free_gaps_excluding(Some(index))
            .into_iter()
            .filter(|gap| gap.len >= slot.size && gap.start != slot.position)
            .map(|gap| gap.start)
            .collect();
        if targets.is_empty() {
            return Ok(false);
        }
        let to = targets[rng.gen_range(0..targets.len())];
        state.push(index, to)?;
        Ok(true)
    }

    /// Applies one proposal to `state`. Returns `false` if nothing changed.
    fn propose(
        &self,
        state: &mut SearchState,
        budget: usize,
        picker: &Picker,
        rng: &mut ChaCha8Rng,
    ) -> Result<bool, OptimizerError> {
        match self.choose(state.moves.len(), budget, rng) {
            Proposal::Extend => Self::extend(state, picker, rng),
            Proposal::Undo => Ok(state.pop()?.is_some()),
            Proposal::Replace => {
                state.pop()?;
                Self::extend(state, picker, rng)
            }
        }
    }

    fn temperature(&self, iteration: u64) -> f64 {
        let p = &self.params;
        let progress = iteration as f64 / p.iteration_cap.max(1) as f64;
        p.initial_temperature * (p.min_temperature / p.initial_temperature).powf(progress)
    }
}

impl DefragStrategy for SimulatedAnnealing {
    fn name(&self) -> &str {
        "heuristic"
    }

    fn algorithm(&self) -> Algorithm {
        Algorithm::Heuristic
    }

    fn optimize(
        &self,
        snapshot: &Snapshot<Validated>,
        control: &RunControl,
    ) -> Result<OptimizationPlan, OptimizerError> {
        self.params.validate()?;
        let started = Instant::now();
        let mut builder = PlanBuilder::new(self.algorithm(), snapshot);
        let budget = snapshot.token_budget();
        let initial = snapshot.layout();

        // A packed layout is already optimal; access cost alone never
        // justifies spending tokens.
        if budget == 0 || initial.is_empty() || initial.fragmentation() <= METRIC_EPSILON {
            let plan = builder.build(&initial);
            tracing::info!("{}", plan.summary());
            return Ok(plan);
        }

        let deadline = control.deadline_with(started, self.params.time_budget());
        let mut rng = ChaCha8Rng::seed_from_u64(self.params.random_seed);
        let picker = Picker::new(&initial);

        let mut current = SearchState {
            layout: initial.clone(),
            moves: Vec::new(),
        };
        let mut current_obj = current.layout.objective();
        let mut best = current.clone();
        let mut best_obj: Objective = current_obj;
        let mut since_best = 0u64;
        let mut iterations = 0u64;
        let report_every = (self.params.iteration_cap / 100).max(1);

        while iterations < self.params.iteration_cap {
            if control.is_cancelled() {
                tracing::warn!("heuristic run cancelled after {iterations} iterations");
                builder.mark_partial();
                break;
            }
            if deadline.is_some_and(|d| Instant::now() >= d) {
                tracing::debug!("time budget reached after {iterations} iterations");
                break;
            }
            if since_best >= self.params.convergence_window {
                tracing::debug!("converged after {iterations} iterations");
                break;
            }
            iterations += 1;

            let mut candidate = current.clone();
            if !self.propose(&mut candidate, budget, &picker, &mut rng)? {
                since_best += 1;
                continue;
            }

            let candidate_obj = candidate.layout.objective();
            let delta = candidate_obj.energy() - current_obj.energy();
            let accept = !current_obj.is_better_than(&candidate_obj)
                || rng.gen::<f64>() < (-delta / self.temperature(iterations)).exp();

            if accept {
                current = candidate;
                current_obj = candidate_obj;
                if current_obj.is_better_than(&best_obj) {
                    best = current.clone();
                    best_obj = current_obj;
                    since_best = 0;
                } else {
                    since_best += 1;
                }
            } else {
                since_best += 1;
            }

            if iterations % report_every == 0 {
                control.report_progress(
                    iterations as f64 / self.params.iteration_cap as f64 * 100.0,
                );
            }
        }

        tracing::debug!(
            "heuristic: {iterations} iterations, best fragmentation {:.3}%",
            best_obj.fragmentation
        );

        builder.set_moves(best.moves);
        builder.set_iterations(iterations);
        let plan = builder.build(&best.layout);
        plan.validate(snapshot)?;
        tracing::info!("{}", plan.summary());
        Ok(plan)
    }
}
