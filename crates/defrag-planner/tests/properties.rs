// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Property-based tests: every strategy returns an executable plan that
//! respects the budget and never makes the layout worse.

use defrag_planner::{
    Algorithm, DefragStrategy, DynamicProgramming, GreedyCompaction, OptimizationLevel,
    RunControl, SearchParams, Strategy,
};
use placement_model::{generate_inventory, GeneratorConfig, Layout, Snapshot, Validated};
use proptest::prelude::*;

fn snapshot(count: usize, budget: usize, fill: f64, seed: u64) -> Snapshot<Validated> {
    let inv = generate_inventory(&GeneratorConfig {
        object_count: count,
        capacity: 500,
        token_budget: budget,
        fill_ratio: fill,
        seed,
    })
    .unwrap();
    Snapshot::new(inv.system.unwrap(), inv.objects)
        .validate()
        .unwrap()
}

fn params(seed: u64) -> SearchParams {
    SearchParams::for_level(OptimizationLevel::Low).with_seed(seed)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_plans_are_valid(
        count in 0usize..24,
        budget in 0usize..8,
        fill in 0.2f64..0.9,
        seed in any::<u64>(),
    ) {
        let snap = snapshot(count, budget, fill, seed);
        for alg in Algorithm::ALL {
            let plan = Strategy::new(alg, &params(seed))
                .optimize(&snap, &RunControl::new())
                .unwrap();

            prop_assert!(plan.moves_used() <= budget, "{alg} used {} moves", plan.moves_used());
            prop_assert!(plan.after_fragmentation() <= plan.before_fragmentation() + 1e-9);
            prop_assert!(!plan.partial);
            plan.validate(&snap).unwrap();

            // The final placement is disjoint and in range.
            let replayed: Layout = plan.replay(&snap).unwrap();
            prop_assert!(replayed.is_consistent());
            prop_assert_eq!(replayed.placement(), plan.new_placement.clone());
        }
    }

    #[test]
    fn prop_dp_never_worse_than_greedy(
        count in 1usize..20,
        budget in 0usize..6,
        fill in 0.2f64..0.9,
        seed in any::<u64>(),
    ) {
        let snap = snapshot(count, budget, fill, seed);
        let greedy = GreedyCompaction::new().optimize(&snap, &RunControl::new()).unwrap();
        let dp = DynamicProgramming::new(64).optimize(&snap, &RunControl::new()).unwrap();
        prop_assert!(dp.after_fragmentation() <= greedy.after_fragmentation() + 1e-9);
        prop_assert!(!greedy.after.is_better_than(&dp.after));
    }

    #[test]
    fn prop_packed_layout_is_a_noop(
        rows in prop::collection::vec((1u64..20, 0.0f64..1.0), 0..15),
        budget in 0usize..5,
    ) {
        let mut cursor = 0;
        let objects: Vec<_> = rows
            .iter()
            .enumerate()
            .map(|(i, &(size, freq))| {
                let obj = placement_model::StorageObject::new(i as u64 + 1, size, freq, cursor);
                cursor += size;
                obj
            })
            .collect();
        let snap = Snapshot::new(placement_model::StorageSystem::new(cursor + 10, budget), objects)
            .validate()
            .unwrap();

        for alg in Algorithm::ALL {
            let plan = Strategy::new(alg, &params(0))
                .optimize(&snap, &RunControl::new())
                .unwrap();
            prop_assert_eq!(plan.moves_used(), 0);
            prop_assert_eq!(plan.before, plan.after);
            prop_assert_eq!(plan.after_fragmentation(), 0.0);
        }
    }

    #[test]
    fn prop_heuristic_deterministic(
        count in 1usize..24,
        budget in 1usize..6,
        seed in any::<u64>(),
    ) {
        let snap = snapshot(count, budget, 0.5, seed);
        let a = Strategy::new(Algorithm::Heuristic, &params(seed))
            .optimize(&snap, &RunControl::new())
            .unwrap();
        let b = Strategy::new(Algorithm::Heuristic, &params(seed))
            .optimize(&snap, &RunControl::new())
            .unwrap();
        prop_assert_eq!(a.moves, b.moves);
        prop_assert_eq!(a.new_placement, b.new_placement);
    }
}
