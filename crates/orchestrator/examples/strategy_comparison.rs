// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Example: Compare defragmentation strategies on a synthetic inventory.
//!
//! Runs greedy, dynamic-programming and heuristic search over the same
//! fragmented device at several token budgets, then submits one job
//! through the orchestrator and applies its plan.
//!
//! ```bash
//! cargo run -p orchestrator --example strategy_comparison
//! ```

use defrag_planner::{Algorithm, DefragStrategy, RunControl, SearchParams, Strategy};
use orchestrator::{render_placement, JobRequest, OptimizerConfig, Orchestrator};
use placement_model::{generate_inventory, GeneratorConfig, StorageSystem};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_env_filter("warn").init();

    // 40 objects over 400 units, roughly half full.
    let generator = GeneratorConfig {
        object_count: 40,
        capacity: 400,
        token_budget: 10,
        fill_ratio: 0.5,
        seed: 7,
    };
    let mut inventory = generate_inventory(&generator)?;
    let system = StorageSystem::new(generator.capacity, generator.token_budget);
    let snapshot = inventory.clone().into_snapshot(system).validate()?;
    println!("Device: {}\n", snapshot.summary());

    let params = SearchParams::default();
    let budgets = [2usize, 5, 10];

    println!(
        "{:<22} {:>7} {:>7} {:>10} {:>10} {:>10}",
        "Strategy", "Budget", "Moves", "Frag %", "Cost", "ms",
    );
    println!("{}", "-".repeat(72));

    for algorithm in Algorithm::ALL {
        let strategy = Strategy::new(algorithm, &params);
        for &budget in &budgets {
            match strategy.optimize(&snapshot.with_budget(budget), &RunControl::new()) {
                Ok(plan) => println!(
                    "{:<22} {:>7} {:>7} {:>10.2} {:>10.2} {:>10.2}",
                    strategy.name(),
                    budget,
                    plan.moves_used(),
                    plan.after_fragmentation(),
                    plan.after.access_cost,
                    plan.elapsed_ms,
                ),
                Err(e) => println!(
                    "{:<22} {:>7} {:>7}",
                    strategy.name(),
                    budget,
                    format!("FAIL: {e}"),
                ),
            }
        }
    }

    // Submit one job through the orchestrator and commit the result.
    println!("\n--- Orchestrated job (auto, budget 10) ---\n");
    let orch = Orchestrator::new(OptimizerConfig::default());
    let request = JobRequest::from_inventory("demo", system, &inventory);

    let rt = tokio::runtime::Runtime::new()?;
    let report = rt.block_on(orch.submit(request))?;
    println!("{}", report.summary());

    let changed = report.apply_to(&mut inventory.objects);
    println!("{changed} objects relocated\n");
    if let Some(plan) = &report.plan {
        print!("{}", render_placement(&plan.new_placement));
    }
    println!("\n{}", orch.metrics().summary());

    Ok(())
}
