// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `defrag compare` command: run every strategy on one inventory.
//!
//! Prints fragmentation, access cost, score, moves and search time per
//! strategy, plus what automatic selection would pick.

use super::{load_snapshot, SystemArgs};
use defrag_planner::{
    auto_select, Algorithm, DefragStrategy, OptimizationLevel, OptimizerError, RunControl,
    Strategy,
};
use orchestrator::OptimizerConfig;
use std::path::PathBuf;

pub async fn execute(
    config: OptimizerConfig,
    input: PathBuf,
    system: SystemArgs,
    level: String,
    seed: Option<u64>,
) -> anyhow::Result<()> {
    println!("╔══════════════════════════════════════════════════════╗");
    println!("║          defrag · Strategy Comparison               ║");
    println!("╚══════════════════════════════════════════════════════╝");
    println!();

    let snapshot = load_snapshot(&input, &system)?;
    let level: OptimizationLevel = level.parse()?;
    let mut params = OptimizerConfig {
        optimization_level: level,
        ..config
    }
    .search_params();
    if let Some(seed) = seed {
        params = params.with_seed(seed);
    }

    println!("  Inventory: {}", snapshot.summary());
    println!(
        "  Level:     {level} (iterations {}, dp limit {}, seed {})",
        params.iteration_cap, params.dp_object_limit, params.random_seed
    );
    println!("  Auto:      {}", auto_select(&snapshot, &params).name());
    println!();

    // ── Results Table ──────────────────────────────────────────
    println!(
        "  {:<22} {:>9} {:>10} {:>8} {:>8} {:>10}",
        "Strategy", "Frag %", "Cost", "Score", "Moves", "ms",
    );
    println!("  {}", "-".repeat(72));

    let control = RunControl::new();
    for algorithm in Algorithm::ALL {
        let strategy = Strategy::new(algorithm, &params);
        match strategy.optimize(&snapshot, &control) {
            Ok(plan) => println!(
                "  {:<22} {:>9.2} {:>10.2} {:>8.1} {:>8} {:>10.2}",
                strategy.name(),
                plan.after_fragmentation(),
                plan.after.access_cost,
                plan.after_score.total,
                format!("{}/{}", plan.moves_used(), plan.token_budget),
                plan.elapsed_ms,
            ),
            Err(OptimizerError::ProblemTooLarge { objects, limit }) => println!(
                "  {:<22} {:>9}",
                strategy.name(),
                format!("skipped: {objects} objects > limit {limit}"),
            ),
            Err(e) => println!("  {:<22} FAIL: {e}", strategy.name()),
        }
    }

    let before = snapshot.layout().objective();
    println!("  {}", "-".repeat(72));
    println!(
        "  {:<22} {:>9.2} {:>10.2}",
        "(current)", before.fragmentation, before.access_cost
    );
    println!();
    Ok(())
}
