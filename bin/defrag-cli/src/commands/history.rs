// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `defrag history` command: list past jobs and aggregate metrics.

use orchestrator::{HistoryLog, JobMetrics, OptimizerConfig};
use std::path::PathBuf;

pub async fn execute(
    config: OptimizerConfig,
    path: Option<PathBuf>,
    system_id: Option<String>,
) -> anyhow::Result<()> {
    let Some(path) = path.or(config.history_path) else {
        anyhow::bail!("no history file given and no history_path in the config");
    };
    let log = HistoryLog::new(path);
    let reports = match &system_id {
        Some(id) => log.for_system(id)?,
        None => log.read_all()?,
    };

    if reports.is_empty() {
        println!("No jobs recorded in {}", log.path().display());
        return Ok(());
    }

    println!(
        "  {:<20} {:<12} {:<20} {:<10} {:>9} {:>7}",
        "Finished", "System", "Algorithm", "Status", "Frag Δ", "Moves",
    );
    println!("  {}", "-".repeat(84));
    for r in &reports {
        let algorithm = r.algorithm.map(|a| a.as_str()).unwrap_or("-");
        let (reduction, moves) = match &r.plan {
            Some(p) => (
                format!("{:.2}", p.fragmentation_reduction()),
                format!("{}", p.moves_used()),
            ),
            None => ("-".to_string(), "-".to_string()),
        };
        println!(
            "  {:<20} {:<12} {:<20} {:<10} {:>9} {:>7}",
            r.finished_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            r.system_id,
            algorithm,
            r.status.to_string(),
            reduction,
            moves,
        );
    }
    println!();
    println!("{}", JobMetrics::from_reports(&reports).summary());
    Ok(())
}
