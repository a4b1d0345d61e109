// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `defrag optimize` command: plan relocations for one inventory.
//!
//! Runs the job through the orchestrator, so the history log and the
//! per-system lease apply exactly as for any other caller:
//! ```text
//! inventory → JobRequest → Orchestrator::submit_with → JobReport → placement file
//! ```

use super::{load_request, truncate, SystemArgs};
use defrag_planner::{CancellationToken, OptimizationLevel, RunControl};
use orchestrator::{
    write_placement, JobParameters, JobReport, JobRequest, OptimizerConfig, Orchestrator,
};
use std::io::Write;
use std::path::PathBuf;

/// Rows of the relocated layout shown with `--show-layout`.
const LAYOUT_PREVIEW: usize = 20;

#[derive(Debug, clap::Args)]
pub struct OptimizeArgs {
    /// Inventory file (text, CSV or JSON job request).
    pub input: PathBuf,

    /// Placement output file (`id position` per line, address order).
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub system: SystemArgs,

    /// Algorithm: auto, greedy, dp, heuristic.
    #[arg(short, long)]
    pub algorithm: Option<String>,

    /// Optimization level: low, medium, high.
    #[arg(short, long)]
    pub level: Option<String>,

    /// RNG seed for the heuristic search.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Heuristic iteration cap.
    #[arg(long)]
    pub iterations: Option<u64>,

    /// Wall-clock budget for the heuristic search in milliseconds.
    #[arg(long)]
    pub time_budget_ms: Option<u64>,

    /// Append the report to this history file.
    #[arg(long)]
    pub history: Option<PathBuf>,

    /// Print the full report as JSON.
    #[arg(long)]
    pub json: bool,

    /// List the relocated layout.
    #[arg(long)]
    pub show_layout: bool,

    /// Hide the progress bar.
    #[arg(short, long)]
    pub quiet: bool,
}

pub async fn execute(mut config: OptimizerConfig, args: OptimizeArgs) -> anyhow::Result<()> {
    println!("╔══════════════════════════════════════════════════════╗");
    println!("║          defrag · Storage Optimizer                 ║");
    println!("╚══════════════════════════════════════════════════════╝");
    println!();

    // ── Request ────────────────────────────────────────────────
    let mut request = load_request(&args.input, &args.system)?;
    let stats = InputStats::of(&request);
    // Invalid requests still go to the orchestrator, which reports them
    // as FAILED jobs.
    let mut objects = request
        .to_snapshot()
        .map(|s| s.objects().to_vec())
        .unwrap_or_default();

    let level = args
        .level
        .as_deref()
        .map(str::parse::<OptimizationLevel>)
        .transpose()?;
    if let Some(algorithm) = &args.algorithm {
        request.algorithm = Some(algorithm.clone());
    }
    request.parameters = JobParameters {
        optimization_level: level.or(request.parameters.optimization_level),
        iteration_cap: args.iterations.or(request.parameters.iteration_cap),
        time_budget_ms: args.time_budget_ms.or(request.parameters.time_budget_ms),
        random_seed: args.seed.or(request.parameters.random_seed),
    };
    if let Some(history) = args.history {
        config.history_path = Some(history);
    }

    println!("  Input:     {}", args.input.display());
    println!("  System:    {}", request.system_id);
    println!("  Objects:   {}", stats.objects);
    println!("  Size:      {} units", stats.total_size);
    println!("  Frequency: {:.4} mean", stats.mean_frequency);
    println!("  Capacity:  {}", request.storage_system.capacity);
    println!("  Tokens:    {}", request.storage_system.token_budget);
    println!(
        "  Algorithm: {}",
        request.algorithm.as_deref().unwrap_or(&config.algorithm)
    );
    println!();

    // ── Run ────────────────────────────────────────────────────
    let token = CancellationToken::new();
    let on_interrupt = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, keeping the best plan so far");
            on_interrupt.cancel();
        }
    });

    let mut control = RunControl::new().with_cancellation(token);
    if !args.quiet {
        control = control.with_progress(draw_progress);
    }

    let orch = Orchestrator::new(config);
    let report = orch.submit_with(request, control).await?;
    if !args.quiet {
        eprintln!();
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    let Some(plan) = report.plan.as_ref() else {
        let reason = report
            .error
            .as_ref()
            .map(|e| format!("{}: {}", e.kind, e.message))
            .unwrap_or_else(|| report.status.to_string());
        anyhow::bail!("optimization failed: {reason}");
    };

    print_result(&report);

    // ── Commit ─────────────────────────────────────────────────
    let changed = report.apply_to(&mut objects);
    println!("  {changed} objects relocated.");

    if args.show_layout {
        objects.sort_by_key(|o| (o.current_position, o.id));
        println!();
        println!("  Optimized layout (first {LAYOUT_PREVIEW}):");
        for (i, o) in objects.iter().take(LAYOUT_PREVIEW).enumerate() {
            println!(
                "   {:>3}. id {:<8} {:<16} size {:>6}  freq {:.4}  @ {}{}",
                i + 1,
                o.id,
                truncate(o.name.as_deref().unwrap_or("-"), 16),
                o.size,
                o.access_frequency,
                o.current_position,
                if o.has_moved() { "  (moved)" } else { "" },
            );
        }
        if objects.len() > LAYOUT_PREVIEW {
            println!("   ...");
        }
    }

    if let Some(output) = &args.output {
        write_placement(output, &plan.new_placement)?;
        println!("  Placement written to {}", output.display());
    }
    println!();
    Ok(())
}

/// Input statistics read straight from the request, before validation.
#[derive(Debug, PartialEq)]
struct InputStats {
    objects: usize,
    total_size: u64,
    mean_frequency: f64,
}

impl InputStats {
    /// Negative sizes count as zero and the total saturates.
    fn of(request: &JobRequest) -> Self {
        let objects = request.objects.len();
        let total_size = request.objects.iter().fold(0u64, |acc, o| {
            acc.saturating_add(u64::try_from(o.size).unwrap_or(0))
        });
        let mean_frequency = if objects == 0 {
            0.0
        } else {
            request.objects.iter().map(|o| o.access_frequency).sum::<f64>() / objects as f64
        };
        Self {
            objects,
            total_size,
            mean_frequency,
        }
    }
}

fn print_result(report: &JobReport) {
    let Some(plan) = &report.plan else {
        return;
    };
    println!("  Result ({}):", report.status);
    println!("   Algorithm:      {}", plan.algorithm);
    println!(
        "   Fragmentation:  {:.2}% -> {:.2}%",
        plan.before_fragmentation(),
        plan.after_fragmentation()
    );
    println!(
        "   Access cost:    {:.2} -> {:.2}",
        plan.before.access_cost, plan.after.access_cost
    );
    println!(
        "   Score:          {:.2} -> {:.2} ({:+.2}%)",
        plan.before_score.total, plan.after_score.total, plan.improvement
    );
    println!("   Moves:          {}/{}", plan.moves_used(), plan.token_budget);
    println!(
        "   Search:         {} iterations, {:.2} ms{}",
        plan.iterations,
        plan.elapsed_ms,
        if plan.partial { " (interrupted)" } else { "" }
    );
    println!();
}

/// Draws a 40-column progress bar on stderr.
fn draw_progress(percent: f64) {
    const WIDTH: usize = 40;
    let filled = ((percent / 100.0) * WIDTH as f64).round() as usize;
    let bar = format!(
        "{}{}",
        "█".repeat(filled.min(WIDTH)),
        "░".repeat(WIDTH - filled.min(WIDTH))
    );
    let mut err = std::io::stderr().lock();
    let _ = write!(err, "\r  [{bar}] {percent:5.1}%");
    let _ = err.flush();
}
