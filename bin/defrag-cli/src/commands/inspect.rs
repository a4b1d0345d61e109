// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `defrag inspect` command: inventory statistics and layout metrics.

use super::{load_snapshot, truncate, SystemArgs};
use placement_model::performance_score;
use std::path::PathBuf;

/// Objects listed in the per-object table.
const PREVIEW_ROWS: usize = 20;

pub async fn execute(input: PathBuf, system: SystemArgs) -> anyhow::Result<()> {
    println!("╔══════════════════════════════════════════════════════╗");
    println!("║          defrag · Inventory Inspector               ║");
    println!("╚══════════════════════════════════════════════════════╝");
    println!();

    let snapshot = load_snapshot(&input, &system)?;
    let layout = snapshot.layout();
    let objects = snapshot.objects();

    // ── Summary ────────────────────────────────────────────────
    let n = objects.len().max(1) as f64;
    let total_size = snapshot.occupied();
    println!("  Objects:        {}", objects.len());
    println!("  Total size:     {total_size} units");
    println!("  Mean size:      {:.2} units", total_size as f64 / n);
    println!(
        "  Mean frequency: {:.4}",
        objects.iter().map(|o| o.access_frequency).sum::<f64>() / n
    );
    println!("  Capacity:       {}", snapshot.capacity());
    println!("  Tokens:         {}", snapshot.token_budget());
    println!();

    // ── Layout ─────────────────────────────────────────────────
    let gaps = layout.free_gaps();
    let largest_gap = gaps.iter().map(|g| g.len).max().unwrap_or(0);
    let score = performance_score(&layout);
    println!("  High-water mark: {}", layout.high_water_mark());
    println!("  Fragmentation:   {:.2}%", layout.fragmentation());
    println!("  Access cost:     {:.2}", layout.access_cost());
    println!("  Free gaps:       {} (largest {largest_gap})", gaps.len());
    println!(
        "  Score:           {:.1} (frag {:.1}, access {:.1}, utilisation {:.1}, locality {:.1})",
        score.total,
        100.0 - score.fragmentation,
        score.access_efficiency,
        score.space_utilization,
        score.locality,
    );
    println!();

    // ── Per-Object Detail ──────────────────────────────────────
    println!(
        "  {:<8} {:<16} {:>8} {:>8} {:>10}",
        "Id", "Name", "Position", "Size", "Frequency",
    );
    println!("  {}", "-".repeat(54));

    let mut by_position: Vec<_> = objects.iter().collect();
    by_position.sort_by_key(|o| (o.current_position, o.id));
    for o in by_position.iter().take(PREVIEW_ROWS) {
        println!(
            "  {:<8} {:<16} {:>8} {:>8} {:>10.4}",
            o.id,
            truncate(o.name.as_deref().unwrap_or("-"), 16),
            o.current_position,
            o.size,
            o.access_frequency,
        );
    }
    if by_position.len() > PREVIEW_ROWS {
        println!("  ... {} more", by_position.len() - PREVIEW_ROWS);
    }
    println!();
    Ok(())
}
