// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `defrag generate` command: write a synthetic fragmented inventory.

use placement_model::{generate_inventory, GeneratorConfig, StorageSystem};
use std::path::PathBuf;

pub async fn execute(
    output: Option<PathBuf>,
    count: usize,
    capacity: u64,
    tokens: usize,
    fill: f64,
    seed: u64,
) -> anyhow::Result<()> {
    let config = GeneratorConfig {
        object_count: count,
        capacity,
        token_budget: tokens,
        fill_ratio: fill,
        seed,
    };
    let inventory = generate_inventory(&config)?;
    let text = inventory.to_text();

    match output {
        Some(path) => {
            std::fs::write(&path, &text)?;
            let snapshot = inventory
                .into_snapshot(StorageSystem::new(capacity, tokens))
                .validate()?;
            println!("Wrote {} objects to {}", count, path.display());
            println!("  {}", snapshot.summary());
        }
        None => print!("{text}"),
    }
    Ok(())
}
