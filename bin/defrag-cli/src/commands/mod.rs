// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

pub mod compare;
pub mod generate;
pub mod history;
pub mod inspect;
pub mod optimize;

use orchestrator::{JobRequest, OptimizerConfig};
use placement_model::{InventoryLoader, Snapshot, StorageSystem, Validated};
use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Device capacity used when neither the file nor the flags give one.
const DEFAULT_CAPACITY: u64 = 1000;
/// Token budget used when neither the file nor the flags give one.
const DEFAULT_TOKENS: usize = 100;

/// Initialises `tracing` from the `-v` count. `RUST_LOG` wins when set.
pub fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Loads the TOML config, or the defaults without one.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<OptimizerConfig> {
    match path {
        Some(p) => {
            let config = OptimizerConfig::from_file(p)?;
            tracing::info!("loaded config from {}", p.display());
            Ok(config)
        }
        None => Ok(OptimizerConfig::default()),
    }
}

/// Storage system flags shared by several commands.
#[derive(Debug, Clone, clap::Args)]
pub struct SystemArgs {
    /// Device capacity in units (overrides the file header).
    #[arg(short = 'd', long)]
    pub capacity: Option<u64>,

    /// Relocation token budget (overrides the file header).
    #[arg(short = 't', long)]
    pub tokens: Option<usize>,

    /// Identifier of the storage system in reports and history.
    #[arg(long, default_value = "local")]
    pub system_id: String,
}

/// Reads a job request from a JSON request file or an inventory file
/// (text or CSV). Flags override the capacity and budget in the file.
pub fn load_request(input: &Path, system: &SystemArgs) -> anyhow::Result<JobRequest> {
    let is_json = input
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));

    if is_json {
        let mut request = JobRequest::from_file(input).map_err(|e| {
            anyhow::anyhow!("failed to read job request '{}': {e}", input.display())
        })?;
        if let Some(capacity) = system.capacity {
            request.storage_system.capacity = i64::try_from(capacity)?;
        }
        if let Some(tokens) = system.tokens {
            request.storage_system.token_budget = i64::try_from(tokens)?;
        }
        return Ok(request);
    }

    let inventory = InventoryLoader::load(input).map_err(|e| {
        anyhow::anyhow!("failed to load inventory from '{}': {e}", input.display())
    })?;
    let header = inventory.system;
    let storage = StorageSystem::new(
        system
            .capacity
            .or(header.map(|h| h.capacity))
            .unwrap_or(DEFAULT_CAPACITY),
        system
            .tokens
            .or(header.map(|h| h.token_budget))
            .unwrap_or(DEFAULT_TOKENS),
    );
    Ok(JobRequest::from_inventory(&system.system_id, storage, &inventory))
}

/// Loads and validates the snapshot for commands that bypass the
/// orchestrator.
pub fn load_snapshot(input: &Path, system: &SystemArgs) -> anyhow::Result<Snapshot<Validated>> {
    let request = load_request(input, system)?;
    Ok(request.to_snapshot()?.validate()?)
}

/// Truncates a string to `max_len` with ellipsis if needed.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{head}...")
    }
}
