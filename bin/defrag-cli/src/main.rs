// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # defrag
//!
//! Command-line interface for the storage defragmentation optimizer.
//!
//! ## Usage
//! ```bash
//! # Optimize an inventory and write the new placement
//! defrag optimize data.txt placement.txt --algorithm dp --tokens 50
//!
//! # Run every strategy on the same inventory
//! defrag compare data.txt --level high
//!
//! # Show inventory statistics and current fragmentation
//! defrag inspect data.csv --capacity 2000
//!
//! # Create a synthetic fragmented inventory
//! defrag generate data.txt --count 200 --capacity 2000
//!
//! # Summarise the job history
//! defrag history ./defrag-history.jsonl
//! ```

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "defrag",
    about = "Storage defragmentation optimizer: greedy, DP and heuristic relocation planning",
    version,
    author
)]
struct Cli {
    /// Path to a TOML configuration file with the default algorithm and
    /// search settings. Explicit flags take precedence.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging (repeat for more: -v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Optimize an inventory and write the resulting placement.
    Optimize(commands::optimize::OptimizeArgs),

    /// Run every strategy on one inventory and compare the results.
    Compare {
        /// Inventory file (text, CSV or JSON job request).
        input: PathBuf,

        #[command(flatten)]
        system: commands::SystemArgs,

        /// Optimization level: low, medium, high.
        #[arg(short, long, default_value = "medium")]
        level: String,

        /// RNG seed for the heuristic search.
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Print inventory statistics and the current layout metrics.
    Inspect {
        /// Inventory file (text, CSV or JSON job request).
        input: PathBuf,

        #[command(flatten)]
        system: commands::SystemArgs,
    },

    /// Generate a synthetic fragmented inventory in the text format.
    Generate {
        /// Output file; prints to stdout when omitted.
        output: Option<PathBuf>,

        /// Number of objects.
        #[arg(short = 'n', long, default_value_t = 100)]
        count: usize,

        /// Device capacity in units.
        #[arg(short = 'd', long, default_value_t = 1000)]
        capacity: u64,

        /// Token budget written to the header.
        #[arg(short = 't', long, default_value_t = 100)]
        tokens: usize,

        /// Share of the capacity occupied by objects.
        #[arg(long, default_value_t = 0.5)]
        fill: f64,

        /// RNG seed.
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },

    /// Summarise a job history file.
    History {
        /// History file; defaults to `history_path` from the config.
        path: Option<PathBuf>,

        /// Only show jobs for this storage system.
        #[arg(short, long)]
        system_id: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing/logging based on verbosity.
    commands::init_tracing(cli.verbose);

    let config = commands::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Optimize(args) => commands::optimize::execute(config, args).await,
        Commands::Compare {
            input,
            system,
            level,
            seed,
        } => commands::compare::execute(config, input, system, level, seed).await,
        Commands::Inspect { input, system } => commands::inspect::execute(input, system).await,
        Commands::Generate {
            output,
            count,
            capacity,
            tokens,
            fill,
            seed,
        } => commands::generate::execute(output, count, capacity, tokens, fill, seed).await,
        Commands::History { path, system_id } => {
            commands::history::execute(config, path, system_id).await
        }
    }
}
