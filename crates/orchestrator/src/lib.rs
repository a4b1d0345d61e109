// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # orchestrator
//!
//! Runs defragmentation jobs for storage systems.
//!
//! The orchestrator takes:
//! - A [`JobRequest`] (JSON, camelCase) describing one storage system.
//! - An [`OptimizerConfig`] (TOML) with the default algorithm and search
//!   knobs.
//!
//! And produces a [`JobReport`] holding the plan or the failure reason.
//!
//! # Job Lifecycle
//! ```text
//! OptimizationJob<Pending> → OptimizationJob<Running> → JobReport
//! ```
//! Transitions are compile-time checked. Reports carry
//! `PENDING | RUNNING | COMPLETED | FAILED` for history.
//!
//! # Concurrency
//! [`Orchestrator::submit`] runs the synchronous planner on tokio's
//! blocking pool. A [`SystemLease`] keeps at most one job per storage
//! system in flight.

mod config;
mod error;
mod history;
mod job;
mod lease;
mod metrics;
mod orchestrator;
mod output;
mod request;

pub use config::{AlgorithmChoice, OptimizerConfig};
pub use error::OrchestratorError;
pub use history::HistoryLog;
pub use job::{JobFailure, JobReport, JobState, JobStatus, OptimizationJob, Pending, Running};
pub use lease::{SystemLease, SystemLocks};
pub use metrics::{AlgorithmMetrics, JobMetrics};
pub use orchestrator::Orchestrator;
pub use output::{render_placement, write_placement};
pub use request::{JobParameters, JobRequest, ObjectSpec, SystemSpec};
