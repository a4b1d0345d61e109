// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for the job orchestrator.
//!
//! Invalid job input is not an error here: it produces a `FAILED`
//! [`crate::JobReport`]. These variants cover everything that prevents a
//! report from being produced at all.

/// Errors that can occur while accepting or running optimization jobs.
#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    /// Configuration error.
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// Another job for the same storage system is still in flight.
    #[error("storage system '{0}' already has a job in flight")]
    SystemBusy(String),

    /// A history, request or output file could not be accessed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A request or history record is not valid JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The placement model rejected the input.
    #[error("model error: {0}")]
    ModelError(#[from] placement_model::ModelError),

    /// The planner returned an error.
    #[error("optimizer error: {0}")]
    OptimizerError(#[from] defrag_planner::OptimizerError),

    /// The blocking task running the job panicked or was aborted.
    #[error("job task failed: {0}")]
    JoinError(String),
}
