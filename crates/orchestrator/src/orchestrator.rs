// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The job orchestrator: the main entry point for running optimizations.
//!
//! [`Orchestrator`] ties together:
//! - The optimizer configuration.
//! - Per-system leases (at most one in-flight job per storage system).
//! - The optional history log.
//! - Aggregate metrics.
//!
//! Jobs run on tokio's blocking pool; the strategies themselves are
//! synchronous.

use crate::{
    HistoryLog, JobMetrics, JobReport, JobRequest, OptimizationJob, OptimizerConfig,
    OrchestratorError, SystemLease, SystemLocks,
};
use defrag_planner::RunControl;
use std::sync::{Arc, Mutex};

/// Accepts job requests and runs them.
#[derive(Debug, Clone)]
pub struct Orchestrator {
    config: OptimizerConfig,
    locks: SystemLocks,
    history: Option<HistoryLog>,
    metrics: Arc<Mutex<JobMetrics>>,
}

impl Orchestrator {
    /// Creates an orchestrator. A `history_path` in the config enables the
    /// history log.
    pub fn new(config: OptimizerConfig) -> Self {
        let history = config.history_path.clone().map(HistoryLog::new);
        tracing::info!(
            "orchestrator ready: algorithm={}, level={}, history={}",
            config.algorithm,
            config.optimization_level,
            history
                .as_ref()
                .map(|h| h.path().display().to_string())
                .unwrap_or_else(|| "off".into())
        );
        Self {
            config,
            locks: SystemLocks::new(),
            history,
            metrics: Arc::new(Mutex::new(JobMetrics::new())),
        }
    }

    pub fn with_history(mut self, history: HistoryLog) -> Self {
        self.history = Some(history);
        self
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    pub fn history(&self) -> Option<&HistoryLog> {
        self.history.as_ref()
    }

    /// Takes the lease for a system by hand, e.g. while its data is being
    /// migrated. Jobs for that system are rejected until it drops.
    pub fn lease(&self, system_id: &str) -> Result<SystemLease, OrchestratorError> {
        self.locks.try_acquire(system_id)
    }

    /// Returns `true` while a job or manual lease holds the system.
    pub fn is_busy(&self, system_id: &str) -> bool {
        self.locks.is_held(system_id)
    }

    /// Snapshot of the aggregate metrics.
    pub fn metrics(&self) -> JobMetrics {
        self.metrics
            .lock()
            .map(|m| m.clone())
            .unwrap_or_default()
    }

    /// Runs a job with no cancellation, deadline or progress reporting.
    pub async fn submit(&self, request: JobRequest) -> Result<JobReport, OrchestratorError> {
        self.submit_with(request, RunControl::new()).await
    }

    /// Runs a job under `control`.
    ///
    /// Invalid input or an oversized problem yields `Ok` with a `FAILED`
    /// report.
    ///
    /// # Errors
    /// - [`OrchestratorError::SystemBusy`] if a job for the same system is
    ///   already in flight. Checked before anything runs.
    /// - [`OrchestratorError::JoinError`] if the job task panicked.
    pub async fn submit_with(
        &self,
        request: JobRequest,
        control: RunControl,
    ) -> Result<JobReport, OrchestratorError> {
        let lease = self.locks.try_acquire(&request.system_id)?;
        let config = self.config.clone();
        let history = self.history.clone();

        let report = tokio::task::spawn_blocking(move || {
            let _lease = lease;
            let report = OptimizationJob::new(request, config)
                .start()
                .run(&control);
            if let Some(history) = &history {
                if let Err(e) = history.append(&report) {
                    tracing::warn!("failed to append job {} to history: {e}", report.job_id);
                }
            }
            report
        })
        .await
        .map_err(|e| OrchestratorError::JoinError(e.to_string()))?;

        if let Ok(mut metrics) = self.metrics.lock() {
            metrics.record(&report);
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::JobStatus;
    use placement_model::{Inventory, StorageObject, StorageSystem};

    fn request(system: &str) -> JobRequest {
        let inv = Inventory {
            system: None,
            objects: vec![
                StorageObject::new(1, 10, 1.0, 0),
                StorageObject::new(2, 10, 1.0, 50),
                StorageObject::new(3, 10, 1.0, 90),
            ],
        };
        JobRequest::from_inventory(system, StorageSystem::new(100, 2), &inv)
    }

    #[tokio::test]
    async fn test_submit_completes_and_releases() {
        let orch = Orchestrator::new(OptimizerConfig::default());
        let report = orch.submit(request("a")).await.unwrap();
        assert_eq!(report.status, JobStatus::Completed);
        assert!(!orch.is_busy("a"));
        assert_eq!(orch.metrics().completed, 1);
    }

    #[tokio::test]
    async fn test_manual_lease_blocks_submit() {
        let orch = Orchestrator::new(OptimizerConfig::default());
        let lease = orch.lease("a").unwrap();
        assert!(matches!(
            orch.submit(request("a")).await,
            Err(OrchestratorError::SystemBusy(_))
        ));
        // Other systems still run.
        orch.submit(request("b")).await.unwrap();
        drop(lease);
        orch.submit(request("a")).await.unwrap();
        assert_eq!(orch.metrics().jobs(), 2);
    }

    #[tokio::test]
    async fn test_failed_job_is_ok_report() {
        let orch = Orchestrator::new(OptimizerConfig::default());
        let mut req = request("a");
        req.storage_system.token_budget = -3;
        let report = orch.submit(req).await.unwrap();
        assert_eq!(report.status, JobStatus::Failed);
        assert_eq!(orch.metrics().failed, 1);
    }
}
