// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Optimization jobs with a type-state–enforced lifecycle.
//!
//! ```text
//! OptimizationJob<Pending>
//!     │  .start()
//!     ▼
//! OptimizationJob<Running>
//!     │  .run(&control)
//!     ▼
//!   JobReport { status: COMPLETED | FAILED }
//! ```
//!
//! Each transition consumes the old value, so a job cannot be run twice
//! or run before it is started. Only a running job applies moves, and
//! only to its own snapshot copy.

use crate::config::AlgorithmChoice;
use crate::{JobRequest, OptimizerConfig};
use chrono::{DateTime, Utc};
use defrag_planner::{
    Algorithm, DefragStrategy, ErrorKind, OptimizationPlan, OptimizerError, RunControl,
    SearchParams,
};
use placement_model::StorageObject;
use std::fmt;
use uuid::Uuid;

// ── Type-state markers ─────────────────────────────────────────

/// Job is accepted but has not started.
#[derive(Debug)]
pub struct Pending;

/// Job is running.
#[derive(Debug)]
pub struct Running;

/// Sealed trait for job states.
pub trait JobState: fmt::Debug {}
impl JobState for Pending {}
impl JobState for Running {}

// ── Reports ────────────────────────────────────────────────────

/// Lifecycle status as recorded in reports and history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobStatus::Pending => "PENDING",
            JobStatus::Running => "RUNNING",
            JobStatus::Completed => "COMPLETED",
            JobStatus::Failed => "FAILED",
        };
        f.write_str(s)
    }
}

/// Why a job failed.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct JobFailure {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&OptimizerError> for JobFailure {
    fn from(err: &OptimizerError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// The outcome of one job.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobReport {
    pub job_id: Uuid,
    pub system_id: String,
    /// Strategy that ran; absent if the job failed before one was chosen.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub algorithm: Option<Algorithm>,
    pub status: JobStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan: Option<OptimizationPlan>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JobFailure>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl JobReport {
    pub fn is_completed(&self) -> bool {
        self.status == JobStatus::Completed
    }

    pub fn is_partial(&self) -> bool {
        self.plan.as_ref().is_some_and(|p| p.partial)
    }

    /// Commits the plan to the caller's records: every planned object gets
    /// its new `current_position`. Original positions are kept. Returns the
    /// number of objects whose position changed.
    pub fn apply_to(&self, objects: &mut [StorageObject]) -> usize {
        let Some(plan) = &self.plan else {
            return 0;
        };
        let mut changed = 0;
        for obj in objects.iter_mut() {
            if let Some(&pos) = plan.new_placement.get(&obj.id) {
                if obj.current_position != pos {
                    obj.current_position = pos;
                    changed += 1;
                }
            }
        }
        changed
    }

    /// Returns a one-line summary for CLI output and logs.
    pub fn summary(&self) -> String {
        let detail = match (&self.plan, &self.error) {
            (Some(plan), _) => plan.summary(),
            (None, Some(err)) => format!("{}: {}", err.kind, err.message),
            (None, None) => String::new(),
        };
        format!(
            "Job {} [{}] {}: {}",
            self.job_id, self.system_id, self.status, detail
        )
    }
}

// ── Job ────────────────────────────────────────────────────────

/// One optimization job.
///
/// The job owns its request; the caller's records are untouched until
/// [`JobReport::apply_to`] is called on a completed report.
pub struct OptimizationJob<S: JobState = Pending> {
    id: Uuid,
    request: JobRequest,
    config: OptimizerConfig,
    started_at: Option<DateTime<Utc>>,
    _state: std::marker::PhantomData<S>,
}

impl OptimizationJob<Pending> {
    /// Creates a pending job.
    pub fn new(request: JobRequest, config: OptimizerConfig) -> Self {
        Self {
            id: Uuid::new_v4(),
            request,
            config,
            started_at: None,
            _state: std::marker::PhantomData,
        }
    }

    /// Marks the job as running. Transitions to the `Running` state.
    pub fn start(self) -> OptimizationJob<Running> {
        tracing::info!(
            "job {} started for system '{}' ({} objects)",
            self.id,
            self.request.system_id,
            self.request.objects.len()
        );
        OptimizationJob {
            id: self.id,
            request: self.request,
            config: self.config,
            started_at: Some(Utc::now()),
            _state: std::marker::PhantomData,
        }
    }
}

impl OptimizationJob<Running> {
    /// Validates the input, runs the strategy and returns the report.
    ///
    /// Invalid input, an oversized DP instance, or a plan that fails to
    /// replay produces a `FAILED` report. A cancelled run is `COMPLETED`
    /// with a partial plan.
    pub fn run(self, control: &RunControl) -> JobReport {
        let started_at = self.started_at.unwrap_or_else(Utc::now);
        let mut algorithm = None;
        let outcome = self.execute(control, &mut algorithm);

        let (status, plan, error) = match outcome {
            Ok(plan) => (JobStatus::Completed, Some(plan), None),
            Err(err) => {
                tracing::warn!("job {} failed: {err}", self.id);
                (JobStatus::Failed, None, Some(JobFailure::from(&err)))
            }
        };

        let report = JobReport {
            job_id: self.id,
            system_id: self.request.system_id,
            algorithm,
            status,
            plan,
            error,
            started_at,
            finished_at: Utc::now(),
        };
        tracing::info!("{}", report.summary());
        report
    }

    fn execute(
        &self,
        control: &RunControl,
        algorithm: &mut Option<Algorithm>,
    ) -> Result<OptimizationPlan, OptimizerError> {
        let snapshot = self.request.to_snapshot()?.validate()?;
        tracing::debug!("job {}: {}", self.id, snapshot.summary());

        let params: SearchParams = self.request.search_params(&self.config);
        let choice = match &self.request.algorithm {
            Some(name) => AlgorithmChoice::parse(name),
            None => self.config.algorithm_choice(),
        }
        .map_err(|e| OptimizerError::InvalidConfiguration(e.to_string()))?;

        let strategy = choice.resolve(&snapshot, &params);
        *algorithm = Some(strategy.algorithm());
        tracing::info!("job {}: using strategy {}", self.id, strategy.name());

        strategy.optimize(&snapshot, control)
    }
}

impl<S: JobState> OptimizationJob<S> {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn system_id(&self) -> &str {
        &self.request.system_id
    }
}

impl<S: JobState> fmt::Debug for OptimizationJob<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptimizationJob")
            .field("state", &std::any::type_name::<S>())
            .field("id", &self.id)
            .field("system_id", &self.request.system_id)
            .field("objects", &self.request.objects.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{JobParameters, ObjectSpec, SystemSpec};
    use defrag_planner::CancellationToken;

    fn request(budget: i64, algorithm: Option<&str>) -> JobRequest {
        let obj = |id: u64, pos: i64| ObjectSpec {
            id,
            name: None,
            size: 10,
            access_frequency: 1.0,
            current_position: pos,
            original_position: None,
        };
        JobRequest {
            system_id: "sys".into(),
            storage_system: SystemSpec {
                capacity: 100,
                token_budget: budget,
            },
            objects: vec![obj(1, 0), obj(2, 50), obj(3, 90)],
            algorithm: algorithm.map(str::to_string),
            parameters: JobParameters::default(),
        }
    }

    fn run(req: JobRequest) -> JobReport {
        OptimizationJob::new(req, OptimizerConfig::default())
            .start()
            .run(&RunControl::new())
    }

    #[test]
    fn test_completed_job() {
        let report = run(request(2, Some("greedy")));
        assert_eq!(report.status, JobStatus::Completed);
        assert_eq!(report.algorithm, Some(Algorithm::Greedy));
        let plan = report.plan.as_ref().unwrap();
        assert_eq!(plan.after_fragmentation(), 0.0);
        assert!(report.error.is_none());
        assert!(report.finished_at >= report.started_at);
    }

    #[test]
    fn test_zero_budget_completes() {
        let report = run(request(0, None));
        assert!(report.is_completed());
        assert_eq!(report.plan.unwrap().moves_used(), 0);
    }

    #[test]
    fn test_negative_budget_fails() {
        let report = run(request(-1, None));
        assert_eq!(report.status, JobStatus::Failed);
        assert!(report.algorithm.is_none());
        assert_eq!(report.error.unwrap().kind, ErrorKind::InvalidConfiguration);
    }

    #[test]
    fn test_overlap_fails_before_strategy() {
        let mut req = request(2, Some("dp"));
        req.objects[1].current_position = 5;
        let report = run(req);
        assert_eq!(report.status, JobStatus::Failed);
        assert!(report.algorithm.is_none());
        assert_eq!(report.error.unwrap().kind, ErrorKind::InvalidConfiguration);
    }

    #[test]
    fn test_dp_too_large_fails() {
        let mut req = request(2, Some("dp"));
        req.parameters.optimization_level = Some(defrag_planner::OptimizationLevel::Low);
        req.objects = (0..30)
            .map(|i| ObjectSpec {
                id: i + 1,
                name: None,
                size: 1,
                access_frequency: 0.5,
                current_position: (i * 3) as i64,
                original_position: None,
            })
            .collect();
        let report = run(req);
        assert_eq!(report.status, JobStatus::Failed);
        assert_eq!(report.algorithm, Some(Algorithm::DynamicProgramming));
        assert_eq!(report.error.unwrap().kind, ErrorKind::ProblemTooLarge);
    }

    #[test]
    fn test_unknown_algorithm_fails() {
        let report = run(request(2, Some("quantum")));
        assert_eq!(report.status, JobStatus::Failed);
        assert_eq!(report.error.unwrap().kind, ErrorKind::InvalidConfiguration);
    }

    #[test]
    fn test_cancelled_job_is_partial() {
        let token = CancellationToken::new();
        token.cancel();
        let report = OptimizationJob::new(request(2, Some("heuristic")), OptimizerConfig::default())
            .start()
            .run(&RunControl::new().with_cancellation(token));
        assert!(report.is_completed());
        assert!(report.is_partial());
    }

    #[test]
    fn test_apply_to_commits_positions() {
        let req = request(2, Some("greedy"));
        let mut objects: Vec<StorageObject> = req
            .to_snapshot()
            .unwrap()
            .objects()
            .to_vec();
        let report = run(req);
        assert_eq!(report.apply_to(&mut objects), 2);
        assert_eq!(objects[2].current_position, 10);
        assert_eq!(objects[2].original_position, 90);
        assert!(objects[2].has_moved());
    }

    #[test]
    fn test_report_json_shape() {
        let report = run(request(-1, None));
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["status"], "FAILED");
        assert_eq!(value["error"]["kind"], "INVALID_CONFIGURATION");
        assert!(value.get("plan").is_none());
        assert!(value.get("jobId").is_some());
        let back: JobReport = serde_json::from_value(value).unwrap();
        assert_eq!(back.status, JobStatus::Failed);
    }
}
