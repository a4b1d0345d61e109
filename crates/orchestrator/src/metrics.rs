// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Aggregate job metrics.
//!
//! [`JobMetrics`] folds finished [`JobReport`]s into counters used to
//! compare strategies across many jobs.

use crate::{JobReport, JobStatus};
use defrag_planner::Algorithm;
use std::collections::BTreeMap;

/// Per-algorithm counters.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct AlgorithmMetrics {
    pub jobs: usize,
    pub total_moves: usize,
    /// Sum of fragmentation reductions in percentage points.
    pub total_fragmentation_reduction: f64,
    pub total_elapsed_ms: f64,
}

/// Aggregate metrics over all jobs recorded.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct JobMetrics {
    pub completed: usize,
    pub failed: usize,
    /// Completed jobs that stopped early on cancellation.
    pub partial: usize,
    pub total_moves: usize,
    pub total_fragmentation_reduction: f64,
    pub total_elapsed_ms: f64,
    pub by_algorithm: BTreeMap<String, AlgorithmMetrics>,
}

impl JobMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds a list of reports, e.g. a loaded history.
    pub fn from_reports<'a>(reports: impl IntoIterator<Item = &'a JobReport>) -> Self {
        let mut m = Self::new();
        for r in reports {
            m.record(r);
        }
        m
    }

    /// Records one finished job.
    pub fn record(&mut self, report: &JobReport) {
        match report.status {
            JobStatus::Completed => self.completed += 1,
            JobStatus::Failed => self.failed += 1,
            JobStatus::Pending | JobStatus::Running => return,
        }
        let Some(plan) = &report.plan else {
            return;
        };
        if plan.partial {
            self.partial += 1;
        }
        self.total_moves += plan.moves_used();
        self.total_fragmentation_reduction += plan.fragmentation_reduction();
        self.total_elapsed_ms += plan.elapsed_ms;

        let entry = self
            .by_algorithm
            .entry(plan.algorithm.as_str().to_string())
            .or_default();
        entry.jobs += 1;
        entry.total_moves += plan.moves_used();
        entry.total_fragmentation_reduction += plan.fragmentation_reduction();
        entry.total_elapsed_ms += plan.elapsed_ms;
    }

    pub fn jobs(&self) -> usize {
        self.completed + self.failed
    }

    /// Mean fragmentation reduction over completed jobs.
    pub fn mean_fragmentation_reduction(&self) -> f64 {
        if self.completed == 0 {
            return 0.0;
        }
        self.total_fragmentation_reduction / self.completed as f64
    }

    /// Counters for one algorithm, if any of its jobs completed.
    pub fn for_algorithm(&self, algorithm: Algorithm) -> Option<&AlgorithmMetrics> {
        self.by_algorithm.get(algorithm.as_str())
    }

    /// Returns a human-readable summary suitable for CLI output.
    pub fn summary(&self) -> String {
        let mut s = format!(
            "Jobs: {} total, {} completed ({} partial), {} failed, \
             {} moves, mean fragmentation reduction {:.2} pts, {:.2}ms search time",
            self.jobs(),
            self.completed,
            self.partial,
            self.failed,
            self.total_moves,
            self.mean_fragmentation_reduction(),
            self.total_elapsed_ms,
        );
        for (name, a) in &self.by_algorithm {
            s.push_str(&format!(
                "\n  {name}: {} jobs, {} moves, {:.2} pts, {:.2}ms",
                a.jobs, a.total_moves, a.total_fragmentation_reduction, a.total_elapsed_ms
            ));
        }
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{JobRequest, OptimizationJob, OptimizerConfig};
    use defrag_planner::RunControl;
    use placement_model::{Inventory, StorageObject, StorageSystem};

    fn report(budget: usize, algorithm: &str) -> JobReport {
        let inv = Inventory {
            system: None,
            objects: vec![
                StorageObject::new(1, 10, 1.0, 0),
                StorageObject::new(2, 10, 1.0, 50),
                StorageObject::new(3, 10, 1.0, 90),
            ],
        };
        let req = JobRequest::from_inventory("m", StorageSystem::new(100, budget), &inv)
            .with_algorithm(algorithm);
        OptimizationJob::new(req, OptimizerConfig::default())
            .start()
            .run(&RunControl::new())
    }

    #[test]
    fn test_empty_metrics() {
        let m = JobMetrics::new();
        assert_eq!(m.jobs(), 0);
        assert_eq!(m.mean_fragmentation_reduction(), 0.0);
    }

    #[test]
    fn test_record_completed_and_failed() {
        let mut m = JobMetrics::new();
        m.record(&report(2, "greedy"));
        m.record(&report(2, "bogus"));
        assert_eq!(m.completed, 1);
        assert_eq!(m.failed, 1);
        assert_eq!(m.total_moves, 2);
        assert!((m.total_fragmentation_reduction - 70.0).abs() < 1e-9);
        let g = m.for_algorithm(Algorithm::Greedy).unwrap();
        assert_eq!(g.jobs, 1);
        assert!(m.for_algorithm(Algorithm::Heuristic).is_none());
    }

    #[test]
    fn test_from_reports_and_summary() {
        let reports = vec![report(1, "greedy"), report(2, "dp")];
        let m = JobMetrics::from_reports(&reports);
        assert_eq!(m.completed, 2);
        assert_eq!(m.by_algorithm.len(), 2);
        let s = m.summary();
        assert!(s.contains("2 completed"));
        assert!(s.contains("greedy:"));
        assert!(s.contains("dynamic-programming:"));
    }
}
