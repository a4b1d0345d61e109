// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Append-only job history in JSON-lines format: one [`JobReport`] per line.

use crate::{JobReport, OrchestratorError};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// A JSON-lines history file.
#[derive(Debug, Clone)]
pub struct HistoryLog {
    path: PathBuf,
}

impl HistoryLog {
    /// Opens (lazily) the history file at `path`. The file is created on
    /// the first append.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends a report as one line.
    pub fn append(&self, report: &JobReport) -> Result<(), OrchestratorError> {
        let mut line = serde_json::to_string(report)?;
        line.push('\n');
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())?;
        tracing::debug!("job {} appended to {}", report.job_id, self.path.display());
        Ok(())
    }

    /// Reads every report. A missing file is an empty history; lines that
    /// do not parse are skipped with a warning.
    pub fn read_all(&self) -> Result<Vec<JobReport>, OrchestratorError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut reports = Vec::new();
        for (i, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<JobReport>(line) {
                Ok(report) => reports.push(report),
                Err(e) => tracing::warn!(
                    "{}:{}: skipping malformed history entry: {e}",
                    self.path.display(),
                    i + 1
                ),
            }
        }
        Ok(reports)
    }

    /// Reports for one storage system, oldest first.
    pub fn for_system(&self, system_id: &str) -> Result<Vec<JobReport>, OrchestratorError> {
        Ok(self
            .read_all()?
            .into_iter()
            .filter(|r| r.system_id == system_id)
            .collect())
    }
}
