// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for the defragmentation planner.

use placement_model::ModelError;
use std::fmt;

/// Errors that can occur while planning a defragmentation.
#[derive(Debug, thiserror::Error)]
pub enum OptimizerError {
    /// The snapshot or the run parameters are malformed.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The exact strategy was asked to solve an instance above its limit.
    #[error("problem too large: {objects} objects exceeds the limit of {limit}")]
    ProblemTooLarge { objects: usize, limit: usize },

    /// A planned relocation could not be applied.
    #[error("invalid move of object {object_id} to offset {position}: {detail}")]
    InvalidMove {
        object_id: u64,
        position: u64,
        detail: String,
    },

    /// The strategy produced a plan that failed its own checks.
    #[error("strategy '{strategy}' failed: {detail}")]
    StrategyFailed { strategy: String, detail: String },
}

/// Coarse error category, as reported in job results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    InvalidConfiguration,
    ProblemTooLarge,
    InvalidMove,
    StrategyFailed,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::InvalidConfiguration => "INVALID_CONFIGURATION",
            ErrorKind::ProblemTooLarge => "PROBLEM_TOO_LARGE",
            ErrorKind::InvalidMove => "INVALID_MOVE",
            ErrorKind::StrategyFailed => "STRATEGY_FAILED",
        };
        f.write_str(s)
    }
}

impl OptimizerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            OptimizerError::InvalidConfiguration(_) => ErrorKind::InvalidConfiguration,
            OptimizerError::ProblemTooLarge { .. } => ErrorKind::ProblemTooLarge,
            OptimizerError::InvalidMove { .. } => ErrorKind::InvalidMove,
            OptimizerError::StrategyFailed { .. } => ErrorKind::StrategyFailed,
        }
    }
}

impl From<ModelError> for OptimizerError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::InvalidMove {
                object_id,
                position,
                detail,
            } => OptimizerError::InvalidMove {
                object_id,
                position,
                detail,
            },
            other => OptimizerError::InvalidConfiguration(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_error_conversion() {
        let err: OptimizerError = ModelError::InvalidMove {
            object_id: 3,
            position: 10,
            detail: "overlap".into(),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::InvalidMove);

        let err: OptimizerError = ModelError::InvalidConfiguration("bad".into()).into();
        assert_eq!(err.kind(), ErrorKind::InvalidConfiguration);
        assert!(err.to_string().contains("bad"));
    }

    #[test]
    fn test_kind_serializes_upper_snake() {
        let json = serde_json::to_string(&ErrorKind::ProblemTooLarge).unwrap();
        assert_eq!(json, "\"PROBLEM_TOO_LARGE\"");
        assert_eq!(ErrorKind::ProblemTooLarge.to_string(), "PROBLEM_TOO_LARGE");
    }
}
