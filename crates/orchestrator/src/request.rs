// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Job requests as they arrive from callers (JSON, camelCase).
//!
//! ```json
//! {
//!   "systemId": "array-01",
//!   "storageSystem": { "capacity": 100, "tokenBudget": 2 },
//!   "objects": [
//!     { "id": 1, "size": 10, "accessFrequency": 0.9, "currentPosition": 0 },
//!     { "id": 2, "name": "logs", "size": 10, "accessFrequency": 0.1, "currentPosition": 50 }
//!   ],
//!   "algorithm": "greedy",
//!   "parameters": { "optimizationLevel": "high", "randomSeed": 7 }
//! }
//! ```
//!
//! Numeric fields are signed so negative values reach validation and
//! become `INVALID_CONFIGURATION` instead of a parse error.

use crate::{OptimizerConfig, OrchestratorError};
use defrag_planner::{OptimizationLevel, SearchParams};
use placement_model::{Inventory, ModelError, Snapshot, StorageObject, StorageSystem, Unchecked};
use std::path::Path;

/// Storage system as given by the caller.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemSpec {
    pub capacity: i64,
    pub token_budget: i64,
}

/// One object as given by the caller.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectSpec {
    pub id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub size: i64,
    pub access_frequency: f64,
    pub current_position: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_position: Option<i64>,
}

/// Per-job overrides of the configured search parameters.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobParameters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optimization_level: Option<OptimizationLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iteration_cap: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_budget_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub random_seed: Option<u64>,
}

/// A request to optimize one storage system.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRequest {
    pub system_id: String,
    pub storage_system: SystemSpec,
    pub objects: Vec<ObjectSpec>,
    /// Algorithm name or `"auto"`; falls back to the configured one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub algorithm: Option<String>,
    #[serde(default)]
    pub parameters: JobParameters,
}

fn non_negative(value: i64, what: &str, id: u64) -> Result<u64, ModelError> {
    u64::try_from(value).map_err(|_| {
        ModelError::InvalidConfiguration(format!("object {id} has negative {what} {value}"))
    })
}

impl ObjectSpec {
    fn to_object(&self) -> Result<StorageObject, ModelError> {
        let size = non_negative(self.size, "size", self.id)?;
        let position = non_negative(self.current_position, "position", self.id)?;
        let original = match self.original_position {
            Some(p) => non_negative(p, "original position", self.id)?,
            None => position,
        };
        let mut obj = StorageObject::new(self.id, size, self.access_frequency, position);
        obj.name = self.name.clone();
        obj.original_position = original;
        Ok(obj)
    }
}

impl JobRequest {
    /// Parses a request from JSON.
    pub fn from_json(json: &str) -> Result<Self, OrchestratorError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads a request from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, OrchestratorError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Builds a request from a loaded inventory.
    pub fn from_inventory(system_id: &str, system: StorageSystem, inventory: &Inventory) -> Self {
        Self {
            system_id: system_id.to_string(),
            storage_system: SystemSpec {
                capacity: system.capacity as i64,
                token_budget: system.token_budget as i64,
            },
            objects: inventory
                .objects
                .iter()
                .map(|o| ObjectSpec {
                    id: o.id,
                    name: o.name.clone(),
                    size: o.size as i64,
                    access_frequency: o.access_frequency,
                    current_position: o.current_position as i64,
                    original_position: Some(o.original_position as i64),
                })
                .collect(),
            algorithm: None,
            parameters: JobParameters::default(),
        }
    }

    pub fn with_algorithm(mut self, algorithm: &str) -> Self {
        self.algorithm = Some(algorithm.to_string());
        self
    }

    pub fn with_parameters(mut self, parameters: JobParameters) -> Self {
        self.parameters = parameters;
        self
    }

    /// Converts the request into an unchecked snapshot, rejecting negative
    /// capacity, budget, sizes or positions.
    pub fn to_snapshot(&self) -> Result<Snapshot<Unchecked>, ModelError> {
        let system =
            StorageSystem::from_signed(self.storage_system.capacity, self.storage_system.token_budget)?;
        let objects = self
            .objects
            .iter()
            .map(ObjectSpec::to_object)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Snapshot::new(system, objects))
    }

    /// Search parameters for this job: configured values, then the
    /// request's overrides.
    pub fn search_params(&self, config: &OptimizerConfig) -> SearchParams {
        let p = &self.parameters;
        let mut params = match p.optimization_level {
            Some(level) => OptimizerConfig {
                optimization_level: level,
                ..config.clone()
            }
            .search_params(),
            None => config.search_params(),
        };
        if let Some(cap) = p.iteration_cap {
            params = params.with_iteration_cap(cap);
        }
        if let Some(ms) = p.time_budget_ms {
            params = params.with_time_budget_ms(ms);
        }
        if let Some(seed) = p.random_seed {
            params = params.with_seed(seed);
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "systemId": "array-01",
        "storageSystem": { "capacity": 100, "tokenBudget": 2 },
        "objects": [
            { "id": 1, "size": 10, "accessFrequency": 0.9, "currentPosition": 0 },
            { "id": 2, "name": "logs", "size": 10, "accessFrequency": 0.1, "currentPosition": 50,
              "originalPosition": 40 }
        ],
        "algorithm": "greedy",
        "parameters": { "optimizationLevel": "high", "randomSeed": 7 }
    }"#;

    #[test]
    fn test_parse_request() {
        let req = JobRequest::from_json(SAMPLE).unwrap();
        assert_eq!(req.system_id, "array-01");
        assert_eq!(req.objects.len(), 2);
        assert_eq!(req.objects[1].name.as_deref(), Some("logs"));
        assert_eq!(req.algorithm.as_deref(), Some("greedy"));
        assert_eq!(req.parameters.optimization_level, Some(OptimizationLevel::High));

        let snap = req.to_snapshot().unwrap().validate().unwrap();
        assert_eq!(snap.token_budget(), 2);
        assert_eq!(snap.objects()[1].original_position, 40);
        assert_eq!(snap.objects()[0].original_position, 0);
    }

    #[test]
    fn test_parameters_default_when_missing() {
        let json = r#"{
            "systemId": "s", "storageSystem": { "capacity": 10, "tokenBudget": 0 }, "objects": []
        }"#;
        let req = JobRequest::from_json(json).unwrap();
        assert!(req.algorithm.is_none());
        assert_eq!(req.parameters, JobParameters::default());
    }

    #[test]
    fn test_negative_values_are_invalid_configuration() {
        let mut req = JobRequest::from_json(SAMPLE).unwrap();
        req.storage_system.token_budget = -1;
        assert!(matches!(req.to_snapshot(), Err(ModelError::InvalidConfiguration(_))));

        let mut req = JobRequest::from_json(SAMPLE).unwrap();
        req.storage_system.capacity = -100;
        assert!(matches!(req.to_snapshot(), Err(ModelError::InvalidConfiguration(_))));

        let mut req = JobRequest::from_json(SAMPLE).unwrap();
        req.objects[0].size = -5;
        assert!(matches!(req.to_snapshot(), Err(ModelError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_search_params_precedence() {
        let config = OptimizerConfig {
            iteration_cap: Some(999),
            random_seed: Some(1),
            ..Default::default()
        };
        let req = JobRequest::from_json(SAMPLE).unwrap();
        let params = req.search_params(&config);
        assert_eq!(params.level, OptimizationLevel::High);
        // The config's cap survives, the request's seed wins.
        assert_eq!(params.iteration_cap, 999);
        assert_eq!(params.random_seed, 7);
        assert_eq!(params.dp_object_limit, 256);
    }

    #[test]
    fn test_from_inventory() {
        let inv = Inventory {
            system: None,
            objects: vec![StorageObject::new(4, 3, 0.5, 7)],
        };
        let req = JobRequest::from_inventory("local", StorageSystem::new(50, 1), &inv)
            .with_algorithm("dp");
        assert_eq!(req.storage_system.capacity, 50);
        assert_eq!(req.objects[0].current_position, 7);
        assert_eq!(req.algorithm.as_deref(), Some("dp"));
        req.to_snapshot().unwrap().validate().unwrap();
    }

    #[test]
    fn test_serializes_camel_case() {
        let req = JobRequest::from_json(SAMPLE).unwrap();
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["storageSystem"]["tokenBudget"], 2);
        assert_eq!(value["objects"][0]["accessFrequency"], 0.9);
    }
}
