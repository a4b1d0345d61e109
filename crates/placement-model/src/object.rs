// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Storage systems and the objects placed inside them.
//!
//! A [`StorageObject`] occupies the half-open range
//! `[current_position, current_position + size)` of its system's address
//! space. Positions and sizes are whole units (the original deployment
//! used GB). Objects carry no data, only placement metadata.

use std::fmt;

/// Unique identifier of an object within one storage system.
pub type ObjectId = u64;

/// A fixed-capacity storage system and its relocation budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageSystem {
    /// Total addressable space in units.
    pub capacity: u64,
    /// Maximum number of relocations allowed in one optimization run.
    pub token_budget: usize,
}

impl StorageSystem {
    pub fn new(capacity: u64, token_budget: usize) -> Self {
        Self {
            capacity,
            token_budget,
        }
    }

    /// Builds a system from signed values as they arrive from external
    /// callers, rejecting negative or zero capacity and negative budgets.
    ///
    /// A budget of zero is valid: the run completes with no moves.
    pub fn from_signed(capacity: i64, token_budget: i64) -> Result<Self, crate::ModelError> {
        if capacity <= 0 {
            return Err(crate::ModelError::InvalidConfiguration(format!(
                "capacity must be positive, got {capacity}"
            )));
        }
        if token_budget < 0 {
            return Err(crate::ModelError::InvalidConfiguration(format!(
                "token budget must not be negative, got {token_budget}"
            )));
        }
        Ok(Self {
            capacity: capacity as u64,
            token_budget: token_budget as usize,
        })
    }

    /// Returns a copy with a different token budget.
    pub fn with_budget(self, token_budget: usize) -> Self {
        Self {
            token_budget,
            ..self
        }
    }
}

impl fmt::Display for StorageSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "capacity {} units, {} tokens",
            self.capacity, self.token_budget
        )
    }
}

/// Placement metadata for a single stored object.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageObject {
    /// Unique identifier within the storage system.
    pub id: ObjectId,
    /// Display name (present for CSV imports).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Size in units. Must be positive.
    pub size: u64,
    /// Proxy for how hot the object is. Finite and non-negative.
    pub access_frequency: f64,
    /// Offset assigned at creation. Never changed by the optimizer.
    pub original_position: u64,
    /// Offset assigned by the latest committed optimization.
    pub current_position: u64,
}

impl StorageObject {
    /// Creates an object whose original and current positions coincide.
    pub fn new(id: ObjectId, size: u64, access_frequency: f64, position: u64) -> Self {
        Self {
            id,
            name: None,
            size,
            access_frequency,
            original_position: position,
            current_position: position,
        }
    }

    /// Sets the display name.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Exclusive end offset of the current range.
    pub fn end(&self) -> u64 {
        self.current_position + self.size
    }

    /// Returns `true` if the object has been relocated since creation.
    pub fn has_moved(&self) -> bool {
        self.current_position != self.original_position
    }

    /// Returns a one-line description for CLI output.
    pub fn summary(&self) -> String {
        format!(
            "#{:<6} {:>8} units @ {:<8} freq {:.4}{}",
            self.id,
            self.size,
            self.current_position,
            self.access_frequency,
            self.name
                .as_deref()
                .map(|n| format!(" ({n})"))
                .unwrap_or_default(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_signed_rejects_negative_budget() {
        assert!(StorageSystem::from_signed(100, -1).is_err());
    }

    #[test]
    fn test_from_signed_rejects_zero_capacity() {
        assert!(StorageSystem::from_signed(0, 5).is_err());
        assert!(StorageSystem::from_signed(-10, 5).is_err());
    }

    #[test]
    fn test_from_signed_accepts_zero_budget() {
        let s = StorageSystem::from_signed(100, 0).unwrap();
        assert_eq!(s.capacity, 100);
        assert_eq!(s.token_budget, 0);
    }

    #[test]
    fn test_object_end_and_moved() {
        let mut o = StorageObject::new(7, 10, 0.5, 40);
        assert_eq!(o.end(), 50);
        assert!(!o.has_moved());
        o.current_position = 0;
        assert!(o.has_moved());
    }

    #[test]
    fn test_object_serde_camel_case() {
        let o = StorageObject::new(1, 4, 0.25, 8).named("logs");
        let json = serde_json::to_string(&o).unwrap();
        assert!(json.contains("\"accessFrequency\""));
        assert!(json.contains("\"currentPosition\":8"));
        let back: StorageObject = serde_json::from_str(&json).unwrap();
        assert_eq!(back, o);
    }

    #[test]
    fn test_summary_includes_name() {
        let o = StorageObject::new(3, 12, 0.9, 0).named("db");
        assert!(o.summary().contains("(db)"));
    }
}
