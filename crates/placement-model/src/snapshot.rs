// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Optimizer input: an owned copy of a storage system and its objects.
//!
//! # Type-State Pattern
//!
//! ```text
//! Snapshot<Unchecked>   : copied from the caller, not yet checked.
//!       │  .validate()
//!       ▼
//! Snapshot<Validated>   : invariants hold, ready for a strategy.
//! ```
//!
//! Strategies only accept `Snapshot<Validated>`, so configuration errors
//! surface before any of them runs.

use crate::{Layout, ModelError, ObjectId, StorageObject, StorageSystem};
use std::collections::HashSet;
use std::fmt;

// ── Type-state markers ─────────────────────────────────────────────

/// Marker: snapshot has been captured but not validated.
#[derive(Debug, Clone)]
pub struct Unchecked;

/// Marker: snapshot invariants have been verified.
#[derive(Debug, Clone)]
pub struct Validated;

/// Sealed trait for snapshot states.
pub trait SnapshotState: fmt::Debug + Clone {}
impl SnapshotState for Unchecked {}
impl SnapshotState for Validated {}

// ── Snapshot ───────────────────────────────────────────────────────

/// An owned copy of a storage system's configuration and object list.
#[derive(Debug, Clone)]
pub struct Snapshot<S: SnapshotState = Unchecked> {
    system: StorageSystem,
    objects: Vec<StorageObject>,
    _state: std::marker::PhantomData<S>,
}

impl Snapshot<Unchecked> {
    /// Captures a snapshot. The objects are moved in; callers that keep
    /// their records should pass a clone.
    pub fn new(system: StorageSystem, objects: Vec<StorageObject>) -> Self {
        Self {
            system,
            objects,
            _state: std::marker::PhantomData,
        }
    }

    /// Validates the snapshot and transitions to the `Validated` state.
    ///
    /// # Checks
    /// - Capacity is positive.
    /// - Every object has a positive size and a finite, non-negative
    ///   access frequency.
    /// - Object ids are unique.
    /// - Every range lies within `[0, capacity)`.
    /// - No two ranges overlap.
    pub fn validate(self) -> Result<Snapshot<Validated>, ModelError> {
        let capacity = self.system.capacity;
        if capacity == 0 {
            return Err(ModelError::InvalidConfiguration(
                "storage system capacity must be positive".into(),
            ));
        }

        let mut seen: HashSet<ObjectId> = HashSet::with_capacity(self.objects.len());
        for obj in &self.objects {
            if obj.size == 0 {
                return Err(ModelError::InvalidConfiguration(format!(
                    "object {} has zero size",
                    obj.id
                )));
            }
            if !obj.access_frequency.is_finite() || obj.access_frequency < 0.0 {
                return Err(ModelError::InvalidConfiguration(format!(
                    "object {} has invalid access frequency {}",
                    obj.id, obj.access_frequency
                )));
            }
            if !seen.insert(obj.id) {
                return Err(ModelError::InvalidConfiguration(format!(
                    "duplicate object id {}",
                    obj.id
                )));
            }
            if obj.size > capacity {
                return Err(ModelError::InvalidConfiguration(format!(
                    "object {} size {} exceeds capacity {capacity}",
                    obj.id, obj.size
                )));
            }
            let fits = obj
                .current_position
                .checked_add(obj.size)
                .is_some_and(|end| end <= capacity);
            if !fits {
                return Err(ModelError::InvalidConfiguration(format!(
                    "object {} at offset {} extends past capacity {capacity}",
                    obj.id, obj.current_position
                )));
            }
        }

        let mut order: Vec<&StorageObject> = self.objects.iter().collect();
        order.sort_by_key(|o| o.current_position);
        for pair in order.windows(2) {
            if pair[0].end() > pair[1].current_position {
                return Err(ModelError::InvalidConfiguration(format!(
                    "objects {} [{}, {}) and {} [{}, {}) overlap",
                    pair[0].id,
                    pair[0].current_position,
                    pair[0].end(),
                    pair[1].id,
                    pair[1].current_position,
                    pair[1].end(),
                )));
            }
        }

        tracing::debug!(
            "snapshot validated: {} objects, {}",
            self.objects.len(),
            self.system
        );

        Ok(Snapshot {
            system: self.system,
            objects: self.objects,
            _state: std::marker::PhantomData,
        })
    }
}

impl<S: SnapshotState> Snapshot<S> {
    pub fn system(&self) -> StorageSystem {
        self.system
    }

    pub fn objects(&self) -> &[StorageObject] {
        &self.objects
    }

    pub fn num_objects(&self) -> usize {
        self.objects.len()
    }
}

// ── Validated state ────────────────────────────────────────────────

impl Snapshot<Validated> {
    /// Capacity of the storage system.
    pub fn capacity(&self) -> u64 {
        self.system.capacity
    }

    /// Maximum number of relocations for a run.
    pub fn token_budget(&self) -> usize {
        self.system.token_budget
    }

    /// Returns an owned working layout at the current positions.
    pub fn layout(&self) -> Layout {
        Layout::from_objects(self.system.capacity, &self.objects)
    }

    /// Returns a copy of this snapshot with a different token budget.
    pub fn with_budget(&self, token_budget: usize) -> Snapshot<Validated> {
        Snapshot {
            system: self.system.with_budget(token_budget),
            objects: self.objects.clone(),
            _state: std::marker::PhantomData,
        }
    }

    /// Total units occupied by objects.
    pub fn occupied(&self) -> u64 {
        self.objects.iter().map(|o| o.size).sum()
    }

    /// Returns a summary string describing the snapshot.
    pub fn summary(&self) -> String {
        let layout = self.layout();
        format!(
            "{} objects, {}/{} units used ({:.1}%), fragmentation {:.2}%, {} tokens",
            self.objects.len(),
            self.occupied(),
            self.system.capacity,
            self.occupied() as f64 / self.system.capacity as f64 * 100.0,
            layout.fragmentation(),
            self.system.token_budget,
        )
    }
}
