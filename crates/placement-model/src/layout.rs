// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Working layouts: the placement of every object of a snapshot.
//!
//! A [`Layout`] is an owned copy. Strategies mutate their own layout and
//! never touch the caller's object records. Slots are indexed in snapshot
//! order, so an index is stable across moves.
//!
//! ```text
//! 0        10                50   60                  90   100
//! [ obj 1 ]|.....gap 40......[obj 2]|.....gap 30.......[obj 3]
//!                                                           ▲ high-water mark
//! ```

use crate::scoring::{self, Objective};
use crate::{ModelError, ObjectId, StorageObject};
use std::collections::BTreeMap;

/// A half-open range `[start, start + len)` of the address space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Extent {
    pub start: u64,
    pub len: u64,
}

impl Extent {
    pub fn new(start: u64, len: u64) -> Self {
        Self { start, len }
    }

    /// Exclusive end offset.
    pub fn end(&self) -> u64 {
        self.start + self.len
    }

    /// Returns `true` if the two ranges share at least one unit.
    pub fn overlaps(&self, other: &Extent) -> bool {
        self.start < other.end() && other.start < self.end()
    }
}

/// One object's placement inside a [`Layout`].
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct Slot {
    pub id: ObjectId,
    pub size: u64,
    pub access_frequency: f64,
    pub position: u64,
}

impl Slot {
    pub fn extent(&self) -> Extent {
        Extent::new(self.position, self.size)
    }

    pub fn end(&self) -> u64 {
        self.position + self.size
    }
}

/// The placement of every object in a storage system.
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    capacity: u64,
    slots: Vec<Slot>,
}

impl Layout {
    /// Builds a layout from object records at their current positions.
    ///
    /// No validation happens here; use [`crate::Snapshot::validate`]
    /// before handing a layout to a strategy.
    pub fn from_objects(capacity: u64, objects: &[StorageObject]) -> Self {
        let slots = objects
            .iter()
            .map(|o| Slot {
                id: o.id,
                size: o.size,
                access_frequency: o.access_frequency,
                position: o.current_position,
            })
            .collect();
        Self { capacity, slots }
    }

    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn slot(&self, index: usize) -> Option<&Slot> {
        self.slots.get(index)
    }

    /// Returns the snapshot index of the object with the given id.
    pub fn index_of(&self, id: ObjectId) -> Option<usize> {
        self.slots.iter().position(|s| s.id == id)
    }

    /// Total units occupied by objects.
    pub fn occupied(&self) -> u64 {
        self.slots.iter().map(|s| s.size).sum()
    }

    /// Highest occupied end offset (0 for an empty layout).
    pub fn high_water_mark(&self) -> u64 {
        self.slots.iter().map(Slot::end).max().unwrap_or(0)
    }

    /// Occupied ranges sorted by start offset.
    pub fn extents_sorted(&self) -> Vec<Extent> {
        let mut extents: Vec<Extent> = self.slots.iter().map(Slot::extent).collect();
        extents.sort_by_key(|e| e.start);
        extents
    }

    /// Slot indices in address order.
    pub fn indices_by_position(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.slots.len()).collect();
        order.sort_by_key(|&i| (self.slots[i].position, self.slots[i].id));
        order
    }

    /// Free ranges of the address space, in address order, including the
    /// tail after the last object.
    pub fn free_gaps(&self) -> Vec<Extent> {
        self.free_gaps_excluding(None)
    }

    /// Free ranges with the range of `skip` (if any) treated as free.
    pub fn free_gaps_excluding(&self, skip: Option<usize>) -> Vec<Extent> {
        let mut occupied: Vec<Extent> = self
            .slots
            .iter()
            .enumerate()
            .filter(|(i, _)| Some(*i) != skip)
            .map(|(_, s)| s.extent())
            .collect();
        occupied.sort_by_key(|e| e.start);

        let mut gaps = Vec::new();
        let mut cursor = 0u64;
        for extent in &occupied {
            if extent.start > cursor {
                gaps.push(Extent::new(cursor, extent.start - cursor));
            }
            cursor = cursor.max(extent.end());
        }
        if cursor < self.capacity {
            gaps.push(Extent::new(cursor, self.capacity - cursor));
        }
        gaps
    }

    /// Lowest start offset strictly below the object's current position
    /// at which it fits. The object's own range counts as free, so the
    /// result may overlap where it currently sits.
    ///
    /// This is the "ideal slot" rule shared by every strategy.
    pub fn lowest_fit_below(&self, index: usize) -> Option<u64> {
        let slot = self.slots.get(index)?;
        self.free_gaps_excluding(Some(index))
            .into_iter()
            .take_while(|gap| gap.start < slot.position)
            .find(|gap| gap.len >= slot.size)
            .map(|gap| gap.start)
    }

    /// Checks that moving object `index` to `new_position` keeps the
    /// layout valid.
    pub fn check_move(&self, index: usize, new_position: u64) -> Result<(), ModelError> {
        let slot = self.slots.get(index).ok_or_else(|| ModelError::InvalidMove {
            object_id: u64::MAX,
            position: new_position,
            detail: format!("no object at index {index}"),
        })?;

        let end = new_position
            .checked_add(slot.size)
            .filter(|&end| end <= self.capacity)
            .ok_or_else(|| ModelError::InvalidMove {
                object_id: slot.id,
                position: new_position,
                detail: format!(
                    "range of {} units exceeds capacity {}",
                    slot.size, self.capacity
                ),
            })?;

        let target = Extent::new(new_position, end - new_position);
        if let Some(other) = self
            .slots
            .iter()
            .enumerate()
            .find(|(i, s)| *i != index && s.extent().overlaps(&target))
            .map(|(_, s)| s)
        {
            return Err(ModelError::InvalidMove {
                object_id: slot.id,
                position: new_position,
                detail: format!(
                    "overlaps object {} at [{}, {})",
                    other.id,
                    other.position,
                    other.end()
                ),
            });
        }
        Ok(())
    }

    /// Returns a new layout with object `index` relocated.
    ///
    /// # Errors
    /// [`ModelError::InvalidMove`] if the new range would overlap another
    /// object or exceed capacity.
    pub fn apply_move(&self, index: usize, new_position: u64) -> Result<Layout, ModelError> {
        let mut next = self.clone();
        next.move_in_place(index, new_position)?;
        Ok(next)
    }

    /// Relocates object `index` in this layout and returns its previous
    /// position. The layout is unchanged on error.
    pub fn move_in_place(&mut self, index: usize, new_position: u64) -> Result<u64, ModelError> {
        self.check_move(index, new_position)?;
        let slot = &mut self.slots[index];
        let previous = slot.position;
        slot.position = new_position;
        Ok(previous)
    }

    /// Fragmentation percentage of this layout.
    pub fn fragmentation(&self) -> f64 {
        scoring::compute_fragmentation(&self.extents_sorted(), self.capacity)
    }

    /// Access cost of this layout.
    pub fn access_cost(&self) -> f64 {
        scoring::estimate_access_cost(self)
    }

    /// Objective value all strategies minimise.
    pub fn objective(&self) -> Objective {
        Objective::of(self)
    }

    /// Object id → position mapping.
    pub fn placement(&self) -> BTreeMap<ObjectId, u64> {
        self.slots.iter().map(|s| (s.id, s.position)).collect()
    }

    /// Returns `true` if every range lies within capacity and no two
    /// ranges overlap.
    pub fn is_consistent(&self) -> bool {
        let extents = self.extents_sorted();
        extents.iter().all(|e| e.end() <= self.capacity)
            && extents.windows(2).all(|w| w[0].end() <= w[1].start)
    }
}
