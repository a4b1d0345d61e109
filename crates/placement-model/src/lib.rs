// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # placement-model
//!
//! Data model for the storage defragmentation optimizer.
//!
//! - [`StorageSystem`] / [`StorageObject`]: a fixed-capacity device and
//!   the objects placed on it.
//! - [`Snapshot`]: an owned copy of both, with a **type-state pattern**
//!   (`Unchecked` → `Validated`).
//! - [`Layout`]: a working placement that strategies mutate; it checks
//!   every move against overlap and capacity.
//! - [`scoring`]: fragmentation, access cost, the [`Objective`] and the
//!   composite [`PerformanceScore`].
//! - [`InventoryLoader`]: reads object inventories from text or CSV.
//! - [`generate_inventory`]: seeded synthetic inventories.
//!
//! # Example
//! ```
//! use placement_model::{Snapshot, StorageObject, StorageSystem};
//!
//! let snapshot = Snapshot::new(
//!     StorageSystem::new(100, 2),
//!     vec![
//!         StorageObject::new(1, 10, 0.9, 0),
//!         StorageObject::new(2, 10, 0.5, 50),
//!         StorageObject::new(3, 10, 0.1, 90),
//!     ],
//! )
//! .validate()
//! .unwrap();
//!
//! let layout = snapshot.layout();
//! assert!((layout.fragmentation() - 70.0).abs() < 1e-9);
//! ```

mod error;
mod generate;
pub mod layout;
mod loader;
mod object;
pub mod scoring;
pub mod snapshot;

pub use error::ModelError;
pub use generate::{generate_inventory, GeneratorConfig};
pub use layout::{Extent, Layout, Slot};
pub use loader::{Inventory, InventoryFormat, InventoryLoader};
pub use object::{ObjectId, StorageObject, StorageSystem};
pub use scoring::{
    compute_fragmentation, estimate_access_cost, improvement, performance_score, Objective,
    PerformanceScore, METRIC_EPSILON,
};
pub use snapshot::{Snapshot, Unchecked, Validated};
