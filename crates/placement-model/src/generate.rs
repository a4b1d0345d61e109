// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Synthetic inventories for demos, benchmarks, and tests.
//!
//! Objects get random sizes and access frequencies and are scattered over
//! the device with random gaps, so the result is fragmented. Generation is
//! deterministic for a given seed.

use crate::{Inventory, ModelError, StorageObject, StorageSystem};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Parameters for [`generate_inventory`].
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GeneratorConfig {
    /// Number of objects to create.
    pub object_count: usize,
    /// Device capacity in units.
    pub capacity: u64,
    /// Token budget written to the inventory header.
    pub token_budget: usize,
    /// Target share of capacity occupied by objects (0.05–0.95).
    pub fill_ratio: f64,
    /// RNG seed.
    pub seed: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            object_count: 100,
            capacity: 1000,
            token_budget: 100,
            fill_ratio: 0.5,
            seed: 42,
        }
    }
}

/// Generates a fragmented inventory.
///
/// Sizes are drawn so the expected total is `capacity × fill_ratio`, then
/// the remaining free space is split into random gaps placed in front of
/// each object (plus a tail). Objects appear on the device in a shuffled
/// order.
pub fn generate_inventory(config: &GeneratorConfig) -> Result<Inventory, ModelError> {
    if config.capacity == 0 {
        return Err(ModelError::InvalidConfiguration(
            "generator capacity must be positive".into(),
        ));
    }
    if config.object_count as u64 > config.capacity {
        return Err(ModelError::InvalidConfiguration(format!(
            "{} objects cannot fit in {} units",
            config.object_count, config.capacity
        )));
    }

    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let fill = config.fill_ratio.clamp(0.05, 0.95);
    let n = config.object_count as u64;

    let mut objects: Vec<StorageObject> = Vec::with_capacity(config.object_count);
    if n > 0 {
        let mean_size = ((config.capacity as f64 * fill) / n as f64).max(1.0);
        let max_size = ((mean_size * 2.0) as u64).max(1);
        let mut sizes: Vec<u64> = (0..n).map(|_| rng.gen_range(1..=max_size)).collect();

        // Shrink the largest objects until everything fits.
        let mut total: u64 = sizes.iter().sum();
        while total > config.capacity {
            if let Some(largest) = sizes.iter_mut().filter(|s| **s > 1).max_by_key(|s| **s) {
                let cut = (*largest - 1).min(total - config.capacity);
                *largest -= cut;
                total -= cut;
            } else {
                break;
            }
        }

        // Split the free space into n + 1 random gaps.
        let free = config.capacity - total;
        let mut cuts: Vec<u64> = (0..n).map(|_| rng.gen_range(0..=free)).collect();
        cuts.sort_unstable();
        let mut gaps = Vec::with_capacity(cuts.len());
        let mut prev = 0;
        for c in cuts {
            gaps.push(c - prev);
            prev = c;
        }

        let mut ids: Vec<u64> = (1..=n).collect();
        ids.shuffle(&mut rng);

        let mut cursor = 0u64;
        for ((id, size), gap) in ids.into_iter().zip(sizes).zip(gaps) {
            cursor += gap;
            let freq = (rng.gen_range(0.1..=1.0_f64) * 10_000.0).round() / 10_000.0;
            objects.push(StorageObject::new(id, size, freq, cursor));
            cursor += size;
        }
        objects.sort_by_key(|o| o.id);
    }

    Ok(Inventory {
        system: Some(StorageSystem::new(config.capacity, config.token_budget)),
        objects,
    })
}
