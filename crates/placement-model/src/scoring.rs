// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Fragmentation, access cost, and the composite performance score.
//!
//! # Fragmentation
//!
//! Free space below the high-water mark, as a share of capacity:
//!
//! ```text
//! fragmentation% = (high_water_mark − occupied) / capacity × 100
//! ```
//!
//! This is the sum of the gaps between consecutive objects, counting the
//! gap in front of the first one. The free tail after the last object is
//! contiguous and does not count. An empty layout and a layout packed
//! from offset 0 both score 0.
//!
//! # Access cost
//!
//! Frequency-weighted mean start offset, normalised to 0–100:
//!
//! ```text
//! access_cost = Σ(freq_i × position_i) / (Σ freq_i × capacity) × 100
//! ```
//!
//! # Objective
//!
//! [`Objective`] orders layouts by fragmentation first and access cost
//! second. Every strategy optimises against it.

use crate::layout::{Extent, Layout};
use std::cmp::Ordering;

/// Tolerance used when comparing metric values.
pub const METRIC_EPSILON: f64 = 1e-9;

/// Computes the fragmentation percentage of a set of occupied ranges.
///
/// `extents` are expected in address order, but the result does not
/// depend on it.
pub fn compute_fragmentation(extents: &[Extent], capacity: u64) -> f64 {
    if capacity == 0 || extents.is_empty() {
        return 0.0;
    }
    let high_water = extents.iter().map(Extent::end).max().unwrap_or(0);
    let occupied: u64 = extents.iter().map(|e| e.len).sum();
    let holes = high_water.saturating_sub(occupied);
    holes as f64 / capacity as f64 * 100.0
}

/// Estimates the access cost of a layout (0 = every hot byte at offset 0).
pub fn estimate_access_cost(layout: &Layout) -> f64 {
    let capacity = layout.capacity();
    let total_freq: f64 = layout.slots().iter().map(|s| s.access_frequency).sum();
    if capacity == 0 || total_freq <= 0.0 {
        return 0.0;
    }
    let weighted: f64 = layout
        .slots()
        .iter()
        .map(|s| s.access_frequency * s.position as f64)
        .sum();
    weighted / (total_freq * capacity as f64) * 100.0
}

/// The value strategies minimise, compared lexicographically.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Objective {
    pub fragmentation: f64,
    pub access_cost: f64,
}

impl Objective {
    pub fn of(layout: &Layout) -> Self {
        Self {
            fragmentation: layout.fragmentation(),
            access_cost: layout.access_cost(),
        }
    }

    /// Lexicographic comparison with [`METRIC_EPSILON`] tolerance.
    pub fn compare(&self, other: &Objective) -> Ordering {
        match cmp_with_tolerance(self.fragmentation, other.fragmentation) {
            Ordering::Equal => cmp_with_tolerance(self.access_cost, other.access_cost),
            ord => ord,
        }
    }

    /// Returns `true` if `self` is strictly better (lower) than `other`.
    pub fn is_better_than(&self, other: &Objective) -> bool {
        self.compare(other) == Ordering::Less
    }

    /// Scalar form used for annealing acceptance probabilities.
    ///
    /// Both components are 0–100; the access cost is scaled down so a
    /// 1% fragmentation change outweighs any access-cost change.
    pub fn energy(&self) -> f64 {
        self.fragmentation + self.access_cost / 100.0
    }
}

fn cmp_with_tolerance(a: f64, b: f64) -> Ordering {
    if (a - b).abs() <= METRIC_EPSILON {
        Ordering::Equal
    } else if a < b {
        Ordering::Less
    } else {
        Ordering::Greater
    }
}

/// Composite 0–100 score reported alongside each plan.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PerformanceScore {
    pub fragmentation: f64,
    pub access_efficiency: f64,
    pub space_utilization: f64,
    pub locality: f64,
    pub total: f64,
}

/// Weights of the composite score components.
const WEIGHT_FRAGMENTATION: f64 = 0.4;
const WEIGHT_ACCESS: f64 = 0.3;
const WEIGHT_UTILIZATION: f64 = 0.2;
const WEIGHT_LOCALITY: f64 = 0.1;

/// Scores a layout: `(100 − fragmentation)·0.4 + access efficiency·0.3 +
/// space utilisation·0.2 + locality·0.1`, clamped to 0–100.
pub fn performance_score(layout: &Layout) -> PerformanceScore {
    if layout.is_empty() || layout.capacity() == 0 {
        return PerformanceScore {
            fragmentation: 0.0,
            access_efficiency: 0.0,
            space_utilization: 0.0,
            locality: 0.0,
            total: 0.0,
        };
    }

    let fragmentation = layout.fragmentation();
    let access_efficiency = 100.0 - estimate_access_cost(layout);
    let space_utilization =
        (layout.occupied() as f64 / layout.capacity() as f64).min(1.0) * 100.0;
    let locality = locality_score(layout);

    let total = ((100.0 - fragmentation) * WEIGHT_FRAGMENTATION
        + access_efficiency * WEIGHT_ACCESS
        + space_utilization * WEIGHT_UTILIZATION
        + locality * WEIGHT_LOCALITY)
        .clamp(0.0, 100.0);

    PerformanceScore {
        fragmentation,
        access_efficiency,
        space_utilization,
        locality,
        total,
    }
}

/// Mean similarity of access frequency between address-adjacent objects.
fn locality_score(layout: &Layout) -> f64 {
    let order = layout.indices_by_position();
    if order.len() < 2 {
        return 0.0;
    }
    let max_freq = layout
        .slots()
        .iter()
        .map(|s| s.access_frequency)
        .fold(0.0_f64, f64::max);

    let slots = layout.slots();
    let similarity: f64 = order
        .windows(2)
        .map(|w| {
            if max_freq <= 0.0 {
                return 1.0;
            }
            let diff = (slots[w[0]].access_frequency - slots[w[1]].access_frequency).abs();
            1.0 - (diff / max_freq).min(1.0)
        })
        .sum();
    similarity / (order.len() - 1) as f64 * 100.0
}

/// Relative change between two scores in percent (0 when `before` is 0).
pub fn improvement(before: f64, after: f64) -> f64 {
    if before > 0.0 {
        (after - before) / before * 100.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StorageObject;

    fn layout(capacity: u64, objs: &[(u64, u64, f64, u64)]) -> Layout {
        let objects: Vec<StorageObject> = objs
            .iter()
            .map(|&(id, size, freq, pos)| StorageObject::new(id, size, freq, pos))
            .collect();
        Layout::from_objects(capacity, &objects)
    }

    #[test]
    fn test_fragmentation_scenario() {
        let l = layout(100, &[(1, 10, 1.0, 0), (2, 10, 1.0, 50), (3, 10, 1.0, 90)]);
        assert!((l.fragmentation() - 70.0).abs() < 1e-9);
    }

    #[test]
    fn test_fragmentation_empty() {
        assert_eq!(compute_fragmentation(&[], 100), 0.0);
        assert_eq!(layout(100, &[]).fragmentation(), 0.0);
    }

    #[test]
    fn test_fragmentation_packed() {
        let l = layout(100, &[(1, 10, 1.0, 0), (2, 30, 1.0, 10), (3, 5, 1.0, 40)]);
        assert_eq!(l.fragmentation(), 0.0);
    }

    #[test]
    fn test_fragmentation_full_device() {
        let l = layout(20, &[(1, 10, 1.0, 0), (2, 10, 1.0, 10)]);
        assert_eq!(l.fragmentation(), 0.0);
    }

    #[test]
    fn test_fragmentation_counts_leading_gap() {
        let l = layout(100, &[(1, 10, 1.0, 25)]);
        assert!((l.fragmentation() - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_fragmentation_zero_capacity() {
        assert_eq!(compute_fragmentation(&[Extent::new(0, 1)], 0), 0.0);
    }

    #[test]
    fn test_access_cost_prefers_hot_objects_low() {
        let hot_low = layout(100, &[(1, 10, 9.0, 0), (2, 10, 1.0, 10)]);
        let hot_high = layout(100, &[(1, 10, 9.0, 10), (2, 10, 1.0, 0)]);
        assert!(hot_low.access_cost() < hot_high.access_cost());
    }

    #[test]
    fn test_access_cost_zero_frequency() {
        let l = layout(100, &[(1, 10, 0.0, 50)]);
        assert_eq!(l.access_cost(), 0.0);
    }

    #[test]
    fn test_access_cost_value() {
        // One object at 50 with weight 1 → 50 / 100 × 100 = 50.
        let l = layout(100, &[(1, 10, 1.0, 50)]);
        assert!((l.access_cost() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_objective_lexicographic() {
        let a = Objective {
            fragmentation: 10.0,
            access_cost: 90.0,
        };
        let b = Objective {
            fragmentation: 20.0,
            access_cost: 0.0,
        };
        assert!(a.is_better_than(&b));
        let c = Objective {
            fragmentation: 10.0,
            access_cost: 50.0,
        };
        assert!(c.is_better_than(&a));
        assert!(!a.is_better_than(&a));
    }

    #[test]
    fn test_energy_weights_fragmentation() {
        let a = Objective {
            fragmentation: 1.0,
            access_cost: 0.0,
        };
        let b = Objective {
            fragmentation: 0.0,
            access_cost: 99.0,
        };
        assert!(b.energy() < a.energy());
    }

    #[test]
    fn test_performance_score_bounds() {
        let l = layout(100, &[(1, 10, 0.2, 0), (2, 10, 0.9, 50), (3, 10, 0.5, 90)]);
        let s = performance_score(&l);
        assert!(s.total >= 0.0 && s.total <= 100.0);
        assert!((s.space_utilization - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_performance_score_improves_when_compacted() {
        let scattered = layout(100, &[(1, 10, 0.5, 0), (2, 10, 0.5, 50), (3, 10, 0.5, 90)]);
        let packed = layout(100, &[(1, 10, 0.5, 0), (2, 10, 0.5, 10), (3, 10, 0.5, 20)]);
        assert!(performance_score(&packed).total > performance_score(&scattered).total);
    }

    #[test]
    fn test_performance_score_empty() {
        assert_eq!(performance_score(&layout(10, &[])).total, 0.0);
    }

    #[test]
    fn test_locality_identical_frequencies() {
        let l = layout(100, &[(1, 10, 0.5, 0), (2, 10, 0.5, 10)]);
        assert!((performance_score(&l).locality - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_improvement() {
        assert!((improvement(50.0, 75.0) - 50.0).abs() < 1e-9);
        assert_eq!(improvement(0.0, 10.0), 0.0);
    }
}
