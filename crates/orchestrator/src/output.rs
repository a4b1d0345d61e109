// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Placement output files: one `id position` line per object, in address
//! order.

use crate::OrchestratorError;
use placement_model::ObjectId;
use std::collections::BTreeMap;
use std::path::Path;

/// Renders a placement as text, lowest address first. Ties on position
/// (zero-size objects) are ordered by id.
pub fn render_placement(placement: &BTreeMap<ObjectId, u64>) -> String {
    let mut rows: Vec<(u64, ObjectId)> = placement.iter().map(|(&id, &pos)| (pos, id)).collect();
    rows.sort_unstable();

    let mut out = String::with_capacity(rows.len() * 12);
    for (pos, id) in rows {
        out.push_str(&format!("{id} {pos}\n"));
    }
    out
}

/// Writes [`render_placement`] output to `path`.
pub fn write_placement(
    path: &Path,
    placement: &BTreeMap<ObjectId, u64>,
) -> Result<(), OrchestratorError> {
    std::fs::write(path, render_placement(placement))?;
    tracing::info!("wrote {} placements to {}", placement.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_in_address_order() {
        let placement = BTreeMap::from([(1, 40), (2, 0), (3, 10), (4, 10)]);
        assert_eq!(render_placement(&placement), "2 0\n3 10\n4 10\n1 40\n");
    }

    #[test]
    fn test_render_empty() {
        assert_eq!(render_placement(&BTreeMap::new()), "");
    }

    #[test]
    fn test_write_placement() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        write_placement(&path, &BTreeMap::from([(7, 3)])).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "7 3\n");
    }
}
