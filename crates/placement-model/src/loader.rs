// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Inventory loading from text and CSV files.
//!
//! # Text format
//! ```text
//! 1000 100            # optional header: capacity token_budget
//! 1 3.27 0.4512 0     # id size access_frequency [position]
//! 2 8 0.9000
//! ```
//!
//! # CSV format
//! ```text
//! id,name,size,accessFrequency,position   # optional header row
//! 1,logs,12,0.75,0
//! 2,db,40,0.9
//! ```
//!
//! Fractional sizes are rounded up to whole units. Objects without a
//! position are packed in file order after the highest positioned object.
//! Lines that cannot be parsed are skipped with a warning.

use crate::snapshot::Unchecked;
use crate::{ModelError, Snapshot, StorageObject, StorageSystem};
use std::path::Path;

/// Input file flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InventoryFormat {
    /// Whitespace-separated `id size access_frequency [position]`.
    Text,
    /// Comma-separated `id,name,size,accessFrequency[,position]`.
    Csv,
}

impl InventoryFormat {
    /// Picks the format from a file extension (`.csv` → CSV, else text).
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => Self::Csv,
            _ => Self::Text,
        }
    }
}

/// A parsed object list, optionally with the system header.
#[derive(Debug, Clone, PartialEq)]
pub struct Inventory {
    /// Capacity and budget from the text header, if present.
    pub system: Option<StorageSystem>,
    /// Objects in file order.
    pub objects: Vec<StorageObject>,
}

impl Inventory {
    /// Total size of all objects, saturating at `u64::MAX`.
    pub fn total_size(&self) -> u64 {
        self.objects
            .iter()
            .fold(0u64, |acc, o| acc.saturating_add(o.size))
    }

    /// Builds an unchecked snapshot, using the file header when present
    /// and `fallback` otherwise.
    pub fn into_snapshot(self, fallback: StorageSystem) -> Snapshot<Unchecked> {
        let system = self.system.unwrap_or(fallback);
        Snapshot::new(system, self.objects)
    }

    /// Serialises to the text format, positions included.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        if let Some(system) = self.system {
            out.push_str(&format!("{} {}\n", system.capacity, system.token_budget));
        }
        for o in &self.objects {
            out.push_str(&format!(
                "{} {} {:.4} {}\n",
                o.id, o.size, o.access_frequency, o.current_position
            ));
        }
        out
    }
}

/// Loads inventories from disk or from in-memory strings.
pub struct InventoryLoader;

impl InventoryLoader {
    /// Reads and parses an inventory file; the format follows the
    /// extension.
    pub fn load(path: &Path) -> Result<Inventory, ModelError> {
        let content = std::fs::read_to_string(path)?;
        let inventory = Self::parse(&content, InventoryFormat::from_path(path))?;
        tracing::info!(
            "loaded {} objects ({} units) from {}",
            inventory.objects.len(),
            inventory.total_size(),
            path.display()
        );
        Ok(inventory)
    }

    /// Parses inventory content in the given format.
    pub fn parse(content: &str, format: InventoryFormat) -> Result<Inventory, ModelError> {
        let (system, rows) = match format {
            InventoryFormat::Text => parse_text(content)?,
            InventoryFormat::Csv => (None, parse_csv(content)),
        };
        if rows.is_empty() {
            return Err(ModelError::InvalidConfiguration(
                "inventory contains no objects".into(),
            ));
        }
        Ok(Inventory {
            system,
            objects: place_rows(rows)?,
        })
    }
}

/// An object row before positions are resolved.
#[derive(Debug)]
struct Row {
    id: u64,
    name: Option<String>,
    size: u64,
    access_frequency: f64,
    position: Option<u64>,
}

fn data_lines(content: &str) -> impl Iterator<Item = (usize, &str)> {
    content
        .lines()
        .enumerate()
        .map(|(i, l)| (i + 1, strip_comment(l).trim()))
        .filter(|(_, l)| !l.is_empty())
}

fn strip_comment(line: &str) -> &str {
    match line.find('#') {
        Some(idx) => &line[..idx],
        None => line,
    }
}

fn parse_text(content: &str) -> Result<(Option<StorageSystem>, Vec<Row>), ModelError> {
    let mut system = None;
    let mut rows = Vec::new();

    for (n, (line_no, line)) in data_lines(content).enumerate() {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if n == 0 && parts.len() == 2 {
            system = Some(parse_header(line_no, &parts)?);
            continue;
        }
        match parse_text_row(line_no, &parts) {
            Ok(row) => rows.push(row),
            Err(e) => tracing::warn!("skipping line: {e}"),
        }
    }
    Ok((system, rows))
}

fn parse_header(line_no: usize, parts: &[&str]) -> Result<StorageSystem, ModelError> {
    let capacity: f64 = parse_field(line_no, "capacity", parts[0])?;
    let tokens: i64 = parse_field(line_no, "token budget", parts[1])?;
    if !capacity.is_finite() {
        return Err(ModelError::Parse {
            line: line_no,
            detail: format!("capacity '{}' is not finite", parts[0]),
        });
    }
    StorageSystem::from_signed(capacity.ceil() as i64, tokens)
}

fn parse_text_row(line_no: usize, parts: &[&str]) -> Result<Row, ModelError> {
    if parts.len() < 3 {
        return Err(ModelError::Parse {
            line: line_no,
            detail: format!("expected at least 3 fields, got {}", parts.len()),
        });
    }
    Ok(Row {
        id: parse_field(line_no, "id", parts[0])?,
        name: None,
        size: parse_size(line_no, parts[1])?,
        access_frequency: parse_frequency(line_no, parts[2])?,
        position: parts
            .get(3)
            .map(|p| parse_field(line_no, "position", p))
            .transpose()?,
    })
}

fn parse_csv(content: &str) -> Vec<Row> {
    let mut rows = Vec::new();
    for (n, (line_no, line)) in data_lines(content).enumerate() {
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if n == 0 && fields[0].parse::<u64>().is_err() {
            tracing::debug!("csv header: {line}");
            continue;
        }
        match parse_csv_row(line_no, &fields) {
            Ok(row) => rows.push(row),
            Err(e) => tracing::warn!("skipping line: {e}"),
        }
    }
    rows
}

fn parse_csv_row(line_no: usize, fields: &[&str]) -> Result<Row, ModelError> {
    if fields.len() < 4 {
        return Err(ModelError::Parse {
            line: line_no,
            detail: format!("expected at least 4 fields, got {}", fields.len()),
        });
    }
    Ok(Row {
        id: parse_field(line_no, "id", fields[0])?,
        name: Some(fields[1].to_string()).filter(|n| !n.is_empty()),
        size: parse_size(line_no, fields[2])?,
        access_frequency: parse_frequency(line_no, fields[3])?,
        position: fields
            .get(4)
            .filter(|p| !p.is_empty())
            .map(|p| parse_field(line_no, "position", p))
            .transpose()?,
    })
}

fn parse_field<T: std::str::FromStr>(line_no: usize, what: &str, raw: &str) -> Result<T, ModelError> {
    raw.parse().map_err(|_| ModelError::Parse {
        line: line_no,
        detail: format!("invalid {what} '{raw}'"),
    })
}

fn parse_size(line_no: usize, raw: &str) -> Result<u64, ModelError> {
    let size: f64 = parse_field(line_no, "size", raw)?;
    if !size.is_finite() || size <= 0.0 {
        return Err(ModelError::Parse {
            line: line_no,
            detail: format!("size must be positive, got '{raw}'"),
        });
    }
    Ok(size.ceil() as u64)
}

fn parse_frequency(line_no: usize, raw: &str) -> Result<f64, ModelError> {
    let freq: f64 = parse_field(line_no, "access frequency", raw)?;
    if !freq.is_finite() || freq < 0.0 {
        return Err(ModelError::Parse {
            line: line_no,
            detail: format!("access frequency must be non-negative, got '{raw}'"),
        });
    }
    Ok(freq)
}

/// Resolves positions: explicit ones are kept, the rest are packed after
/// the highest positioned object in file order.
fn place_rows(rows: Vec<Row>) -> Result<Vec<StorageObject>, ModelError> {
    let mut cursor = 0u64;
    for row in &rows {
        if let Some(p) = row.position {
            cursor = cursor.max(end_of(row.id, p, row.size)?);
        }
    }

    let mut objects = Vec::with_capacity(rows.len());
    for row in rows {
        let position = match row.position {
            Some(p) => p,
            None => {
                let p = cursor;
                cursor = end_of(row.id, p, row.size)?;
                p
            }
        };
        let mut obj = StorageObject::new(row.id, row.size, row.access_frequency, position);
        obj.name = row.name;
        objects.push(obj);
    }
    Ok(objects)
}

fn end_of(id: u64, position: u64, size: u64) -> Result<u64, ModelError> {
    position.checked_add(size).ok_or_else(|| {
        ModelError::InvalidConfiguration(format!(
            "object {id} at offset {position} with size {size} overflows the address space"
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_text_with_header() {
        let inv = InventoryLoader::parse(
            "100 2\n1 10 0.5 0\n2 10 0.2 50\n3 10 0.9 90\n",
            InventoryFormat::Text,
        )
        .unwrap();
        assert_eq!(inv.system, Some(StorageSystem::new(100, 2)));
        assert_eq!(inv.objects.len(), 3);
        assert_eq!(inv.objects[2].current_position, 90);
        assert_eq!(inv.objects[2].original_position, 90);
    }

    #[test]
    fn test_parse_text_without_header() {
        let inv = InventoryLoader::parse("1 10 0.5\n2 4 0.2\n", InventoryFormat::Text).unwrap();
        assert!(inv.system.is_none());
        assert_eq!(inv.objects[0].current_position, 0);
        assert_eq!(inv.objects[1].current_position, 10);
    }

    #[test]
    fn test_parse_text_rounds_sizes_up() {
        let inv = InventoryLoader::parse("1000 10\n1 3.27 0.45\n", InventoryFormat::Text).unwrap();
        assert_eq!(inv.objects[0].size, 4);
    }

    #[test]
    fn test_parse_text_skips_bad_lines() {
        let inv = InventoryLoader::parse(
            "100 5\n1 10 0.5\ngarbage\n2 -3 0.1\n3 5 0.7\n",
            InventoryFormat::Text,
        )
        .unwrap();
        let ids: Vec<u64> = inv.objects.iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn test_parse_text_comments() {
        let inv = InventoryLoader::parse(
            "# inventory\n100 5 # header\n1 10 0.5 20 # hot\n",
            InventoryFormat::Text,
        )
        .unwrap();
        assert_eq!(inv.objects.len(), 1);
        assert_eq!(inv.objects[0].current_position, 20);
    }

    #[test]
    fn test_parse_text_skips_non_numeric_id() {
        let inv =
            InventoryLoader::parse("100 5\nobjA 10 0.5 0\n2 10 0.5 20\n", InventoryFormat::Text)
                .unwrap();
        assert_eq!(inv.objects.len(), 1);
        assert_eq!(inv.objects[0].id, 2);
    }

    #[test]
    fn test_parse_position_overflow_is_rejected() {
        let err = InventoryLoader::parse(
            "1 10 0.5 18446744073709551615\n2 5 0.5\n",
            InventoryFormat::Text,
        )
        .unwrap_err();
        assert!(matches!(err, ModelError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_parse_packed_size_overflow_is_rejected() {
        let err = InventoryLoader::parse(
            "1,a,10,0.5,18446744073709551000\n2,b,600,0.1\n",
            InventoryFormat::Csv,
        )
        .unwrap_err();
        assert!(matches!(err, ModelError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_total_size_saturates() {
        let inv = Inventory {
            system: None,
            objects: vec![
                StorageObject::new(1, u64::MAX, 0.5, 0),
                StorageObject::new(2, 10, 0.5, 0),
            ],
        };
        assert_eq!(inv.total_size(), u64::MAX);
    }

    #[test]
    fn test_parse_negative_budget_header() {
        let err = InventoryLoader::parse("100 -1\n1 10 0.5\n", InventoryFormat::Text).unwrap_err();
        assert!(matches!(err, ModelError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_parse_empty() {
        let err = InventoryLoader::parse("100 5\n", InventoryFormat::Text).unwrap_err();
        assert!(matches!(err, ModelError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_parse_csv_with_header() {
        let inv = InventoryLoader::parse(
            "id,name,size,accessFrequency\n1,logs,12,0.75\n2,db,40,0.9\n",
            InventoryFormat::Csv,
        )
        .unwrap();
        assert_eq!(inv.objects.len(), 2);
        assert_eq!(inv.objects[0].name.as_deref(), Some("logs"));
        assert_eq!(inv.objects[1].current_position, 12);
    }

    #[test]
    fn test_parse_csv_mixed_positions() {
        let inv = InventoryLoader::parse(
            "1,a,10,0.5,40\n2,b,5,0.1\n3,c,5,0.2,0\n",
            InventoryFormat::Csv,
        )
        .unwrap();
        let positions: Vec<u64> = inv.objects.iter().map(|o| o.current_position).collect();
        assert_eq!(positions, vec![40, 50, 0]);
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(InventoryFormat::from_path(Path::new("a.CSV")), InventoryFormat::Csv);
        assert_eq!(InventoryFormat::from_path(Path::new("a.in")), InventoryFormat::Text);
    }

    #[test]
    fn test_to_text_roundtrip() {
        let inv = InventoryLoader::parse("100 3\n1 10 0.5 0\n2 20 0.25 60\n", InventoryFormat::Text)
            .unwrap();
        let back = InventoryLoader::parse(&inv.to_text(), InventoryFormat::Text).unwrap();
        assert_eq!(back, inv);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "id,name,size,accessFrequency").unwrap();
        writeln!(file, "7,cache,3,1.0").unwrap();
        let inv = InventoryLoader::load(file.path()).unwrap();
        assert_eq!(inv.objects[0].id, 7);
    }

    #[test]
    fn test_into_snapshot_prefers_header() {
        let inv = InventoryLoader::parse("50 1\n1 10 0.5\n", InventoryFormat::Text).unwrap();
        let snap = inv.into_snapshot(StorageSystem::new(999, 9)).validate().unwrap();
        assert_eq!(snap.capacity(), 50);
    }
}
