// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for the placement model.

/// Errors raised while building, validating, or mutating a layout.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// The storage system or its object list is malformed.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A relocation would overlap another object or leave the device.
    #[error("invalid move of object {object_id} to offset {position}: {detail}")]
    InvalidMove {
        object_id: u64,
        position: u64,
        detail: String,
    },

    /// An inventory file could not be read.
    #[error("failed to read inventory: {0}")]
    Io(#[from] std::io::Error),

    /// An inventory line could not be parsed.
    #[error("parse error on line {line}: {detail}")]
    Parse { line: usize, detail: String },
}
