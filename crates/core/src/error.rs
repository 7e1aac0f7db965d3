// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for sn-core operations.

use thiserror::Error;

/// All possible errors that can occur in sn-core operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("dream not found: {0}")]
    DreamNotFound(String),

    #[error("segment not found: {segment_id} in dream {dream_id}")]
    SegmentNotFound {
        dream_id: String,
        segment_id: String,
    },

    #[error("segment order {order} must be greater than {previous} in dream {dream_id}\n  hint: segment order values are assigned by the caller and must strictly increase")]
    SegmentOrder {
        dream_id: String,
        order: u32,
        previous: u32,
    },

    #[error("invalid dream state: '{0}'\n  hint: valid states are: draft, completed")]
    InvalidState(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("corrupted data: {0}")]
    CorruptedData(String),
}

/// A specialized Result type for sn-core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
