// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

use crate::sync::{QueueError, RemoteError, SyncError};

/// All possible errors that can occur in the snrs library.
///
/// Errors provide user-friendly messages with hints for common issues.
#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot determine data directory\n  hint: pass -C <dir> or set SOMNA_DATA_DIR")]
    NoDataDir,

    #[error("data directory is in use: {0}\n  hint: another somna process (such as `somna watch`) holds the lock")]
    Locked(String),

    #[error("no remote configured\n  hint: add a [remote] section with a url to {0}")]
    NoRemote(String),

    #[error("dream not found: {0}")]
    DreamNotFound(String),

    #[error("segment not found: {segment_id} in dream {dream_id}")]
    SegmentNotFound {
        dream_id: String,
        segment_id: String,
    },

    #[error("segment order {order} must be greater than {previous} in dream {dream_id}\n  hint: use --order {next} or higher")]
    SegmentOrder {
        dream_id: String,
        order: u32,
        previous: u32,
        next: u32,
    },

    #[error("invalid dream state: '{0}'\n  hint: valid states are: draft, completed")]
    InvalidState(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("unknown format '{format}'")]
    UnknownFormat { format: String },

    #[error("{0}")]
    Remote(#[from] RemoteError),

    #[error("sync error: {0}")]
    Sync(SyncError),

    #[error("queue error: {0}")]
    Queue(#[from] QueueError),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config error: {0}")]
    Config(String),

    #[error("corrupted data in database: {0}")]
    CorruptedData(String),
}

/// A specialized Result type for snrs operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<sn_core::Error> for Error {
    fn from(e: sn_core::Error) -> Self {
        match e {
            sn_core::Error::DreamNotFound(id) => Error::DreamNotFound(id),
            sn_core::Error::SegmentNotFound {
                dream_id,
                segment_id,
            } => Error::SegmentNotFound {
                dream_id,
                segment_id,
            },
            sn_core::Error::SegmentOrder {
                dream_id,
                order,
                previous,
            } => Error::SegmentOrder {
                dream_id,
                order,
                previous,
                next: previous.saturating_add(1),
            },
            sn_core::Error::InvalidState(s) => Error::InvalidState(s),
            sn_core::Error::InvalidInput(s) => Error::InvalidInput(s),
            sn_core::Error::Database(e) => Error::Database(e),
            sn_core::Error::Io(e) => Error::Io(e),
            sn_core::Error::Json(e) => Error::Json(e),
            sn_core::Error::CorruptedData(s) => Error::CorruptedData(s),
        }
    }
}

impl From<SyncError> for Error {
    fn from(e: SyncError) -> Self {
        match e {
            SyncError::Local(e) => e.into(),
            SyncError::Queue(e) => Error::Queue(e),
            SyncError::Remote(e) => Error::Remote(e),
            other => Error::Sync(other),
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
