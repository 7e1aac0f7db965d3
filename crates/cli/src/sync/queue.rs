// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Durable operation queue.
//!
//! The whole queue is one JSON document. Every mutation writes the new
//! document to a temporary file, fsyncs it and renames it over the old one,
//! so the file on disk is always either the previous or the next state.
//! In-memory state changes only after the write succeeded.

use std::collections::VecDeque;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sn_core::Op;

/// File name of the queue document inside the data directory.
pub const QUEUE_FILE_NAME: &str = "sync_queue.json";

const QUEUE_VERSION: u32 = 1;

/// Error type for queue operations.
#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The document was written by an incompatible build.
    #[error("unsupported queue version {0} (expected {QUEUE_VERSION})")]
    UnsupportedVersion(u32),
}

/// Result type for queue operations.
pub type QueueResult<T> = Result<T, QueueError>;

/// A mutation waiting for remote confirmation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedOp {
    /// Monotonic position assigned at enqueue.
    pub sequence: u64,
    #[serde(flatten)]
    pub op: Op,
    pub enqueued_at: DateTime<Utc>,
    /// Failed delivery attempts so far.
    #[serde(default)]
    pub attempt_count: u32,
}

#[derive(Serialize, Deserialize)]
struct QueueDocument {
    version: u32,
    next_sequence: u64,
    entries: VecDeque<QueuedOp>,
}

/// Ordered, persisted log of operations not yet confirmed by the remote.
#[derive(Debug)]
pub struct OperationQueue {
    path: PathBuf,
    next_sequence: u64,
    entries: VecDeque<QueuedOp>,
}

impl OperationQueue {
    /// Open the queue document at `path`, creating an empty queue if it does not exist.
    pub fn open(path: &Path) -> QueueResult<Self> {
        let mut queue = OperationQueue {
            path: path.to_path_buf(),
            next_sequence: 1,
            entries: VecDeque::new(),
        };
        queue.load()?;
        Ok(queue)
    }

    /// Open the queue under its fixed name inside `dir`.
    pub fn open_in(dir: &Path) -> QueueResult<Self> {
        Self::open(&dir.join(QUEUE_FILE_NAME))
    }

    /// Rehydrate from disk, replacing the in-memory state.
    pub fn load(&mut self) -> QueueResult<()> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };
        if text.trim().is_empty() {
            return Ok(());
        }

        let doc: QueueDocument = serde_json::from_str(&text)?;
        if doc.version != QUEUE_VERSION {
            return Err(QueueError::UnsupportedVersion(doc.version));
        }

        let after_last = doc.entries.back().map_or(1, |e| e.sequence + 1);
        self.next_sequence = doc.next_sequence.max(after_last);
        self.entries = doc.entries;
        Ok(())
    }

    /// Append an operation and persist. Returns its sequence number.
    pub fn enqueue(&mut self, op: Op) -> QueueResult<u64> {
        let sequence = self.next_sequence;
        let mut entries = self.entries.clone();
        entries.push_back(QueuedOp {
            sequence,
            op,
            enqueued_at: Utc::now(),
            attempt_count: 0,
        });

        self.commit(entries, sequence + 1)?;
        Ok(sequence)
    }

    /// The oldest unconfirmed operation.
    pub fn peek_front(&self) -> Option<&QueuedOp> {
        self.entries.front()
    }

    /// Remove the head after the remote confirmed it.
    ///
    /// Only removes the head if it is still `expected_sequence`; returns `None`
    /// when the head is something else (the entry was purged meanwhile).
    pub fn dequeue_front(&mut self, expected_sequence: u64) -> QueueResult<Option<QueuedOp>> {
        if self.entries.front().map(|e| e.sequence) != Some(expected_sequence) {
            return Ok(None);
        }

        let mut entries = self.entries.clone();
        let removed = entries.pop_front();
        self.commit(entries, self.next_sequence)?;
        Ok(removed)
    }

    /// Bump the attempt counter of an entry after a failed delivery.
    pub fn record_attempt(&mut self, sequence: u64) -> QueueResult<()> {
        let mut entries = self.entries.clone();
        match entries.iter_mut().find(|e| e.sequence == sequence) {
            Some(entry) => entry.attempt_count += 1,
            None => return Ok(()),
        }
        self.commit(entries, self.next_sequence)
    }

    /// Drop every queued operation that targets `dream_id`, then append `op`.
    ///
    /// Both changes land in a single write. Returns the new sequence number
    /// and how many entries were dropped.
    pub fn enqueue_purging(&mut self, dream_id: &str, op: Op) -> QueueResult<(u64, usize)> {
        let sequence = self.next_sequence;
        let mut entries: VecDeque<QueuedOp> = self
            .entries
            .iter()
            .filter(|e| e.op.dream_id() != Some(dream_id))
            .cloned()
            .collect();
        let purged = self.entries.len() - entries.len();
        entries.push_back(QueuedOp {
            sequence,
            op,
            enqueued_at: Utc::now(),
            attempt_count: 0,
        });

        self.commit(entries, sequence + 1)?;
        Ok((sequence, purged))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries, oldest first.
    pub fn entries(&self) -> impl Iterator<Item = &QueuedOp> {
        self.entries.iter()
    }

    /// The sequence the next enqueue will receive.
    pub fn next_sequence(&self) -> u64 {
        self.next_sequence
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn commit(&mut self, entries: VecDeque<QueuedOp>, next_sequence: u64) -> QueueResult<()> {
        let doc = QueueDocument {
            version: QUEUE_VERSION,
            next_sequence,
            entries,
        };
        write_atomic(&self.path, &serde_json::to_vec_pretty(&doc)?)?;

        self.entries = doc.entries;
        self.next_sequence = doc.next_sequence;
        Ok(())
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let tmp = path.with_extension("json.tmp");
    {
        let mut file = File::create(&tmp)?;
        file.write_all(bytes)?;
        file.sync_all()?;
    }
    fs::rename(&tmp, path)?;

    // Directory fsync makes the rename durable; not every platform allows it.
    if let Some(parent) = path.parent() {
        if let Ok(dir) = File::open(parent) {
            let _ = dir.sync_all();
        }
    }
    Ok(())
}
