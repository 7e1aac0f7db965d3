// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Offline-first sync engine.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐     ┌─────────────────┐     ┌──────────────┐
//! │    caller    │────►│ SyncCoordinator │────►│ RemoteStore  │
//! │ (CLI, tasks) │◄────│                 │◄────│   (trait)    │
//! └──────────────┘     └─────────────────┘     └──────────────┘
//!                        │             │
//!                        ▼             ▼
//!                 ┌────────────┐ ┌────────────────┐
//!                 │ LocalStore │ │ OperationQueue │
//!                 │  (SQLite)  │ │ (JSON document)│
//!                 └────────────┘ └────────────────┘
//! ```
//!
//! # Guarantees
//!
//! - Reads are served from the local store and never touch the queue
//! - Operations reach the remote in enqueue order, at least once
//! - A queued operation survives restarts until the remote confirms it
//! - Permanent (4xx) failures are dropped and reported, not retried

mod coordinator;
mod queue;
mod reconcile;
mod remote;
mod state;
mod transport;
mod triggers;

pub use coordinator::{
    DrainReport, DrainStop, Rejection, SyncCoordinator, SyncError, SyncOptions, SyncResult,
};
pub use queue::{OperationQueue, QueueError, QueueResult, QueuedOp, QUEUE_FILE_NAME};
pub use reconcile::{UploadPublisher, UploadStream};
pub use remote::{RemoteError, RemoteResult, RemoteStore};
pub use state::{SharedSyncState, SyncState};
pub use transport::WebSocketRemote;
pub use triggers::{
    probe_reachable, spawn_keepalive, spawn_network_listener, spawn_reachability_probe,
    spawn_upload_forwarder, BackgroundWake,
};

#[cfg(test)]
pub(crate) mod test_helpers;


#[cfg(test)]
mod queue_tests;


#[cfg(test)]
mod state_tests;
