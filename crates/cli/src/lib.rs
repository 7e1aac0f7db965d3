// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! snrs - An offline-first dream journal library.
//!
//! This crate provides the core functionality for the `somna` CLI tool.
//! Dreams are stored in a local SQLite database and every change is
//! queued for delivery to a WebSocket backend.
//!
//! # Main Components
//!
//! - [`sync::SyncCoordinator`] - Applies changes locally, queues them and replays the queue
//! - [`sync::OperationQueue`] - Durable FIFO of operations awaiting delivery
//! - [`sync::WebSocketRemote`] - The backend transport
//! - [`Config`] - Remote endpoint and sync tunables
//! - [`Error`] - Error types for all operations
//!
//! # Usage
//!
//! ```rust,ignore
//! use snrs::{config::resolve_data_dir, Command, OutputFormat};
//!
//! let data_dir = resolve_data_dir(None)?;
//! snrs::run(Command::List { output: OutputFormat::Text }, &data_dir, false)?;
//! ```

mod cli;
mod commands;
mod display;

pub mod config;
pub mod env;
pub mod error;
pub mod sync;

pub use cli::{Cli, Command, OutputFormat, SegmentCommand};
pub use config::Config;
pub use error::{Error, Result};

use std::path::Path;

/// Execute a CLI command against `data_dir`. This is the main entry point for
/// library users and provides a testable way to run commands without process
/// execution.
pub fn run(command: Command, data_dir: &Path, offline: bool) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| Error::Io(std::io::Error::other(format!("tokio: {e}"))))?;
    rt.block_on(commands::dispatch(command, data_dir, offline))
}
