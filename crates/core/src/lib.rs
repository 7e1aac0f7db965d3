// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! sn-core: Shared library for the somna dream journal
//!
//! This crate provides the dream aggregate types, the replayable operation
//! model, the local store contract and its SQLite implementation, and the
//! wire messages exchanged with the remote backend.

pub mod db;
pub mod dream;
pub mod error;
pub mod id;
pub mod op;
pub mod protocol;
pub mod store;

pub use db::Database;
pub use dream::{Dream, DreamState, Segment, UploadResult};
pub use error::{Error, Result};
pub use op::{Op, OpPayload, UnknownOp};
pub use store::LocalStore;
