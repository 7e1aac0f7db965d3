// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Remote store abstraction.
//!
//! The coordinator only needs two calls: forward a mutation and fetch the
//! authoritative copy of a dream. Outcomes are classified as retryable or
//! permanent so the drain loop knows whether to stop or move on.

use std::future::Future;
use std::pin::Pin;

use sn_core::{Dream, Op};

/// Error type for remote operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RemoteError {
    /// The backend could not be reached.
    #[error("remote unreachable: {0}")]
    Unreachable(String),

    /// The call did not finish within the send timeout.
    #[error("remote call timed out")]
    Timeout,

    /// The backend failed with a 5xx status.
    #[error("server error {status}: {message}")]
    Server { status: u16, message: String },

    /// The backend refused the request with a 4xx status.
    #[error("rejected by remote ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// The backend answered with something unexpected.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The attempt was abandoned before it completed.
    #[error("remote call cancelled")]
    Cancelled,
}

impl RemoteError {
    /// Classify an HTTP-style status code.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        if (400..500).contains(&status) {
            RemoteError::Rejected { status, message }
        } else {
            RemoteError::Server { status, message }
        }
    }

    /// Whether the same operation may succeed if sent again later.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, RemoteError::Rejected { .. })
    }
}

/// Result type for remote operations.
pub type RemoteResult<T> = Result<T, RemoteError>;

/// The remote backend.
///
/// Implementations must tolerate replays of operations that succeeded but
/// were never acknowledged locally.
pub trait RemoteStore: Send {
    /// Forward a mutation.
    ///
    /// Returns the server-computed dream for operations that produce one.
    fn send(
        &mut self,
        op: Op,
    ) -> Pin<Box<dyn Future<Output = RemoteResult<Option<Dream>>> + Send + '_>>;

    /// Fetch the authoritative copy of a dream.
    fn fetch(
        &mut self,
        dream_id: &str,
    ) -> Pin<Box<dyn Future<Output = RemoteResult<Dream>> + Send + '_>>;

    /// Check the connection, opening it if needed.
    fn ping(&mut self) -> Pin<Box<dyn Future<Output = RemoteResult<()>> + Send + '_>> {
        Box::pin(async { Ok(()) })
    }
}
