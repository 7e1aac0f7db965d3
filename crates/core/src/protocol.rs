// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! WebSocket protocol messages exchanged with the dream backend.
//!
//! Requests carry a client-chosen `request_id` that the server echoes in
//! its reply. Upload results are pushed by the server without a request.

use serde::{Deserialize, Serialize};

use crate::dream::{Dream, UploadResult};
use crate::op::Op;

/// Messages sent from client to server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Apply a mutation on the backend.
    Apply {
        /// Echoed in the reply.
        request_id: u64,
        /// The mutation to apply.
        op: Op,
    },

    /// Request the authoritative copy of a dream.
    Fetch { request_id: u64, dream_id: String },

    /// Keepalive.
    Ping { id: u64 },
}

/// Messages sent from server to client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// The mutation was accepted.
    ///
    /// Carries the resulting dream for operations whose result is computed
    /// server-side (completion, image generation).
    Applied {
        request_id: u64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        dream: Option<Dream>,
    },

    /// The request failed with an HTTP-style status code.
    ///
    /// 4xx statuses are permanent, 5xx statuses may be retried.
    Rejected {
        request_id: u64,
        status: u16,
        message: String,
    },

    /// Response to a Fetch request.
    Dream { request_id: u64, dream: Dream },

    /// An upload finished processing on the backend.
    Upload(UploadResult),

    /// Pong response to client Ping.
    Pong { id: u64 },

    /// Error not tied to a request.
    Error { message: String },
}

impl ClientMessage {
    /// Creates an Apply message.
    pub fn apply(request_id: u64, op: Op) -> Self {
        ClientMessage::Apply { request_id, op }
    }

    /// Creates a Fetch message.
    pub fn fetch(request_id: u64, dream_id: impl Into<String>) -> Self {
        ClientMessage::Fetch {
            request_id,
            dream_id: dream_id.into(),
        }
    }

    /// Creates a Ping message.
    pub fn ping(id: u64) -> Self {
        ClientMessage::Ping { id }
    }

    /// Serializes the message to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserializes the message from JSON.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

impl ServerMessage {
    pub fn applied(request_id: u64, dream: Option<Dream>) -> Self {
        ServerMessage::Applied { request_id, dream }
    }

    pub fn rejected(request_id: u64, status: u16, message: impl Into<String>) -> Self {
        ServerMessage::Rejected {
            request_id,
            status,
            message: message.into(),
        }
    }

    pub fn dream(request_id: u64, dream: Dream) -> Self {
        ServerMessage::Dream { request_id, dream }
    }

    pub fn upload(result: UploadResult) -> Self {
        ServerMessage::Upload(result)
    }

    pub fn pong(id: u64) -> Self {
        ServerMessage::Pong { id }
    }

    pub fn error(message: impl Into<String>) -> Self {
        ServerMessage::Error {
            message: message.into(),
        }
    }

    /// The request this message answers, if any.
    pub fn request_id(&self) -> Option<u64> {
        match self {
            ServerMessage::Applied { request_id, .. }
            | ServerMessage::Rejected { request_id, .. }
            | ServerMessage::Dream { request_id, .. } => Some(*request_id),
            ServerMessage::Pong { id } => Some(*id),
            ServerMessage::Upload(_) | ServerMessage::Error { .. } => None,
        }
    }

    /// Serializes the message to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserializes the message from JSON.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
