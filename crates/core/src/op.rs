// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Operations for replayable dream mutations.
//!
//! Every mutation is represented as an operation. It is applied to the local
//! store first and then forwarded to the remote backend, possibly much later
//! and possibly more than once. Ops are designed to be:
//!
//! - Serializable: stored in the offline queue and sent over the wire
//! - Replay-safe: keyed by the ids they carry, so a resend is harmless
//! - Forward-compatible: a queue written by a newer build still loads
//!
//! The on-disk and wire shape is `{"kind": "<snake_case>", "payload": {...}}`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::dream::Segment;

/// Known mutation kinds and their payloads.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", content = "payload", rename_all = "snake_case")]
pub enum OpPayload {
    /// Create a new draft dream.
    InsertNew {
        dream_id: String,
        title: String,
        created_at: DateTime<Utc>,
    },

    /// Append a captured segment.
    AppendSegment { dream_id: String, segment: Segment },

    /// Remove a segment.
    RemoveSegment {
        dream_id: String,
        segment_id: String,
    },

    /// Finish capture; the backend starts transcription.
    MarkCompleted { dream_id: String },

    UpdateTitle { dream_id: String, title: String },

    UpdateSummary { dream_id: String, summary: String },

    UpdateTitleAndSummary {
        dream_id: String,
        title: String,
        summary: String,
    },

    DeleteDream { dream_id: String },

    /// Ask the backend to interpret the dream.
    RequestAnalysis { dream_id: String },

    /// Ask the backend to render an image for the dream.
    GenerateImage { dream_id: String, prompt: String },
}

impl OpPayload {
    /// Returns the stable tag used on disk and on the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            OpPayload::InsertNew { .. } => "insert_new",
            OpPayload::AppendSegment { .. } => "append_segment",
            OpPayload::RemoveSegment { .. } => "remove_segment",
            OpPayload::MarkCompleted { .. } => "mark_completed",
            OpPayload::UpdateTitle { .. } => "update_title",
            OpPayload::UpdateSummary { .. } => "update_summary",
            OpPayload::UpdateTitleAndSummary { .. } => "update_title_and_summary",
            OpPayload::DeleteDream { .. } => "delete_dream",
            OpPayload::RequestAnalysis { .. } => "request_analysis",
            OpPayload::GenerateImage { .. } => "generate_image",
        }
    }

    /// Returns the dream this operation touches.
    pub fn dream_id(&self) -> &str {
        match self {
            OpPayload::InsertNew { dream_id, .. }
            | OpPayload::AppendSegment { dream_id, .. }
            | OpPayload::RemoveSegment { dream_id, .. }
            | OpPayload::MarkCompleted { dream_id }
            | OpPayload::UpdateTitle { dream_id, .. }
            | OpPayload::UpdateSummary { dream_id, .. }
            | OpPayload::UpdateTitleAndSummary { dream_id, .. }
            | OpPayload::DeleteDream { dream_id }
            | OpPayload::RequestAnalysis { dream_id }
            | OpPayload::GenerateImage { dream_id, .. } => dream_id,
        }
    }

    /// Returns true if the caller needs the server's result synchronously.
    pub fn needs_reply(&self) -> bool {
        matches!(
            self,
            OpPayload::MarkCompleted { .. } | OpPayload::GenerateImage { .. }
        )
    }

    /// Creates an InsertNew payload.
    pub fn insert_new(dream_id: String, title: String, created_at: DateTime<Utc>) -> Self {
        OpPayload::InsertNew {
            dream_id,
            title,
            created_at,
        }
    }

    /// Creates an AppendSegment payload.
    pub fn append_segment(dream_id: String, segment: Segment) -> Self {
        OpPayload::AppendSegment { dream_id, segment }
    }

    /// Creates a RemoveSegment payload.
    pub fn remove_segment(dream_id: String, segment_id: String) -> Self {
        OpPayload::RemoveSegment {
            dream_id,
            segment_id,
        }
    }

    /// Creates a MarkCompleted payload.
    pub fn mark_completed(dream_id: String) -> Self {
        OpPayload::MarkCompleted { dream_id }
    }

    /// Creates an UpdateTitle payload.
    pub fn update_title(dream_id: String, title: String) -> Self {
        OpPayload::UpdateTitle { dream_id, title }
    }

    /// Creates an UpdateSummary payload.
    pub fn update_summary(dream_id: String, summary: String) -> Self {
        OpPayload::UpdateSummary { dream_id, summary }
    }

    /// Creates an UpdateTitleAndSummary payload.
    pub fn update_title_and_summary(dream_id: String, title: String, summary: String) -> Self {
        OpPayload::UpdateTitleAndSummary {
            dream_id,
            title,
            summary,
        }
    }

    /// Creates a DeleteDream payload.
    pub fn delete_dream(dream_id: String) -> Self {
        OpPayload::DeleteDream { dream_id }
    }

    /// Creates a RequestAnalysis payload.
    pub fn request_analysis(dream_id: String) -> Self {
        OpPayload::RequestAnalysis { dream_id }
    }

    /// Creates a GenerateImage payload.
    pub fn generate_image(dream_id: String, prompt: String) -> Self {
        OpPayload::GenerateImage { dream_id, prompt }
    }
}

/// An operation whose kind this build does not recognize.
///
/// Kept verbatim so it can still be delivered to the backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UnknownOp {
    pub kind: String,
    #[serde(default)]
    pub payload: serde_json::Value,
}

/// A replayable mutation, known or opaque.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Op {
    Known(OpPayload),
    Unknown(UnknownOp),
}

impl Op {
    pub fn kind(&self) -> &str {
        match self {
            Op::Known(payload) => payload.kind(),
            Op::Unknown(unknown) => &unknown.kind,
        }
    }

    /// Returns the dream id affected by this operation.
    ///
    /// Returns `None` for unknown operations, whose shape is opaque.
    pub fn dream_id(&self) -> Option<&str> {
        match self {
            Op::Known(payload) => Some(payload.dream_id()),
            Op::Unknown(_) => None,
        }
    }

    pub fn payload(&self) -> Option<&OpPayload> {
        match self {
            Op::Known(payload) => Some(payload),
            Op::Unknown(_) => None,
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, Op::Known(_))
    }
}

impl From<OpPayload> for Op {
    fn from(payload: OpPayload) -> Self {
        Op::Known(payload)
    }
}

#[cfg(test)]
#[path = "op_tests.rs"]
mod tests;
