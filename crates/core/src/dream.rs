// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Core dream types for the somna journal.
//!
//! This module contains the dream aggregate, its audio segments, the
//! lifecycle state, and the upload notification pushed when server-side
//! work (such as transcription) finishes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Lifecycle state of a dream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DreamState {
    /// Still being captured. Segments may be appended or removed.
    #[default]
    Draft,
    /// Capture finished and handed to the backend for transcription.
    Completed,
}

impl DreamState {
    /// Returns the string representation used in storage and display.
    pub fn as_str(&self) -> &'static str {
        match self {
            DreamState::Draft => "draft",
            DreamState::Completed => "completed",
        }
    }
}

impl fmt::Display for DreamState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DreamState {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "draft" => Ok(DreamState::Draft),
            "completed" => Ok(DreamState::Completed),
            _ => Err(Error::InvalidState(s.to_string())),
        }
    }
}

/// One audio capture clip belonging to a dream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub id: String,
    /// Audio file name, relative to the recordings directory.
    pub filename: String,
    pub duration_secs: f64,
    /// Caller-assigned position. Strictly increasing within a dream.
    pub order: u32,
}

impl Segment {
    pub fn new(id: impl Into<String>, filename: impl Into<String>, duration_secs: f64, order: u32) -> Self {
        Segment {
            id: id.into(),
            filename: filename.into(),
            duration_secs,
            order,
        }
    }
}

/// The persisted record for one captured dream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dream {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub title: String,
    #[serde(default)]
    pub transcript: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    /// Interpretation text produced by the analysis service.
    #[serde(default)]
    pub analysis: Option<String>,
    /// Segments ordered by `order`.
    #[serde(default)]
    pub segments: Vec<Segment>,
    #[serde(default)]
    pub state: DreamState,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub image_prompt: Option<String>,
}

impl Dream {
    /// Creates a new draft dream with no segments.
    pub fn new(id: String, title: String, created_at: DateTime<Utc>) -> Self {
        Dream {
            id,
            created_at,
            title,
            transcript: None,
            summary: None,
            analysis: None,
            segments: Vec::new(),
            state: DreamState::Draft,
            image_url: None,
            image_prompt: None,
        }
    }

    /// Returns true once capture has finished.
    pub fn is_completed(&self) -> bool {
        self.state == DreamState::Completed
    }

    /// Total recorded duration across all segments.
    pub fn total_duration_secs(&self) -> f64 {
        self.segments.iter().map(|s| s.duration_secs).sum()
    }

    /// Checks that `order` may be appended after the existing segments.
    ///
    /// Duplicate or decreasing order values are a caller bug.
    pub fn check_next_order(&self, order: u32) -> Result<()> {
        match self.segments.iter().map(|s| s.order).max() {
            Some(previous) if order <= previous => Err(Error::SegmentOrder {
                dream_id: self.id.clone(),
                order,
                previous,
            }),
            _ => Ok(()),
        }
    }
}

/// Notification that server-side work for a dream became available.
///
/// Not persisted by the sync engine; observers re-read the dream on receipt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadResult {
    pub dream_id: String,
    #[serde(default)]
    pub transcript: Option<String>,
    pub succeeded: bool,
}

impl UploadResult {
    pub fn succeeded(dream_id: impl Into<String>, transcript: impl Into<String>) -> Self {
        UploadResult {
            dream_id: dream_id.into(),
            transcript: Some(transcript.into()),
            succeeded: true,
        }
    }

    pub fn failed(dream_id: impl Into<String>) -> Self {
        UploadResult {
            dream_id: dream_id.into(),
            transcript: None,
            succeeded: false,
        }
    }
}

#[cfg(test)]
#[path = "dream_tests.rs"]
mod tests;
