// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! The local store contract.
//!
//! Apply rules:
//! - InsertNew: first write wins (a replayed create is ignored)
//! - AppendSegment: a known segment id is ignored; a new one must extend the order
//! - RemoveSegment / DeleteDream: removing something already gone succeeds
//! - UpdateTitle / UpdateSummary / UpdateTitleAndSummary / MarkCompleted: overwrite
//! - RequestAnalysis / GenerateImage: server-computed; locally they only record intent
//!
//! Every rule is safe to apply more than once.

use crate::db::Database;
use crate::dream::{Dream, DreamState, UploadResult};
use crate::error::{Error, Result};
use crate::op::OpPayload;

/// Durable, always-available persistence of dream aggregates.
pub trait LocalStore: Send {
    /// Applies a mutation and returns the resulting dream, or `None` if it was deleted.
    fn apply(&mut self, op: &OpPayload) -> Result<Option<Dream>>;

    /// Returns a dream by id.
    fn get(&self, id: &str) -> Result<Dream>;

    /// Returns all dreams, newest first.
    fn list(&self) -> Result<Vec<Dream>>;

    /// Replaces local state for a dream with an authoritative copy from the backend.
    fn upsert(&mut self, dream: &Dream) -> Result<()>;

    /// Merges a finished upload into the dream.
    ///
    /// Returns `None` if the dream no longer exists locally.
    fn merge_upload(&mut self, result: &UploadResult) -> Result<Option<Dream>>;
}

impl LocalStore for Database {
    fn apply(&mut self, op: &OpPayload) -> Result<Option<Dream>> {
        match op {
            OpPayload::InsertNew {
                dream_id,
                title,
                created_at,
            } => {
                if !self.dream_exists(dream_id)? {
                    self.create_dream(&Dream::new(dream_id.clone(), title.clone(), *created_at))?;
                }
            }

            OpPayload::AppendSegment { dream_id, segment } => {
                let dream = self.get_dream(dream_id)?;
                if !dream.segments.iter().any(|s| s.id == segment.id) {
                    dream.check_next_order(segment.order)?;
                    self.add_segment(dream_id, segment)?;
                }
            }

            OpPayload::RemoveSegment {
                dream_id,
                segment_id,
            } => {
                if !self.dream_exists(dream_id)? {
                    return Err(Error::DreamNotFound(dream_id.clone()));
                }
                self.remove_segment(dream_id, segment_id)?;
            }

            OpPayload::MarkCompleted { dream_id } => {
                self.update_state(dream_id, DreamState::Completed)?;
            }

            OpPayload::UpdateTitle { dream_id, title } => self.update_title(dream_id, title)?,

            OpPayload::UpdateSummary { dream_id, summary } => {
                self.update_summary(dream_id, summary)?
            }

            OpPayload::UpdateTitleAndSummary {
                dream_id,
                title,
                summary,
            } => self.update_title_and_summary(dream_id, title, summary)?,

            OpPayload::DeleteDream { dream_id } => {
                self.delete_dream(dream_id)?;
                return Ok(None);
            }

            OpPayload::RequestAnalysis { .. } => {}

            OpPayload::GenerateImage { dream_id, prompt } => {
                self.update_image_prompt(dream_id, prompt)?;
            }
        }

        self.get_dream(op.dream_id()).map(Some)
    }

    fn get(&self, id: &str) -> Result<Dream> {
        self.get_dream(id)
    }

    fn list(&self) -> Result<Vec<Dream>> {
        self.list_dreams()
    }

    fn upsert(&mut self, dream: &Dream) -> Result<()> {
        self.replace_dream(dream)
    }

    fn merge_upload(&mut self, result: &UploadResult) -> Result<Option<Dream>> {
        if !self.dream_exists(&result.dream_id)? {
            return Ok(None);
        }
        if result.succeeded {
            if let Some(transcript) = &result.transcript {
                self.update_transcript(&result.dream_id, transcript)?;
            }
        }
        self.get_dream(&result.dream_id).map(Some)
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
