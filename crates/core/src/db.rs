// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! SQLite-backed database for dream storage.
//!
//! The [`Database`] struct provides all data access operations for dreams
//! and their segments. It is the always-available source of truth for reads.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

use crate::dream::{Dream, Segment};
use crate::error::{Error, Result};

/// SQL schema for the dream journal database.
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS dreams (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    transcript TEXT,
    summary TEXT,
    analysis TEXT,
    state TEXT NOT NULL DEFAULT 'draft',
    image_url TEXT,
    image_prompt TEXT,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS segments (
    id TEXT NOT NULL,
    dream_id TEXT NOT NULL,
    filename TEXT NOT NULL,
    duration_secs REAL NOT NULL,
    seg_order INTEGER NOT NULL,
    PRIMARY KEY (dream_id, id),
    FOREIGN KEY (dream_id) REFERENCES dreams(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_dreams_created ON dreams(created_at);
CREATE INDEX IF NOT EXISTS idx_segments_order ON segments(dream_id, seg_order);
"#;

/// Parse a string value from the database, returning a rusqlite error on parse failure.
fn parse_db<T: std::str::FromStr>(
    value: &str,
    column: &str,
) -> std::result::Result<T, rusqlite::Error> {
    value.parse().map_err(|_| {
        rusqlite::Error::FromSqlConversionFailure(
            0,
            rusqlite::types::Type::Text,
            Box::new(Error::CorruptedData(format!(
                "invalid value '{value}' in column '{column}'"
            ))),
        )
    })
}

/// Parse an RFC3339 timestamp from the database.
fn parse_timestamp(
    value: &str,
    column: &str,
) -> std::result::Result<DateTime<Utc>, rusqlite::Error> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| {
            rusqlite::Error::FromSqlConversionFailure(
                0,
                rusqlite::types::Type::Text,
                Box::new(Error::CorruptedData(format!(
                    "invalid timestamp '{value}' in column '{column}'"
                ))),
            )
        })
}

/// Format a timestamp for storage. Fixed precision keeps text ordering chronological.
fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
}

/// Run schema creation and all migrations on a database connection.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    migrate_add_image_columns(conn)?;
    Ok(())
}

/// Migration: Add image columns to databases created before image generation.
fn migrate_add_image_columns(conn: &Connection) -> Result<()> {
    for column in ["image_url", "image_prompt"] {
        let has_column: bool = conn
            .query_row(
                "SELECT COUNT(*) > 0 FROM pragma_table_info('dreams') WHERE name = ?1",
                [column],
                |row| row.get(0),
            )
            .unwrap_or(false);

        if !has_column {
            let sql = format!("ALTER TABLE dreams ADD COLUMN {column} TEXT");
            conn.execute(&sql, [])?;
        }
    }
    Ok(())
}

const DREAM_COLUMNS: &str = "id, title, transcript, summary, analysis, state, image_url, image_prompt, created_at";

fn row_to_dream(row: &rusqlite::Row<'_>) -> std::result::Result<Dream, rusqlite::Error> {
    let state_str: String = row.get(5)?;
    let created_str: String = row.get(8)?;
    Ok(Dream {
        id: row.get(0)?,
        title: row.get(1)?,
        transcript: row.get(2)?,
        summary: row.get(3)?,
        analysis: row.get(4)?,
        state: parse_db(&state_str, "state")?,
        image_url: row.get(6)?,
        image_prompt: row.get(7)?,
        created_at: parse_timestamp(&created_str, "created_at")?,
        segments: Vec::new(),
    })
}

/// SQLite database connection with dream journal operations.
pub struct Database {
    /// The underlying SQLite connection.
    pub conn: Connection,
}

impl Database {
    /// Open a database connection at the given path, creating and migrating if needed.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;

        conn.execute_batch(
            "PRAGMA foreign_keys = ON;
             PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;",
        )?;

        let db = Database { conn };
        run_migrations(&db.conn)?;
        Ok(db)
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        let db = Database { conn };
        run_migrations(&db.conn)?;
        Ok(db)
    }

    /// Insert a dream row (segments are stored separately).
    pub fn create_dream(&self, dream: &Dream) -> Result<()> {
        self.conn.execute(
            "INSERT INTO dreams (id, title, transcript, summary, analysis, state,
             image_url, image_prompt, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                dream.id,
                dream.title,
                dream.transcript,
                dream.summary,
                dream.analysis,
                dream.state.as_str(),
                dream.image_url,
                dream.image_prompt,
                format_timestamp(&dream.created_at),
            ],
        )?;
        Ok(())
    }

    /// Get a dream by ID, including its segments.
    pub fn get_dream(&self, id: &str) -> Result<Dream> {
        let dream = self
            .conn
            .query_row(
                &format!("SELECT {DREAM_COLUMNS} FROM dreams WHERE id = ?1"),
                params![id],
                row_to_dream,
            )
            .optional()?;

        let mut dream = dream.ok_or_else(|| Error::DreamNotFound(id.to_string()))?;
        dream.segments = self.get_segments(id)?;
        Ok(dream)
    }

    /// Check if a dream exists.
    pub fn dream_exists(&self, id: &str) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM dreams WHERE id = ?1",
            params![id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// List all dreams, newest first.
    pub fn list_dreams(&self) -> Result<Vec<Dream>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {DREAM_COLUMNS} FROM dreams ORDER BY created_at DESC, id"
        ))?;
        let mut dreams = stmt
            .query_map([], row_to_dream)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        for dream in &mut dreams {
            dream.segments = self.get_segments(&dream.id)?;
        }
        Ok(dreams)
    }

    /// Get a dream's segments in order.
    pub fn get_segments(&self, dream_id: &str) -> Result<Vec<Segment>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, filename, duration_secs, seg_order FROM segments
             WHERE dream_id = ?1 ORDER BY seg_order",
        )?;
        let segments = stmt
            .query_map(params![dream_id], |row| {
                Ok(Segment {
                    id: row.get(0)?,
                    filename: row.get(1)?,
                    duration_secs: row.get(2)?,
                    order: row.get(3)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(segments)
    }

    /// Append a segment. Returns false if a segment with the same id already exists.
    pub fn add_segment(&self, dream_id: &str, segment: &Segment) -> Result<bool> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO segments (id, dream_id, filename, duration_secs, seg_order)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                segment.id,
                dream_id,
                segment.filename,
                segment.duration_secs,
                segment.order
            ],
        )?;
        Ok(inserted > 0)
    }

    /// Remove a segment. Returns false if it did not exist.
    pub fn remove_segment(&self, dream_id: &str, segment_id: &str) -> Result<bool> {
        let removed = self.conn.execute(
            "DELETE FROM segments WHERE dream_id = ?1 AND id = ?2",
            params![dream_id, segment_id],
        )?;
        Ok(removed > 0)
    }

    fn update_column(&self, id: &str, column: &str, value: Option<&str>) -> Result<()> {
        set_column(&self.conn, id, column, value)
    }

    pub fn update_title(&self, id: &str, title: &str) -> Result<()> {
        self.update_column(id, "title", Some(title))
    }

    pub fn update_summary(&self, id: &str, summary: &str) -> Result<()> {
        self.update_column(id, "summary", Some(summary))
    }

    /// Set title and summary together; neither changes if either update fails.
    pub fn update_title_and_summary(&mut self, id: &str, title: &str, summary: &str) -> Result<()> {
        let tx = self.conn.transaction()?;
        set_column(&tx, id, "title", Some(title))?;
        set_column(&tx, id, "summary", Some(summary))?;
        tx.commit()?;
        Ok(())
    }

    pub fn update_transcript(&self, id: &str, transcript: &str) -> Result<()> {
        self.update_column(id, "transcript", Some(transcript))
    }

    pub fn update_state(&self, id: &str, state: crate::dream::DreamState) -> Result<()> {
        self.update_column(id, "state", Some(state.as_str()))
    }

    /// Record the prompt for a pending image; clears any previous image url.
    pub fn update_image_prompt(&mut self, id: &str, prompt: &str) -> Result<()> {
        let tx = self.conn.transaction()?;
        set_column(&tx, id, "image_prompt", Some(prompt))?;
        set_column(&tx, id, "image_url", None)?;
        tx.commit()?;
        Ok(())
    }

    /// Delete a dream and its segments. Returns false if it did not exist.
    pub fn delete_dream(&mut self, id: &str) -> Result<bool> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM segments WHERE dream_id = ?1", params![id])?;
        let removed = tx.execute("DELETE FROM dreams WHERE id = ?1", params![id])?;
        tx.commit()?;
        Ok(removed > 0)
    }

    /// Replace a dream and its segments with the given state.
    pub fn replace_dream(&mut self, dream: &Dream) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO dreams (id, title, transcript, summary, analysis, state,
             image_url, image_prompt, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                transcript = excluded.transcript,
                summary = excluded.summary,
                analysis = excluded.analysis,
                state = excluded.state,
                image_url = excluded.image_url,
                image_prompt = excluded.image_prompt",
            params![
                dream.id,
                dream.title,
                dream.transcript,
                dream.summary,
                dream.analysis,
                dream.state.as_str(),
                dream.image_url,
                dream.image_prompt,
                format_timestamp(&dream.created_at),
            ],
        )?;
        tx.execute("DELETE FROM segments WHERE dream_id = ?1", params![dream.id])?;
        for segment in &dream.segments {
            tx.execute(
                "INSERT INTO segments (id, dream_id, filename, duration_secs, seg_order)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    segment.id,
                    dream.id,
                    segment.filename,
                    segment.duration_secs,
                    segment.order
                ],
            )?;
        }
        tx.commit()?;
        Ok(())
    }
}

fn set_column(conn: &Connection, id: &str, column: &str, value: Option<&str>) -> Result<()> {
    let sql = format!("UPDATE dreams SET {column} = ?1 WHERE id = ?2");
    let updated = conn.execute(&sql, params![value, id])?;
    if updated == 0 {
        return Err(Error::DreamNotFound(id.to_string()));
    }
    Ok(())
}

#[cfg(test)]
#[path = "db_tests.rs"]
mod tests;
