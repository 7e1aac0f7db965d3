// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::io::Write;

use sn_core::Dream;

use crate::cli::OutputFormat;
use crate::error::Result;
use crate::sync::{RemoteStore, SyncError, SyncResult};

use super::{print_json, Coordinator};

pub async fn create<R: RemoteStore>(
    c: &Coordinator<R>,
    title: &str,
    output: OutputFormat,
    out: &mut impl Write,
) -> Result<()> {
    let dream = c.insert_new(title).await?;
    match output {
        OutputFormat::Text => writeln!(out, "Created {}: {}", dream.id, dream.title)?,
        OutputFormat::Json => print_json(out, &dream)?,
    }
    Ok(())
}

pub async fn retitle<R: RemoteStore>(
    c: &Coordinator<R>,
    id: &str,
    title: &str,
    summary: Option<&str>,
    out: &mut impl Write,
) -> Result<()> {
    match summary {
        Some(summary) => c.update_title_and_summary(id, title, summary).await?,
        None => c.update_title(id, title).await?,
    };
    writeln!(out, "Updated {id}")?;
    Ok(())
}

pub async fn summarize<R: RemoteStore>(
    c: &Coordinator<R>,
    id: &str,
    summary: &str,
    out: &mut impl Write,
) -> Result<()> {
    c.update_summary(id, summary).await?;
    writeln!(out, "Updated {id}")?;
    Ok(())
}

pub async fn analyze<R: RemoteStore>(
    c: &Coordinator<R>,
    id: &str,
    out: &mut impl Write,
) -> Result<()> {
    c.request_analysis(id).await?;
    writeln!(out, "Requested analysis of {id}")?;
    Ok(())
}

pub async fn delete<R: RemoteStore>(
    c: &Coordinator<R>,
    id: &str,
    out: &mut impl Write,
) -> Result<()> {
    // Deleting an unknown id would still queue a delete; fail instead.
    c.get_dream(id)?;
    c.delete_dream(id).await?;
    writeln!(out, "Deleted {id}")?;
    Ok(())
}

pub async fn complete<R: RemoteStore>(
    c: &Coordinator<R>,
    id: &str,
    output: OutputFormat,
    out: &mut impl Write,
) -> Result<()> {
    let result = c.mark_completed(id).await;
    report_direct(c, id, "Completed", result, output, out)
}

pub async fn image<R: RemoteStore>(
    c: &Coordinator<R>,
    id: &str,
    prompt: &str,
    output: OutputFormat,
    out: &mut impl Write,
) -> Result<()> {
    let result = c.generate_image(id, prompt).await;
    report_direct(c, id, "Image requested for", result, output, out)
}

/// Print the outcome of a call that waits for the backend.
///
/// Deferred and retrying outcomes are not failures: the change is applied
/// locally and stays queued.
fn report_direct<R: RemoteStore>(
    c: &Coordinator<R>,
    id: &str,
    verb: &str,
    result: SyncResult<Dream>,
    output: OutputFormat,
    out: &mut impl Write,
) -> Result<()> {
    let (dream, note) = match result {
        Ok(dream) => (dream, None),
        Err(SyncError::Deferred { sequence }) => (
            c.get_dream(id)?,
            Some(format!("queued as #{sequence} until the remote is reachable")),
        ),
        Err(SyncError::Retrying { sequence, source }) => (
            c.get_dream(id)?,
            Some(format!("delivery failed ({source}); #{sequence} will be retried")),
        ),
        Err(e) => return Err(e.into()),
    };

    match output {
        OutputFormat::Json => print_json(out, &dream)?,
        OutputFormat::Text => match note {
            Some(note) => writeln!(out, "{verb} {id} locally; {note}")?,
            None => writeln!(out, "{verb} {id}")?,
        },
    }
    Ok(())
}

#[cfg(test)]
#[path = "dream_tests.rs"]
mod tests;
