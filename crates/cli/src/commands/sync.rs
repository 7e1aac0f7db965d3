// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::io::Write;

use serde::Serialize;

use crate::cli::OutputFormat;
use crate::display::{format_drain_report, format_queued_op};
use crate::error::Result;
use crate::sync::{DrainReport, DrainStop, QueuedOp, RemoteStore, SyncState};

use super::{print_json, Coordinator};

#[derive(Serialize)]
struct PendingStatus {
    state: SyncState,
    #[serde(skip_serializing_if = "Option::is_none")]
    forced_online: Option<bool>,
    pending: usize,
    entries: Vec<QueuedOp>,
}

#[derive(Serialize)]
struct RejectedOp {
    sequence: u64,
    kind: String,
    dream_id: Option<String>,
    error: String,
}

#[derive(Serialize)]
struct SyncSummary {
    delivered: usize,
    rejected: Vec<RejectedOp>,
    remaining: usize,
    stop: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl From<&DrainReport> for SyncSummary {
    fn from(report: &DrainReport) -> Self {
        let (stop, error) = match &report.stop {
            DrainStop::Empty => ("empty", None),
            DrainStop::Failed(e) => ("failed", Some(e.to_string())),
            DrainStop::Cancelled => ("cancelled", None),
            DrainStop::Offline => ("offline", None),
            DrainStop::Coalesced => ("coalesced", None),
        };
        SyncSummary {
            delivered: report.delivered,
            rejected: report
                .rejected
                .iter()
                .map(|r| RejectedOp {
                    sequence: r.sequence,
                    kind: r.kind.clone(),
                    dream_id: r.dream_id.clone(),
                    error: r.error.to_string(),
                })
                .collect(),
            remaining: report.remaining,
            stop,
            error,
        }
    }
}

pub async fn pending<R: RemoteStore>(
    c: &Coordinator<R>,
    output: OutputFormat,
    out: &mut impl Write,
) -> Result<()> {
    let entries = c.queued().await;
    match output {
        OutputFormat::Json => print_json(
            out,
            &PendingStatus {
                state: c.state(),
                forced_online: c.forced_online(),
                pending: entries.len(),
                entries,
            },
        )?,
        OutputFormat::Text => {
            match c.forced_online() {
                Some(true) => writeln!(out, "State: {} (forced online)", c.state())?,
                Some(false) => writeln!(out, "State: {} (forced offline)", c.state())?,
                None => writeln!(out, "State: {}", c.state())?,
            }
            writeln!(out, "Pending: {}", entries.len())?;
            for entry in &entries {
                writeln!(out, "  {}", format_queued_op(entry))?;
            }
        }
    }
    Ok(())
}

/// Deliver the queue now, as if the app came to the foreground.
pub async fn sync<R: RemoteStore>(
    c: &Coordinator<R>,
    output: OutputFormat,
    out: &mut impl Write,
) -> Result<()> {
    let report = c.app_foregrounded().await?;
    match output {
        OutputFormat::Json => print_json(out, &SyncSummary::from(&report))?,
        OutputFormat::Text => {
            for line in format_drain_report(&report) {
                writeln!(out, "{line}")?;
            }
        }
    }
    Ok(())
}

pub async fn refresh<R: RemoteStore>(
    c: &Coordinator<R>,
    id: &str,
    output: OutputFormat,
    out: &mut impl Write,
) -> Result<()> {
    c.refresh_dream(id).await?;
    super::show::show(c, id, output, out).await
}

#[cfg(test)]
#[path = "sync_tests.rs"]
mod tests;
