// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use sn_core::{Dream, Segment};

use crate::sync::{DrainReport, DrainStop, QueuedOp};

/// Maximum line width for wrapped text content (excluding 4-space indent).
const WRAP_WIDTH: usize = 96;

/// Wrap text at word boundaries if it's a single line.
///
/// - If content contains newlines: return as-is (preserve user formatting)
/// - If content is single line >width: wrap at word boundaries
/// - If content is single line <=width: return as-is
pub fn wrap_text(content: &str, width: usize) -> String {
    if content.contains('\n') || content.len() <= width {
        return content.to_string();
    }

    let mut result = String::new();
    let mut current_line = String::new();

    for word in content.split_whitespace() {
        if current_line.is_empty() {
            current_line = word.to_string();
        } else if current_line.len() + 1 + word.len() <= width {
            current_line.push(' ');
            current_line.push_str(word);
        } else {
            if !result.is_empty() {
                result.push('\n');
            }
            result.push_str(&current_line);
            current_line = word.to_string();
        }
    }

    if !current_line.is_empty() {
        if !result.is_empty() {
            result.push('\n');
        }
        result.push_str(&current_line);
    }

    result
}

/// Format a labelled block of free text.
///
/// Output format:
/// ```text
/// Transcript:
///     Content goes here, potentially
///     wrapped across multiple lines.
/// ```
pub fn format_text_block(label: &str, content: &str) -> Vec<String> {
    let mut lines = vec![format!("{label}:")];
    for line in wrap_text(content, WRAP_WIDTH).lines() {
        lines.push(format!("    {line}"));
    }
    lines
}

/// Format seconds as `m:ss`, or `h:mm:ss` past an hour.
pub fn format_duration(secs: f64) -> String {
    let total = secs.max(0.0).round() as u64;
    let (hours, minutes, seconds) = (total / 3600, (total % 3600) / 60, total % 60);
    if hours > 0 {
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes}:{seconds:02}")
    }
}

/// Format a single dream line for list output
pub fn format_dream_line(dream: &Dream) -> String {
    let count = dream.segments.len();
    let noun = if count == 1 { "segment" } else { "segments" };
    format!(
        "- [{}] {}: {} ({count} {noun}, {})",
        dream.state,
        dream.id,
        dream.title,
        format_duration(dream.total_duration_secs())
    )
}

pub fn format_segment(segment: &Segment) -> String {
    format!(
        "  #{} {} {} ({})",
        segment.order,
        segment.id,
        segment.filename,
        format_duration(segment.duration_secs)
    )
}

/// Format dream details for the show command
pub fn format_dream_details(dream: &Dream, pending: usize) -> String {
    let mut output = Vec::new();

    output.push(format!("[{}] {}", dream.state, dream.id));
    output.push(format!("Title: {}", dream.title));
    output.push(format!(
        "Created: {}",
        dream.created_at.format("%Y-%m-%d %H:%M")
    ));
    if pending > 0 {
        output.push(format!("Pending sync: {pending}"));
    }
    if let Some(prompt) = &dream.image_prompt {
        output.push(format!("Image prompt: {prompt}"));
    }
    if let Some(url) = &dream.image_url {
        output.push(format!("Image: {url}"));
    }

    if !dream.segments.is_empty() {
        output.push(String::new());
        output.push(format!(
            "Segments ({}):",
            format_duration(dream.total_duration_secs())
        ));
        output.extend(dream.segments.iter().map(format_segment));
    }

    let blocks = [
        ("Summary", &dream.summary),
        ("Transcript", &dream.transcript),
        ("Analysis", &dream.analysis),
    ];
    for (label, content) in blocks {
        if let Some(content) = content {
            output.push(String::new());
            output.extend(format_text_block(label, content));
        }
    }

    output.join("\n")
}

/// Format a queued operation for the pending command
pub fn format_queued_op(entry: &QueuedOp) -> String {
    let mut line = format!("#{} {}", entry.sequence, entry.op.kind());
    if let Some(dream_id) = entry.op.dream_id() {
        line.push(' ');
        line.push_str(dream_id);
    }
    if !entry.op.is_known() {
        line.push_str(" (unknown kind)");
    }
    if entry.attempt_count > 0 {
        line.push_str(&format!(" [{} failed attempts]", entry.attempt_count));
    }
    line
}

/// Summarize a drain for the sync command.
pub fn format_drain_report(report: &DrainReport) -> Vec<String> {
    let mut lines = vec![format!(
        "Delivered {}, {} still pending",
        report.delivered, report.remaining
    )];
    for rejection in &report.rejected {
        lines.push(format!(
            "  dropped #{} {}: {}",
            rejection.sequence, rejection.kind, rejection.error
        ));
    }
    match &report.stop {
        DrainStop::Empty => {}
        DrainStop::Failed(e) => lines.push(format!("Stopped: {e}")),
        DrainStop::Cancelled => lines.push("Stopped: cancelled".to_string()),
        DrainStop::Offline => lines.push("Stopped: offline".to_string()),
        DrainStop::Coalesced => lines.push("Another sync is already running".to_string()),
    }
    lines
}

#[cfg(test)]
#[path = "display_tests.rs"]
mod tests;
