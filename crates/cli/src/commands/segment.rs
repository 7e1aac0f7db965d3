// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::io::Write;

use crate::display::format_duration;
use crate::error::{Error, Result};
use crate::sync::RemoteStore;

use super::Coordinator;

pub async fn add<R: RemoteStore>(
    c: &Coordinator<R>,
    id: &str,
    file: &str,
    duration_secs: f64,
    order: u32,
    out: &mut impl Write,
) -> Result<()> {
    let dream = c.append_segment(id, file, duration_secs, order).await?;
    let segment = dream
        .segments
        .iter()
        .find(|s| s.order == order)
        .ok_or_else(|| Error::CorruptedData(format!("segment {order} missing after append")))?;
    writeln!(
        out,
        "Added {} to {id} ({} total)",
        segment.id,
        format_duration(dream.total_duration_secs())
    )?;
    Ok(())
}

pub async fn remove<R: RemoteStore>(
    c: &Coordinator<R>,
    id: &str,
    segment_id: &str,
    out: &mut impl Write,
) -> Result<()> {
    if !c.segments(id)?.iter().any(|s| s.id == segment_id) {
        return Err(Error::SegmentNotFound {
            dream_id: id.to_string(),
            segment_id: segment_id.to_string(),
        });
    }
    c.remove_segment(id, segment_id).await?;
    writeln!(out, "Removed {segment_id} from {id}")?;
    Ok(())
}

#[cfg(test)]
#[path = "segment_tests.rs"]
mod tests;
