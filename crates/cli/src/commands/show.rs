// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::io::Write;

use serde::Serialize;
use sn_core::Dream;

use crate::cli::OutputFormat;
use crate::display::{format_dream_details, format_dream_line};
use crate::error::Result;
use crate::sync::RemoteStore;

use super::{print_json, Coordinator};

#[derive(Serialize)]
struct DreamDetails {
    #[serde(flatten)]
    dream: Dream,
    /// Queued operations touching this dream.
    pending: usize,
}

pub fn list<R: RemoteStore>(
    c: &Coordinator<R>,
    output: OutputFormat,
    out: &mut impl Write,
) -> Result<()> {
    let dreams = c.all_dreams()?;
    match output {
        OutputFormat::Json => print_json(out, &dreams)?,
        OutputFormat::Text => {
            for dream in &dreams {
                writeln!(out, "{}", format_dream_line(dream))?;
            }
        }
    }
    Ok(())
}

pub async fn show<R: RemoteStore>(
    c: &Coordinator<R>,
    id: &str,
    output: OutputFormat,
    out: &mut impl Write,
) -> Result<()> {
    let dream = c.get_dream(id)?;
    let pending = c
        .queued()
        .await
        .iter()
        .filter(|e| e.op.dream_id() == Some(id))
        .count();

    match output {
        OutputFormat::Text => writeln!(out, "{}", format_dream_details(&dream, pending))?,
        OutputFormat::Json => print_json(out, &DreamDetails { dream, pending })?,
    }
    Ok(())
}

#[cfg(test)]
#[path = "show_tests.rs"]
mod tests;
