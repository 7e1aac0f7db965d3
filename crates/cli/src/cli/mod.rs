// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Parse a string that must not be empty or whitespace-only.
fn non_empty_string(s: &str) -> Result<String, String> {
    if s.trim().is_empty() {
        Err("cannot be empty".to_string())
    } else {
        Ok(s.to_string())
    }
}

/// Parse a segment duration in seconds.
fn duration_secs(s: &str) -> Result<f64, String> {
    let secs: f64 = s.parse().map_err(|_| format!("'{s}' is not a number"))?;
    if secs.is_finite() && secs >= 0.0 {
        Ok(secs)
    } else {
        Err("must be a non-negative number of seconds".to_string())
    }
}

/// Output format for commands supporting structured output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Parser)]
#[command(name = "somna")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "An offline-first dream journal")]
#[command(
    long_about = "An offline-first dream journal.\n\n\
    Every change is saved locally first and delivered to the backend in order \
    once it is reachable."
)]
pub struct Cli {
    /// Use <dir> as the data directory
    #[arg(short = 'C', long = "data-dir", global = true, value_name = "dir")]
    pub data_dir: Option<PathBuf>,

    /// Do not contact the remote; changes stay queued
    #[arg(long, global = true)]
    pub offline: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start a new dream
    #[command(after_help = "\
Examples:
  somna new \"Flying over the city\"        Create a draft dream
  somna new \"Falling\" -o json             Print the new dream as JSON")]
    New {
        /// Title of the dream
        #[arg(value_parser = non_empty_string)]
        title: String,

        /// Output format (text, json)
        #[arg(long = "output", short = 'o', value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// Add or remove recorded segments
    #[command(subcommand)]
    Segment(SegmentCommand),

    /// Change a dream's title (and optionally its summary)
    Title {
        /// Dream ID
        id: String,

        /// New title
        #[arg(value_parser = non_empty_string)]
        title: String,

        /// Also replace the summary
        #[arg(long, short)]
        summary: Option<String>,
    },

    /// Change a dream's summary
    Summary {
        /// Dream ID
        id: String,

        /// New summary
        summary: String,
    },

    /// Finish capture and hand the dream to the backend
    Complete {
        /// Dream ID
        id: String,

        /// Output format (text, json)
        #[arg(long = "output", short = 'o', value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// Ask the backend to analyze a dream
    Analyze {
        /// Dream ID
        id: String,
    },

    /// Generate an image for a dream
    Image {
        /// Dream ID
        id: String,

        /// Prompt for the image
        #[arg(value_parser = non_empty_string)]
        prompt: String,

        /// Output format (text, json)
        #[arg(long = "output", short = 'o', value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// Delete a dream
    Delete {
        /// Dream ID
        id: String,
    },

    /// List dreams
    List {
        /// Output format (text, json)
        #[arg(long = "output", short = 'o', value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// Show dream details
    Show {
        /// Dream ID
        id: String,

        /// Output format (text, json)
        #[arg(long = "output", short = 'o', value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// Show operations waiting for the remote
    Pending {
        /// Output format (text, json)
        #[arg(long = "output", short = 'o', value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// Deliver queued operations now
    Sync {
        /// Output format (text, json)
        #[arg(long = "output", short = 'o', value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// Replace the local copy of a dream with the backend's
    Refresh {
        /// Dream ID
        id: String,

        /// Output format (text, json)
        #[arg(long = "output", short = 'o', value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// Keep syncing until interrupted
    ///
    /// Probes the remote, drains the queue when it becomes reachable, retries
    /// periodically and merges upload results pushed by the backend.
    Watch,
}

/// Segment subcommands.
#[derive(Subcommand)]
pub enum SegmentCommand {
    /// Append a recorded segment
    #[command(after_help = "\
Examples:
  somna segment add dream-ab12 clip1.m4a --duration 42.5 --order 1")]
    Add {
        /// Dream ID
        id: String,

        /// Audio file name
        #[arg(value_parser = non_empty_string)]
        file: String,

        /// Length in seconds
        #[arg(long, value_parser = duration_secs)]
        duration: f64,

        /// Position; must be greater than every existing segment's order
        #[arg(long)]
        order: u32,
    },

    /// Remove a segment
    Rm {
        /// Dream ID
        id: String,

        /// Segment ID
        segment_id: String,
    },
}

#[cfg(test)]
#[path = "../cli_tests/mod.rs"]
mod tests;
