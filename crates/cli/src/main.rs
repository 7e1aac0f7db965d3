// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![deny(unsafe_code)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

use std::fs;
use std::path::Path;

use clap::Parser;
use snrs::config::{resolve_data_dir, LOG_FILE_NAME};
use snrs::{env, Cli};

fn main() {
    let cli = Cli::parse();
    let result = resolve_data_dir(cli.data_dir.as_deref()).and_then(|data_dir| {
        setup_logging(&data_dir);
        snrs::run(cli.command, &data_dir, cli.offline)
    });
    if let Err(e) = result {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn setup_logging(data_dir: &Path) {
    use tracing_subscriber::EnvFilter;

    let filter = env::log_filter()
        .and_then(|directive| EnvFilter::try_new(directive).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new("info"));

    // Try to open log file, fall back to stderr
    let file = fs::create_dir_all(data_dir).and_then(|()| {
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(data_dir.join(LOG_FILE_NAME))
    });
    if let Ok(file) = file {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(file)
            .with_ansi(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}
