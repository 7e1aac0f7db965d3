// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

// Allow unused items: test helpers are shared across multiple test binaries,
// and not every test file uses every helper.
#![allow(dead_code)]
#![allow(unused_imports)]

use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;

pub use predicates::prelude::*;
pub use tempfile::TempDir;

/// A `somna` command isolated to `data_dir`.
pub fn somna(data_dir: &Path) -> Command {
    let mut cmd = cargo_bin_cmd!("somna");
    cmd.env("SOMNA_DATA_DIR", data_dir)
        .env_remove("SOMNA_OFFLINE")
        .env_remove("SOMNA_LOG");
    cmd
}

/// Point the data directory at a remote.
pub fn write_remote(data_dir: &Path, url: &str) {
    std::fs::write(
        data_dir.join("config.toml"),
        format!("[remote]\nurl = \"{url}\"\n\n[sync]\nsend_timeout_ms = 2000\n"),
    )
    .unwrap();
}

/// Create a dream and return its ID.
pub fn create_dream(data_dir: &Path, title: &str) -> String {
    let output = somna(data_dir).arg("new").arg(title).output().unwrap();
    assert!(output.status.success(), "new failed: {output:?}");

    String::from_utf8_lossy(&output.stdout)
        .split_whitespace()
        .nth(1)
        .unwrap()
        .trim_end_matches(':')
        .to_string()
}

/// Run a command with `-o json` and parse its output.
pub fn json(data_dir: &Path, args: &[&str]) -> serde_json::Value {
    let output = somna(data_dir)
        .args(args)
        .args(["-o", "json"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{args:?} failed: {output:?}");
    serde_json::from_slice(&output.stdout).unwrap()
}
