// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access.
//!
//! The variable name constants are generated by `build.rs` and live in the
//! [`vars`] submodule.

use std::path::PathBuf;

/// Generated environment variable name constants.
pub mod vars {
    include!(concat!(env!("OUT_DIR"), "/env_vars.rs"));
}

/// Returns the value of `SOMNA_DATA_DIR` if set.
pub fn data_dir() -> Option<PathBuf> {
    std::env::var(vars::SOMNA_DATA_DIR).ok().map(PathBuf::from)
}

/// Returns the value of `XDG_DATA_HOME` if set.
pub fn xdg_data_home() -> Option<PathBuf> {
    std::env::var(vars::XDG_DATA_HOME).ok().map(PathBuf::from)
}

/// Returns the log filter directive from `SOMNA_LOG` if set.
pub fn log_filter() -> Option<String> {
    std::env::var(vars::SOMNA_LOG).ok()
}

/// Returns `true` if `SOMNA_OFFLINE=1`.
pub fn offline() -> bool {
    std::env::var(vars::SOMNA_OFFLINE).is_ok_and(|v| v == "1")
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
