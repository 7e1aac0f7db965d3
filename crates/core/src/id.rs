// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Opaque id generation for dreams and segments.

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

/// Prefix for dream ids.
pub const DREAM_PREFIX: &str = "dream";
/// Prefix for segment ids.
pub const SEGMENT_PREFIX: &str = "seg";

/// Generate an id from prefix, seed text, and timestamp.
/// Format: {prefix}-{hash} where hash is first 12 hex chars of SHA256(seed + timestamp)
pub fn generate_id(prefix: &str, seed: &str, at: &DateTime<Utc>) -> String {
    let input = format!("{}{}", seed, at.to_rfc3339_opts(chrono::SecondsFormat::Nanos, true));
    let hash = Sha256::digest(input.as_bytes());
    format!("{}-{}", prefix, hex::encode(&hash[..6]))
}

/// Generate a unique id, handling collisions by appending an incrementing suffix.
pub fn generate_unique_id<F>(prefix: &str, seed: &str, at: &DateTime<Utc>, exists: F) -> String
where
    F: Fn(&str) -> bool,
{
    let base_id = generate_id(prefix, seed, at);

    if !exists(&base_id) {
        return base_id;
    }

    let mut suffix = 2;
    loop {
        let id = format!("{}-{}", base_id, suffix);
        if !exists(&id) {
            return id;
        }
        suffix += 1;
    }
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
