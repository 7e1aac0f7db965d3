// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use serde_json::Value;
use sn_core::Dream;
use tempfile::tempdir;

use super::*;
use crate::error::Error;
use crate::sync::test_helpers::{open_coordinator, MockRemote};

#[tokio::test]
async fn list_text_one_line_per_dream() {
    let dir = tempdir().unwrap();
    let c = open_coordinator(dir.path(), MockRemote::new(), false);
    let first = c.insert_new("Cliffs").await.unwrap();
    c.append_segment(&first.id, "a.m4a", 65.0, 1).await.unwrap();
    c.insert_new("Rain").await.unwrap();
    let mut out = Vec::new();

    list(&c, OutputFormat::Text, &mut out).unwrap();

    let printed = String::from_utf8(out).unwrap();
    assert_eq!(printed.lines().count(), 2);
    assert!(printed.contains(&format!("- [draft] {}: Cliffs (1 segment, 1:05)", first.id)));
    assert!(printed.contains("Rain (0 segments, 0:00)"));
}

#[tokio::test]
async fn list_json_is_an_array() {
    let dir = tempdir().unwrap();
    let c = open_coordinator(dir.path(), MockRemote::new(), false);
    c.insert_new("One").await.unwrap();
    let mut out = Vec::new();

    list(&c, OutputFormat::Json, &mut out).unwrap();

    let dreams: Vec<Dream> = serde_json::from_slice(&out).unwrap();
    assert_eq!(dreams.len(), 1);
    assert_eq!(dreams[0].title, "One");
}

#[test]
fn list_empty_prints_nothing() {
    let dir = tempdir().unwrap();
    let c = open_coordinator(dir.path(), MockRemote::new(), false);
    let mut out = Vec::new();

    list(&c, OutputFormat::Text, &mut out).unwrap();

    assert!(out.is_empty());
}

#[tokio::test]
async fn show_text_includes_pending_count() {
    let dir = tempdir().unwrap();
    let c = open_coordinator(dir.path(), MockRemote::new(), false);
    let dream = c.insert_new("Tunnel").await.unwrap();
    c.update_summary(&dream.id, "dark and long").await.unwrap();
    let other = c.insert_new("Unrelated").await.unwrap();
    let mut out = Vec::new();

    show(&c, &dream.id, OutputFormat::Text, &mut out)
        .await
        .unwrap();

    let printed = String::from_utf8(out).unwrap();
    assert!(printed.starts_with(&format!("[draft] {}\n", dream.id)));
    assert!(printed.contains("Title: Tunnel"));
    assert!(printed.contains("Pending sync: 2"));
    assert!(printed.contains("Summary:"));
    assert!(!printed.contains(&other.id));
}

#[tokio::test]
async fn show_json_flattens_dream() {
    let dir = tempdir().unwrap();
    let c = open_coordinator(dir.path(), MockRemote::new(), false);
    let dream = c.insert_new("Tunnel").await.unwrap();
    let mut out = Vec::new();

    show(&c, &dream.id, OutputFormat::Json, &mut out)
        .await
        .unwrap();

    let value: Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(value["id"], dream.id.as_str());
    assert_eq!(value["title"], "Tunnel");
    assert_eq!(value["state"], "draft");
    assert_eq!(value["pending"], 1);
}

#[tokio::test]
async fn show_unknown_dream_fails() {
    let dir = tempdir().unwrap();
    let c = open_coordinator(dir.path(), MockRemote::new(), false);
    let mut out = Vec::new();

    let err = show(&c, "dr-missing", OutputFormat::Text, &mut out)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::DreamNotFound(_)));
}
