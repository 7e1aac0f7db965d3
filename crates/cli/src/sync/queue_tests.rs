// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Tests for the operation queue module.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use super::test_helpers::make_insert_op;
use super::*;
use sn_core::OpPayload;
use tempfile::tempdir;

fn titles(queue: &OperationQueue) -> Vec<String> {
    queue
        .entries()
        .filter_map(|e| match e.op.payload() {
            Some(OpPayload::InsertNew { title, .. }) => Some(title.clone()),
            _ => None,
        })
        .collect()
}

#[test]
fn test_queue_missing_file_is_empty() {
    let dir = tempdir().unwrap();
    let queue = OperationQueue::open_in(dir.path()).unwrap();
    assert!(queue.is_empty());
    assert_eq!(queue.next_sequence(), 1);
    assert!(!dir.path().join(QUEUE_FILE_NAME).exists());
}

#[test]
fn test_queue_empty_file_is_empty() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join(QUEUE_FILE_NAME), "").unwrap();
    let queue = OperationQueue::open_in(dir.path()).unwrap();
    assert_eq!(queue.len(), 0);
}

#[test]
fn test_enqueue_assigns_increasing_sequences() {
    let dir = tempdir().unwrap();
    let mut queue = OperationQueue::open_in(dir.path()).unwrap();

    let first = queue.enqueue(make_insert_op("d1", "first")).unwrap();
    let second = queue.enqueue(make_insert_op("d2", "second")).unwrap();

    assert_eq!((first, second), (1, 2));
    assert_eq!(queue.peek_front().unwrap().sequence, 1);
    assert_eq!(titles(&queue), vec!["first", "second"]);
}

#[test]
fn test_enqueue_into_empty_and_non_empty_queue_keeps_order() {
    let dir = tempdir().unwrap();
    let mut queue = OperationQueue::open_in(dir.path()).unwrap();
    queue.enqueue(make_insert_op("d1", "a")).unwrap();

    let reopened = OperationQueue::open_in(dir.path()).unwrap();
    assert_eq!(titles(&reopened), vec!["a"]);

    queue.enqueue(make_insert_op("d2", "b")).unwrap();
    queue.enqueue(make_insert_op("d3", "c")).unwrap();

    let reopened = OperationQueue::open_in(dir.path()).unwrap();
    assert_eq!(titles(&reopened), vec!["a", "b", "c"]);
    let sequences: Vec<u64> = reopened.entries().map(|e| e.sequence).collect();
    assert_eq!(sequences, vec![1, 2, 3]);
}

#[test]
fn test_contents_survive_reopen() {
    let dir = tempdir().unwrap();
    {
        let mut queue = OperationQueue::open_in(dir.path()).unwrap();
        queue.enqueue(make_insert_op("d1", "kept")).unwrap();
    }
    let queue = OperationQueue::open_in(dir.path()).unwrap();
    assert_eq!(queue.len(), 1);
    assert_eq!(queue.peek_front().unwrap().op.kind(), "insert_new");
}

#[test]
fn test_dequeue_front_only_removes_expected_head() {
    let dir = tempdir().unwrap();
    let mut queue = OperationQueue::open_in(dir.path()).unwrap();
    queue.enqueue(make_insert_op("d1", "first")).unwrap();
    queue.enqueue(make_insert_op("d2", "second")).unwrap();

    assert!(queue.dequeue_front(2).unwrap().is_none());
    assert_eq!(queue.len(), 2);

    let removed = queue.dequeue_front(1).unwrap().unwrap();
    assert_eq!(removed.sequence, 1);
    assert_eq!(titles(&queue), vec!["second"]);

    let reopened = OperationQueue::open_in(dir.path()).unwrap();
    assert_eq!(titles(&reopened), vec!["second"]);
}

#[test]
fn test_next_sequence_never_decreases() {
    let dir = tempdir().unwrap();
    {
        let mut queue = OperationQueue::open_in(dir.path()).unwrap();
        queue.enqueue(make_insert_op("d1", "a")).unwrap();
        queue.enqueue(make_insert_op("d2", "b")).unwrap();
        queue.dequeue_front(1).unwrap();
        queue.dequeue_front(2).unwrap();
        assert!(queue.is_empty());
    }

    let mut queue = OperationQueue::open_in(dir.path()).unwrap();
    assert_eq!(queue.next_sequence(), 3);
    assert_eq!(queue.enqueue(make_insert_op("d3", "c")).unwrap(), 3);
}

#[test]
fn test_record_attempt_is_persisted() {
    let dir = tempdir().unwrap();
    let mut queue = OperationQueue::open_in(dir.path()).unwrap();
    let seq = queue.enqueue(make_insert_op("d1", "a")).unwrap();

    queue.record_attempt(seq).unwrap();
    queue.record_attempt(seq).unwrap();
    queue.record_attempt(99).unwrap();

    let reopened = OperationQueue::open_in(dir.path()).unwrap();
    assert_eq!(reopened.peek_front().unwrap().attempt_count, 2);
}

#[test]
fn test_enqueue_purging_removes_only_that_dream() {
    let dir = tempdir().unwrap();
    let mut queue = OperationQueue::open_in(dir.path()).unwrap();
    queue.enqueue(make_insert_op("d1", "a")).unwrap();
    queue.enqueue(make_insert_op("d2", "b")).unwrap();
    queue
        .enqueue(OpPayload::update_title("d1".into(), "a2".into()).into())
        .unwrap();

    let (sequence, purged) = queue
        .enqueue_purging("d1", OpPayload::delete_dream("d1".into()).into())
        .unwrap();

    assert_eq!((sequence, purged), (4, 2));
    let kinds: Vec<_> = queue.entries().map(|e| e.op.kind().to_string()).collect();
    assert_eq!(kinds, vec!["insert_new", "delete_dream"]);

    let reopened = OperationQueue::open_in(dir.path()).unwrap();
    assert_eq!(reopened.len(), 2);
    assert_eq!(reopened.next_sequence(), 5);
}

#[test]
fn test_enqueue_purging_failed_write_keeps_queue_intact() {
    let dir = tempdir().unwrap();
    let mut queue = OperationQueue::open_in(dir.path()).unwrap();
    queue.enqueue(make_insert_op("d1", "a")).unwrap();
    queue
        .enqueue(OpPayload::update_title("d1".into(), "a2".into()).into())
        .unwrap();

    // The temp file cannot be created while a directory occupies its path.
    let tmp = dir.path().join(QUEUE_FILE_NAME).with_extension("json.tmp");
    std::fs::create_dir(&tmp).unwrap();

    let result = queue.enqueue_purging("d1", OpPayload::delete_dream("d1".into()).into());

    assert!(result.is_err());
    assert_eq!(queue.len(), 2);
    assert_eq!(queue.next_sequence(), 3);
    std::fs::remove_dir(&tmp).unwrap();
    let reopened = OperationQueue::open_in(dir.path()).unwrap();
    let kinds: Vec<_> = reopened.entries().map(|e| e.op.kind().to_string()).collect();
    assert_eq!(kinds, vec!["insert_new", "update_title"]);
}

#[test]
fn test_document_format() {
    let dir = tempdir().unwrap();
    let mut queue = OperationQueue::open_in(dir.path()).unwrap();
    queue.enqueue(make_insert_op("d1", "first")).unwrap();

    let text = std::fs::read_to_string(dir.path().join(QUEUE_FILE_NAME)).unwrap();
    let doc: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(doc["version"], 1);
    assert_eq!(doc["next_sequence"], 2);
    let entry = &doc["entries"][0];
    assert_eq!(entry["sequence"], 1);
    assert_eq!(entry["kind"], "insert_new");
    assert_eq!(entry["payload"]["title"], "first");
    assert_eq!(entry["attempt_count"], 0);
    assert!(entry["enqueued_at"].is_string());
}

#[test]
fn test_no_temp_file_left_behind() {
    let dir = tempdir().unwrap();
    let mut queue = OperationQueue::open_in(dir.path()).unwrap();
    queue.enqueue(make_insert_op("d1", "a")).unwrap();

    let names: Vec<String> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec![QUEUE_FILE_NAME.to_string()]);
}

#[test]
fn test_unknown_kind_is_loaded_and_preserved() {
    let dir = tempdir().unwrap();
    let path = dir.path().join(QUEUE_FILE_NAME);
    std::fs::write(
        &path,
        r#"{
          "version": 1,
          "next_sequence": 3,
          "entries": [
            {"sequence": 1, "kind": "share_dream", "payload": {"dream_id": "d1", "with": "friend"},
             "enqueued_at": "2026-01-01T00:00:00Z", "attempt_count": 0},
            {"sequence": 2, "kind": "update_title", "payload": {"dream_id": "d1", "title": "t"},
             "enqueued_at": "2026-01-01T00:00:01Z"}
          ]
        }"#,
    )
    .unwrap();

    let mut queue = OperationQueue::open(&path).unwrap();
    assert_eq!(queue.len(), 2);
    let head = queue.peek_front().unwrap();
    assert_eq!(head.op.kind(), "share_dream");
    assert!(!head.op.is_known());
    assert_eq!(queue.entries().nth(1).unwrap().op.kind(), "update_title");

    // Rewriting the document keeps the unknown entry intact.
    queue.enqueue(make_insert_op("d2", "x")).unwrap();
    let doc: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(doc["entries"][0]["kind"], "share_dream");
    assert_eq!(doc["entries"][0]["payload"]["with"], "friend");
    assert_eq!(doc["entries"][2]["sequence"], 3);
}

#[test]
fn test_unsupported_version_fails() {
    let dir = tempdir().unwrap();
    let path = dir.path().join(QUEUE_FILE_NAME);
    std::fs::write(&path, r#"{"version": 9, "next_sequence": 1, "entries": []}"#).unwrap();
    assert!(matches!(
        OperationQueue::open(&path),
        Err(QueueError::UnsupportedVersion(9))
    ));
}

#[test]
fn test_corrupt_document_fails() {
    let dir = tempdir().unwrap();
    let path = dir.path().join(QUEUE_FILE_NAME);
    std::fs::write(&path, "{not json").unwrap();
    assert!(matches!(
        OperationQueue::open(&path),
        Err(QueueError::Serialization(_))
    ));
}

#[test]
fn test_persist_failure_leaves_memory_unchanged() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("gone").join(QUEUE_FILE_NAME);
    let mut queue = OperationQueue::open(&missing).unwrap();

    assert!(matches!(
        queue.enqueue(make_insert_op("d1", "a")),
        Err(QueueError::Io(_))
    ));
    assert!(queue.is_empty());
    assert_eq!(queue.next_sequence(), 1);
}
