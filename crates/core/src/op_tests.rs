// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use yare::parameterized;

fn ts() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2026-03-01T07:30:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

#[parameterized(
    insert_new = { OpPayload::insert_new("d1".into(), "Title".into(), ts()), "insert_new" },
    append_segment = { OpPayload::append_segment("d1".into(), Segment::new("s1", "a.m4a", 2.0, 1)), "append_segment" },
    remove_segment = { OpPayload::remove_segment("d1".into(), "s1".into()), "remove_segment" },
    mark_completed = { OpPayload::mark_completed("d1".into()), "mark_completed" },
    update_title = { OpPayload::update_title("d1".into(), "T".into()), "update_title" },
    update_summary = { OpPayload::update_summary("d1".into(), "S".into()), "update_summary" },
    update_both = { OpPayload::update_title_and_summary("d1".into(), "T".into(), "S".into()), "update_title_and_summary" },
    delete_dream = { OpPayload::delete_dream("d1".into()), "delete_dream" },
    request_analysis = { OpPayload::request_analysis("d1".into()), "request_analysis" },
    generate_image = { OpPayload::generate_image("d1".into(), "moonlit sea".into()), "generate_image" },
)]
fn payload_kind_matches_wire_tag(payload: OpPayload, kind: &str) {
    assert_eq!(payload.kind(), kind);
    assert_eq!(payload.dream_id(), "d1");

    let json = serde_json::to_value(&payload).unwrap();
    assert_eq!(json["kind"], kind);
}

#[test]
fn needs_reply_only_for_direct_result_kinds() {
    assert!(OpPayload::mark_completed("d1".into()).needs_reply());
    assert!(OpPayload::generate_image("d1".into(), "p".into()).needs_reply());
    assert!(!OpPayload::update_title("d1".into(), "t".into()).needs_reply());
    assert!(!OpPayload::request_analysis("d1".into()).needs_reply());
}

#[test]
fn op_json_format() {
    let op = Op::from(OpPayload::update_title("d1".into(), "New".into()));
    let json = serde_json::to_string(&op).unwrap();
    assert!(json.contains("\"kind\":\"update_title\""));
    assert!(json.contains("\"payload\":{"));
    assert!(json.contains("\"title\":\"New\""));
}

#[test]
fn known_kind_decodes_as_known() {
    let json = r#"{"kind":"delete_dream","payload":{"dream_id":"d7"}}"#;
    let op: Op = serde_json::from_str(json).unwrap();
    assert!(op.is_known());
    assert_eq!(op.dream_id(), Some("d7"));
    assert_eq!(op.payload(), Some(&OpPayload::delete_dream("d7".into())));
}

#[test]
fn unknown_kind_is_preserved() {
    let json = r#"{"kind":"score_archetype","payload":{"dream_id":"d7","model":"v2"}}"#;
    let op: Op = serde_json::from_str(json).unwrap();

    assert!(!op.is_known());
    assert_eq!(op.kind(), "score_archetype");
    assert_eq!(op.dream_id(), None);

    let reencoded: serde_json::Value = serde_json::to_value(&op).unwrap();
    let original: serde_json::Value = serde_json::from_str(json).unwrap();
    assert_eq!(reencoded, original);
}

#[test]
fn unknown_kind_without_payload() {
    let op: Op = serde_json::from_str(r#"{"kind":"ping_backend"}"#).unwrap();
    assert_eq!(op.kind(), "ping_backend");
    assert!(matches!(op, Op::Unknown(UnknownOp { payload: serde_json::Value::Null, .. })));
}
