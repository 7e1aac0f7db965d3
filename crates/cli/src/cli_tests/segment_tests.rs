// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use super::*;
use yare::parameterized;

fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
    Cli::try_parse_from(args)
}

#[test]
fn test_segment_add() {
    let cli = parse(&[
        "somna", "segment", "add", "dream-1", "a.m4a", "--duration", "12.5", "--order", "3",
    ])
    .unwrap();
    match cli.command {
        Command::Segment(SegmentCommand::Add {
            id,
            file,
            duration,
            order,
        }) => {
            assert_eq!(id, "dream-1");
            assert_eq!(file, "a.m4a");
            assert_eq!(duration, 12.5);
            assert_eq!(order, 3);
        }
        _ => panic!("Expected segment add"),
    }
}

#[parameterized(
    missing_order = { &["somna", "segment", "add", "d", "a.m4a", "--duration", "1"] },
    missing_duration = { &["somna", "segment", "add", "d", "a.m4a", "--order", "1"] },
    negative_duration = { &["somna", "segment", "add", "d", "a.m4a", "--duration=-1", "--order", "1"] },
    not_a_number = { &["somna", "segment", "add", "d", "a.m4a", "--duration", "long", "--order", "1"] },
    negative_order = { &["somna", "segment", "add", "d", "a.m4a", "--duration", "1", "--order=-1"] },
)]
fn test_segment_add_invalid(args: &[&str]) {
    assert!(parse(args).is_err());
}

#[test]
fn test_segment_rm() {
    let cli = parse(&["somna", "segment", "rm", "dream-1", "seg-9"]).unwrap();
    assert!(matches!(
        cli.command,
        Command::Segment(SegmentCommand::Rm { id, segment_id }) if id == "dream-1" && segment_id == "seg-9"
    ));
}
