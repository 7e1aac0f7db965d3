// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;

#[test]
fn test_initial_state_follows_connectivity() {
    assert_eq!(SharedSyncState::new(true).get(), SyncState::OnlineIdle);
    assert_eq!(SharedSyncState::new(false).get(), SyncState::Offline);
}

#[test]
fn test_set_reported_returns_previous_value() {
    let state = SharedSyncState::new(false);
    assert!(!state.set_reported(true));
    assert!(state.is_online());
    assert!(state.set_reported(false));
    assert!(!state.is_online());
}

#[test]
fn test_forced_value_wins_over_reported() {
    let state = SharedSyncState::new(true);

    assert!(state.force_online(Some(false)));
    assert_eq!(state.forced(), Some(false));
    assert!(!state.is_online());

    state.set_reported(true);
    assert!(!state.is_online());

    assert!(!state.force_online(None));
    assert_eq!(state.forced(), None);
    assert!(state.is_online());

    state.set_reported(false);
    state.force_online(Some(true));
    assert!(state.is_online());
}

#[test]
fn test_drain_guard_clears_draining_on_drop() {
    let state = SharedSyncState::new(true);
    {
        let _guard = state.begin_drain();
        assert!(state.is_draining());
        assert_eq!(state.get(), SyncState::OnlineDraining);
    }
    assert!(!state.is_draining());
    assert_eq!(state.get(), SyncState::OnlineIdle);
}

#[test]
fn test_offline_takes_precedence_over_draining() {
    let state = SharedSyncState::new(true);
    let _guard = state.begin_drain();
    state.set_reported(false);
    assert_eq!(state.get(), SyncState::Offline);
}

#[test]
fn test_pending_mirror() {
    let state = SharedSyncState::new(false);
    assert_eq!(state.pending(), 0);
    state.set_pending(3);
    assert_eq!(state.pending(), 3);
}

#[test]
fn test_sync_state_display_and_json() {
    assert_eq!(SyncState::OnlineDraining.to_string(), "online (draining)");
    assert_eq!(
        serde_json::to_string(&SyncState::OnlineIdle).unwrap(),
        "\"online_idle\""
    );
}
