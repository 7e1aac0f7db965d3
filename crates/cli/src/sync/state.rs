// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Sync state machine.
//!
//! All fields are atomics so diagnostics and triggers can read the state
//! without waiting on the writer lock.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};

use serde::Serialize;

const FORCE_NONE: u8 = 0;
const FORCE_OFFLINE: u8 = 1;
const FORCE_ONLINE: u8 = 2;

/// Externally visible coordinator state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncState {
    Offline,
    OnlineIdle,
    OnlineDraining,
}

impl SyncState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncState::Offline => "offline",
            SyncState::OnlineIdle => "online (idle)",
            SyncState::OnlineDraining => "online (draining)",
        }
    }
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State shared between the coordinator, its triggers and diagnostics.
pub struct SharedSyncState {
    /// Connectivity as last reported by the network monitor.
    reported_online: AtomicBool,
    /// Diagnostic override; wins over the reported value.
    forced: AtomicU8,
    draining: AtomicBool,
    /// Mirror of the queue length for lock-free reads.
    pending: AtomicUsize,
}

impl SharedSyncState {
    pub fn new(online: bool) -> Self {
        Self {
            reported_online: AtomicBool::new(online),
            forced: AtomicU8::new(FORCE_NONE),
            draining: AtomicBool::new(false),
            pending: AtomicUsize::new(0),
        }
    }

    /// Effective connectivity.
    pub fn is_online(&self) -> bool {
        match self.forced.load(Ordering::Acquire) {
            FORCE_OFFLINE => false,
            FORCE_ONLINE => true,
            _ => self.reported_online.load(Ordering::Acquire),
        }
    }

    /// Record reported connectivity. Returns the previous effective value.
    pub fn set_reported(&self, online: bool) -> bool {
        let was = self.is_online();
        self.reported_online.store(online, Ordering::Release);
        was
    }

    /// Override reported connectivity; `None` clears the override.
    /// Returns the previous effective value.
    pub fn force_online(&self, online: Option<bool>) -> bool {
        let was = self.is_online();
        let value = match online {
            None => FORCE_NONE,
            Some(false) => FORCE_OFFLINE,
            Some(true) => FORCE_ONLINE,
        };
        self.forced.store(value, Ordering::Release);
        was
    }

    pub fn forced(&self) -> Option<bool> {
        match self.forced.load(Ordering::Acquire) {
            FORCE_OFFLINE => Some(false),
            FORCE_ONLINE => Some(true),
            _ => None,
        }
    }

    pub fn is_draining(&self) -> bool {
        self.draining.load(Ordering::Acquire)
    }

    /// Mark a drain as running until the guard is dropped.
    pub fn begin_drain(&self) -> DrainGuard<'_> {
        self.draining.store(true, Ordering::Release);
        DrainGuard { state: self }
    }

    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::Acquire)
    }

    pub fn set_pending(&self, count: usize) {
        self.pending.store(count, Ordering::Release);
    }

    pub fn get(&self) -> SyncState {
        if !self.is_online() {
            SyncState::Offline
        } else if self.is_draining() {
            SyncState::OnlineDraining
        } else {
            SyncState::OnlineIdle
        }
    }
}

/// Clears the draining flag on drop, including when a drain future is dropped mid-flight.
pub struct DrainGuard<'a> {
    state: &'a SharedSyncState,
}

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        self.state.draining.store(false, Ordering::Release);
    }
}
