// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Long-running sync loop.
//!
//! Wires the trigger sources to the coordinator: a reachability probe feeds
//! the network listener, a background wake retries the queue periodically,
//! a keepalive holds the remote connection open, and upload notifications
//! pushed by the remote are merged as they arrive.

use std::sync::Arc;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::display::format_drain_report;
use crate::error::Result;
use crate::sync::{
    spawn_keepalive, spawn_network_listener, spawn_reachability_probe, spawn_upload_forwarder,
    BackgroundWake,
};

use super::Session;

pub async fn run(session: &mut Session) -> Result<()> {
    let url = session.require_remote()?;
    let coordinator = Arc::clone(&session.coordinator);
    let settings = session.config.sync.clone();
    let cancel = CancellationToken::new();

    println!(
        "Watching {url} ({} pending, {})",
        coordinator.pending_count(),
        coordinator.state()
    );
    let report = coordinator.app_foregrounded().await?;
    for line in format_drain_report(&report) {
        println!("{line}");
    }

    let (online_tx, online_rx) = watch::channel(coordinator.is_online());
    let probe = spawn_reachability_probe(url, settings.probe_interval(), online_tx, cancel.clone());
    let listener = spawn_network_listener(Arc::clone(&coordinator), online_rx, cancel.clone());
    let wake = BackgroundWake::spawn(
        Arc::clone(&coordinator),
        settings.background_interval(),
        &cancel,
    );
    let keepalive = spawn_keepalive(
        Arc::clone(&coordinator),
        settings.probe_interval(),
        cancel.clone(),
    );
    let forwarder = session
        .take_uploads()
        .map(|rx| spawn_upload_forwarder(Arc::clone(&coordinator), rx, cancel.clone()));

    let mut uploads = coordinator.subscribe();
    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                if let Err(e) = signal {
                    error!(error = %e, "failed to listen for ctrl-c");
                }
                break;
            }
            event = uploads.next() => {
                let Some(event) = event else { break };
                if event.succeeded {
                    println!("Transcript ready for {}", event.dream_id);
                } else {
                    println!("Upload failed for {}", event.dream_id);
                }
            }
        }
    }

    info!(pending = coordinator.pending_count(), "stopping watch");
    cancel.cancel();
    wake.shutdown().await;
    for handle in [Some(probe), Some(listener), Some(keepalive), forwarder].into_iter().flatten() {
        if let Err(e) = handle.await {
            error!(error = %e, "background task panicked");
        }
    }
    println!("Stopped ({} pending)", coordinator.pending_count());
    Ok(())
}
