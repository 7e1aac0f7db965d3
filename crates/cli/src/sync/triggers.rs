// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Background tasks that feed triggers into a coordinator.

use std::sync::Arc;
use std::time::Duration;

use sn_core::{LocalStore, UploadResult};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_tungstenite::tungstenite::http::Uri;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use super::coordinator::SyncCoordinator;
use super::remote::RemoteStore;

/// Forward connectivity transitions from `rx` into the coordinator.
///
/// The state change is recorded before anything else so an offline
/// transition cancels an in-flight send even while a drain is running.
pub fn spawn_network_listener<L, R>(
    coordinator: Arc<SyncCoordinator<L, R>>,
    mut rx: watch::Receiver<bool>,
    cancel: CancellationToken,
) -> JoinHandle<()>
where
    L: LocalStore + 'static,
    R: RemoteStore + 'static,
{
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                changed = rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let online = *rx.borrow_and_update();
                    match coordinator.report_connectivity(online) {
                        Ok(true) => spawn_drain(Arc::clone(&coordinator), cancel.child_token()),
                        Ok(false) => {}
                        Err(e) => error!(error = %e, "failed to record connectivity"),
                    }
                }
            }
        }
        debug!("network listener stopped");
    })
}

fn spawn_drain<L, R>(coordinator: Arc<SyncCoordinator<L, R>>, cancel: CancellationToken)
where
    L: LocalStore + 'static,
    R: RemoteStore + 'static,
{
    tokio::spawn(async move {
        if let Err(e) = coordinator.drain(&cancel).await {
            error!(error = %e, "drain failed");
        }
    });
}

/// Periodic background wake.
pub struct BackgroundWake {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl BackgroundWake {
    /// Call `background_wake` every `period` until `cancel` fires or the wake is shut down.
    pub fn spawn<L, R>(
        coordinator: Arc<SyncCoordinator<L, R>>,
        period: Duration,
        cancel: &CancellationToken,
    ) -> Self
    where
        L: LocalStore + 'static,
        R: RemoteStore + 'static,
    {
        let token = cancel.child_token();
        let task_token = token.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = task_token.cancelled() => break,
                    _ = ticker.tick() => {
                        match coordinator.background_wake(&task_token).await {
                            Ok(report) => debug!(delivered = report.delivered, remaining = report.remaining, "background wake"),
                            Err(e) => error!(error = %e, "background drain failed"),
                        }
                    }
                }
            }
        });
        BackgroundWake {
            cancel: token,
            handle,
        }
    }

    /// Stop and wait for the task to finish.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(e) = self.handle.await {
            error!(error = %e, "background wake task panicked");
        }
    }
}

/// Merge upload notifications received from the remote into the coordinator.
pub fn spawn_upload_forwarder<L, R>(
    coordinator: Arc<SyncCoordinator<L, R>>,
    mut rx: mpsc::UnboundedReceiver<UploadResult>,
    cancel: CancellationToken,
) -> JoinHandle<()>
where
    L: LocalStore + 'static,
    R: RemoteStore + 'static,
{
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                next = rx.recv() => {
                    let Some(result) = next else { break };
                    info!(dream_id = %result.dream_id, succeeded = result.succeeded, "upload finished");
                    if let Err(e) = coordinator.ingest_upload(result) {
                        error!(error = %e, "failed to merge upload");
                    }
                }
            }
        }
    })
}

/// Ping the remote every `period` so the connection stays open for pushed uploads.
pub fn spawn_keepalive<L, R>(
    coordinator: Arc<SyncCoordinator<L, R>>,
    period: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()>
where
    L: LocalStore + 'static,
    R: RemoteStore + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    if let Err(e) = coordinator.keep_alive().await {
                        debug!(error = %e, "keepalive failed");
                    }
                }
            }
        }
    })
}

/// Publish reachability of `url` on `tx` every `period` until cancelled.
pub fn spawn_reachability_probe(
    url: String,
    period: Duration,
    tx: watch::Sender<bool>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    let reachable = probe_reachable(&url, period).await;
                    tx.send_if_modified(|online| {
                        let changed = *online != reachable;
                        *online = reachable;
                        changed
                    });
                }
            }
        }
    })
}

/// Whether a TCP connection to the host of a `ws://`/`wss://` url succeeds within `timeout`.
pub async fn probe_reachable(url: &str, timeout: Duration) -> bool {
    let Some((host, port)) = host_and_port(url) else {
        return false;
    };
    matches!(
        tokio::time::timeout(timeout, TcpStream::connect((host.as_str(), port))).await,
        Ok(Ok(_))
    )
}

pub(super) fn host_and_port(url: &str) -> Option<(String, u16)> {
    let uri: Uri = url.parse().ok()?;
    let host = uri.host()?.to_string();
    let default_port = match uri.scheme_str() {
        Some("wss") | Some("https") => 443,
        _ => 80,
    };
    Some((host, uri.port_u16().unwrap_or(default_port)))
}
