// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! The sync coordinator.
//!
//! Every mutation is applied to the local store first, then persisted to the
//! operation queue and, when online, delivered by an inline drain. The drain
//! replays the queue head to tail and stops at the first retryable failure,
//! so the remote sees operations in exact enqueue order.
//!
//! Locks:
//! - `local` (std mutex): held only for a single store call, never across I/O
//! - `queue` (tokio mutex): held while recording or dequeueing, never across a send
//! - `remote` (tokio mutex): held for a whole drain; `try_lock` makes drains single-flight,
//!   and a drain that finds it taken leaves `drain_requested` for the holder

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use chrono::Utc;
use sn_core::id::{generate_unique_id, DREAM_PREFIX, SEGMENT_PREFIX};
use sn_core::{Dream, LocalStore, Op, OpPayload, Segment, UploadResult};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::queue::{OperationQueue, QueueError, QueuedOp};
use super::reconcile::{UploadPublisher, UploadStream};
use super::remote::{RemoteError, RemoteResult, RemoteStore};
use super::state::{SharedSyncState, SyncState};

/// Tunables for a coordinator.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Upper bound on every remote call.
    pub send_timeout: Duration,
    /// Events buffered per reconciliation observer before it starts lagging.
    pub upload_channel_capacity: usize,
}

impl Default for SyncOptions {
    fn default() -> Self {
        SyncOptions {
            send_timeout: Duration::from_secs(10),
            upload_channel_capacity: 64,
        }
    }
}

/// Error type for coordinator calls.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// The local store refused or failed the operation.
    #[error(transparent)]
    Local(#[from] sn_core::Error),

    /// The queue could not be persisted.
    #[error("queue error: {0}")]
    Queue(#[from] QueueError),

    /// Applied locally and queued; the server result is not available yet.
    #[error("queued as #{sequence}; will be delivered when the remote is reachable")]
    Deferred { sequence: u64 },

    /// Applied locally; delivery failed and stays queued for retry.
    #[error("delivery of #{sequence} failed and will be retried: {source}")]
    Retrying {
        sequence: u64,
        #[source]
        source: RemoteError,
    },

    /// The remote refused the operation or could not answer a fetch.
    #[error(transparent)]
    Remote(RemoteError),

    #[error("local store lock poisoned")]
    Poisoned,
}

/// Result type for coordinator calls.
pub type SyncResult<T> = Result<T, SyncError>;

/// Why a drain stopped.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum DrainStop {
    /// The queue is empty.
    #[default]
    Empty,
    /// A retryable failure left the head in place.
    Failed(RemoteError),
    /// The caller's token was cancelled.
    Cancelled,
    /// Connectivity was lost (or never there).
    Offline,
    /// Another drain was already running.
    Coalesced,
}

/// An operation dropped after a permanent failure.
#[derive(Debug, Clone, PartialEq)]
pub struct Rejection {
    pub sequence: u64,
    pub kind: String,
    pub dream_id: Option<String>,
    pub error: RemoteError,
}

/// Outcome of a drain.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DrainReport {
    pub delivered: usize,
    pub rejected: Vec<Rejection>,
    pub remaining: usize,
    pub stop: DrainStop,
}

impl DrainReport {
    fn stopped(stop: DrainStop, remaining: usize) -> Self {
        DrainReport {
            remaining,
            stop,
            ..Default::default()
        }
    }

    fn absorb(&mut self, other: DrainReport) {
        self.delivered += other.delivered;
        self.rejected.extend(other.rejected);
        self.remaining = other.remaining;
        self.stop = other.stop;
    }
}

struct DrainOutcome {
    report: DrainReport,
    /// Result for the operation the caller is waiting on, if it was attempted.
    target: Option<RemoteResult<Option<Dream>>>,
}

enum Attempt {
    Done(RemoteResult<Option<Dream>>),
    Cancelled,
    Offline,
}

/// Single logical writer for local state, the queue and the remote.
pub struct SyncCoordinator<L, R> {
    local: Mutex<L>,
    queue: tokio::sync::Mutex<OperationQueue>,
    remote: tokio::sync::Mutex<R>,
    state: SharedSyncState,
    /// Cancelled (and replaced) whenever connectivity is lost.
    epoch: Mutex<CancellationToken>,
    /// Set by a drain that found the remote busy; the holder drains again after releasing it.
    drain_requested: AtomicBool,
    uploads: UploadPublisher,
    options: SyncOptions,
}

impl<L: LocalStore, R: RemoteStore> SyncCoordinator<L, R> {
    pub fn new(local: L, remote: R, queue: OperationQueue, online: bool, options: SyncOptions) -> Self {
        let state = SharedSyncState::new(online);
        state.set_pending(queue.len());
        SyncCoordinator {
            local: Mutex::new(local),
            queue: tokio::sync::Mutex::new(queue),
            remote: tokio::sync::Mutex::new(remote),
            state,
            epoch: Mutex::new(CancellationToken::new()),
            drain_requested: AtomicBool::new(false),
            uploads: UploadPublisher::new(options.upload_channel_capacity),
            options,
        }
    }

    // Mutations

    /// Create a draft dream.
    pub async fn insert_new(&self, title: &str) -> SyncResult<Dream> {
        let now = Utc::now();
        let id = self.with_local(|local| {
            Ok(generate_unique_id(DREAM_PREFIX, title, &now, |id| {
                local.get(id).is_ok()
            }))
        })?;
        let dream = self
            .mutate(OpPayload::insert_new(id.clone(), title.to_string(), now))
            .await?;
        expect_dream(dream, &id)
    }

    /// Append a recorded segment. `order` must exceed every existing segment's order.
    pub async fn append_segment(
        &self,
        dream_id: &str,
        filename: &str,
        duration_secs: f64,
        order: u32,
    ) -> SyncResult<Dream> {
        let now = Utc::now();
        let segment_id = self.with_local(|local| {
            let dream = local.get(dream_id)?;
            let seed = format!("{dream_id}/{filename}");
            Ok(generate_unique_id(SEGMENT_PREFIX, &seed, &now, |id| {
                dream.segments.iter().any(|s| s.id == id)
            }))
        })?;
        let segment = Segment::new(segment_id, filename, duration_secs, order);
        let dream = self
            .mutate(OpPayload::append_segment(dream_id.to_string(), segment))
            .await?;
        expect_dream(dream, dream_id)
    }

    pub async fn remove_segment(&self, dream_id: &str, segment_id: &str) -> SyncResult<Dream> {
        let op = OpPayload::remove_segment(dream_id.to_string(), segment_id.to_string());
        expect_dream(self.mutate(op).await?, dream_id)
    }

    pub async fn update_title(&self, dream_id: &str, title: &str) -> SyncResult<Dream> {
        let op = OpPayload::update_title(dream_id.to_string(), title.to_string());
        expect_dream(self.mutate(op).await?, dream_id)
    }

    pub async fn update_summary(&self, dream_id: &str, summary: &str) -> SyncResult<Dream> {
        let op = OpPayload::update_summary(dream_id.to_string(), summary.to_string());
        expect_dream(self.mutate(op).await?, dream_id)
    }

    pub async fn update_title_and_summary(
        &self,
        dream_id: &str,
        title: &str,
        summary: &str,
    ) -> SyncResult<Dream> {
        let op = OpPayload::update_title_and_summary(
            dream_id.to_string(),
            title.to_string(),
            summary.to_string(),
        );
        expect_dream(self.mutate(op).await?, dream_id)
    }

    /// Delete a dream. Queued operations for it are dropped before the delete is queued.
    pub async fn delete_dream(&self, dream_id: &str) -> SyncResult<()> {
        self.mutate(OpPayload::delete_dream(dream_id.to_string()))
            .await?;
        Ok(())
    }

    /// Ask the backend to analyze a dream. The analysis arrives later with the dream.
    pub async fn request_analysis(&self, dream_id: &str) -> SyncResult<()> {
        self.mutate(OpPayload::request_analysis(dream_id.to_string()))
            .await?;
        Ok(())
    }

    /// Finish capture and wait for the backend's copy.
    ///
    /// Offline, or behind a stuck backlog, this returns [`SyncError::Deferred`]
    /// with the dream already completed locally.
    pub async fn mark_completed(&self, dream_id: &str) -> SyncResult<Dream> {
        self.mutate_with_result(OpPayload::mark_completed(dream_id.to_string()))
            .await
    }

    /// Generate an image for a dream and wait for the backend's result.
    pub async fn generate_image(&self, dream_id: &str, prompt: &str) -> SyncResult<Dream> {
        self.mutate_with_result(OpPayload::generate_image(
            dream_id.to_string(),
            prompt.to_string(),
        ))
        .await
    }

    /// Apply a fire-and-forget mutation.
    ///
    /// Returns the locally updated dream (`None` after a delete). Remote
    /// failures are absorbed by the queue; only local and persistence
    /// failures are returned.
    pub async fn mutate(&self, op: OpPayload) -> SyncResult<Option<Dream>> {
        let (dream, _) = self.record(op).await?;
        if self.state.is_online() {
            let report = self.drain(&CancellationToken::new()).await?;
            debug!(delivered = report.delivered, remaining = report.remaining, "inline drain");
        }
        Ok(dream)
    }

    async fn mutate_with_result(&self, op: OpPayload) -> SyncResult<Dream> {
        let dream_id = op.dream_id().to_string();
        let (_, sequence) = self.record(op).await?;
        if !self.state.is_online() {
            info!(sequence, dream_id = %dream_id, "offline; result deferred");
            return Err(SyncError::Deferred { sequence });
        }

        let token = CancellationToken::new();
        let outcome = {
            let mut remote = self.remote.lock().await;
            self.drain_locked(&mut *remote, &token, Some(sequence)).await?
        };
        let emptied = outcome.report.stop == DrainStop::Empty;

        // Merge before draining anything recorded meanwhile, so a newer local
        // change to the same dream is still queued and wins.
        let result = match outcome.target {
            Some(Ok(Some(dream))) => self.merge_remote(dream).await,
            Some(Ok(None)) => self.get_dream(&dream_id),
            Some(Err(e)) if e.is_retryable() => Err(SyncError::Retrying { sequence, source: e }),
            Some(Err(e)) => Err(SyncError::Remote(e)),
            None => Err(SyncError::Deferred { sequence }),
        };
        if emptied {
            self.drain_if_requested().await?;
        }
        result
    }

    /// Apply locally and append to the queue as one step under the queue lock.
    async fn record(&self, op: OpPayload) -> SyncResult<(Option<Dream>, u64)> {
        let kind = op.kind();
        let mut queue = self.queue.lock().await;

        let dream = self.with_local(|local| local.apply(&op))?;
        let deleted = match &op {
            OpPayload::DeleteDream { dream_id } => Some(dream_id.clone()),
            _ => None,
        };
        let sequence = match deleted {
            Some(dream_id) => {
                let (sequence, purged) = queue.enqueue_purging(&dream_id, Op::from(op))?;
                if purged > 0 {
                    info!(dream_id = %dream_id, purged, "dropped queued operations for deleted dream");
                }
                sequence
            }
            None => queue.enqueue(Op::from(op))?,
        };
        self.state.set_pending(queue.len());
        debug!(sequence, kind, "enqueued");
        Ok((dream, sequence))
    }

    // Drain

    /// Replay queued operations in order until the queue is empty or a send fails.
    ///
    /// A drain requested while another is running returns immediately with
    /// [`DrainStop::Coalesced`]. Cancelling `cancel` abandons the in-flight
    /// send and leaves the head queued.
    pub async fn drain(&self, cancel: &CancellationToken) -> SyncResult<DrainReport> {
        let mut total = DrainReport::default();
        loop {
            // Raised before trying the lock so a holder releasing it afterwards sees it.
            self.drain_requested.store(true, Ordering::Release);
            let Ok(mut remote) = self.remote.try_lock() else {
                debug!("remote busy; drain coalesced");
                total.stop = DrainStop::Coalesced;
                total.remaining = self.state.pending();
                return Ok(total);
            };
            self.drain_requested.store(false, Ordering::Release);
            let outcome = self.drain_locked(&mut *remote, cancel, None).await;
            drop(remote);
            total.absorb(outcome?.report);

            let requested = self.drain_requested.swap(false, Ordering::AcqRel);
            if total.stop != DrainStop::Empty || (!requested && self.state.pending() == 0) {
                return Ok(total);
            }
        }
    }

    /// Drain on behalf of callers that were coalesced while the remote was held.
    async fn drain_if_requested(&self) -> SyncResult<()> {
        if self.drain_requested.swap(false, Ordering::AcqRel) && self.state.is_online() {
            let report = self.drain(&CancellationToken::new()).await?;
            debug!(delivered = report.delivered, remaining = report.remaining, "coalesced drain");
        }
        Ok(())
    }

    async fn drain_locked(
        &self,
        remote: &mut R,
        cancel: &CancellationToken,
        target: Option<u64>,
    ) -> SyncResult<DrainOutcome> {
        let _draining = self.state.begin_drain();
        let epoch = self.epoch_token()?;
        let mut report = DrainReport::default();
        let mut target_result = None;

        loop {
            if cancel.is_cancelled() {
                report.stop = DrainStop::Cancelled;
                break;
            }
            if !self.state.is_online() || epoch.is_cancelled() {
                report.stop = DrainStop::Offline;
                break;
            }

            let head = self.queue.lock().await.peek_front().cloned();
            let Some(head) = head else {
                report.stop = DrainStop::Empty;
                break;
            };

            match self.attempt(remote, &head, cancel, &epoch).await {
                Attempt::Cancelled => {
                    report.stop = DrainStop::Cancelled;
                    break;
                }
                Attempt::Offline => {
                    report.stop = DrainStop::Offline;
                    break;
                }
                Attempt::Done(result) => {
                    let is_target = target == Some(head.sequence);
                    if is_target {
                        target_result = Some(result.clone());
                    }
                    if let Some(stop) = self.settle(&head, result, &mut report).await? {
                        report.stop = stop;
                        break;
                    }
                }
            }
        }

        report.remaining = self.state.pending();
        if report.delivered > 0 || !report.rejected.is_empty() {
            info!(
                delivered = report.delivered,
                rejected = report.rejected.len(),
                remaining = report.remaining,
                "drain finished"
            );
        }
        Ok(DrainOutcome {
            report,
            target: target_result,
        })
    }

    async fn attempt(
        &self,
        remote: &mut R,
        head: &QueuedOp,
        cancel: &CancellationToken,
        epoch: &CancellationToken,
    ) -> Attempt {
        let send = tokio::time::timeout(self.options.send_timeout, remote.send(head.op.clone()));
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Attempt::Cancelled,
            _ = epoch.cancelled() => Attempt::Offline,
            result = send => Attempt::Done(result.unwrap_or(Err(RemoteError::Timeout))),
        }
    }

    /// Update the queue after an attempt. Returns a stop reason if the drain must end.
    async fn settle(
        &self,
        head: &QueuedOp,
        result: RemoteResult<Option<Dream>>,
        report: &mut DrainReport,
    ) -> SyncResult<Option<DrainStop>> {
        let sequence = head.sequence;
        let kind = head.op.kind();
        let mut queue = self.queue.lock().await;

        let stop = match result {
            Ok(_) => {
                queue.dequeue_front(sequence)?;
                report.delivered += 1;
                debug!(sequence, kind, "delivered");
                None
            }
            Err(e) if e.is_retryable() => {
                queue.record_attempt(sequence)?;
                warn!(
                    sequence,
                    kind,
                    attempts = head.attempt_count + 1,
                    error = %e,
                    "delivery failed; will retry"
                );
                Some(DrainStop::Failed(e))
            }
            Err(e) => {
                queue.dequeue_front(sequence)?;
                warn!(sequence, kind, error = %e, "operation rejected; dropped");
                report.rejected.push(Rejection {
                    sequence,
                    kind: kind.to_string(),
                    dream_id: head.op.dream_id().map(str::to_string),
                    error: e,
                });
                None
            }
        };

        self.state.set_pending(queue.len());
        Ok(stop)
    }

    // Triggers

    /// Connectivity changed. Going offline abandons any in-flight send;
    /// coming online starts a drain.
    pub async fn network_changed(&self, online: bool) -> SyncResult<DrainReport> {
        self.report_connectivity(online)?;
        self.drain_if_online().await
    }

    /// Record a connectivity change without draining. Returns the effective connectivity.
    ///
    /// Listeners that must keep reacting while a drain runs use this and
    /// start the drain separately.
    pub fn report_connectivity(&self, online: bool) -> SyncResult<bool> {
        let was = self.state.set_reported(online);
        self.connectivity_changed(was)?;
        Ok(self.state.is_online())
    }

    /// The app returned to the foreground.
    pub async fn app_foregrounded(&self) -> SyncResult<DrainReport> {
        debug!("foreground trigger");
        self.drain_if_online().await
    }

    /// Periodic background wake. `cancel` models the OS ending the background window.
    pub async fn background_wake(&self, cancel: &CancellationToken) -> SyncResult<DrainReport> {
        debug!("background wake");
        if !self.state.is_online() {
            return Ok(DrainReport::stopped(DrainStop::Offline, self.state.pending()));
        }
        self.drain(cancel).await
    }

    /// Keep the remote connection open so pushed upload results keep arriving.
    ///
    /// Skipped while offline or while another call holds the remote.
    pub async fn keep_alive(&self) -> SyncResult<()> {
        if !self.state.is_online() {
            return Ok(());
        }
        let pinged = {
            let Ok(mut remote) = self.remote.try_lock() else {
                return Ok(());
            };
            tokio::time::timeout(self.options.send_timeout, remote.ping())
                .await
                .unwrap_or(Err(RemoteError::Timeout))
        };
        self.drain_if_requested().await?;
        pinged.map_err(SyncError::Remote)
    }

    /// Diagnostic override of reported connectivity; `None` clears it.
    pub fn force_online(&self, online: Option<bool>) -> SyncResult<()> {
        let was = self.state.force_online(online);
        self.connectivity_changed(was)
    }

    async fn drain_if_online(&self) -> SyncResult<DrainReport> {
        if !self.state.is_online() {
            return Ok(DrainReport::stopped(DrainStop::Offline, self.state.pending()));
        }
        self.drain(&CancellationToken::new()).await
    }

    fn connectivity_changed(&self, was_online: bool) -> SyncResult<()> {
        let online = self.state.is_online();
        if was_online && !online {
            let mut epoch = self.epoch.lock().map_err(|_| SyncError::Poisoned)?;
            epoch.cancel();
            *epoch = CancellationToken::new();
            info!(pending = self.state.pending(), "went offline");
        } else if !was_online && online {
            info!(pending = self.state.pending(), "back online");
        }
        Ok(())
    }

    fn epoch_token(&self) -> SyncResult<CancellationToken> {
        self.epoch
            .lock()
            .map(|token| token.clone())
            .map_err(|_| SyncError::Poisoned)
    }

    // Reconciliation

    /// Observe upload results.
    pub fn subscribe(&self) -> UploadStream {
        self.uploads.subscribe()
    }

    /// Merge a finished upload into local state, then notify observers.
    pub fn ingest_upload(&self, result: UploadResult) -> SyncResult<Option<Dream>> {
        let dream = self.with_local(|local| local.merge_upload(&result))?;
        if dream.is_none() {
            debug!(dream_id = %result.dream_id, "upload for unknown dream");
        }
        self.uploads.publish(result);
        Ok(dream)
    }

    /// Replace the local copy of a dream with the backend's.
    ///
    /// Skipped while operations for the dream are still queued, since the
    /// local copy is ahead of the backend.
    pub async fn refresh_dream(&self, dream_id: &str) -> SyncResult<Dream> {
        if !self.state.is_online() {
            return Err(SyncError::Remote(RemoteError::Unreachable(
                "offline".to_string(),
            )));
        }
        let fetched = {
            let mut remote = self.remote.lock().await;
            tokio::time::timeout(self.options.send_timeout, remote.fetch(dream_id))
                .await
                .unwrap_or(Err(RemoteError::Timeout))
        };
        let merged = match fetched {
            Ok(dream) => self.merge_remote(dream).await,
            Err(e) => Err(SyncError::Remote(e)),
        };
        self.drain_if_requested().await?;
        merged
    }

    async fn merge_remote(&self, dream: Dream) -> SyncResult<Dream> {
        let queue = self.queue.lock().await;
        if queue.entries().any(|e| e.op.dream_id() == Some(dream.id.as_str())) {
            debug!(dream_id = %dream.id, "local copy ahead of remote; keeping it");
            return self.get_dream(&dream.id);
        }
        self.with_local(|local| local.upsert(&dream))?;
        Ok(dream)
    }

    // Reads

    pub fn all_dreams(&self) -> SyncResult<Vec<Dream>> {
        self.with_local(|local| local.list())
    }

    pub fn get_dream(&self, dream_id: &str) -> SyncResult<Dream> {
        self.with_local(|local| local.get(dream_id))
    }

    pub fn segments(&self, dream_id: &str) -> SyncResult<Vec<Segment>> {
        Ok(self.get_dream(dream_id)?.segments)
    }

    pub fn get_transcript(&self, dream_id: &str) -> SyncResult<Option<String>> {
        Ok(self.get_dream(dream_id)?.transcript)
    }

    // Diagnostics

    pub fn pending_count(&self) -> usize {
        self.state.pending()
    }

    pub fn state(&self) -> SyncState {
        self.state.get()
    }

    pub fn is_online(&self) -> bool {
        self.state.is_online()
    }

    /// Connectivity override in effect, if any.
    pub fn forced_online(&self) -> Option<bool> {
        self.state.forced()
    }

    /// Snapshot of the queue, oldest first.
    pub async fn queued(&self) -> Vec<QueuedOp> {
        self.queue.lock().await.entries().cloned().collect()
    }

    fn with_local<T>(&self, f: impl FnOnce(&mut L) -> sn_core::Result<T>) -> SyncResult<T> {
        let mut local = self.local.lock().map_err(|_| SyncError::Poisoned)?;
        Ok(f(&mut local)?)
    }
}

fn expect_dream(dream: Option<Dream>, dream_id: &str) -> SyncResult<Dream> {
    dream.ok_or_else(|| SyncError::Local(sn_core::Error::DreamNotFound(dream_id.to_string())))
}
