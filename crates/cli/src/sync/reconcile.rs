// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Reconciliation stream of upload results.
//!
//! One producer (the coordinator), any number of observers. Publishing never
//! waits for observers; a slow observer loses the oldest events instead.

use sn_core::UploadResult;
use tokio::sync::broadcast;
use tracing::debug;

/// Producer side of the reconciliation stream.
#[derive(Clone)]
pub struct UploadPublisher {
    tx: broadcast::Sender<UploadResult>,
}

impl UploadPublisher {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Push an event to every current observer.
    pub fn publish(&self, result: UploadResult) {
        // An error only means nobody is listening.
        if self.tx.send(result).is_err() {
            debug!("upload published with no observers");
        }
    }

    pub fn subscribe(&self) -> UploadStream {
        UploadStream {
            rx: self.tx.subscribe(),
        }
    }
}

/// Observer side of the reconciliation stream.
pub struct UploadStream {
    rx: broadcast::Receiver<UploadResult>,
}

impl UploadStream {
    /// Wait for the next event. Returns `None` once the producer is gone.
    ///
    /// Events dropped because this observer lagged are skipped.
    pub async fn next(&mut self) -> Option<UploadResult> {
        loop {
            match self.rx.recv().await {
                Ok(result) => return Some(result),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!(skipped, "upload observer lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
