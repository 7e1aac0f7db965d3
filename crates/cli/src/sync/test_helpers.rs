// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for sync module tests.

#![allow(clippy::unwrap_used)]

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use sn_core::{Database, Dream, Op, OpPayload};

use super::coordinator::{SyncCoordinator, SyncOptions};
use super::queue::OperationQueue;
use super::remote::{RemoteError, RemoteResult, RemoteStore};

pub type TestCoordinator = SyncCoordinator<Database, MockRemote>;

/// Scripted reply for one `send` call.
#[derive(Debug, Clone)]
pub enum MockReply {
    Ok,
    Dream(Dream),
    Fail(RemoteError),
    /// Never completes.
    Hang,
}

/// Remote store fake. Replies are taken from the script in order; once the
/// script is empty every call succeeds.
#[derive(Clone, Default)]
pub struct MockRemote {
    replies: Arc<Mutex<VecDeque<MockReply>>>,
    /// Every op passed to `send`, in call order.
    sent: Arc<Mutex<Vec<Op>>>,
    /// Ops whose `send` succeeded.
    delivered: Arc<Mutex<Vec<Op>>>,
    dreams: Arc<Mutex<HashMap<String, Dream>>>,
    delay: Arc<Mutex<Option<Duration>>>,
    fetch_delay: Arc<Mutex<Option<Duration>>>,
    pings: Arc<Mutex<usize>>,
}

impl MockRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(&self, reply: MockReply) {
        self.replies.lock().unwrap().push_back(reply);
    }

    pub fn fail_with_status(&self, status: u16) {
        self.script(MockReply::Fail(RemoteError::from_status(status, "scripted")));
    }

    /// Delay every reply.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    /// Delay every fetch.
    pub fn set_fetch_delay(&self, delay: Duration) {
        *self.fetch_delay.lock().unwrap() = Some(delay);
    }

    pub fn pings(&self) -> usize {
        *self.pings.lock().unwrap()
    }

    /// Make a dream available to `fetch`.
    pub fn put_dream(&self, dream: Dream) {
        self.dreams.lock().unwrap().insert(dream.id.clone(), dream);
    }

    pub fn sent(&self) -> Vec<Op> {
        self.sent.lock().unwrap().clone()
    }

    pub fn delivered(&self) -> Vec<Op> {
        self.delivered.lock().unwrap().clone()
    }

    pub fn sent_kinds(&self) -> Vec<String> {
        self.sent().iter().map(|op| op.kind().to_string()).collect()
    }

    /// Titles of delivered `insert_new` ops, in delivery order.
    pub fn delivered_titles(&self) -> Vec<String> {
        self.delivered()
            .iter()
            .filter_map(|op| match op.payload() {
                Some(OpPayload::InsertNew { title, .. }) => Some(title.clone()),
                _ => None,
            })
            .collect()
    }
}

impl RemoteStore for MockRemote {
    fn send(
        &mut self,
        op: Op,
    ) -> Pin<Box<dyn Future<Output = RemoteResult<Option<Dream>>> + Send + '_>> {
        Box::pin(async move {
            self.sent.lock().unwrap().push(op.clone());
            let delay = *self.delay.lock().unwrap();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }

            let reply = self.replies.lock().unwrap().pop_front();
            let result = match reply.unwrap_or(MockReply::Ok) {
                MockReply::Ok => Ok(None),
                MockReply::Dream(dream) => Ok(Some(dream)),
                MockReply::Fail(e) => Err(e),
                MockReply::Hang => std::future::pending().await,
            };
            if result.is_ok() {
                self.delivered.lock().unwrap().push(op);
            }
            result
        })
    }

    fn fetch(
        &mut self,
        dream_id: &str,
    ) -> Pin<Box<dyn Future<Output = RemoteResult<Dream>> + Send + '_>> {
        let found = self.dreams.lock().unwrap().get(dream_id).cloned();
        let delay = *self.fetch_delay.lock().unwrap();
        let dream_id = dream_id.to_string();
        Box::pin(async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            found.ok_or_else(|| RemoteError::from_status(404, format!("no dream {dream_id}")))
        })
    }

    fn ping(&mut self) -> Pin<Box<dyn Future<Output = RemoteResult<()>> + Send + '_>> {
        *self.pings.lock().unwrap() += 1;
        Box::pin(async { Ok(()) })
    }
}

pub fn test_options() -> SyncOptions {
    SyncOptions {
        send_timeout: Duration::from_millis(200),
        upload_channel_capacity: 16,
    }
}

/// Open a coordinator over the database and queue stored in `dir`.
pub fn open_coordinator(dir: &Path, remote: MockRemote, online: bool) -> TestCoordinator {
    let db = Database::open(&dir.join("dreams.db")).unwrap();
    let queue = OperationQueue::open_in(dir).unwrap();
    SyncCoordinator::new(db, remote, queue, online, test_options())
}

/// An `insert_new` op for queue tests.
pub fn make_insert_op(id: &str, title: &str) -> Op {
    Op::from(OpPayload::insert_new(
        id.to_string(),
        title.to_string(),
        Utc::now(),
    ))
}
