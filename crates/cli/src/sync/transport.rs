// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! WebSocket adapter for [`RemoteStore`].
//!
//! Connects lazily on the first call and reconnects after the connection
//! breaks. A reader task owns the receiving half: replies are routed to the
//! waiting request by `request_id` (replies to abandoned requests are
//! dropped), and upload notifications are forwarded to the configured
//! channel whenever they arrive, including while no request is in flight.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use sn_core::protocol::{ClientMessage, ServerMessage};
use sn_core::{Dream, Op, UploadResult};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use super::remote::{RemoteError, RemoteResult, RemoteStore};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type Reply = RemoteResult<ServerMessage>;
type Uploads = Option<mpsc::UnboundedSender<UploadResult>>;

/// Requests waiting for a reply. `closed` is set once the reader stops,
/// after which nothing new may register.
#[derive(Default)]
struct Waiters {
    pending: HashMap<u64, oneshot::Sender<Reply>>,
    closed: Option<String>,
}

type SharedWaiters = Arc<Mutex<Waiters>>;

struct WebSocketConnection {
    sink: SplitSink<WsStream, Message>,
    waiters: SharedWaiters,
    reader: JoinHandle<()>,
}

impl WebSocketConnection {
    fn is_alive(&self) -> bool {
        !self.reader.is_finished()
    }

    fn register(&self, request_id: u64) -> RemoteResult<oneshot::Receiver<Reply>> {
        let mut waiters = self
            .waiters
            .lock()
            .map_err(|_| RemoteError::Protocol("waiter table poisoned".to_string()))?;
        if let Some(reason) = &waiters.closed {
            return Err(RemoteError::Unreachable(reason.clone()));
        }
        let (tx, rx) = oneshot::channel();
        waiters.pending.insert(request_id, tx);
        Ok(rx)
    }

}

impl Drop for WebSocketConnection {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

/// Removes an abandoned request from the waiter table.
struct PendingRequest {
    waiters: SharedWaiters,
    request_id: u64,
}

impl Drop for PendingRequest {
    fn drop(&mut self) {
        if let Ok(mut waiters) = self.waiters.lock() {
            waiters.pending.remove(&self.request_id);
        }
    }
}

/// Remote store reached over a WebSocket.
pub struct WebSocketRemote {
    url: Option<String>,
    ws: Option<WebSocketConnection>,
    next_request_id: u64,
    uploads: Uploads,
}

impl WebSocketRemote {
    pub fn new(url: impl Into<String>) -> Self {
        WebSocketRemote {
            url: Some(url.into()),
            ws: None,
            next_request_id: 1,
            uploads: None,
        }
    }

    /// A remote with no backend configured; every call fails as unreachable.
    pub fn unconfigured() -> Self {
        WebSocketRemote {
            url: None,
            ws: None,
            next_request_id: 1,
            uploads: None,
        }
    }

    /// Forward upload notifications to `tx`.
    pub fn with_uploads(mut self, tx: mpsc::UnboundedSender<UploadResult>) -> Self {
        self.uploads = Some(tx);
        self
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn is_connected(&self) -> bool {
        self.ws.as_ref().is_some_and(WebSocketConnection::is_alive)
    }

    async fn ensure_connected(&mut self) -> RemoteResult<&mut WebSocketConnection> {
        if self.ws.as_ref().is_some_and(|ws| !ws.is_alive()) {
            self.ws = None;
        }
        if self.ws.is_none() {
            let url = self
                .url
                .as_deref()
                .ok_or_else(|| RemoteError::Unreachable("no remote configured".to_string()))?;

            let (ws_stream, _) = tokio_tungstenite::connect_async(url)
                .await
                .map_err(|e| RemoteError::Unreachable(e.to_string()))?;
            info!(url, "connected to remote");

            let (sink, stream) = ws_stream.split();
            let waiters = SharedWaiters::default();
            let reader = tokio::spawn(read_loop(
                stream,
                Arc::clone(&waiters),
                self.uploads.clone(),
            ));
            self.ws = Some(WebSocketConnection {
                sink,
                waiters,
                reader,
            });
        }
        self.ws
            .as_mut()
            .ok_or_else(|| RemoteError::Unreachable("connection closed".to_string()))
    }

    /// Send a request and wait for the reply carrying the same request id.
    async fn exchange(&mut self, msg: ClientMessage, request_id: u64) -> RemoteResult<ServerMessage> {
        let json = msg
            .to_json()
            .map_err(|e| RemoteError::Protocol(e.to_string()))?;

        let ws = self.ensure_connected().await?;
        let rx = ws.register(request_id)?;
        let reply = {
            let _pending = PendingRequest {
                waiters: Arc::clone(&ws.waiters),
                request_id,
            };
            let sent = match ws.sink.send(Message::Text(json.into())).await {
                Ok(()) => ws.sink.flush().await,
                Err(e) => Err(e),
            };
            match sent {
                Ok(()) => rx
                    .await
                    .unwrap_or_else(|_| Err(RemoteError::Unreachable("connection closed".to_string()))),
                Err(e) => Err(RemoteError::Unreachable(e.to_string())),
            }
        };

        match reply {
            Ok(ServerMessage::Rejected {
                status, message, ..
            }) => Err(RemoteError::from_status(status, message)),
            Ok(other) => Ok(other),
            Err(e @ RemoteError::Unreachable(_)) => {
                self.ws = None;
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    fn take_request_id(&mut self) -> u64 {
        let id = self.next_request_id;
        self.next_request_id += 1;
        id
    }
}

/// Read server messages until the connection ends.
async fn read_loop(mut stream: SplitStream<WsStream>, waiters: SharedWaiters, uploads: Uploads) {
    let reason = loop {
        match stream.next().await {
            Some(Ok(Message::Text(text))) => match ServerMessage::from_json(&text) {
                Ok(ServerMessage::Upload(result)) => forward_upload(uploads.as_ref(), result),
                Ok(ServerMessage::Error { message }) => {
                    fail_pending(&waiters, || RemoteError::Protocol(message.clone()));
                }
                Ok(reply) => route_reply(&waiters, reply),
                Err(e) => {
                    let message = e.to_string();
                    fail_pending(&waiters, || RemoteError::Protocol(message.clone()));
                }
            },
            Some(Ok(Message::Close(_))) | None => break "connection closed".to_string(),
            Some(Ok(_)) => continue,
            Some(Err(e)) => break e.to_string(),
        }
    };

    info!(reason = %reason, "remote connection ended");
    if let Ok(mut table) = waiters.lock() {
        table.closed = Some(reason.clone());
        for (_, tx) in table.pending.drain() {
            let _ = tx.send(Err(RemoteError::Unreachable(reason.clone())));
        }
    }
}

fn route_reply(waiters: &SharedWaiters, reply: ServerMessage) {
    let waiter = reply.request_id().and_then(|id| {
        waiters
            .lock()
            .ok()
            .and_then(|mut table| table.pending.remove(&id))
    });
    match waiter {
        Some(tx) => {
            if tx.send(Ok(reply)).is_err() {
                debug!("reply for abandoned request");
            }
        }
        None => debug!(?reply, "skipping unrelated message"),
    }
}

/// Fail every waiting request; the server could not say which one it meant.
fn fail_pending(waiters: &SharedWaiters, error: impl Fn() -> RemoteError) {
    if let Ok(mut table) = waiters.lock() {
        for (_, tx) in table.pending.drain() {
            let _ = tx.send(Err(error()));
        }
    }
}

fn forward_upload(uploads: Option<&mpsc::UnboundedSender<UploadResult>>, result: UploadResult) {
    match uploads {
        Some(tx) => {
            if tx.send(result).is_err() {
                debug!("upload receiver dropped");
            }
        }
        None => warn!(dream_id = %result.dream_id, "upload notification with no listener"),
    }
}

impl RemoteStore for WebSocketRemote {
    fn send(
        &mut self,
        op: Op,
    ) -> Pin<Box<dyn Future<Output = RemoteResult<Option<Dream>>> + Send + '_>> {
        Box::pin(async move {
            let request_id = self.take_request_id();
            match self.exchange(ClientMessage::apply(request_id, op), request_id).await? {
                ServerMessage::Applied { dream, .. } => Ok(dream),
                other => Err(RemoteError::Protocol(format!(
                    "unexpected reply to apply: {other:?}"
                ))),
            }
        })
    }

    fn fetch(
        &mut self,
        dream_id: &str,
    ) -> Pin<Box<dyn Future<Output = RemoteResult<Dream>> + Send + '_>> {
        let dream_id = dream_id.to_string();
        Box::pin(async move {
            let request_id = self.take_request_id();
            match self
                .exchange(ClientMessage::fetch(request_id, dream_id), request_id)
                .await?
            {
                ServerMessage::Dream { dream, .. } => Ok(dream),
                other => Err(RemoteError::Protocol(format!(
                    "unexpected reply to fetch: {other:?}"
                ))),
            }
        })
    }

    fn ping(&mut self) -> Pin<Box<dyn Future<Output = RemoteResult<()>> + Send + '_>> {
        Box::pin(async move {
            let id = self.take_request_id();
            match self.exchange(ClientMessage::ping(id), id).await? {
                ServerMessage::Pong { .. } => Ok(()),
                other => Err(RemoteError::Protocol(format!(
                    "unexpected reply to ping: {other:?}"
                ))),
            }
        })
    }
}
