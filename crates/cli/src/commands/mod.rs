// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

pub mod dream;
pub mod segment;
pub mod show;
pub mod sync;
pub mod watch;

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use sn_core::{Database, UploadResult};
use tokio::sync::mpsc;
use tracing::debug;

use crate::cli::{Command, SegmentCommand};
use crate::config::{Config, CONFIG_FILE_NAME, DB_FILE_NAME, LOCK_FILE_NAME};
use crate::env;
use crate::error::{Error, Result};
use crate::sync::{OperationQueue, SyncCoordinator, SyncOptions, WebSocketRemote};

/// The coordinator the CLI runs against.
pub type Coordinator<R = WebSocketRemote> = SyncCoordinator<Database, R>;

/// Everything one invocation needs, opened from the data directory.
pub struct Session {
    pub data_dir: PathBuf,
    pub config: Config,
    pub coordinator: Arc<Coordinator>,
    uploads: Option<mpsc::UnboundedReceiver<UploadResult>>,
    _lock: File,
}

impl Session {
    /// Lock the data directory and open the local store, queue and remote.
    ///
    /// The remote is reported reachable whenever one is configured.
    pub fn open(data_dir: &Path, offline: bool) -> Result<Self> {
        fs::create_dir_all(data_dir)?;
        let lock = acquire_lock(&data_dir.join(LOCK_FILE_NAME))?;
        let config = Config::load(data_dir)?;

        let db = Database::open(&data_dir.join(DB_FILE_NAME))?;
        let queue = OperationQueue::open_in(data_dir)?;

        let (tx, rx) = mpsc::unbounded_channel();
        let remote = match config.remote_url() {
            Some(url) => WebSocketRemote::new(url).with_uploads(tx),
            None => WebSocketRemote::unconfigured(),
        };
        let reported_online = remote.url().is_some();

        let coordinator =
            SyncCoordinator::new(db, remote, queue, reported_online, SyncOptions::from(&config.sync));
        if offline || env::offline() {
            coordinator.force_online(Some(false))?;
        }
        debug!(
            data_dir = %data_dir.display(),
            pending = coordinator.pending_count(),
            state = %coordinator.state(),
            "session opened"
        );

        Ok(Session {
            data_dir: data_dir.to_path_buf(),
            config,
            coordinator: Arc::new(coordinator),
            uploads: Some(rx),
            _lock: lock,
        })
    }

    /// Upload notifications received by the remote. Available once.
    pub fn take_uploads(&mut self) -> Option<mpsc::UnboundedReceiver<UploadResult>> {
        self.uploads.take()
    }

    /// The configured remote url, or a hint on where to configure one.
    pub fn require_remote(&self) -> Result<String> {
        self.config
            .remote_url()
            .map(str::to_string)
            .ok_or_else(|| {
                Error::NoRemote(self.data_dir.join(CONFIG_FILE_NAME).display().to_string())
            })
    }
}

/// Execute a parsed command against the data directory.
pub async fn dispatch(command: Command, data_dir: &Path, offline: bool) -> Result<()> {
    let mut session = Session::open(data_dir, offline)?;
    let coordinator = Arc::clone(&session.coordinator);
    let c = coordinator.as_ref();
    let out = &mut std::io::stdout();

    match command {
        Command::New { title, output } => dream::create(c, &title, output, out).await,
        Command::Segment(SegmentCommand::Add {
            id,
            file,
            duration,
            order,
        }) => segment::add(c, &id, &file, duration, order, out).await,
        Command::Segment(SegmentCommand::Rm { id, segment_id }) => {
            segment::remove(c, &id, &segment_id, out).await
        }
        Command::Title { id, title, summary } => {
            dream::retitle(c, &id, &title, summary.as_deref(), out).await
        }
        Command::Summary { id, summary } => dream::summarize(c, &id, &summary, out).await,
        Command::Complete { id, output } => dream::complete(c, &id, output, out).await,
        Command::Analyze { id } => dream::analyze(c, &id, out).await,
        Command::Image { id, prompt, output } => {
            dream::image(c, &id, &prompt, output, out).await
        }
        Command::Delete { id } => dream::delete(c, &id, out).await,
        Command::List { output } => show::list(c, output, out),
        Command::Show { id, output } => show::show(c, &id, output, out).await,
        Command::Pending { output } => sync::pending(c, output, out).await,
        Command::Sync { output } => sync::sync(c, output, out).await,
        Command::Refresh { id, output } => {
            session.require_remote()?;
            sync::refresh(c, &id, output, out).await
        }
        Command::Watch => watch::run(&mut session).await,
    }
}

/// Take an exclusive lock on the data directory. Held until the file is dropped.
fn acquire_lock(lock_path: &Path) -> Result<File> {
    use fs2::FileExt;

    let file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(lock_path)?;
    file.try_lock_exclusive()
        .map_err(|_| Error::Locked(lock_path.display().to_string()))?;
    Ok(file)
}

/// Write `value` as a single JSON line.
fn print_json<T: Serialize + ?Sized>(out: &mut impl Write, value: &T) -> Result<()> {
    let json = serde_json::to_string(value)?;
    writeln!(out, "{json}")?;
    Ok(())
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
