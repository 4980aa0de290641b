//! File lifecycle manager
//!
//! One actor task owns the append stream of a consumer. Writes and
//! maintenance requests arrive as [`Command`]s over a single channel, so
//! rotation, cleanup, archival and existence checks never interleave with
//! a write in progress. Scheduled jobs are separate tasks that send the
//! same commands as the public handle.
//!
//! ```text
//! Initializing ──> Ready <──> Buffering
//!                    └─ rotate ─┘
//! ```
//!
//! Failures are logged and absorbed: a failed write moves the manager to
//! [`ManagerState::Buffering`] and the bytes wait in a bounded
//! [`PendingBuffer`] until a new stream opens.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use bytes::Bytes;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::archive::archive_path;
use crate::buffer::PendingBuffer;
use crate::config::{FileManagerConfig, ManagerSettings};
use crate::error::{ConfigError, StorageError};
use crate::fs::{FileMeta, LogFs, LogSink, TokioFs};
use crate::naming::extract_chunk;
use crate::schedule::{CronSchedule, DAILY_AT_MIDNIGHT, EVERY_QUARTER_HOUR};

/// Lifecycle state of the manager
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ManagerState {
    /// Scanning the directory and opening the first stream
    Initializing,
    /// A stream is open and writes go straight to disk
    Ready,
    /// No stream; writes accumulate in the pending buffer
    Buffering,
}

/// Snapshot of the manager, returned by [`FileManagerHandle::status`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagerStatus {
    pub state: ManagerState,
    /// File currently (or most recently) written to
    pub current_path: Option<PathBuf>,
    /// Bytes in the current file; only tracked when the size is bounded
    pub file_bytes: u64,
    pub buffered_bytes: usize,
    /// Bytes evicted from the pending buffer so far
    pub dropped_bytes: u64,
    pub rotations: u64,
}

/// Maintenance operation run by the manager
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Job {
    CheckCurrentFile,
    Rotate,
    Cleanup,
    Archive,
    ResetChunkScope,
}

impl Job {
    pub fn as_str(&self) -> &'static str {
        match self {
            Job::CheckCurrentFile => "check-current-file",
            Job::Rotate => "rotate",
            Job::Cleanup => "cleanup",
            Job::Archive => "archive",
            Job::ResetChunkScope => "reset-chunk-scope",
        }
    }
}

enum Command {
    Write(Bytes),
    Flush(oneshot::Sender<()>),
    /// Ack carries the number of files the job acted on
    Run(Job, oneshot::Sender<usize>),
    Status(oneshot::Sender<ManagerStatus>),
    Shutdown(oneshot::Sender<()>),
}

/// Cloneable handle to a running file manager
#[derive(Debug, Clone)]
pub struct FileManagerHandle {
    commands: mpsc::UnboundedSender<Command>,
}

impl FileManagerHandle {
    /// Queue bytes for writing. Never blocks and never fails; bytes sent
    /// after shutdown are discarded.
    ///
    /// The command queue is unbounded. Only bytes the manager has already
    /// taken off the queue while it has no open stream count against the
    /// pending buffer's 2 MiB cap; bytes still queued behind a slow
    /// filesystem call are held in full.
    pub fn write(&self, bytes: impl Into<Bytes>) {
        if self.commands.send(Command::Write(bytes.into())).is_err() {
            debug!("Write after file manager shutdown discarded");
        }
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, StorageError> {
        let (ack, done) = oneshot::channel();
        self.commands
            .send(command(ack))
            .map_err(|_| StorageError::ManagerClosed)?;
        done.await.map_err(|_| StorageError::ManagerClosed)
    }

    /// Resolve once every earlier write has been processed
    pub async fn flush(&self) -> Result<(), StorageError> {
        self.request(Command::Flush).await
    }

    pub async fn rotate(&self) -> Result<(), StorageError> {
        self.request(|ack| Command::Run(Job::Rotate, ack)).await.map(|_| ())
    }

    /// Delete expired files; returns how many were deleted
    pub async fn cleanup(&self) -> Result<usize, StorageError> {
        self.request(|ack| Command::Run(Job::Cleanup, ack)).await
    }

    /// Compress aged files; returns how many were archived
    pub async fn archive(&self) -> Result<usize, StorageError> {
        self.request(|ack| Command::Run(Job::Archive, ack)).await
    }

    /// Whether the current file is still on disk. A missing file is
    /// replaced by rotating when rotation is enabled.
    pub async fn check_current_file(&self) -> Result<bool, StorageError> {
        self.request(|ack| Command::Run(Job::CheckCurrentFile, ack))
            .await
            .map(|missing| missing == 0)
    }

    pub async fn reset_chunk_scope(&self) -> Result<(), StorageError> {
        self.request(|ack| Command::Run(Job::ResetChunkScope, ack))
            .await
            .map(|_| ())
    }

    pub async fn status(&self) -> Result<ManagerStatus, StorageError> {
        self.request(Command::Status).await
    }

    /// Flush, close the stream and stop the scheduled jobs
    pub async fn shutdown(&self) -> Result<(), StorageError> {
        self.request(Command::Shutdown).await
    }
}

/// The actor owning one append stream
pub struct FileManager {
    settings: ManagerSettings,
    fs: Arc<dyn LogFs>,
    sink: Option<Box<dyn LogSink>>,
    current_path: Option<PathBuf>,
    /// The current file has not accepted a byte since it was opened
    unproven: bool,
    file_bytes: u64,
    buffer: PendingBuffer,
    state: ManagerState,
    rotations: u64,
    last_reset: Option<NaiveDate>,
    shutdown_tx: broadcast::Sender<()>,
}

impl FileManager {
    /// Validate `config` and start a manager on the real filesystem.
    ///
    /// Must be called within a tokio runtime.
    pub fn spawn(config: FileManagerConfig) -> Result<FileManagerHandle, ConfigError> {
        Self::spawn_with_fs(config, Arc::new(TokioFs))
    }

    pub fn spawn_with_fs(
        config: FileManagerConfig,
        fs: Arc<dyn LogFs>,
    ) -> Result<FileManagerHandle, ConfigError> {
        let settings = config.validate()?;
        // Unbounded so `write` stays synchronous for producers
        let (commands, rx) = mpsc::unbounded_channel();
        let (shutdown_tx, _) = broadcast::channel(1);

        // Jobs queue behind initialization because the actor drains the
        // channel only once the first stream is settled
        for (job, schedule) in job_schedules(&settings)? {
            ScheduledJob::spawn(
                job,
                schedule,
                commands.clone(),
                shutdown_tx.subscribe(),
                settings.debug,
            );
        }

        if settings.debug {
            info!(
                out_dir = %settings.out_dir.display(),
                pattern = settings.pattern.template(),
                max_file_size = ?settings.max_file_size,
                retention_ms = settings.retention.as_millis() as u64,
                archive_after_ms = settings.archive_after.as_millis() as u64,
                rotation = ?settings.rotation.as_ref().map(CronSchedule::expression),
                cleaning = ?settings.cleaning.as_ref().map(CronSchedule::expression),
                archiving = ?settings.archiving.as_ref().map(CronSchedule::expression),
                "File manager configured"
            );
        }

        let manager = Self {
            settings,
            fs,
            sink: None,
            current_path: None,
            unproven: false,
            file_bytes: 0,
            buffer: PendingBuffer::new(),
            state: ManagerState::Initializing,
            rotations: 0,
            last_reset: None,
            shutdown_tx,
        };
        tokio::spawn(manager.run(rx));

        Ok(FileManagerHandle { commands })
    }

    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<Command>) {
        self.initialize().await;

        while let Some(command) = rx.recv().await {
            match command {
                Command::Write(bytes) => self.write(bytes).await,
                Command::Flush(ack) => {
                    self.flush_buffer().await;
                    let _ = ack.send(());
                }
                Command::Run(job, ack) => {
                    let affected = self.run_job(job).await;
                    let _ = ack.send(affected);
                }
                Command::Status(ack) => {
                    let _ = ack.send(self.status());
                }
                Command::Shutdown(ack) => {
                    self.close().await;
                    let _ = self.shutdown_tx.send(());
                    let _ = ack.send(());
                    break;
                }
            }
        }

        if self.settings.debug {
            debug!(out_dir = %self.settings.out_dir.display(), "File manager stopped");
        }
    }

    fn status(&self) -> ManagerStatus {
        ManagerStatus {
            state: self.state,
            current_path: self.current_path.clone(),
            file_bytes: self.file_bytes,
            buffered_bytes: self.buffer.len(),
            dropped_bytes: self.buffer.dropped_bytes(),
            rotations: self.rotations,
        }
    }

    fn size_bounded(&self) -> bool {
        self.settings.max_file_size.is_some()
    }

    fn track(&mut self, bytes: usize) {
        if self.size_bounded() {
            self.file_bytes += bytes as u64;
        }
    }

    /// Resume today's latest live file or start chunk 1
    #[instrument(skip_all)]
    async fn initialize(&mut self) {
        self.ensure_dir().await;
        self.cleanup().await;

        let live = self.live_files().await;
        let today = Utc::now().date_naive();
        let latest = live
            .into_iter()
            .filter(|meta| DateTime::<Utc>::from(meta.modified).date_naive() == today)
            .max_by_key(|meta| meta.modified);

        match latest {
            Some(meta) => match self.fs.open_append(&meta.path).await {
                Ok(sink) => {
                    if self.settings.debug {
                        info!(path = %meta.path.display(), bytes = meta.len, "Resuming live file");
                    }
                    self.sink = Some(sink);
                    self.current_path = Some(meta.path);
                    self.unproven = false;
                    self.file_bytes = if self.size_bounded() { meta.len } else { 0 };
                }
                Err(e) => {
                    warn!(path = %meta.path.display(), error = %e, "Failed to resume live file");
                    self.open_chunk(1).await;
                }
            },
            None => {
                self.open_chunk(1).await;
            }
        }

        self.settle().await;
    }

    /// Uncompressed matching files younger than the retention window
    async fn live_files(&self) -> Vec<FileMeta> {
        let now = SystemTime::now();
        let mut live = Vec::new();
        for meta in self.matching_files(false).await {
            if age(now, meta.modified) < self.settings.retention {
                live.push(meta);
            }
        }
        live
    }

    async fn matching_files(&self, include_compressed: bool) -> Vec<FileMeta> {
        let dir = &self.settings.out_dir;
        let names = match self.fs.list(dir).await {
            Ok(names) => names,
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "Failed to read log directory");
                return Vec::new();
            }
        };

        let pattern = &self.settings.pattern;
        let mut files = Vec::new();
        for name in names {
            let matched = if include_compressed {
                pattern.matches(&name)
            } else {
                pattern.matches_uncompressed(&name)
            };
            if !matched {
                continue;
            }
            let path = dir.join(&name);
            match self.fs.stat(&path).await {
                Ok(meta) => files.push(meta),
                Err(e) => warn!(path = %path.display(), error = %e, "Failed to stat log file"),
            }
        }

        if self.settings.debug {
            debug!(
                matched = files.len(),
                include_compressed, "Scanned log directory"
            );
        }
        files
    }

    async fn ensure_dir(&self) {
        let dir = &self.settings.out_dir;
        if self.fs.dir_exists(dir).await {
            return;
        }
        match self.fs.create_dir(dir).await {
            Ok(()) if self.settings.debug => {
                info!(dir = %dir.display(), "Created log directory");
            }
            Ok(()) => {}
            Err(e) => warn!(dir = %dir.display(), error = %e, "Failed to create log directory"),
        }
    }

    async fn open_path(&mut self, path: PathBuf) -> bool {
        match self.fs.open_append(&path).await {
            Ok(sink) => {
                if self.settings.debug {
                    info!(path = %path.display(), "Opened log file");
                }
                self.sink = Some(sink);
                self.current_path = Some(path);
                self.unproven = true;
                self.file_bytes = 0;
                true
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to open log file");
                false
            }
        }
    }

    async fn open_chunk(&mut self, chunk: u32) -> bool {
        let name = self.settings.pattern.file_name(chunk);
        let path = self.settings.out_dir.join(name);
        self.open_path(path).await
    }

    async fn close_sink(&mut self) {
        if let Some(mut sink) = self.sink.take() {
            if let Err(e) = sink.close().await {
                warn!(path = %sink.path().display(), error = %e, "Failed to close log file");
            }
        }
    }

    /// Drain the buffer into the open stream and pick the resulting state
    async fn settle(&mut self) {
        self.flush_buffer().await;
        self.state = if self.sink.is_some() {
            ManagerState::Ready
        } else {
            ManagerState::Buffering
        };
    }

    async fn flush_buffer(&mut self) {
        if self.buffer.is_empty() {
            return;
        }
        let Some(sink) = self.sink.as_mut() else {
            return;
        };

        let data = self.buffer.take();
        match sink.append(&data).await {
            Ok(()) => {
                self.unproven = false;
                self.track(data.len());
                if self.settings.debug {
                    debug!(bytes = data.len(), "Flushed pending buffer");
                }
            }
            Err(e) => {
                warn!(error = %e, bytes = data.len(), "Failed to flush pending buffer");
                self.buffer.requeue(&data);
                self.close_sink().await;
                self.state = ManagerState::Buffering;
            }
        }
    }

    fn buffer_bytes(&mut self, bytes: &[u8]) {
        let evicted = self.buffer.push(bytes);
        if evicted > 0 {
            warn!(evicted, "Pending buffer full, dropped oldest bytes");
        } else if self.settings.debug {
            debug!(bytes = bytes.len(), buffered = self.buffer.len(), "Buffered write");
        }
    }

    async fn write(&mut self, bytes: Bytes) {
        if self.sink.is_none() {
            self.buffer_bytes(&bytes);
            self.state = ManagerState::Buffering;
            self.recover().await;
            return;
        }

        if let Some(max) = self.settings.max_file_size {
            let would_exceed = self.file_bytes + bytes.len() as u64 > max;
            if self.file_bytes > 0 && would_exceed && self.settings.rotation_enabled() {
                if self.settings.debug {
                    debug!(
                        current = self.file_bytes,
                        incoming = bytes.len(),
                        max,
                        "Size limit reached"
                    );
                }
                self.rotate().await;
            }
        }

        let Some(sink) = self.sink.as_mut() else {
            self.buffer_bytes(&bytes);
            self.state = ManagerState::Buffering;
            return;
        };

        match sink.append(&bytes).await {
            Ok(()) => {
                self.unproven = false;
                self.track(bytes.len());
            }
            Err(e) => {
                warn!(error = %e, bytes = bytes.len(), "Write failed, buffering");
                self.close_sink().await;
                self.buffer_bytes(&bytes);
                self.state = ManagerState::Buffering;
                self.recover().await;
            }
        }
    }

    /// Try to get a stream back after a failure
    ///
    /// A file that never accepted a byte is reopened rather than rotated
    /// away, so a persistent write failure does not leave a trail of
    /// empty chunks.
    async fn recover(&mut self) {
        self.ensure_dir().await;
        let reuse = self.unproven && self.current_path.is_some();
        if self.settings.rotation_enabled() && !reuse {
            self.rotate().await;
        } else {
            let path = self.current_path.clone();
            let reopened = match path {
                Some(path) => self.open_path(path).await,
                None => self.open_chunk(1).await,
            };
            if !reopened {
                return;
            }
        }
        self.settle().await;
    }

    /// Close the current stream and open the next chunk
    #[instrument(skip_all)]
    async fn rotate(&mut self) {
        if !self.settings.rotation_enabled() {
            if self.settings.debug {
                debug!("Rotation disabled, skipping");
            }
            return;
        }

        let current_chunk = self
            .current_path
            .as_deref()
            .and_then(Path::file_name)
            .and_then(|name| name.to_str())
            .map(extract_chunk)
            .unwrap_or(0);

        if self.sink.is_some() {
            self.flush_buffer().await;
            self.close_sink().await;
        }

        if self.open_chunk(current_chunk.saturating_add(1)).await {
            self.rotations += 1;
            if self.settings.debug {
                info!(chunk = current_chunk + 1, rotations = self.rotations, "Rotated log file");
            }
        }
        self.settle().await;
    }

    async fn run_job(&mut self, job: Job) -> usize {
        let affected = match job {
            Job::CheckCurrentFile => self.check_current_file().await,
            Job::Rotate => {
                self.rotate().await;
                0
            }
            Job::Cleanup => self.cleanup().await,
            Job::Archive => self.archive().await,
            Job::ResetChunkScope => {
                self.reset_chunk_scope();
                0
            }
        };
        if self.settings.debug {
            debug!(job = job.as_str(), affected, "Job finished");
        }
        affected
    }

    /// Returns 1 when the current file has gone missing
    async fn check_current_file(&mut self) -> usize {
        let Some(path) = self.current_path.clone() else {
            return 0;
        };
        if self.fs.exists(&path).await {
            return 0;
        }

        warn!(path = %path.display(), "Current log file is missing");
        if self.settings.rotation_enabled() {
            self.rotate().await;
        }
        1
    }

    /// Delete matching files, compressed or not, older than the retention
    /// window. The file being written is kept.
    async fn cleanup(&mut self) -> usize {
        let now = SystemTime::now();
        let mut deleted = 0;
        for meta in self.matching_files(true).await {
            if age(now, meta.modified) <= self.settings.retention {
                continue;
            }
            if self.current_path.as_ref() == Some(&meta.path) {
                continue;
            }
            match self.fs.remove(&meta.path).await {
                Ok(()) => {
                    deleted += 1;
                    if self.settings.debug {
                        debug!(path = %meta.path.display(), "Deleted expired file");
                    }
                }
                Err(e) => {
                    warn!(path = %meta.path.display(), error = %e, "Failed to delete expired file")
                }
            }
        }
        deleted
    }

    /// Compress uncompressed files older than the archive threshold
    async fn archive(&mut self) -> usize {
        let now = SystemTime::now();
        let mut archived = 0;
        for meta in self.matching_files(false).await {
            if age(now, meta.modified) <= self.settings.archive_after {
                continue;
            }
            if self.current_path.as_ref() == Some(&meta.path) {
                continue;
            }

            let target = archive_path(&meta.path);
            if let Err(e) = self.fs.compress(&meta.path, &target).await {
                warn!(path = %meta.path.display(), error = %e, "Failed to archive file");
                if self.fs.exists(&target).await
                    && let Err(e) = self.fs.remove(&target).await
                {
                    warn!(path = %target.display(), error = %e, "Partial archive left behind");
                }
                continue;
            }
            match self.fs.remove(&meta.path).await {
                Ok(()) => {
                    archived += 1;
                    if self.settings.debug {
                        debug!(path = %target.display(), "Archived file");
                    }
                }
                Err(e) => warn!(
                    path = %meta.path.display(),
                    error = %e,
                    "Failed to delete archived original"
                ),
            }
        }
        archived
    }

    /// Chunk numbers are derived from file names, so this only records the day
    fn reset_chunk_scope(&mut self) {
        let today = Utc::now().date_naive();
        if self.last_reset != Some(today) {
            self.last_reset = Some(today);
            if self.settings.debug {
                debug!(%today, "Chunk scope reset");
            }
        }
    }

    async fn close(&mut self) {
        self.flush_buffer().await;
        if !self.buffer.is_empty() {
            warn!(bytes = self.buffer.len(), "Discarding unflushed bytes at shutdown");
        }
        self.close_sink().await;
    }
}

fn age(now: SystemTime, modified: SystemTime) -> Duration {
    now.duration_since(modified).unwrap_or_default()
}

fn job_schedules(settings: &ManagerSettings) -> Result<Vec<(Job, CronSchedule)>, ConfigError> {
    let mut jobs = Vec::new();
    if settings.rotation.is_some() || settings.cleaning.is_some() {
        jobs.push((Job::CheckCurrentFile, CronSchedule::parse(EVERY_QUARTER_HOUR)?));
    }
    if let Some(schedule) = &settings.rotation {
        jobs.push((Job::Rotate, schedule.clone()));
    }
    if let Some(schedule) = &settings.cleaning {
        jobs.push((Job::Cleanup, schedule.clone()));
    }
    if let Some(schedule) = &settings.archiving {
        jobs.push((Job::Archive, schedule.clone()));
    }
    jobs.push((Job::ResetChunkScope, CronSchedule::parse(DAILY_AT_MIDNIGHT)?));
    Ok(jobs)
}

/// Background task firing one job on a cron schedule
struct ScheduledJob {
    job: Job,
    schedule: CronSchedule,
    commands: mpsc::UnboundedSender<Command>,
    shutdown_rx: broadcast::Receiver<()>,
    debug: bool,
}

impl ScheduledJob {
    fn spawn(
        job: Job,
        schedule: CronSchedule,
        commands: mpsc::UnboundedSender<Command>,
        shutdown_rx: broadcast::Receiver<()>,
        debug: bool,
    ) -> JoinHandle<()> {
        let task = Self {
            job,
            schedule,
            commands,
            shutdown_rx,
            debug,
        };
        tokio::spawn(task.run())
    }

    async fn run(mut self) {
        if self.debug {
            debug!(job = self.job.as_str(), schedule = %self.schedule, "Scheduled job started");
        }

        loop {
            let Some(delay) = self.schedule.delay_from(Utc::now()) else {
                warn!(job = self.job.as_str(), schedule = %self.schedule, "Schedule never fires");
                break;
            };

            tokio::select! {
                _ = self.shutdown_rx.recv() => break,
                _ = tokio::time::sleep(delay) => {
                    let (ack, done) = oneshot::channel();
                    if self.commands.send(Command::Run(self.job, ack)).is_err() {
                        break;
                    }
                    // Wait for the manager so runs of one job never pile up
                    let _ = done.await;
                }
            }
        }

        if self.debug {
            debug!(job = self.job.as_str(), "Scheduled job stopped");
        }
    }
}
