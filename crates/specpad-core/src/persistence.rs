//! Background persistence: initial load and periodic flush of the document
//!
//! The persister owns no document state of its own. It loads the backing
//! file once, then on every tick copies the contents out of a dirty document,
//! drops the lock and writes the copy to disk. A write that lands while the
//! copy is being written keeps the document dirty for the next tick.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use std::io::ErrorKind;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::document::Document;
use crate::{DocumentError, Result, DEFAULT_FLUSH_INTERVAL_MS};

/// Lifecycle of the persistence loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncPhase {
    /// Initial load has not finished
    Loading,
    /// Flushing on every tick
    Running,
    /// Initial load failed, nothing will be flushed
    Failed,
    /// Loop was cancelled
    Stopped,
}

/// Point-in-time view of the persistence loop
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub phase: SyncPhase,
    pub loaded_bytes: Option<usize>,
    pub flush_count: u64,
    pub last_flush: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

/// Shared, observable state of the persistence loop
#[derive(Debug)]
pub struct SyncStatus {
    inner: RwLock<SyncReport>,
}

impl SyncStatus {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(SyncReport {
                phase: SyncPhase::Loading,
                loaded_bytes: None,
                flush_count: 0,
                last_flush: None,
                last_error: None,
            }),
        }
    }

    pub fn report(&self) -> SyncReport {
        self.inner.read().clone()
    }

    pub fn phase(&self) -> SyncPhase {
        self.inner.read().phase
    }

    fn set_phase(&self, phase: SyncPhase) {
        self.inner.write().phase = phase;
    }

    fn record_loaded(&self, bytes: usize) {
        self.inner.write().loaded_bytes = Some(bytes);
    }

    fn record_flush(&self) {
        let mut report = self.inner.write();
        report.flush_count += 1;
        report.last_flush = Some(Utc::now());
        report.last_error = None;
    }

    fn record_error(&self, error: &DocumentError) {
        self.inner.write().last_error = Some(error.to_string());
    }
}

impl Default for SyncStatus {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of a single flush tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushOutcome {
    /// Nothing to write
    Clean,
    /// Contents were written; `clean` is false when a newer write arrived
    /// while flushing
    Flushed { bytes: usize, clean: bool },
}

/// Loads the document at startup and flushes it while dirty
pub struct Persister {
    document: Arc<Document>,
    interval: Duration,
    status: Arc<SyncStatus>,
}

impl Persister {
    pub fn new(document: Arc<Document>) -> Self {
        Self {
            document,
            interval: Duration::from_millis(DEFAULT_FLUSH_INTERVAL_MS),
            status: Arc::new(SyncStatus::new()),
        }
    }

    /// Set the tick interval (zero is raised to one millisecond)
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval.max(Duration::from_millis(1));
        self
    }

    /// Report into an existing status handle
    pub fn with_status(mut self, status: Arc<SyncStatus>) -> Self {
        self.status = status;
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn status(&self) -> Arc<SyncStatus> {
        self.status.clone()
    }

    /// Load the backing file into the document
    ///
    /// A missing file is created empty. Returns the number of bytes read.
    pub async fn open(&self) -> Result<usize> {
        self.status.set_phase(SyncPhase::Loading);
        match self.load().await {
            Ok(bytes) => {
                self.status.record_loaded(bytes);
                self.status.set_phase(SyncPhase::Running);
                Ok(bytes)
            }
            Err(e) => {
                self.status.record_error(&e);
                self.status.set_phase(SyncPhase::Failed);
                Err(e)
            }
        }
    }

    async fn load(&self) -> Result<usize> {
        let path = self.document.path();

        let contents = match tokio::fs::read(path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tokio::fs::File::create(path)
                    .await
                    .map_err(|source| DocumentError::Load {
                        path: path.to_path_buf(),
                        source,
                    })?;
                tracing::info!("Created empty document at {}", path.display());
                Vec::new()
            }
            Err(source) => {
                return Err(DocumentError::Load {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let bytes = contents.len();
        if !self.document.install_loaded(contents) {
            tracing::warn!("Document was written before load finished, keeping the newer contents");
        }
        tracing::info!("Loaded {} bytes from {}", bytes, path.display());

        Ok(bytes)
    }

    /// Write the document to disk if it is dirty
    pub async fn save(&self) -> Result<FlushOutcome> {
        let Some(snapshot) = self.document.snapshot() else {
            return Ok(FlushOutcome::Clean);
        };

        let path = self.document.path();
        if let Err(source) = tokio::fs::write(path, &snapshot.contents).await {
            let err = DocumentError::Flush {
                path: path.to_path_buf(),
                source,
            };
            self.status.record_error(&err);
            return Err(err);
        }

        let bytes = snapshot.contents.len();
        let clean = self.document.mark_clean(snapshot.revision);
        self.status.record_flush();
        tracing::info!("{} bytes saved", bytes);

        Ok(FlushOutcome::Flushed { bytes, clean })
    }

    /// Load, then flush on every tick until `cancel` fires
    ///
    /// A load failure is returned straight away and nothing is ever flushed.
    pub async fn run(self, cancel: CancellationToken) -> Result<()> {
        if let Err(e) = self.open().await {
            tracing::error!("{}", e);
            return Err(e);
        }
        self.flush_loop(cancel).await
    }

    /// Flush on every tick until `cancel` fires, assuming the document is
    /// already loaded
    ///
    /// Flush failures are logged and retried on the next tick. Cancellation
    /// triggers one last flush.
    pub async fn flush_loop(self, cancel: CancellationToken) -> Result<()> {
        let mut ticker = tokio::time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    if let Err(e) = self.save().await {
                        tracing::warn!("{}; retrying on next tick", e);
                    }
                }
            }
        }

        let result = self.save().await.map(|_| ());
        if let Err(ref e) = result {
            tracing::error!("Final flush failed: {}", e);
        }
        self.status.set_phase(SyncPhase::Stopped);
        tracing::debug!("Persistence loop stopped");

        result
    }

    /// Run the loop on the tokio runtime
    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<Result<()>> {
        tokio::spawn(self.run(cancel))
    }
}
