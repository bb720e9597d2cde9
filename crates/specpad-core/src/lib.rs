//! specpad core - shared document buffer and disk persistence
//!
//! A single [`Document`] holds the bytes being edited. The HTTP layer reads and
//! replaces it; a background [`Persister`] loads it from disk at startup and
//! flushes it back whenever it is dirty. The two sides never talk to each
//! other directly, only through the document's lock and dirty flag.
//!
//! ```text
//!   GET/PUT /backend ──► Document ◄── Persister ──► file on disk
//!                      (RwLock + dirty)   (tick every 2s)
//! ```

pub mod document;
pub mod error;
pub mod persistence;

pub use document::{Document, Snapshot};
pub use error::{DocumentError, Result};
pub use persistence::{FlushOutcome, Persister, SyncPhase, SyncReport, SyncStatus};

/// Default backing file, relative to the working directory
pub const DEFAULT_DOCUMENT_PATH: &str = "api-spec.yaml";

/// Default time between two flush ticks, in milliseconds
pub const DEFAULT_FLUSH_INTERVAL_MS: u64 = 2000;
