//! In-memory document buffer shared by the HTTP handlers and the persister

use bytes::Bytes;
use parking_lot::RwLock;
use std::path::{Path, PathBuf};

/// Contents copied out of a dirty document, tagged with the revision they
/// were taken at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub contents: Bytes,
    pub revision: u64,
}

#[derive(Debug, Default)]
struct DocumentState {
    contents: Bytes,
    dirty: bool,
    /// Number of writes accepted so far
    revision: u64,
}

/// The document being edited, paired with its backing file
///
/// Contents, dirty flag and revision live behind one lock so that a write
/// and its dirty marker are always observed together.
#[derive(Debug)]
pub struct Document {
    path: PathBuf,
    state: RwLock<DocumentState>,
}

impl Document {
    /// Create an empty, clean document backed by `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            state: RwLock::new(DocumentState::default()),
        }
    }

    /// Backing file location
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current contents
    pub fn read(&self) -> Bytes {
        self.state.read().contents.clone()
    }

    /// Overwrite the contents and mark the document dirty
    pub fn replace(&self, contents: impl Into<Bytes>) {
        let contents = contents.into();
        let mut state = self.state.write();
        state.contents = contents;
        state.dirty = true;
        state.revision += 1;
    }

    pub fn is_dirty(&self) -> bool {
        self.state.read().dirty
    }

    pub fn revision(&self) -> u64 {
        self.state.read().revision
    }

    pub fn len(&self) -> usize {
        self.state.read().contents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy out the contents if there is anything to flush
    pub fn snapshot(&self) -> Option<Snapshot> {
        let state = self.state.read();
        state.dirty.then(|| Snapshot {
            contents: state.contents.clone(),
            revision: state.revision,
        })
    }

    /// Clear the dirty flag after `revision` reached disk
    ///
    /// Returns false and leaves the document dirty when a write landed after
    /// the snapshot was taken.
    pub fn mark_clean(&self, revision: u64) -> bool {
        let mut state = self.state.write();
        if state.revision != revision {
            return false;
        }
        state.dirty = false;
        true
    }

    /// Install contents read from disk at startup
    ///
    /// Skipped when a write already reached the document, since that write is
    /// newer than the file.
    pub fn install_loaded(&self, contents: impl Into<Bytes>) -> bool {
        let mut state = self.state.write();
        if state.revision != 0 {
            return false;
        }
        state.contents = contents.into();
        state.dirty = false;
        true
    }
}
