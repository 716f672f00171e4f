//! Archive entries and their metadata
//!
//! An [`Entry`] is one file or directory record. Files carry a payload that
//! is either plaintext or still compressed; the compressed state only ever
//! moves to plaintext, once, under a per-entry lock.

use crate::archive::compression;
use crate::error::Result;
use crate::path;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::trace;

/// Permission bits reported for regular files
pub const FILE_MODE_BITS: u32 = 0o444;

/// Mode bits reported for directories (`S_IFDIR | 0o555`)
pub const DIR_MODE_BITS: u32 = 0o040555;

/// The only two kinds of mode an archive knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileMode {
    /// Read-only regular file
    ReadOnly,
    /// Directory
    Directory,
}

impl FileMode {
    /// Unix-style mode bits
    pub fn bits(self) -> u32 {
        match self {
            FileMode::ReadOnly => FILE_MODE_BITS,
            FileMode::Directory => DIR_MODE_BITS,
        }
    }
}

/// Metadata returned by `stat` and `readdir`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    path: String,
    name: String,
    size: u64,
    mode: FileMode,
    mod_time: i64,
}

impl Metadata {
    /// Metadata for a directory that has no record of its own
    pub(crate) fn derived_dir(path: String) -> Self {
        Self {
            name: path::basename(&path).to_string(),
            path,
            size: 0,
            mode: FileMode::Directory,
            mod_time: 0,
        }
    }

    pub(crate) fn root() -> Self {
        Self::derived_dir(String::new())
    }

    /// Full archive path
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Base name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Uncompressed size in bytes; 0 for directories
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn mode(&self) -> FileMode {
        self.mode
    }

    pub fn is_dir(&self) -> bool {
        self.mode == FileMode::Directory
    }

    /// Modification time in seconds since the Unix epoch
    pub fn unix_mod_time(&self) -> i64 {
        self.mod_time
    }

    pub fn mod_time(&self) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(self.mod_time.max(0) as u64)
    }
}

/// A source file as handed over by the discovery layer
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Absolute path on the host filesystem
    pub path: PathBuf,
    pub is_dir: bool,
    pub size: u64,
    /// Seconds since the Unix epoch
    pub mod_time: i64,
    /// Plaintext contents; `None` for directories
    pub data: Option<Vec<u8>>,
}

/// Payload state of a file entry
pub(crate) enum PayloadState {
    Plain(Arc<[u8]>),
    Compressed(Vec<u8>),
}

/// Payload bytes with a one-way compressed -> plaintext transition
pub(crate) struct Payload {
    state: RwLock<PayloadState>,
    compressed: AtomicBool,
}

impl Payload {
    pub(crate) fn plain(data: Vec<u8>) -> Self {
        Self {
            state: RwLock::new(PayloadState::Plain(data.into())),
            compressed: AtomicBool::new(false),
        }
    }

    pub(crate) fn compressed(data: Vec<u8>) -> Self {
        Self {
            state: RwLock::new(PayloadState::Compressed(data)),
            compressed: AtomicBool::new(true),
        }
    }

    pub(crate) fn is_compressed(&self) -> bool {
        self.compressed.load(Ordering::Acquire)
    }

    /// Plaintext bytes, decompressing in place on first use.
    ///
    /// The write lock makes the transition happen at most once; racing
    /// callers block and then observe the plaintext.
    pub(crate) fn plaintext(&self, path: &str, size: u64) -> Result<Arc<[u8]>> {
        if !self.is_compressed() {
            let guard = self.state.read().unwrap_or_else(PoisonError::into_inner);
            if let PayloadState::Plain(data) = &*guard {
                return Ok(Arc::clone(data));
            }
        }

        let mut guard = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let plain: Arc<[u8]> = match &*guard {
            PayloadState::Plain(data) => return Ok(Arc::clone(data)),
            PayloadState::Compressed(bytes) => {
                compression::decompress_entry(path, bytes, size)?.into()
            }
        };
        trace!(path, size, "decompressed entry");
        *guard = PayloadState::Plain(Arc::clone(&plain));
        self.compressed.store(false, Ordering::Release);
        Ok(plain)
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Payload")
            .field("compressed", &self.is_compressed())
            .finish()
    }
}

#[derive(Debug)]
pub(crate) enum EntryKind {
    File { size: u64, payload: Payload },
    Directory,
}

/// One file or directory record
#[derive(Debug)]
pub struct Entry {
    path: String,
    name: String,
    mod_time: i64,
    kind: EntryKind,
}

impl Entry {
    /// Create a file entry from plaintext bytes
    pub fn file(path: &str, data: impl Into<Vec<u8>>, mod_time: i64) -> Result<Self> {
        let data = data.into();
        Ok(Self::from_parts(
            path::validate(path)?,
            mod_time.max(0),
            EntryKind::File {
                size: data.len() as u64,
                payload: Payload::plain(data),
            },
        ))
    }

    /// Create a directory entry
    pub fn directory(path: &str, mod_time: i64) -> Result<Self> {
        Ok(Self::from_parts(
            path::validate(path)?,
            mod_time.max(0),
            EntryKind::Directory,
        ))
    }

    /// Create an entry from a discovered source, relative to `root`
    pub fn from_source(root: &Path, source: SourceFile) -> Result<Self> {
        let rel = path::relative_to(root, &source.path)?;
        if source.is_dir {
            Self::directory(&rel, source.mod_time)
        } else {
            Self::file(&rel, source.data.unwrap_or_default(), source.mod_time)
        }
    }

    /// Stat and read a single path from disk
    pub fn from_disk(root: &Path, file_path: &Path) -> Result<Self> {
        let metadata = std::fs::metadata(file_path)?;
        let mod_time = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0);
        let data = if metadata.is_dir() {
            None
        } else {
            Some(std::fs::read(file_path)?)
        };

        Self::from_source(
            root,
            SourceFile {
                path: file_path.to_path_buf(),
                is_dir: metadata.is_dir(),
                size: metadata.len(),
                mod_time,
                data,
            },
        )
    }

    pub(crate) fn from_parts(path: String, mod_time: i64, kind: EntryKind) -> Self {
        let name = path::basename(&path).to_string();
        Self {
            path,
            name,
            mod_time,
            kind,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_dir(&self) -> bool {
        matches!(self.kind, EntryKind::Directory)
    }

    pub fn size(&self) -> u64 {
        match &self.kind {
            EntryKind::File { size, .. } => *size,
            EntryKind::Directory => 0,
        }
    }

    /// Modification time in seconds since the Unix epoch
    pub fn mod_time(&self) -> i64 {
        self.mod_time
    }

    /// Whether the payload still holds compressed bytes
    pub fn is_compressed(&self) -> bool {
        match &self.kind {
            EntryKind::File { payload, .. } => payload.is_compressed(),
            EntryKind::Directory => false,
        }
    }

    pub fn metadata(&self) -> Metadata {
        Metadata {
            path: self.path.clone(),
            name: self.name.clone(),
            size: self.size(),
            mode: if self.is_dir() {
                FileMode::Directory
            } else {
                FileMode::ReadOnly
            },
            mod_time: self.mod_time,
        }
    }

    /// Plaintext of a file entry; `None` for directories
    pub(crate) fn plaintext(&self) -> Result<Option<Arc<[u8]>>> {
        match &self.kind {
            EntryKind::File { size, payload } => payload.plaintext(&self.path, *size).map(Some),
            EntryKind::Directory => Ok(None),
        }
    }
}
