//! Read-only virtual file system over a loaded archive
//!
//! Provides path lookup, byte cursors, directory listings and prefix walks
//! over the sorted entry index. The hierarchy is never materialized; a
//! directory is the range of paths that share its prefix.

use crate::archive::{text, ArchiveReader};
use crate::config::LoadOptions;
use crate::entry::{Entry, Metadata};
use crate::error::{BroccoliError, Result};
use crate::file::File;
use crate::index::Index;
use crate::path;
use crate::serve::PrefixedFs;
use std::sync::Arc;

/// Handle to a loaded archive. Cheap to clone and safe to share across threads.
#[derive(Clone, Debug)]
pub struct Vfs {
    index: Arc<Index>,
}

impl Vfs {
    /// Load an archive, decompressing every file up front when `eager`
    pub fn load(bytes: &[u8], eager: bool) -> Result<Self> {
        Self::load_with(bytes, &LoadOptions::default().with_eager(eager))
    }

    /// Load an archive with explicit options
    pub fn load_with(bytes: &[u8], options: &LoadOptions) -> Result<Self> {
        let entries = ArchiveReader::new(options.clone()).read_entries(bytes)?;
        Ok(Self {
            index: Arc::new(Index::new(entries)),
        })
    }

    /// Load an archive that was wrapped with [`text::encode`]
    pub fn load_text(text: &str, options: &LoadOptions) -> Result<Self> {
        Self::load_with(&text::decode(text)?, options)
    }

    /// Build a file system directly from entries, without the codec.
    ///
    /// Entries built with [`Entry::file`] already hold plaintext, so there
    /// is nothing to decompress.
    pub fn from_entries(mut entries: Vec<Entry>) -> Result<Self> {
        entries.sort_by(|a, b| a.path().cmp(b.path()));
        if let Some(w) = entries.windows(2).find(|w| w[0].path() == w[1].path()) {
            return Err(BroccoliError::DuplicatePath(w[0].path().to_string()));
        }
        Ok(Self {
            index: Arc::new(Index::new(entries)),
        })
    }

    /// Open a file for reading.
    ///
    /// Directories cannot be read byte-wise and fail with
    /// [`BroccoliError::PermissionDenied`]; use [`Vfs::open_dir`] to list them.
    /// A compressed payload is decompressed here on first open.
    pub fn open(&self, file_path: &str) -> Result<File> {
        let normalized = path::normalize(file_path);
        let entry = match self.index.get(&normalized) {
            Some(entry) => entry,
            None if normalized.is_empty() || self.index.derived_dir(&normalized).is_some() => {
                return Err(BroccoliError::PermissionDenied(normalized))
            }
            None => return Err(BroccoliError::NotFound(normalized)),
        };

        match entry.plaintext()? {
            Some(data) => Ok(File::regular(entry.metadata(), data)),
            None => Err(BroccoliError::PermissionDenied(normalized)),
        }
    }

    /// Open a directory for listing. `""` opens the archive root, and
    /// directories implied only by deeper paths open like recorded ones.
    pub fn open_dir(&self, dir_path: &str) -> Result<File> {
        let normalized = path::normalize(dir_path);
        let metadata = self.stat(&normalized)?;
        if !metadata.is_dir() {
            return Err(BroccoliError::NotADirectory(normalized));
        }
        Ok(File::directory(metadata, Arc::clone(&self.index)))
    }

    /// Metadata for a path, without touching its payload
    pub fn stat(&self, file_path: &str) -> Result<Metadata> {
        let normalized = path::normalize(file_path);
        match self.index.metadata(&normalized) {
            Some(metadata) => Ok(metadata),
            None if normalized.is_empty() => Ok(Metadata::root()),
            None => Err(BroccoliError::NotFound(normalized)),
        }
    }

    /// Visit every entry whose path starts with `root`, in path order.
    ///
    /// Recorded directories and files are both visited; a directory always
    /// precedes its descendants. The first error returned by `visit` stops the walk
    /// and is returned.
    pub fn walk<F, E>(&self, root: &str, mut visit: F) -> std::result::Result<(), E>
    where
        F: FnMut(&str, &Metadata) -> std::result::Result<(), E>,
    {
        let root = path::normalize(root);
        for entry in self.index.prefix_range(&root) {
            visit(entry.path(), &entry.metadata())?;
        }
        Ok(())
    }

    /// Check whether a path exists, derived directories included
    pub fn exists(&self, file_path: &str) -> bool {
        self.index.metadata(&path::normalize(file_path)).is_some()
    }

    /// Whether a file's payload is still waiting for its first open
    pub fn is_compressed(&self, file_path: &str) -> Result<bool> {
        let normalized = path::normalize(file_path);
        match self.index.get(&normalized) {
            Some(entry) => Ok(entry.is_compressed()),
            None if self.index.derived_dir(&normalized).is_some() => Ok(false),
            None => Err(BroccoliError::NotFound(normalized)),
        }
    }

    /// Number of recorded entries, directories included
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// All paths in sorted order
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.index.entries().iter().map(Entry::path)
    }

    /// The underlying index
    pub fn index(&self) -> &Index {
        &self.index
    }

    /// Adapter resolving request paths under `prefix`
    pub fn serve(&self, prefix: &str) -> PrefixedFs {
        PrefixedFs::new(self.clone(), prefix)
    }
}
