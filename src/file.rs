//! Open file handles
//!
//! A [`File`] is either a byte cursor over a file's plaintext or a listing
//! cursor over a directory's range of the index. Each `open` produces an
//! independent handle; two handles on the same path share the plaintext
//! buffer but never their position.

use crate::entry::Metadata;
use crate::error::{BroccoliError, Result};
use crate::index::Index;
use crate::path;
use std::io;
use std::sync::Arc;

/// Reference point for [`File::seek`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum Whence {
    /// Relative to the start of the file
    Start = 0,
    /// Relative to the current position
    Current = 1,
    /// Backwards from the end of the file
    End = 2,
}

impl TryFrom<i32> for Whence {
    type Error = BroccoliError;

    fn try_from(value: i32) -> Result<Self> {
        match value {
            0 => Ok(Whence::Start),
            1 => Ok(Whence::Current),
            2 => Ok(Whence::End),
            other => Err(BroccoliError::BadWhence(other)),
        }
    }
}

struct ByteCursor {
    data: Arc<[u8]>,
    pos: usize,
}

struct DirCursor {
    index: Arc<Index>,
    prefix: String,
    next: usize,
    next_derived: usize,
}

impl DirCursor {
    fn new(index: Arc<Index>, prefix: String) -> Self {
        let next = index.lower_bound(&prefix);
        let next_derived = index
            .derived_dirs()
            .partition_point(|meta| meta.path() < prefix.as_str());
        Self {
            index,
            prefix,
            next,
            next_derived,
        }
    }

    fn is_child(&self, path: &str) -> Option<bool> {
        path.strip_prefix(self.prefix.as_str())
            .map(|rest| !rest.contains('/'))
    }

    /// Position of the next recorded immediate child, skipping deeper
    /// descendants
    fn peek_entry(&mut self) -> Option<usize> {
        while let Some(entry) = self.index.entry_at(self.next) {
            match self.is_child(entry.path()) {
                Some(true) => return Some(self.next),
                Some(false) => self.next += 1,
                None => return None,
            }
        }
        None
    }

    /// Position of the next derived immediate child directory
    fn peek_derived(&mut self) -> Option<usize> {
        while let Some(meta) = self.index.derived_dirs().get(self.next_derived) {
            match self.is_child(meta.path()) {
                Some(true) => return Some(self.next_derived),
                Some(false) => self.next_derived += 1,
                None => return None,
            }
        }
        None
    }

    /// Next immediate child in path order, recorded or derived
    fn next_child(&mut self) -> Option<Metadata> {
        let entry = self.peek_entry().map(|i| self.index.entries()[i].metadata());
        let derived = self
            .peek_derived()
            .map(|i| self.index.derived_dirs()[i].clone());

        match (entry, derived) {
            (Some(entry), Some(dir)) if dir.path() < entry.path() => {
                self.next_derived += 1;
                Some(dir)
            }
            (Some(entry), _) => {
                self.next += 1;
                Some(entry)
            }
            (None, Some(dir)) => {
                self.next_derived += 1;
                Some(dir)
            }
            (None, None) => None,
        }
    }
}

enum State {
    Closed,
    Reading(ByteCursor),
    Listing(DirCursor),
}

/// An open file or directory
pub struct File {
    metadata: Metadata,
    state: State,
}

impl File {
    pub(crate) fn regular(metadata: Metadata, data: Arc<[u8]>) -> Self {
        Self {
            metadata,
            state: State::Reading(ByteCursor { data, pos: 0 }),
        }
    }

    pub(crate) fn directory(metadata: Metadata, index: Arc<Index>) -> Self {
        let prefix = path::child_prefix(metadata.path());
        Self {
            metadata,
            state: State::Listing(DirCursor::new(index, prefix)),
        }
    }

    /// Metadata of the opened entry
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn name(&self) -> &str {
        self.metadata.name()
    }

    pub fn is_dir(&self) -> bool {
        self.metadata.is_dir()
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.state, State::Closed)
    }

    /// Copy bytes from the current position into `buf`.
    ///
    /// Returns `Ok(0)` once the end of the data has been reached.
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let cursor = self.byte_cursor()?;
        let remaining = &cursor.data[cursor.pos.min(cursor.data.len())..];
        let n = remaining.len().min(buf.len());
        buf[..n].copy_from_slice(&remaining[..n]);
        cursor.pos += n;
        Ok(n)
    }

    /// Move the read position and return the new absolute offset.
    ///
    /// Valid targets are `0..len`; `End` counts backwards, so
    /// `seek(1, Whence::End)` lands on the last byte.
    pub fn seek(&mut self, offset: i64, whence: Whence) -> Result<u64> {
        let cursor = self.byte_cursor()?;
        let len = cursor.data.len() as i64;
        let pos = cursor.pos as i64;

        let target = match whence {
            Whence::Start => {
                if offset < 0 || offset >= len {
                    return Err(BroccoliError::BadOffset(offset));
                }
                offset
            }
            Whence::Current => {
                let remaining = len - pos;
                if offset >= remaining || pos + offset < 0 {
                    return Err(BroccoliError::BadOffset(offset));
                }
                pos + offset
            }
            Whence::End => {
                if offset < 0 || offset >= len {
                    return Err(BroccoliError::BadOffset(offset));
                }
                len - offset
            }
        };

        cursor.pos = target as usize;
        Ok(target as u64)
    }

    /// Current read position
    pub fn position(&self) -> Result<u64> {
        match &self.state {
            State::Reading(cursor) => Ok(cursor.pos as u64),
            State::Listing(_) => Err(BroccoliError::PermissionDenied(
                self.metadata.path().to_string(),
            )),
            State::Closed => Err(BroccoliError::Closed),
        }
    }

    /// List up to `count` immediate children, resuming where the previous
    /// call stopped.
    ///
    /// With `count > 0`, an empty remainder is reported as
    /// [`BroccoliError::Exhausted`]. With `count <= 0`, everything left is
    /// returned at once, possibly empty.
    pub fn readdir(&mut self, count: isize) -> Result<Vec<Metadata>> {
        let cursor = match &mut self.state {
            State::Listing(cursor) => cursor,
            State::Reading(_) => {
                return Err(BroccoliError::NotADirectory(self.metadata.path().to_string()))
            }
            State::Closed => return Err(BroccoliError::Closed),
        };

        let mut children = Vec::new();
        if count <= 0 {
            while let Some(child) = cursor.next_child() {
                children.push(child);
            }
            return Ok(children);
        }

        while children.len() < count as usize {
            match cursor.next_child() {
                Some(child) => children.push(child),
                None => break,
            }
        }
        if children.is_empty() {
            return Err(BroccoliError::Exhausted);
        }
        Ok(children)
    }

    /// Release the handle's view of the data
    pub fn close(&mut self) -> Result<()> {
        if self.is_closed() {
            return Err(BroccoliError::AlreadyClosed);
        }
        self.state = State::Closed;
        Ok(())
    }

    fn byte_cursor(&mut self) -> Result<&mut ByteCursor> {
        match &mut self.state {
            State::Reading(cursor) => Ok(cursor),
            State::Listing(_) => Err(BroccoliError::PermissionDenied(
                self.metadata.path().to_string(),
            )),
            State::Closed => Err(BroccoliError::Closed),
        }
    }
}

impl std::fmt::Debug for File {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "File({:?}, closed: {})", self.metadata.path(), self.is_closed())
    }
}

impl io::Read for File {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        File::read(self, buf).map_err(Into::into)
    }
}

impl io::Seek for File {
    fn seek(&mut self, pos: io::SeekFrom) -> io::Result<u64> {
        let (offset, whence) = match pos {
            // Position query, valid even at end of data
            io::SeekFrom::Current(0) => return self.position().map_err(Into::into),
            io::SeekFrom::Start(n) => (
                i64::try_from(n).map_err(|_| BroccoliError::BadOffset(i64::MAX))?,
                Whence::Start,
            ),
            io::SeekFrom::Current(n) => (n, Whence::Current),
            io::SeekFrom::End(n) => (
                n.checked_neg().ok_or(BroccoliError::BadOffset(n))?,
                Whence::End,
            ),
        };
        File::seek(self, offset, whence).map_err(Into::into)
    }
}
