use crate::archive::compression::decompress_bounded;
use crate::archive::format::{read_u32, read_u64, Record, ENTRY_COUNT_SIZE, RECORD_LENGTH_SIZE};
use crate::archive::pool::CompressionPool;
use crate::config::LoadOptions;
use crate::entry::{Entry, EntryKind, Payload};
use crate::error::{BroccoliError, Result};
use crate::path;
use tracing::{debug, warn};

/// Archive reader turning packed bytes back into entries
pub struct ArchiveReader {
    options: LoadOptions,
}

impl ArchiveReader {
    pub fn new(options: LoadOptions) -> Self {
        Self { options }
    }

    /// Decode every entry of an archive, sorted by path.
    ///
    /// File payloads stay compressed unless the reader is eager, in which
    /// case they are all decompressed on the worker pool before returning.
    pub fn read_entries(&self, bytes: &[u8]) -> Result<Vec<Entry>> {
        let limit = self.options.max_archive_size;
        let stream = decompress_bounded(bytes, limit)
            .map_err(|e| BroccoliError::Corrupt(format!("outer stream: {}", e)))?;
        if stream.len() as u64 > limit {
            return Err(BroccoliError::ArchiveTooLarge { limit });
        }

        let mut entries = parse_stream(&stream, self.options.max_entry_size)?;
        ensure_sorted(&mut entries)?;

        let files = entries.iter().filter(|e| !e.is_dir()).count();
        debug!(
            entries = entries.len(),
            files,
            archive_bytes = bytes.len(),
            stream_bytes = stream.len(),
            eager = self.options.eager,
            "decoded archive"
        );

        if self.options.eager {
            decompress_all(&entries, self.options.workers)?;
        }
        Ok(entries)
    }
}

/// Decompress every file payload in parallel
pub fn decompress_all(entries: &[Entry], workers: usize) -> Result<()> {
    let files: Vec<&Entry> = entries.iter().filter(|e| !e.is_dir()).collect();
    CompressionPool::new(workers).run(&files, |entry| entry.plaintext().map(|_| ()))?;
    Ok(())
}

fn parse_stream(stream: &[u8], max_entry_size: u64) -> Result<Vec<Entry>> {
    let mut rest = stream;
    let count = read_u32(&mut rest)? as usize;

    if count > rest.len() / RECORD_LENGTH_SIZE {
        return Err(BroccoliError::Corrupt(format!(
            "entry count {} cannot fit in {} bytes",
            count,
            stream.len() - ENTRY_COUNT_SIZE
        )));
    }

    let mut entries = Vec::with_capacity(count);
    for i in 0..count {
        let len = read_u64(&mut rest)?;
        if len > rest.len() as u64 {
            return Err(BroccoliError::Corrupt(format!(
                "record {} claims {} bytes, {} remain",
                i,
                len,
                rest.len()
            )));
        }
        let (record_bytes, tail) = rest.split_at(len as usize);
        rest = tail;
        entries.push(entry_from_record(
            Record::read_from(record_bytes)?,
            max_entry_size,
        )?);
    }

    if !rest.is_empty() {
        return Err(BroccoliError::Corrupt(format!(
            "{} trailing bytes after last record",
            rest.len()
        )));
    }
    Ok(entries)
}

fn entry_from_record(record: Record, max_entry_size: u64) -> Result<Entry> {
    let normalized = path::validate(&record.path)
        .map_err(|e| BroccoliError::Corrupt(format!("stored path: {}", e)))?;
    if normalized != record.path {
        return Err(BroccoliError::Corrupt(format!(
            "stored path {:?} is not normalized",
            record.path
        )));
    }
    if record.name != path::basename(&record.path) {
        return Err(BroccoliError::Corrupt(format!(
            "name {:?} does not match path {:?}",
            record.name, record.path
        )));
    }

    if record.is_dir() {
        if record.size != 0 || !record.payload.is_empty() {
            return Err(BroccoliError::Corrupt(format!(
                "directory {} carries a payload",
                record.path
            )));
        }
        let mod_time = record.dir_mod_time().ok_or_else(|| {
            BroccoliError::Corrupt(format!("{}: invalid modification time", record.path))
        })?;
        return Ok(Entry::from_parts(record.path, mod_time, EntryKind::Directory));
    }

    let size = u64::try_from(record.size)
        .map_err(|_| BroccoliError::Corrupt(format!("{}: negative size", record.path)))?;
    if size > max_entry_size {
        return Err(BroccoliError::EntryTooLarge {
            path: record.path,
            size,
            limit: max_entry_size,
        });
    }
    Ok(Entry::from_parts(
        record.path,
        record.mod_time,
        EntryKind::File {
            size,
            payload: Payload::compressed(record.payload),
        },
    ))
}

/// Entries are written sorted; re-sort identically if they are not, and
/// refuse duplicates outright.
fn ensure_sorted(entries: &mut [Entry]) -> Result<()> {
    if !entries.windows(2).all(|w| w[0].path() <= w[1].path()) {
        warn!("archive entries out of order, re-sorting");
        entries.sort_by(|a, b| a.path().cmp(b.path()));
    }
    if let Some(w) = entries.windows(2).find(|w| w[0].path() == w[1].path()) {
        return Err(BroccoliError::Corrupt(format!(
            "duplicate entry {}",
            w[0].path()
        )));
    }
    Ok(())
}
