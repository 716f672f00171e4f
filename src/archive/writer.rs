use crate::archive::compression::compress;
use crate::archive::format::{zstd_level, Record};
use crate::archive::pool::CompressionPool;
use crate::config::PackOptions;
use crate::entry::{Entry, SourceFile};
use crate::error::{BroccoliError, Result};
use std::collections::HashSet;
use std::io::Write;
use std::path::Path;
use tracing::debug;

/// Archive writer collecting entries into a packed buffer
pub struct ArchiveWriter {
    options: PackOptions,
    entries: Vec<Entry>,
    paths: HashSet<String>,
}

impl ArchiveWriter {
    /// Create a writer with the given pack options
    pub fn new(options: PackOptions) -> Self {
        Self {
            options,
            entries: Vec::new(),
            paths: HashSet::new(),
        }
    }

    /// Add a prepared entry
    pub fn add_entry(&mut self, entry: Entry) -> Result<()> {
        if !self.paths.insert(entry.path().to_string()) {
            return Err(BroccoliError::DuplicatePath(entry.path().to_string()));
        }
        self.entries.push(entry);
        Ok(())
    }

    /// Add a file from plaintext bytes
    pub fn add_file(&mut self, path: &str, data: &[u8], mod_time: i64) -> Result<()> {
        self.add_entry(Entry::file(path, data, mod_time)?)
    }

    /// Add a directory record
    pub fn add_directory(&mut self, path: &str, mod_time: i64) -> Result<()> {
        self.add_entry(Entry::directory(path, mod_time)?)
    }

    /// Add an entry produced by the discovery layer
    pub fn add_source(&mut self, root: &Path, source: SourceFile) -> Result<()> {
        self.add_entry(Entry::from_source(root, source)?)
    }

    /// Add a file or directory from disk
    pub fn add_from_disk(&mut self, root: &Path, path: &Path) -> Result<()> {
        self.add_entry(Entry::from_disk(root, path)?)
    }

    /// Number of entries added so far
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Compress every file, serialize the sorted entries, and compress the
    /// whole stream once more. Nothing is returned unless every step succeeds.
    pub fn finish(mut self) -> Result<Vec<u8>> {
        self.options.validate()?;

        self.entries.sort_by(|a, b| a.path().cmp(b.path()));
        let entry_count = u32::try_from(self.entries.len())
            .map_err(|_| BroccoliError::Internal("too many entries for one archive".into()))?;

        let files: Vec<&Entry> = self.entries.iter().filter(|e| !e.is_dir()).collect();
        let quality = self.options.quality;
        let pool = CompressionPool::new(self.options.workers);
        let compressed = pool.run(&files, |entry| compress_entry(entry, quality))?;
        let mut compressed = compressed.into_iter();

        let mut encoder = zstd::Encoder::new(Vec::new(), zstd_level(self.options.packing_quality))?;
        encoder.include_checksum(true)?;
        encoder.write_all(&entry_count.to_le_bytes())?;

        let mut plain_bytes = 0u64;
        for entry in &self.entries {
            let payload = if entry.is_dir() {
                Vec::new()
            } else {
                compressed.next().ok_or_else(|| {
                    BroccoliError::Internal(format!("missing payload for {}", entry.path()))
                })?
            };
            plain_bytes += entry.size();

            let record = Record {
                path: entry.path().to_string(),
                name: entry.name().to_string(),
                size: entry.size() as i64,
                mod_time: Record::encode_mod_time(entry.mod_time(), entry.is_dir()),
                payload,
            };
            encoder.write_all(&(record.encoded_len() as u64).to_le_bytes())?;
            record.write_to(&mut encoder)?;
        }

        let archive = encoder.finish()?;
        debug!(
            entries = self.entries.len(),
            files = files.len(),
            plain_bytes,
            archive_bytes = archive.len(),
            "packed archive"
        );
        Ok(archive)
    }
}

fn compress_entry(entry: &Entry, quality: u8) -> Result<Vec<u8>> {
    let Some(data) = entry.plaintext()? else {
        return Ok(Vec::new());
    };
    compress(&data, quality).map_err(|e| BroccoliError::CompressionFailed {
        path: entry.path().to_string(),
        reason: e.to_string(),
    })
}

/// Pack `entries` with the given per-file quality and default options
pub fn pack(entries: Vec<Entry>, quality: u8) -> Result<Vec<u8>> {
    let mut writer = ArchiveWriter::new(PackOptions::default().with_quality(quality));
    for entry in entries {
        writer.add_entry(entry)?;
    }
    writer.finish()
}
