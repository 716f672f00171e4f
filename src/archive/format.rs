use crate::error::{BroccoliError, Result};
use crate::path::MAX_PATH_LENGTH;
use std::io::{Read, Write};

/// Highest quality level (best ratio, slowest)
pub const MAX_QUALITY: u8 = 11;

/// Default per-file quality level
pub const DEFAULT_QUALITY: u8 = MAX_QUALITY;

/// Quality of the outer pass over the whole serialized stream
pub const PACKING_QUALITY: u8 = 6;

/// Size of the entry count prefix
pub const ENTRY_COUNT_SIZE: usize = 4;

/// Size of each record length prefix
pub const RECORD_LENGTH_SIZE: usize = 8;

/// Map a 0-11 quality level onto the zstd level range (1-22)
pub fn zstd_level(quality: u8) -> i32 {
    let quality = quality.min(MAX_QUALITY) as i32;
    1 + quality * 21 / MAX_QUALITY as i32
}

/// One serialized entry.
///
/// Layout (little-endian):
/// - Path: u16 length + UTF-8 bytes
/// - Name: u16 length + UTF-8 bytes
/// - Size: i64
/// - Modified time: i64, negative for directories
/// - Payload: u64 length + bytes (per-entry compressed, empty for directories)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub path: String,
    pub name: String,
    pub size: i64,
    pub mod_time: i64,
    pub payload: Vec<u8>,
}

impl Record {
    /// Wire encoding of an entry's modification time; the sign carries
    /// the directory bit, so a directory at the epoch is written as -1.
    pub fn encode_mod_time(mod_time: i64, is_dir: bool) -> i64 {
        if is_dir {
            -mod_time.max(1)
        } else {
            mod_time.max(0)
        }
    }

    /// Modification time of a directory record. `-1` reads back as the
    /// epoch, so a directory stamped exactly one second after it also
    /// loads as 0.
    pub fn dir_mod_time(&self) -> Option<i64> {
        match self.mod_time {
            -1 => Some(0),
            t if t < 0 => t.checked_neg(),
            _ => None,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.mod_time < 0
    }

    /// Number of bytes `write_to` will produce
    pub fn encoded_len(&self) -> usize {
        2 + self.path.len() + 2 + self.name.len() + 8 + 8 + 8 + self.payload.len()
    }

    /// Write record to a writer
    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        write_str(&mut writer, &self.path)?;
        write_str(&mut writer, &self.name)?;
        writer.write_all(&self.size.to_le_bytes())?;
        writer.write_all(&self.mod_time.to_le_bytes())?;
        writer.write_all(&(self.payload.len() as u64).to_le_bytes())?;
        writer.write_all(&self.payload)?;
        Ok(())
    }

    /// Parse a record that must span exactly `bytes`
    pub fn read_from(bytes: &[u8]) -> Result<Self> {
        let mut reader = bytes;

        let path = read_str(&mut reader, "path")?;
        let name = read_str(&mut reader, "name")?;
        let size = read_i64(&mut reader)?;
        let mod_time = read_i64(&mut reader)?;

        let payload_len = read_u64(&mut reader)?;
        if payload_len != reader.len() as u64 {
            return Err(BroccoliError::Corrupt(format!(
                "{}: payload length {} does not match remaining {} bytes",
                path,
                payload_len,
                reader.len()
            )));
        }
        let payload = reader.to_vec();

        Ok(Self {
            path,
            name,
            size,
            mod_time,
            payload,
        })
    }
}

fn write_str<W: Write>(mut writer: W, value: &str) -> Result<()> {
    let bytes = value.as_bytes();
    if bytes.len() > MAX_PATH_LENGTH {
        return Err(BroccoliError::InvalidPath(format!(
            "Path too long: {} bytes (max {})",
            bytes.len(),
            MAX_PATH_LENGTH
        )));
    }
    writer.write_all(&(bytes.len() as u16).to_le_bytes())?;
    writer.write_all(bytes)?;
    Ok(())
}

fn read_str<R: Read>(mut reader: R, field: &str) -> Result<String> {
    let len = read_u16(&mut reader)? as usize;
    if len > MAX_PATH_LENGTH {
        return Err(BroccoliError::Corrupt(format!(
            "{} length {} exceeds {}",
            field, len, MAX_PATH_LENGTH
        )));
    }
    let mut buf = vec![0u8; len];
    read_exact(&mut reader, &mut buf)?;
    String::from_utf8(buf)
        .map_err(|e| BroccoliError::Corrupt(format!("Invalid UTF-8 in {}: {}", field, e)))
}

fn read_exact<R: Read>(mut reader: R, buf: &mut [u8]) -> Result<()> {
    reader
        .read_exact(buf)
        .map_err(|e| BroccoliError::Corrupt(format!("truncated record: {}", e)))
}

// Helper functions for reading primitive types
fn read_u16<R: Read>(mut reader: R) -> Result<u16> {
    let mut buf = [0u8; 2];
    read_exact(&mut reader, &mut buf)?;
    Ok(u16::from_le_bytes(buf))
}

pub(crate) fn read_u32<R: Read>(mut reader: R) -> Result<u32> {
    let mut buf = [0u8; 4];
    read_exact(&mut reader, &mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

pub(crate) fn read_u64<R: Read>(mut reader: R) -> Result<u64> {
    let mut buf = [0u8; 8];
    read_exact(&mut reader, &mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

fn read_i64<R: Read>(mut reader: R) -> Result<i64> {
    let mut buf = [0u8; 8];
    read_exact(&mut reader, &mut buf)?;
    Ok(i64::from_le_bytes(buf))
}
