use std::io;
use thiserror::Error;

/// Result type for broccoli operations
pub type Result<T> = std::result::Result<T, BroccoliError>;

/// Unified error type for all broccoli operations
#[derive(Debug, Error)]
pub enum BroccoliError {
    // Lookup errors
    #[error("File not found in archive: {0}")]
    NotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Not a directory: {0}")]
    NotADirectory(String),

    // Cursor errors
    #[error("File is closed")]
    Closed,

    #[error("File is already closed")]
    AlreadyClosed,

    #[error("Seek: bad offset {0}")]
    BadOffset(i64),

    #[error("Seek: bad whence {0}")]
    BadWhence(i32),

    #[error("No more directory entries")]
    Exhausted,

    // Archive errors
    #[error("Corrupt archive: {0}")]
    Corrupt(String),

    #[error("Compression failed for {path}: {reason}")]
    CompressionFailed { path: String, reason: String },

    #[error("Decompression failed for {path}: {reason}")]
    DecompressionFailed { path: String, reason: String },

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Duplicate path in archive: {0}")]
    DuplicatePath(String),

    #[error("Archive exceeds the {limit} byte decompression limit")]
    ArchiveTooLarge { limit: u64 },

    #[error("{path} declares {size} bytes, over the {limit} byte entry limit")]
    EntryTooLarge { path: String, size: u64, limit: u64 },

    // Configuration errors
    #[error("Invalid configuration: {0}")]
    Config(String),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl BroccoliError {
    /// True for lookups that missed the index
    pub fn is_not_found(&self) -> bool {
        matches!(self, BroccoliError::NotFound(_))
    }

    /// True when a directory listing has been fully consumed
    pub fn is_exhausted(&self) -> bool {
        matches!(self, BroccoliError::Exhausted)
    }
}

impl From<toml::de::Error> for BroccoliError {
    fn from(err: toml::de::Error) -> Self {
        BroccoliError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for BroccoliError {
    fn from(err: serde_json::Error) -> Self {
        BroccoliError::Config(err.to_string())
    }
}

impl From<base64::DecodeError> for BroccoliError {
    fn from(err: base64::DecodeError) -> Self {
        BroccoliError::Corrupt(format!("invalid text encoding: {}", err))
    }
}

impl From<BroccoliError> for io::Error {
    fn from(err: BroccoliError) -> Self {
        let kind = match &err {
            BroccoliError::Io(inner) => inner.kind(),
            BroccoliError::NotFound(_) => io::ErrorKind::NotFound,
            BroccoliError::PermissionDenied(_) => io::ErrorKind::PermissionDenied,
            BroccoliError::BadOffset(_) | BroccoliError::BadWhence(_) => {
                io::ErrorKind::InvalidInput
            }
            BroccoliError::Exhausted => io::ErrorKind::UnexpectedEof,
            BroccoliError::Corrupt(_) | BroccoliError::DecompressionFailed { .. } => {
                io::ErrorKind::InvalidData
            }
            _ => io::ErrorKind::Other,
        };
        io::Error::new(kind, err)
    }
}
