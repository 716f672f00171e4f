//! Broccoli-rs: pack a file tree into one compressed blob and serve it back
//! as a read-only virtual file system
//!
//! This library provides:
//! - A packed archive format with per-file and whole-archive zstd layers
//! - Parallel compression on a bounded worker pool
//! - Lazy (first-open) or eager payload decompression
//! - Path lookup, read/seek cursors, directory listings and prefix walks
//!
//! # Example
//!
//! ```
//! use broccoli_rs::{ArchiveWriter, PackOptions, Vfs};
//!
//! // Pack a couple of files
//! let mut writer = ArchiveWriter::new(PackOptions::default());
//! writer.add_directory("public", 1_700_000_000)?;
//! writer.add_file("public/index.html", b"<h1>Hello</h1>", 1_700_000_000)?;
//! let archive = writer.finish()?;
//!
//! // Load it back and read a file
//! let vfs = Vfs::load(&archive, false)?;
//! let mut file = vfs.open("public/index.html")?;
//! let mut buf = [0u8; 64];
//! let n = file.read(&mut buf)?;
//! assert_eq!(&buf[..n], b"<h1>Hello</h1>");
//! # Ok::<(), broccoli_rs::BroccoliError>(())
//! ```

// Core modules
pub mod archive;
pub mod config;
pub mod entry;
pub mod error;
pub mod file;
pub mod index;
pub mod path;
pub mod serve;
pub mod vfs;

// Re-export commonly used types
pub use archive::{
    pack, ArchiveReader, ArchiveWriter, CompressionPool, DEFAULT_QUALITY, MAX_QUALITY,
    PACKING_QUALITY,
};
pub use config::{Config, LoadOptions, PackOptions};
pub use entry::{Entry, FileMode, Metadata, SourceFile};
pub use error::{BroccoliError, Result};
pub use file::{File, Whence};
pub use index::Index;
pub use serve::PrefixedFs;
pub use vfs::Vfs;
