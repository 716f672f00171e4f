pub mod compression;
pub mod format;
mod pool;
mod reader;
pub mod text;
mod writer;

pub use format::{Record, DEFAULT_QUALITY, MAX_QUALITY, PACKING_QUALITY};
pub use pool::CompressionPool;
pub use reader::{decompress_all, ArchiveReader};
pub use writer::{pack, ArchiveWriter};
