//! Request-path adapter for file servers
//!
//! Maps an inbound request path (`/css/site.css`) onto an archive path
//! under a fixed prefix (`public/css/site.css`) and opens it.

use crate::error::Result;
use crate::file::File;
use crate::vfs::Vfs;

/// A [`Vfs`] view rooted at a directory prefix
#[derive(Clone, Debug)]
pub struct PrefixedFs {
    vfs: Vfs,
    prefix: String,
}

impl PrefixedFs {
    pub(crate) fn new(vfs: Vfs, prefix: &str) -> Self {
        Self {
            vfs,
            prefix: prefix.trim_matches('/').to_string(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Archive path a request path resolves to
    pub fn resolve(&self, request_path: &str) -> String {
        crate::path::normalize(&format!("{}/{}", self.prefix, request_path))
    }

    /// Open the request path: directories yield a listing handle,
    /// files a byte cursor.
    pub fn open(&self, request_path: &str) -> Result<File> {
        let archive_path = self.resolve(request_path);
        if self.vfs.stat(&archive_path)?.is_dir() {
            self.vfs.open_dir(&archive_path)
        } else {
            self.vfs.open(&archive_path)
        }
    }
}
