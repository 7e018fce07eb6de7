//! The in-memory filesystem over an archive's contents.
//!
//! [`ZipFileSystem`] decodes every archive entry exactly once at
//! construction and keeps the decompressed bytes in a hash map keyed by
//! the entry's separator-trimmed name. Lookups after that are pure reads:
//! no I/O, no locking, no shared cursors. The instance can be handed to
//! any number of concurrent request handlers.
//!
//! Three things make the lookup surface slightly more than a map get:
//!
//! - The exact path `/` answers with a synthetic directory so a file
//!   server probing the root can move on to its index file.
//! - Requests arrive with leading slashes (and directories sometimes with
//!   trailing ones) while archive names carry neither after trimming, so
//!   both sides are normalized to the same key space.
//! - With [`FsOptions::serve_index_for_missing`] set, a miss is rewritten
//!   to the top-level `index.html`, which is what client-side routed
//!   single-page applications need.

mod handle;
mod options;

pub use handle::{FileMetadata, ZipFile};
pub use options::FsOptions;

use std::collections::HashMap;
use std::io;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use bytes::Bytes;
use tracing::debug;

use crate::io::{LocalFileReader, MemoryReader, ReadAt};
use crate::zip::ZipParser;

/// A read-only, path-addressable file store over a zip archive.
///
/// Built once, immutable afterwards, and `Send + Sync`: every lookup
/// allocates its own handle and the stored content buffers are shared by
/// reference count, so concurrent callers never contend.
#[derive(Debug)]
pub struct ZipFileSystem {
    files: HashMap<String, ZipEntry>,
    serve_index_for_missing: bool,
}

/// One decoded archive member held by the lookup table
#[derive(Debug)]
struct ZipEntry {
    content: Bytes,
    metadata: FileMetadata,
}

impl ZipFileSystem {
    /// Decode an archive from any [`ReadAt`] source.
    ///
    /// Every entry's data is read and decompressed into memory up front;
    /// the archive is never consulted again after construction. This is a
    /// deliberate memory-for-simplicity trade: lookups stay allocation-free
    /// on the archive side and need no streaming machinery.
    ///
    /// # Errors
    ///
    /// Fails if the central directory is malformed or any entry's data
    /// cannot be read, inflated, or CRC-verified. The error names the
    /// offending entry. No instance is produced on failure; a partially
    /// built table is never observable.
    pub async fn from_reader<R: ReadAt + 'static>(
        reader: Arc<R>,
        options: FsOptions,
    ) -> Result<Self> {
        let parser = ZipParser::new(reader);
        let entries = parser
            .entries()
            .await
            .context("reading archive directory")?;

        let mut files = HashMap::with_capacity(entries.len());
        for entry in entries {
            let data = parser
                .read_data(&entry)
                .await
                .with_context(|| format!("error reading file {}", entry.name))?;
            let metadata = FileMetadata::from_entry(&entry);

            // Directory entries carry a trailing slash in the archive while
            // lookups arrive without one; keys are stored fully trimmed
            let key = entry.name.trim_matches('/').to_string();

            // Nothing guards against an archive naming the same path twice;
            // the entry decoded last replaces the earlier one
            files.insert(
                key,
                ZipEntry {
                    content: Bytes::from(data),
                    metadata,
                },
            );
        }

        debug!(files = files.len(), "archive decoded");

        Ok(Self {
            files,
            serve_index_for_missing: options.serve_index_for_missing,
        })
    }

    /// Decode an archive stored in a file on disk.
    pub async fn from_file(path: &Path, options: FsOptions) -> Result<Self> {
        Self::from_reader(Arc::new(LocalFileReader::new(path)?), options).await
    }

    /// Decode an archive held in a byte buffer.
    pub async fn from_bytes(data: Vec<u8>, options: FsOptions) -> Result<Self> {
        Self::from_reader(Arc::new(MemoryReader::new(data)), options).await
    }

    /// Decode the archive appended to the running executable.
    ///
    /// Enables single-binary deployments: build the server, append a zip
    /// of assets to the compiled file, and serve it with no files on disk.
    pub async fn from_current_exe(options: FsOptions) -> Result<Self> {
        Self::from_reader(Arc::new(LocalFileReader::current_exe()?), options).await
    }

    /// Number of entries in the store.
    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Look up a path and open it.
    ///
    /// The path is normalized by trimming leading and trailing slashes, so
    /// `dir` and `/dir/` resolve identically. A hit returns a fresh
    /// [`ZipFile`] over the entry's content and metadata. A miss returns
    /// [`io::ErrorKind::NotFound`], or the top-level `index.html` when the
    /// missing-path rewrite is enabled.
    pub fn open(&self, name: &str) -> io::Result<ZipFile> {
        // The root is never a stored entry. Answer it with a phony
        // directory so a file server probing `/` moves on to the index
        // file instead of failing.
        if name == "/" {
            return Ok(ZipFile::root());
        }

        let key = name.trim_matches('/');

        if let Some(entry) = self.files.get(key) {
            return Ok(ZipFile::new(entry.content.clone(), entry.metadata.clone()));
        }

        // Missing paths can be rewritten to the top-level index file. The
        // index file itself is exempt: if it is absent the lookup must
        // fail here rather than recurse forever.
        if key != "index.html" && self.serve_index_for_missing {
            return self.open("index.html");
        }

        Err(io::ErrorKind::NotFound.into())
    }
}
