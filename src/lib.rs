//! # zipfs
//!
//! Serve the contents of a zip archive as a read-only, path-addressable
//! file store.
//!
//! The archive is decoded once at construction: every entry is
//! decompressed into memory and indexed by its separator-trimmed name.
//! After that, lookups are pure hash-map reads with no I/O and no locks,
//! so one [`ZipFileSystem`] can back any number of concurrent HTTP
//! request handlers. An opt-in fallback rewrites missing paths to the
//! top-level `index.html` for client-side routed single-page apps.
//!
//! Archives can come from a file on disk, a byte buffer, or the running
//! executable's own file, which makes single-binary deployments possible:
//! append a zip of assets to the compiled server and start it with no
//! other files present.
//!
//! ## Example
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use zipfs::{FsOptions, ZipFileSystem, serve};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // Decode the archive up front; this is the only I/O that ever happens
//!     let fs = ZipFileSystem::from_file(
//!         Path::new("webassets.zip"),
//!         FsOptions {
//!             serve_index_for_missing: true,
//!             ..Default::default()
//!         },
//!     )
//!     .await?;
//!
//!     // Direct lookups work without a server in front
//!     let index = fs.open("/index.html")?;
//!     println!("index.html is {} bytes", index.metadata().len());
//!
//!     // Or hand the store to the bundled HTTP layer
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:8080").await?;
//!     axum::serve(listener, serve::router(Arc::new(fs))).await?;
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod fs;
pub mod io;
pub mod serve;
pub mod zip;

pub use cli::Cli;
pub use fs::{FileMetadata, FsOptions, ZipFile, ZipFileSystem};
pub use io::{LocalFileReader, MemoryReader, ReadAt};
pub use zip::{RawEntry, ZipParser};
