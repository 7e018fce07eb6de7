//! Zip archive decoding.
//!
//! This module reads a zip archive's central directory and entry data from
//! any [`ReadAt`](crate::io::ReadAt) source. It is the decoding collaborator
//! of the filesystem layer: it knows the wire format and nothing about
//! lookup or serving.
//!
//! A zip file is parsed from its end:
//! 1. Locate the End of Central Directory (EOCD) record
//! 2. If the EOCD saturates its 32-bit fields, read the ZIP64 records
//! 3. Read the Central Directory for per-entry metadata
//! 4. Per entry, read the Local File Header to find the data and inflate it
//!
//! Offsets recorded in the archive are relative to the start of the zip
//! data, which is not necessarily the start of the source: an archive
//! appended to an executable carries leading foreign bytes. The parser
//! measures that prefix from the EOCD position and shifts every entry
//! offset by it, so self-contained binaries work without preprocessing.
//!
//! ## Supported features
//!
//! - Standard zip format and ZIP64 size/offset extensions
//! - STORED and DEFLATE entry data, CRC-32 verified
//!
//! ## Limitations
//!
//! - No encryption, no multi-disk archives
//! - No BZIP2, LZMA, or other compression methods

mod parser;
mod structures;

pub use parser::ZipParser;
pub use structures::{CompressionMethod, RawEntry};
