use bytes::Bytes;
use std::io::{self, Read, Seek, SeekFrom};

use crate::zip::RawEntry;

/// Metadata for one resolved path, derived from the archive's entry header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMetadata {
    name: String,
    size: u64,
    mode: u32,
    dos_time: u16,
    dos_date: u16,
    is_dir: bool,
}

impl FileMetadata {
    pub(crate) fn from_entry(entry: &RawEntry) -> Self {
        let trimmed = entry.name.trim_matches('/');
        let name = trimmed.rsplit('/').next().unwrap_or(trimmed).to_string();
        let mode = entry
            .unix_mode
            .unwrap_or(if entry.is_dir { 0o755 } else { 0o644 });

        Self {
            name,
            size: entry.uncompressed_size,
            mode,
            dos_time: entry.dos_time,
            dos_date: entry.dos_date,
            is_dir: entry.is_dir,
        }
    }

    /// The phony directory reported for the root path
    pub(crate) fn root() -> Self {
        Self {
            name: String::new(),
            size: 0,
            mode: 0o755,
            dos_time: 0,
            dos_date: 0,
            is_dir: true,
        }
    }

    /// Base name of the entry, without directory components
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Uncompressed size in bytes
    pub fn len(&self) -> u64 {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Unix permission bits, defaulted when the archive carries none
    pub fn mode(&self) -> u32 {
        self.mode
    }

    pub fn is_dir(&self) -> bool {
        self.is_dir
    }

    /// Modification timestamp as (year, month, day, hour, minute, second),
    /// decoded from the entry's DOS-format date and time fields
    pub fn modified(&self) -> (u16, u8, u8, u8, u8, u8) {
        let day = (self.dos_date & 0x1F) as u8;
        let month = ((self.dos_date >> 5) & 0x0F) as u8;
        let year = (self.dos_date >> 9) + 1980;
        let second = ((self.dos_time & 0x1F) * 2) as u8;
        let minute = ((self.dos_time >> 5) & 0x3F) as u8;
        let hour = ((self.dos_time >> 11) & 0x1F) as u8;
        (year, month, day, hour, minute, second)
    }
}

/// An opened file, allocated per lookup.
///
/// Reads are served from the filesystem's in-memory content with a
/// private cursor, so handles never affect each other. Seeking anywhere
/// in the content is supported; reads past the end return zero bytes.
#[derive(Debug)]
pub struct ZipFile {
    content: Bytes,
    metadata: FileMetadata,
    pos: u64,
}

impl ZipFile {
    pub(crate) fn new(content: Bytes, metadata: FileMetadata) -> Self {
        Self {
            content,
            metadata,
            pos: 0,
        }
    }

    pub(crate) fn root() -> Self {
        Self::new(Bytes::new(), FileMetadata::root())
    }

    pub fn metadata(&self) -> &FileMetadata {
        &self.metadata
    }

    /// The complete file contents.
    ///
    /// The returned [`Bytes`] shares the filesystem's buffer; cloning it
    /// copies nothing.
    pub fn contents(&self) -> Bytes {
        self.content.clone()
    }

    /// Directory children. Always empty: listings are suppressed so the
    /// archive's layout is never enumerable through the store.
    pub fn read_dir(&self) -> Vec<FileMetadata> {
        Vec::new()
    }
}

impl Read for ZipFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let start = self.pos.min(self.content.len() as u64) as usize;
        let remaining = &self.content[start..];
        let n = remaining.len().min(buf.len());
        buf[..n].copy_from_slice(&remaining[..n]);
        self.pos += n as u64;
        Ok(n)
    }
}

impl Seek for ZipFile {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(offset) => offset as i128,
            SeekFrom::End(delta) => self.content.len() as i128 + delta as i128,
            SeekFrom::Current(delta) => self.pos as i128 + delta as i128,
        };

        if target < 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "seek before start of file",
            ));
        }

        self.pos = target as u64;
        Ok(self.pos)
    }
}
