//! Central-directory reader and entry decoder.
//!
//! [`ZipParser`] enumerates an archive's entries and produces their
//! decompressed bytes, reading from any source that implements the
//! [`ReadAt`] trait. All parsing works on buffers fetched with absolute
//! offsets, so the source never needs a seek cursor.

use byteorder::{LittleEndian, ReadBytesExt};
use flate2::read::DeflateDecoder;
use std::io::{Cursor, Read};
use std::sync::Arc;

use crate::io::ReadAt;
use anyhow::{Result, anyhow, bail};

use super::structures::*;

/// Maximum zip comment size allowed by the format (65535 bytes).
///
/// Bounds the backwards search for an EOCD record hidden by a comment.
const MAX_COMMENT_LEN: u64 = 65535;

/// Low-level zip decoder over a random-access source.
///
/// Generic over the reader type so local files, in-memory buffers, and
/// the running executable all parse identically.
pub struct ZipParser<R: ReadAt> {
    /// The underlying data source
    reader: Arc<R>,
    /// Total size of the source in bytes
    size: u64,
}

impl<R: ReadAt> ZipParser<R> {
    pub fn new(reader: Arc<R>) -> Self {
        let size = reader.size();
        Self { reader, size }
    }

    /// Find and parse the End of Central Directory record.
    ///
    /// The record is almost always the source's last 22 bytes, but an
    /// archive comment can push it back by up to 64 KiB. A single tail
    /// read covers both cases; the buffer is scanned backwards and a
    /// signature match only counts when its comment length reaches the
    /// source's exact end.
    ///
    /// # Returns
    ///
    /// The parsed record and its absolute offset in the source.
    async fn find_eocd(&self) -> Result<(EndOfCentralDirectory, u64)> {
        let window = (MAX_COMMENT_LEN + EndOfCentralDirectory::SIZE as u64).min(self.size);
        if window < EndOfCentralDirectory::SIZE as u64 {
            bail!("source too small to hold a zip archive");
        }

        let start = self.size - window;
        let mut buf = vec![0u8; window as usize];
        self.reader.read_exact_at(start, &mut buf).await?;

        for i in (0..=buf.len() - EndOfCentralDirectory::SIZE).rev() {
            if buf[i..].starts_with(EndOfCentralDirectory::SIGNATURE) {
                let comment_len = u16::from_le_bytes([buf[i + 20], buf[i + 21]]) as usize;
                if i + EndOfCentralDirectory::SIZE + comment_len == buf.len() {
                    let eocd =
                        EndOfCentralDirectory::from_bytes(&buf[i..i + EndOfCentralDirectory::SIZE])?;
                    return Ok((eocd, start + i as u64));
                }
            }
        }

        bail!("no end of central directory record found; not a zip archive")
    }

    /// List every entry recorded in the archive's central directory.
    ///
    /// Entry offsets in the returned records are absolute source offsets:
    /// when the zip data is preceded by foreign bytes (an executable the
    /// archive was appended to), the recorded offsets fall short of the
    /// real positions by the prefix length, and that shift is applied
    /// here.
    ///
    /// # Errors
    ///
    /// Returns an error if the archive structure is malformed or the
    /// source cannot be read.
    pub async fn entries(&self) -> Result<Vec<RawEntry>> {
        let (eocd, eocd_offset) = self.find_eocd().await?;

        let (cd_offset, cd_size, total_entries, base) = if eocd.is_zip64() {
            // The locator sits immediately before the EOCD record
            let locator_offset = eocd_offset
                .checked_sub(Zip64EOCDLocator::SIZE as u64)
                .ok_or_else(|| anyhow!("zip64 locator out of range"))?;
            let mut buf = vec![0u8; Zip64EOCDLocator::SIZE];
            self.reader.read_exact_at(locator_offset, &mut buf).await?;
            let locator = Zip64EOCDLocator::from_bytes(&buf)?;

            let mut buf = vec![0u8; Zip64EOCD::MIN_SIZE];
            self.reader
                .read_exact_at(locator.eocd64_offset, &mut buf)
                .await?;
            let eocd64 = Zip64EOCD::from_bytes(&buf)?;

            // ZIP64 archives are taken at face value; prefix detection is
            // only done for the 32-bit record
            (eocd64.cd_offset, eocd64.cd_size, eocd64.total_entries, 0)
        } else {
            // The directory ends where the EOCD begins, so any leading
            // foreign bytes show up as the distance the recorded end falls
            // short by
            let recorded_end = eocd.cd_offset as u64 + eocd.cd_size as u64;
            let base = eocd_offset
                .checked_sub(recorded_end)
                .ok_or_else(|| anyhow!("central directory extends past its end record"))?;
            (
                eocd.cd_offset as u64 + base,
                eocd.cd_size as u64,
                eocd.total_entries as u64,
                base,
            )
        };

        let mut cd_data = vec![0u8; cd_size as usize];
        self.reader.read_exact_at(cd_offset, &mut cd_data).await?;

        let mut entries = Vec::with_capacity(total_entries as usize);
        let mut cursor = Cursor::new(cd_data.as_slice());

        for _ in 0..total_entries {
            let mut entry = parse_central_header(&mut cursor)?;
            entry.header_offset += base;
            entries.push(entry);
        }

        Ok(entries)
    }

    /// Read and decompress one entry's data.
    ///
    /// The Local File Header's variable-length fields may differ from the
    /// central directory copy, so the data position is computed from the
    /// lengths this header declares. STORED data is returned as read;
    /// DEFLATE data is inflated. Either way the result is checked against
    /// the header's uncompressed size and CRC-32.
    ///
    /// # Errors
    ///
    /// Returns an error on an unsupported compression method, a malformed
    /// header, or data that fails verification.
    pub async fn read_data(&self, entry: &RawEntry) -> Result<Vec<u8>> {
        let mut header = [0u8; LOCAL_HEADER_SIZE];
        self.reader
            .read_exact_at(entry.header_offset, &mut header)
            .await?;
        if !header.starts_with(LOCAL_HEADER_SIGNATURE) {
            bail!("malformed local file header");
        }

        // Name and extra-field lengths sit at fixed positions 26 and 28
        let name_len = u16::from_le_bytes([header[26], header[27]]) as u64;
        let extra_len = u16::from_le_bytes([header[28], header[29]]) as u64;
        let data_offset = entry.header_offset + LOCAL_HEADER_SIZE as u64 + name_len + extra_len;

        let mut compressed = vec![0u8; entry.compressed_size as usize];
        self.reader.read_exact_at(data_offset, &mut compressed).await?;

        let data = match entry.method {
            CompressionMethod::Stored => compressed,
            CompressionMethod::Deflate => {
                let mut inflated = Vec::with_capacity(entry.uncompressed_size as usize);
                DeflateDecoder::new(compressed.as_slice()).read_to_end(&mut inflated)?;
                inflated
            }
            CompressionMethod::Unsupported(method) => {
                bail!("unsupported compression method {method}")
            }
        };

        if data.len() as u64 != entry.uncompressed_size {
            bail!(
                "decompressed to {} bytes, header says {}",
                data.len(),
                entry.uncompressed_size
            );
        }
        let checksum = crc32fast::hash(&data);
        if checksum != entry.crc32 {
            bail!(
                "crc32 mismatch: computed {checksum:08x}, header says {:08x}",
                entry.crc32
            );
        }

        Ok(data)
    }
}

/// Parse one Central Directory File Header at the cursor's position.
fn parse_central_header(cursor: &mut Cursor<&[u8]>) -> Result<RawEntry> {
    let mut sig = [0u8; 4];
    cursor.read_exact(&mut sig)?;
    if sig != CENTRAL_HEADER_SIGNATURE {
        bail!("malformed central directory header");
    }

    let version_made_by = cursor.read_u16::<LittleEndian>()?;
    let _version_needed = cursor.read_u16::<LittleEndian>()?;
    let _flags = cursor.read_u16::<LittleEndian>()?;
    let method = cursor.read_u16::<LittleEndian>()?;
    let dos_time = cursor.read_u16::<LittleEndian>()?;
    let dos_date = cursor.read_u16::<LittleEndian>()?;
    let crc32 = cursor.read_u32::<LittleEndian>()?;
    let mut compressed_size = cursor.read_u32::<LittleEndian>()? as u64;
    let mut uncompressed_size = cursor.read_u32::<LittleEndian>()? as u64;
    let name_len = cursor.read_u16::<LittleEndian>()?;
    let extra_len = cursor.read_u16::<LittleEndian>()?;
    let comment_len = cursor.read_u16::<LittleEndian>()?;
    let _start_disk = cursor.read_u16::<LittleEndian>()?;
    let _internal_attrs = cursor.read_u16::<LittleEndian>()?;
    let external_attrs = cursor.read_u32::<LittleEndian>()?;
    let mut header_offset = cursor.read_u32::<LittleEndian>()? as u64;

    let mut name_bytes = vec![0u8; name_len as usize];
    cursor.read_exact(&mut name_bytes)?;
    // Lossy conversion keeps non-UTF8 names resolvable instead of fatal
    let name = String::from_utf8_lossy(&name_bytes).into_owned();

    // Directory placeholders are marked by a trailing slash
    let is_dir = name.ends_with('/');

    // ZIP64 values live in extra field 0x0001. Each 64-bit value is
    // present only when the corresponding 32-bit field saturated, in
    // header order.
    let extra_end = cursor.position() + extra_len as u64;
    while cursor.position() + 4 <= extra_end {
        let field_id = cursor.read_u16::<LittleEndian>()?;
        let field_len = cursor.read_u16::<LittleEndian>()?;
        let field_end = (cursor.position() + field_len as u64).min(extra_end);

        if field_id == 0x0001 {
            if uncompressed_size == u32::MAX as u64 && cursor.position() + 8 <= field_end {
                uncompressed_size = cursor.read_u64::<LittleEndian>()?;
            }
            if compressed_size == u32::MAX as u64 && cursor.position() + 8 <= field_end {
                compressed_size = cursor.read_u64::<LittleEndian>()?;
            }
            if header_offset == u32::MAX as u64 && cursor.position() + 8 <= field_end {
                header_offset = cursor.read_u64::<LittleEndian>()?;
            }
        }

        cursor.set_position(field_end);
    }
    cursor.set_position(extra_end + comment_len as u64);

    // Creator system 3 is unix; its permission bits ride in the top half
    // of the external attributes
    let unix_mode = if version_made_by >> 8 == 3 {
        let mode = (external_attrs >> 16) & 0o7777;
        (mode != 0).then_some(mode)
    } else {
        None
    };

    Ok(RawEntry {
        name,
        method: CompressionMethod::from_u16(method),
        compressed_size,
        uncompressed_size,
        crc32,
        header_offset,
        dos_time,
        dos_date,
        unix_mode,
        is_dir,
    })
}
