use byteorder::{LittleEndian, ReadBytesExt};
use std::io::Cursor;

use anyhow::{Result, bail};

/// Entry data encodings understood by the decoder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMethod {
    Stored,
    Deflate,
    Unsupported(u16),
}

impl CompressionMethod {
    pub fn from_u16(value: u16) -> Self {
        match value {
            0 => CompressionMethod::Stored,
            8 => CompressionMethod::Deflate,
            _ => CompressionMethod::Unsupported(value),
        }
    }

    pub fn as_u16(&self) -> u16 {
        match self {
            CompressionMethod::Stored => 0,
            CompressionMethod::Deflate => 8,
            CompressionMethod::Unsupported(v) => *v,
        }
    }
}

/// End of Central Directory record, the archive's trailing anchor.
///
/// Only the fields the decoder consumes are retained; disk-spanning
/// fields are read for the ZIP64 check and discarded.
pub struct EndOfCentralDirectory {
    pub disk_entries: u16,
    pub total_entries: u16,
    pub cd_size: u32,
    pub cd_offset: u32,
}

impl EndOfCentralDirectory {
    pub const SIGNATURE: &'static [u8] = b"PK\x05\x06";
    pub const SIZE: usize = 22;

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE || &data[0..4] != Self::SIGNATURE {
            bail!("missing end of central directory record");
        }

        // Skip the signature and the two leading disk-number fields
        let mut cursor = Cursor::new(&data[8..]);

        Ok(Self {
            disk_entries: cursor.read_u16::<LittleEndian>()?,
            total_entries: cursor.read_u16::<LittleEndian>()?,
            cd_size: cursor.read_u32::<LittleEndian>()?,
            cd_offset: cursor.read_u32::<LittleEndian>()?,
        })
    }

    /// Saturated 16/32-bit fields mean the real values live in the ZIP64
    /// records.
    pub fn is_zip64(&self) -> bool {
        self.disk_entries == 0xFFFF
            || self.total_entries == 0xFFFF
            || self.cd_size == u32::MAX
            || self.cd_offset == u32::MAX
    }
}

/// ZIP64 EOCD Locator, fixed 20 bytes immediately before the EOCD
pub struct Zip64EOCDLocator {
    pub eocd64_offset: u64,
}

impl Zip64EOCDLocator {
    pub const SIGNATURE: &'static [u8] = b"PK\x06\x07";
    pub const SIZE: usize = 20;

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE || &data[0..4] != Self::SIGNATURE {
            bail!("missing zip64 locator record");
        }

        let mut cursor = Cursor::new(&data[8..]);

        Ok(Self {
            eocd64_offset: cursor.read_u64::<LittleEndian>()?,
        })
    }
}

/// ZIP64 End of Central Directory record, 56 bytes minimum
pub struct Zip64EOCD {
    pub total_entries: u64,
    pub cd_size: u64,
    pub cd_offset: u64,
}

impl Zip64EOCD {
    pub const SIGNATURE: &'static [u8] = b"PK\x06\x06";
    pub const MIN_SIZE: usize = 56;

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < Self::MIN_SIZE || &data[0..4] != Self::SIGNATURE {
            bail!("missing zip64 end of central directory record");
        }

        // total_entries sits at byte 32, after the record's own size,
        // version fields, disk numbers, and this-disk entry count
        let mut cursor = Cursor::new(&data[32..]);

        Ok(Self {
            total_entries: cursor.read_u64::<LittleEndian>()?,
            cd_size: cursor.read_u64::<LittleEndian>()?,
            cd_offset: cursor.read_u64::<LittleEndian>()?,
        })
    }
}

/// Central Directory File Header signature (PK\x01\x02)
pub const CENTRAL_HEADER_SIGNATURE: &[u8] = b"PK\x01\x02";

/// Local File Header signature (PK\x03\x04) and fixed size
pub const LOCAL_HEADER_SIGNATURE: &[u8] = b"PK\x03\x04";
pub const LOCAL_HEADER_SIZE: usize = 30;

/// One decoded central-directory row.
///
/// Raw header facts only; presentation (trimmed names, defaulted modes)
/// is the filesystem layer's business.
#[derive(Debug, Clone)]
pub struct RawEntry {
    pub name: String,
    pub method: CompressionMethod,
    pub compressed_size: u64,
    pub uncompressed_size: u64,
    pub crc32: u32,
    /// Offset of the entry's Local File Header, already adjusted for any
    /// bytes preceding the zip data
    pub header_offset: u64,
    pub dos_time: u16,
    pub dos_date: u16,
    /// Unix permission bits from the external attributes, when the entry
    /// was written by a unix creator
    pub unix_mode: Option<u32>,
    pub is_dir: bool,
}
