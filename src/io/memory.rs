use super::ReadAt;
use anyhow::{Result, bail};
use async_trait::async_trait;

/// Archive source over a byte buffer already held in memory
pub struct MemoryReader {
    data: Vec<u8>,
}

impl MemoryReader {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }
}

#[async_trait]
impl ReadAt for MemoryReader {
    async fn read_exact_at(&self, offset: u64, buf: &mut [u8]) -> Result<()> {
        let start = usize::try_from(offset).unwrap_or(usize::MAX);
        match start.checked_add(buf.len()) {
            Some(end) if end <= self.data.len() => {
                buf.copy_from_slice(&self.data[start..end]);
                Ok(())
            }
            _ => bail!(
                "read of {} bytes at offset {offset} is out of range",
                buf.len()
            ),
        }
    }

    fn size(&self) -> u64 {
        self.data.len() as u64
    }
}
