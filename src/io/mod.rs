mod local;
mod memory;

pub use local::LocalFileReader;
pub use memory::MemoryReader;

use anyhow::Result;
use async_trait::async_trait;

/// Trait for random access reading from an archive source
#[async_trait]
pub trait ReadAt: Send + Sync {
    /// Fill `buf` with the bytes starting at `offset`; a short read is an error
    async fn read_exact_at(&self, offset: u64, buf: &mut [u8]) -> Result<()>;

    /// Get the total size of the data source
    fn size(&self) -> u64;
}
