use super::ReadAt;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::Path;

/// Archive source backed by a file on disk
pub struct LocalFileReader {
    file: std::fs::File,
    size: u64,
}

impl LocalFileReader {
    pub fn new(path: &Path) -> Result<Self> {
        let file =
            std::fs::File::open(path).with_context(|| format!("opening {}", path.display()))?;
        let size = file.metadata()?.len();
        Ok(Self { file, size })
    }

    /// Open the running executable itself.
    ///
    /// This is the source used for single-binary deployments where a zip
    /// archive has been appended to the compiled program after the build.
    pub fn current_exe() -> Result<Self> {
        let path = std::env::current_exe().context("locating current executable")?;
        Self::new(&path)
    }
}

#[async_trait]
impl ReadAt for LocalFileReader {
    async fn read_exact_at(&self, offset: u64, buf: &mut [u8]) -> Result<()> {
        #[cfg(unix)]
        {
            use std::os::unix::fs::FileExt;
            self.file.read_exact_at(buf, offset)?;
        }

        #[cfg(not(unix))]
        {
            use std::io::{Read, Seek, SeekFrom};
            // &File implements Read and Seek. The shared cursor is only
            // touched during construction, which is single-threaded.
            let mut file = &self.file;
            file.seek(SeekFrom::Start(offset))?;
            file.read_exact(buf)?;
        }

        Ok(())
    }

    fn size(&self) -> u64 {
        self.size
    }
}
