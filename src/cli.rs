use clap::Parser;

use crate::fs::FsOptions;

#[derive(Parser, Debug)]
#[command(name = "zipfs")]
#[command(version)]
#[command(about = "Serve a zip archive as a read-only HTTP file store", long_about = None)]
#[command(after_help = "Examples:\n  \
  zipfs site.zip                     serve site.zip on 127.0.0.1:8080\n  \
  zipfs site.zip -b 0.0.0.0:3000     serve on all interfaces, port 3000\n  \
  zipfs site.zip --spa               rewrite missing paths to index.html\n  \
  zipfs --embedded                   serve the archive appended to this binary")]
pub struct Cli {
    /// Zip archive to serve
    #[arg(value_name = "ARCHIVE")]
    pub archive: Option<String>,

    /// Read the archive appended to the running executable
    #[arg(long, conflicts_with = "archive")]
    pub embedded: bool,

    /// Socket address to listen on
    #[arg(
        short = 'b',
        long = "bind",
        value_name = "ADDR",
        default_value = "127.0.0.1:8080"
    )]
    pub bind: String,

    /// Serve index.html for missing paths (single-page applications)
    #[arg(long)]
    pub spa: bool,
}

impl Cli {
    pub fn fs_options(&self) -> FsOptions {
        FsOptions {
            serve_index_for_missing: self.spa,
        }
    }
}
