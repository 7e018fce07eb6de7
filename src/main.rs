//! Main entry point for the zipfs CLI application.
//!
//! This binary serves a zip archive over HTTP, either from a path on disk
//! or from archive data appended to the executable itself.

use anyhow::{Result, bail};
use clap::Parser;
use std::path::Path;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use zipfs::{Cli, ZipFileSystem, serve};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let options = cli.fs_options();

    let fs = if cli.embedded {
        ZipFileSystem::from_current_exe(options).await?
    } else if let Some(ref archive) = cli.archive {
        ZipFileSystem::from_file(Path::new(archive), options).await?
    } else {
        bail!("no archive to serve; pass a path or --embedded");
    };

    info!(files = fs.file_count(), addr = %cli.bind, "serving archive");

    let listener = tokio::net::TcpListener::bind(&cli.bind).await?;
    axum::serve(listener, serve::router(Arc::new(fs))).await?;

    Ok(())
}
