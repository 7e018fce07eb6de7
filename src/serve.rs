//! HTTP plumbing over the filesystem.
//!
//! A single wildcard route maps request paths onto
//! [`ZipFileSystem::open`]. The only logic here beyond status mapping is
//! the directory probe: a directory handle never has content of its own,
//! so the response comes from the `index.html` stored beneath it or is a
//! 404. Listings are never generated.

use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::http::{StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use tracing::debug;

use crate::fs::{ZipFile, ZipFileSystem};

/// Build a router that serves every request path out of the filesystem.
pub fn router(fs: Arc<ZipFileSystem>) -> Router {
    Router::new().fallback(serve_path).with_state(fs)
}

async fn serve_path(State(fs): State<Arc<ZipFileSystem>>, uri: Uri) -> Response {
    let path = uri.path();

    match fs.open(path) {
        Ok(file) if file.metadata().is_dir() => {
            // A directory itself produces no bytes; the only thing it can
            // answer with is the index file stored beneath it
            let key = path.trim_matches('/');
            let index = if key.is_empty() {
                String::from("index.html")
            } else {
                format!("{key}/index.html")
            };

            match fs.open(&index) {
                Ok(file) => file_response(file),
                Err(_) => not_found(),
            }
        }
        Ok(file) => file_response(file),
        Err(_) => {
            debug!(%path, "no matching entry");
            not_found()
        }
    }
}

fn file_response(file: ZipFile) -> Response {
    // The handle's name, not the request path: a rewritten miss must be
    // typed as the index file it actually carries
    let mime = content_type(file.metadata().name());
    ([(header::CONTENT_TYPE, mime)], file.contents()).into_response()
}

fn not_found() -> Response {
    StatusCode::NOT_FOUND.into_response()
}

/// Content type by file extension, octet-stream when unrecognized.
fn content_type(name: &str) -> &'static str {
    let extension = name.rsplit('.').next().unwrap_or("");
    match extension {
        "html" | "htm" => "text/html; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "js" | "mjs" => "text/javascript; charset=utf-8",
        "json" | "map" => "application/json",
        "wasm" => "application/wasm",
        "svg" => "image/svg+xml",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "ico" => "image/x-icon",
        "txt" => "text/plain; charset=utf-8",
        "xml" => "text/xml; charset=utf-8",
        "pdf" => "application/pdf",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        _ => "application/octet-stream",
    }
}
