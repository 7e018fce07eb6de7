/// Construction-time configuration for [`ZipFileSystem`](super::ZipFileSystem).
///
/// A plain record with defaults: pass `FsOptions::default()` for stock
/// behavior, or name the fields to change and take the rest with
/// `..Default::default()`. Adding a field later never touches existing
/// call sites.
///
/// ```
/// use zipfs::FsOptions;
///
/// let options = FsOptions {
///     serve_index_for_missing: true,
///     ..Default::default()
/// };
/// # let _ = options;
/// ```
#[derive(Debug, Clone, Default)]
pub struct FsOptions {
    /// Serve the top-level `index.html` whenever a requested path has no
    /// entry. Useful for single-page applications that route client-side.
    /// Off by default.
    pub serve_index_for_missing: bool,
}
