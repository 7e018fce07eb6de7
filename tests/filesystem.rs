//! Behavior of the archive-backed filesystem: loading, lookup,
//! normalization, and the missing-path rewrite.

use std::io::{Cursor, ErrorKind, Read, Seek, SeekFrom, Write};

use zip::write::FileOptions;
use zipfs::{FsOptions, ZipFileSystem};

const ROOT_INDEX: &str = "<html><body><h1>root index</h1></body></html>";
const SUB_INDEX: &str = "<html><body><h1>subdirectory index</h1></body></html>";
const TEXT_FILE: &str = "plain text payload";

/// Build a zip archive in memory. `None` content adds a directory entry.
fn build_archive(entries: &[(&str, Option<&str>)]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    for (name, content) in entries {
        match content {
            Some(data) => {
                writer.start_file(*name, options).unwrap();
                writer.write_all(data.as_bytes()).unwrap();
            }
            None => {
                writer.add_directory(*name, options).unwrap();
            }
        }
    }

    writer.finish().unwrap().into_inner()
}

/// The archive used by most tests: a root index, directories with and
/// without their own index, and a plain nested file.
fn site_archive() -> Vec<u8> {
    build_archive(&[
        ("index.html", Some(ROOT_INDEX)),
        ("emptydirectory", None),
        ("nonemptydirectory", None),
        ("nonemptydirectory/file.txt", Some(TEXT_FILE)),
        ("directorywithindex", None),
        ("directorywithindex/index.html", Some(SUB_INDEX)),
    ])
}

async fn site_fs(options: FsOptions) -> ZipFileSystem {
    ZipFileSystem::from_bytes(site_archive(), options)
        .await
        .unwrap()
}

fn spa_options() -> FsOptions {
    FsOptions {
        serve_index_for_missing: true,
        ..Default::default()
    }
}

fn contents(fs: &ZipFileSystem, path: &str) -> Vec<u8> {
    let mut file = fs.open(path).unwrap();
    let mut buf = Vec::new();
    file.read_to_end(&mut buf).unwrap();
    buf
}

#[tokio::test]
async fn entries_resolve_to_their_decompressed_content() {
    let fs = site_fs(FsOptions::default()).await;

    assert_eq!(contents(&fs, "index.html"), ROOT_INDEX.as_bytes());
    assert_eq!(
        contents(&fs, "nonemptydirectory/file.txt"),
        TEXT_FILE.as_bytes()
    );
    assert_eq!(
        contents(&fs, "directorywithindex/index.html"),
        SUB_INDEX.as_bytes()
    );

    let file = fs.open("nonemptydirectory/file.txt").unwrap();
    assert_eq!(file.metadata().len(), TEXT_FILE.len() as u64);
    assert_eq!(file.metadata().name(), "file.txt");
    assert!(!file.metadata().is_dir());

    // Directory placeholders resolve too, with no content of their own
    let dir = fs.open("emptydirectory").unwrap();
    assert!(dir.metadata().is_dir());
    assert!(dir.metadata().is_empty());
    assert!(dir.contents().is_empty());
}

#[tokio::test]
async fn root_is_a_phony_directory() {
    let fs = site_fs(FsOptions::default()).await;

    let root = fs.open("/").unwrap();
    assert!(root.metadata().is_dir());
    assert_eq!(root.metadata().name(), "");
    assert_eq!(root.metadata().len(), 0);
    assert_eq!(root.metadata().mode(), 0o755);
    assert!(root.contents().is_empty());
    assert!(root.read_dir().is_empty());
}

#[tokio::test]
async fn directory_listings_are_always_empty() {
    let fs = site_fs(FsOptions::default()).await;

    assert!(fs.open("/").unwrap().read_dir().is_empty());
    assert!(fs.open("nonemptydirectory").unwrap().read_dir().is_empty());
    assert!(fs.open("index.html").unwrap().read_dir().is_empty());
}

#[tokio::test]
async fn repeated_lookups_are_identical() {
    let fs = site_fs(FsOptions::default()).await;

    let first = contents(&fs, "index.html");
    let second = contents(&fs, "index.html");
    assert_eq!(first, second);

    let a = fs.open("index.html").unwrap();
    let b = fs.open("index.html").unwrap();
    assert_eq!(a.metadata(), b.metadata());
}

#[tokio::test]
async fn leading_and_trailing_separators_are_ignored() {
    let fs = site_fs(FsOptions::default()).await;

    assert_eq!(contents(&fs, "/index.html"), ROOT_INDEX.as_bytes());
    assert_eq!(
        contents(&fs, "/nonemptydirectory/file.txt/"),
        TEXT_FILE.as_bytes()
    );

    let plain = fs.open("directorywithindex").unwrap();
    let trailing = fs.open("directorywithindex/").unwrap();
    let both = fs.open("/directorywithindex/").unwrap();
    assert_eq!(plain.metadata(), trailing.metadata());
    assert_eq!(plain.metadata(), both.metadata());
}

#[tokio::test]
async fn missing_paths_fail_without_the_rewrite() {
    let fs = site_fs(FsOptions::default()).await;

    for path in ["missing.png", "emptydirectory/nothing.txt", "deep/nested/route"] {
        let err = fs.open(path).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound, "path {path}");
    }
}

#[tokio::test]
async fn rewrite_serves_the_root_index_for_missing_paths() {
    let fs = site_fs(spa_options()).await;

    assert_eq!(contents(&fs, "missing.png"), ROOT_INDEX.as_bytes());
    assert_eq!(contents(&fs, "deep/nested/route"), ROOT_INDEX.as_bytes());

    // The rewritten handle reports the index file, not the request
    let file = fs.open("missing.png").unwrap();
    assert_eq!(file.metadata().name(), "index.html");

    // Present entries are untouched by the rewrite
    assert_eq!(
        contents(&fs, "directorywithindex/index.html"),
        SUB_INDEX.as_bytes()
    );
    assert_eq!(
        contents(&fs, "nonemptydirectory/file.txt"),
        TEXT_FILE.as_bytes()
    );
}

#[tokio::test]
async fn rewrite_without_an_index_fails_instead_of_recursing() {
    let archive = build_archive(&[("only.txt", Some("just one file"))]);
    let fs = ZipFileSystem::from_bytes(archive, spa_options())
        .await
        .unwrap();

    let err = fs.open("anything-missing").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let err = fs.open("index.html").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn duplicate_names_resolve_to_the_last_entry() {
    let archive = build_archive(&[
        ("dupe.txt", Some("first version")),
        ("other.txt", Some("unrelated")),
        ("dupe.txt", Some("second version")),
    ]);
    let fs = ZipFileSystem::from_bytes(archive, FsOptions::default())
        .await
        .unwrap();

    assert_eq!(contents(&fs, "dupe.txt"), b"second version");
    assert_eq!(fs.file_count(), 2);
}

// The end-to-end scenario: a root index, a subdirectory index, and a
// nested plain file, with no directory placeholder entries at all.
#[tokio::test]
async fn resolution_scenario_with_and_without_the_rewrite() {
    let archive = build_archive(&[
        ("index.html", Some("ROOT")),
        ("sub/index.html", Some("SUB")),
        ("sub/file.txt", Some("TXT")),
    ]);

    let fs = ZipFileSystem::from_bytes(archive.clone(), FsOptions::default())
        .await
        .unwrap();
    assert!(fs.open("/").unwrap().metadata().is_dir());
    assert_eq!(contents(&fs, "index.html"), b"ROOT");
    assert_eq!(fs.open("sub").unwrap_err().kind(), ErrorKind::NotFound);
    assert_eq!(contents(&fs, "sub/index.html"), b"SUB");
    assert_eq!(contents(&fs, "sub/file.txt"), b"TXT");
    assert_eq!(
        fs.open("missing.png").unwrap_err().kind(),
        ErrorKind::NotFound
    );

    // With the rewrite on, misses resolve to the root index. The fallback
    // target is always the top-level file, never sub/index.html.
    let fs = ZipFileSystem::from_bytes(archive, spa_options())
        .await
        .unwrap();
    assert!(fs.open("/").unwrap().metadata().is_dir());
    assert_eq!(contents(&fs, "index.html"), b"ROOT");
    assert_eq!(contents(&fs, "sub"), b"ROOT");
    assert_eq!(contents(&fs, "sub/index.html"), b"SUB");
    assert_eq!(contents(&fs, "sub/file.txt"), b"TXT");
    assert_eq!(contents(&fs, "missing.png"), b"ROOT");
}

#[tokio::test]
async fn file_and_buffer_sources_agree() {
    let archive = site_archive();

    let mut tmp = tempfile::NamedTempFile::new().unwrap();
    tmp.write_all(&archive).unwrap();
    tmp.flush().unwrap();

    let from_file = ZipFileSystem::from_file(tmp.path(), FsOptions::default())
        .await
        .unwrap();
    let from_bytes = ZipFileSystem::from_bytes(archive, FsOptions::default())
        .await
        .unwrap();

    assert_eq!(from_file.file_count(), from_bytes.file_count());
    assert_eq!(
        contents(&from_file, "index.html"),
        contents(&from_bytes, "index.html")
    );
    assert_eq!(
        contents(&from_file, "nonemptydirectory/file.txt"),
        contents(&from_bytes, "nonemptydirectory/file.txt")
    );
}

// An archive appended to another file, the layout a bundled executable
// has. Recorded offsets are short by the prefix length and must still
// resolve.
#[tokio::test]
async fn archives_appended_to_foreign_bytes_load() {
    let mut data = b"#!/bin/sh\nexec something\n".to_vec();
    data.resize(data.len() + 4096, 0xAB);
    data.extend_from_slice(&site_archive());

    let fs = ZipFileSystem::from_bytes(data, FsOptions::default())
        .await
        .unwrap();

    assert_eq!(contents(&fs, "index.html"), ROOT_INDEX.as_bytes());
    assert_eq!(
        contents(&fs, "directorywithindex/index.html"),
        SUB_INDEX.as_bytes()
    );
}

#[tokio::test]
async fn stored_entries_load_like_deflated_ones() {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let stored = FileOptions::default().compression_method(zip::CompressionMethod::Stored);
    writer.start_file("raw.bin", stored).unwrap();
    writer.write_all(b"uncompressed bytes").unwrap();
    let archive = writer.finish().unwrap().into_inner();

    let fs = ZipFileSystem::from_bytes(archive, FsOptions::default())
        .await
        .unwrap();
    assert_eq!(contents(&fs, "raw.bin"), b"uncompressed bytes");
}

#[tokio::test]
async fn empty_entries_load() {
    let archive = build_archive(&[("empty.dat", Some(""))]);
    let fs = ZipFileSystem::from_bytes(archive, FsOptions::default())
        .await
        .unwrap();

    let file = fs.open("empty.dat").unwrap();
    assert!(file.metadata().is_empty());
    assert!(contents(&fs, "empty.dat").is_empty());
}

#[tokio::test]
async fn garbage_input_fails_construction() {
    let err = ZipFileSystem::from_bytes(vec![0xAB; 200], FsOptions::default())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("archive directory"));

    assert!(
        ZipFileSystem::from_bytes(vec![0; 8], FsOptions::default())
            .await
            .is_err()
    );
}

#[tokio::test]
async fn handles_support_random_access() {
    let fs = site_fs(FsOptions::default()).await;
    let mut file = fs.open("nonemptydirectory/file.txt").unwrap();

    let mut buf = [0u8; 5];
    file.seek(SeekFrom::Start(6)).unwrap();
    file.read_exact(&mut buf).unwrap();
    assert_eq!(&buf, &TEXT_FILE.as_bytes()[6..11]);

    file.seek(SeekFrom::End(-7)).unwrap();
    let mut tail = Vec::new();
    file.read_to_end(&mut tail).unwrap();
    assert_eq!(tail, &TEXT_FILE.as_bytes()[TEXT_FILE.len() - 7..]);

    // Reads past the end return nothing rather than failing
    file.seek(SeekFrom::Start(10_000)).unwrap();
    let mut past = Vec::new();
    file.read_to_end(&mut past).unwrap();
    assert!(past.is_empty());

    assert!(file.seek(SeekFrom::Current(-20_000)).is_err());
}

#[tokio::test]
async fn metadata_carries_header_time_and_mode() {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let when = zip::DateTime::from_date_and_time(2024, 5, 17, 12, 30, 0).unwrap();
    let options = FileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated)
        .last_modified_time(when)
        .unix_permissions(0o640);
    writer.start_file("doc.txt", options).unwrap();
    writer.write_all(b"dated").unwrap();
    let archive = writer.finish().unwrap().into_inner();

    let fs = ZipFileSystem::from_bytes(archive, FsOptions::default())
        .await
        .unwrap();
    let file = fs.open("doc.txt").unwrap();

    assert_eq!(file.metadata().modified(), (2024, 5, 17, 12, 30, 0));
    assert_eq!(file.metadata().mode(), 0o640);
}
