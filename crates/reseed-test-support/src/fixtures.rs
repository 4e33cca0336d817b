//! Descriptor builders and on-disk fixtures.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use reseed_core::{FileEntry, InfoHash, TorrentDescriptor};

/// Info hash used by the fixture descriptors.
pub const SAMPLE_INFO_HASH: &str = "0123456789abcdef0123456789abcdef01234567";

/// Bytes written by [`write_torrent_file`]; only their identity matters.
pub const SAMPLE_TORRENT_BYTES: &[u8] = b"d4:infod4:name4:demoee";

/// Parsed form of [`SAMPLE_INFO_HASH`].
#[must_use]
pub fn sample_info_hash() -> InfoHash {
    InfoHash::parse(SAMPLE_INFO_HASH).unwrap_or_else(|err| panic!("fixture hash: {err}"))
}

/// Descriptor for a single-file torrent.
#[must_use]
pub fn single_file(name: &str) -> TorrentDescriptor {
    TorrentDescriptor {
        info_hash: sample_info_hash(),
        name: name.to_string(),
        files: None,
    }
}

/// Descriptor for a multi-file torrent; each entry is a `/`-separated path.
#[must_use]
pub fn multi_file(name: &str, entries: &[&str]) -> TorrentDescriptor {
    TorrentDescriptor {
        info_hash: sample_info_hash(),
        name: name.to_string(),
        files: Some(
            entries
                .iter()
                .map(|entry| FileEntry::new(entry.split('/')))
                .collect(),
        ),
    }
}

/// Write [`SAMPLE_TORRENT_BYTES`] to `dir/name` and return the path.
///
/// # Errors
///
/// Propagates IO failures from writing the file.
pub fn write_torrent_file(dir: &Path, name: &str) -> io::Result<PathBuf> {
    let path = dir.join(name);
    fs::write(&path, SAMPLE_TORRENT_BYTES)?;
    Ok(path)
}

/// Write a POSIX shell script to `dir/name` for use as a fake helper
/// program. Run it through `sh` rather than executing it directly.
///
/// # Errors
///
/// Propagates IO failures from writing the file.
pub fn write_shell_script(dir: &Path, name: &str, body: &str) -> io::Result<PathBuf> {
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{body}\n"))?;
    Ok(path)
}
