//! Core domain types shared by the reader, locator, and daemon adapters.

use std::fmt::{self, Display, Formatter};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Hex-encoded torrent info hash, normalised to lowercase.
///
/// Accepts 40 characters (`BitTorrent` v1, SHA-1) or 64 characters (v2, SHA-256).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct InfoHash(String);

/// Raised when a string is not a valid hex info hash.
#[derive(Debug, Error)]
#[error("info hash must be 40 or 64 hexadecimal characters")]
pub struct InvalidInfoHash {
    /// Rejected input.
    pub value: String,
}

impl InfoHash {
    /// Parse and normalise a hex info hash.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidInfoHash`] when the input has the wrong length or
    /// contains non-hex characters.
    pub fn parse(raw: &str) -> Result<Self, InvalidInfoHash> {
        let valid_len = matches!(raw.len(), 40 | 64);
        if valid_len && raw.bytes().all(|byte| byte.is_ascii_hexdigit()) {
            Ok(Self(raw.to_ascii_lowercase()))
        } else {
            Err(InvalidInfoHash {
                value: raw.to_string(),
            })
        }
    }

    /// Borrow the normalised hex string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for InfoHash {
    type Error = InvalidInfoHash;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<InfoHash> for String {
    fn from(hash: InfoHash) -> Self {
        hash.0
    }
}

impl Display for InfoHash {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

/// A file declared by a multi-file torrent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    /// Path segments relative to the torrent's root folder.
    pub path: Vec<String>,
}

impl FileEntry {
    /// Build an entry from its path segments.
    #[must_use]
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            path: segments.into_iter().map(Into::into).collect(),
        }
    }
}

/// Parsed torrent metadata needed to locate its data on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TorrentDescriptor {
    /// Unique key the daemon indexes torrents by.
    pub info_hash: InfoHash,
    /// Declared name: the file name for single-file torrents, the root
    /// folder name otherwise.
    pub name: String,
    /// Declared files; `None` for single-file torrents.
    pub files: Option<Vec<FileEntry>>,
}

impl TorrentDescriptor {
    /// Whether the torrent describes a single file rather than a folder.
    #[must_use]
    pub const fn is_single_file(&self) -> bool {
        self.files.is_none()
    }
}

/// Absolute path reported by the filesystem index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationCandidate(PathBuf);

impl LocationCandidate {
    /// Wrap a located path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    /// Borrow the located path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.0
    }
}

/// Folder rename applied after the torrent is registered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderRename {
    /// Folder name declared by the torrent.
    pub from: String,
    /// Folder name found on disk.
    pub to: String,
}

/// Where the daemon should look for the torrent's data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedLocation {
    /// Directory registered as the torrent's download location.
    pub download_location: String,
    /// Rename needed when the on-disk folder differs from the declared name.
    pub rename: Option<FolderRename>,
}

/// Subset of the daemon's status table the importer reads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TorrentStatus {
    /// Display name known to the daemon.
    pub name: Option<String>,
    /// Directory the daemon stores the torrent under.
    pub save_path: Option<String>,
}

/// Result of a completed import run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ImportOutcome {
    /// The daemon already tracks this info hash; nothing was changed.
    AlreadyAdded {
        /// Info hash found in the daemon.
        info_hash: InfoHash,
    },
    /// The torrent was registered against the located data.
    Added {
        /// Identifier returned by the daemon.
        torrent_id: String,
        /// Location the torrent was registered with.
        location: ResolvedLocation,
        /// Status reported right after registration, when available.
        status: Option<TorrentStatus>,
    },
}
