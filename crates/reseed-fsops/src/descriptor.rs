//! Torrent descriptor reader backed by the `torrent-info` helper.
//!
//! The helper prints one JSON document shaped as
//! `{"info_hash": "...", "torrent": {"info": {"name": "...", "files": null | [{"path": [...]}]}}}`.
//! Unknown fields are ignored.

use std::path::Path;

use async_trait::async_trait;
use reseed_core::{DescriptorReader, FileEntry, InfoHash, TorrentDescriptor};
use serde::Deserialize;
use tracing::{debug, info};

use crate::command::HelperCommand;
use crate::error::{FsOpsError, FsOpsResult};

/// Program run when no override is configured.
pub const DEFAULT_TORRENT_INFO_PROGRAM: &str = "torrent-info";

#[derive(Debug, Deserialize)]
struct TorrentInfoDocument {
    info_hash: String,
    torrent: TorrentSection,
}

#[derive(Debug, Deserialize)]
struct TorrentSection {
    info: InfoSection,
}

#[derive(Debug, Deserialize)]
struct InfoSection {
    name: String,
    #[serde(default)]
    files: Option<Vec<FileSection>>,
}

#[derive(Debug, Deserialize)]
struct FileSection {
    path: Vec<String>,
}

/// Reads descriptors by running `torrent-info <file>`.
#[derive(Debug, Clone)]
pub struct TorrentInfoReader {
    helper: HelperCommand,
}

impl Default for TorrentInfoReader {
    fn default() -> Self {
        Self::new(HelperCommand::new(DEFAULT_TORRENT_INFO_PROGRAM))
    }
}

impl TorrentInfoReader {
    /// Reader over a specific helper command.
    #[must_use]
    pub const fn new(helper: HelperCommand) -> Self {
        Self { helper }
    }

    /// Run the helper and parse its output.
    ///
    /// Any stderr output is treated as failure, as is a non-zero exit.
    ///
    /// # Errors
    ///
    /// Returns an [`FsOpsError`] when the helper fails or prints something
    /// other than a well-formed descriptor.
    pub async fn read(&self, torrent_file: &Path) -> FsOpsResult<TorrentDescriptor> {
        let program = self.helper.program();
        info!(program = %program.display(), torrent = %torrent_file.display(), "reading torrent descriptor");
        let output = self.helper.output([torrent_file]).await?;

        if !output.status.success() || !output.stderr_text().is_empty() {
            return Err(output.failure(program));
        }

        let stdout = output.stdout_text(program)?;
        parse_descriptor(&stdout, torrent_file)
    }
}

#[async_trait]
impl DescriptorReader for TorrentInfoReader {
    async fn read_descriptor(&self, torrent_file: &Path) -> anyhow::Result<TorrentDescriptor> {
        Ok(self.read(torrent_file).await?)
    }
}

/// Parse the helper's JSON document.
///
/// # Errors
///
/// Returns [`FsOpsError::Json`] for malformed documents and
/// [`FsOpsError::InfoHash`] for unusable info hashes.
pub fn parse_descriptor(document: &str, torrent_file: &Path) -> FsOpsResult<TorrentDescriptor> {
    let parsed: TorrentInfoDocument =
        serde_json::from_str(document).map_err(|source| FsOpsError::Json {
            path: torrent_file.to_path_buf(),
            source,
        })?;
    debug!(info = ?parsed.torrent.info, "torrent info");

    let info_hash = InfoHash::parse(&parsed.info_hash).map_err(|source| FsOpsError::InfoHash {
        path: torrent_file.to_path_buf(),
        source,
    })?;
    let info = parsed.torrent.info;

    Ok(TorrentDescriptor {
        info_hash,
        name: info.name,
        files: info.files.map(|files| {
            files
                .into_iter()
                .map(|file| FileEntry { path: file.path })
                .collect()
        }),
    })
}
