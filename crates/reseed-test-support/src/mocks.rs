//! In-memory fakes for the importer's adapter traits.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use anyhow::{anyhow, bail};
use async_trait::async_trait;
use reseed_core::{
    DescriptorReader, FileLocator, InfoHash, LocationCandidate, TorrentDaemon,
    TorrentDescriptor, TorrentStatus,
};

/// Reader returning a fixed descriptor, or failing when constructed with
/// [`FakeReader::failing`].
pub struct FakeReader {
    descriptor: Option<TorrentDescriptor>,
}

impl FakeReader {
    /// Reader that always yields `descriptor`.
    #[must_use]
    pub const fn new(descriptor: TorrentDescriptor) -> Self {
        Self {
            descriptor: Some(descriptor),
        }
    }

    /// Reader that always fails.
    #[must_use]
    pub const fn failing() -> Self {
        Self { descriptor: None }
    }
}

#[async_trait]
impl DescriptorReader for FakeReader {
    async fn read_descriptor(&self, torrent_file: &Path) -> anyhow::Result<TorrentDescriptor> {
        self.descriptor
            .clone()
            .ok_or_else(|| anyhow!("cannot parse {}", torrent_file.display()))
    }
}

/// Locator answering from a fixed table and recording every query.
#[derive(Default)]
pub struct FakeLocator {
    results: HashMap<String, Vec<String>>,
    queries: Mutex<Vec<String>>,
}

impl FakeLocator {
    /// Empty locator: every lookup yields no match.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the paths returned for `name`.
    #[must_use]
    pub fn with(mut self, name: &str, paths: &[&str]) -> Self {
        self.results.insert(
            name.to_string(),
            paths.iter().map(|path| (*path).to_string()).collect(),
        );
        self
    }

    /// Names looked up so far, in call order.
    #[must_use]
    pub fn queries(&self) -> Vec<String> {
        self.queries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl FileLocator for FakeLocator {
    async fn locate(&self, file_name: &str) -> anyhow::Result<Vec<LocationCandidate>> {
        self.queries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(file_name.to_string());
        Ok(self
            .results
            .get(file_name)
            .map(|paths| paths.iter().map(LocationCandidate::new).collect())
            .unwrap_or_default())
    }
}

/// Daemon call captured by [`RecordingDaemon`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DaemonCall {
    /// `is_already_added` with the queried hash.
    IsAlreadyAdded(String),
    /// `add_torrent` with the file and location.
    AddTorrent {
        /// Submitted torrent file.
        torrent_file: PathBuf,
        /// Submitted download location.
        download_location: String,
    },
    /// `torrent_status` for the given id.
    TorrentStatus(String),
    /// `rename_folder` with its arguments.
    RenameFolder {
        /// Torrent being renamed.
        torrent_id: String,
        /// Old folder name.
        from: String,
        /// New folder name.
        to: String,
    },
}

/// Daemon fake with scripted answers that records every call.
pub struct RecordingDaemon {
    known_hashes: Vec<String>,
    assigned_id: Option<String>,
    fail_add: bool,
    calls: Vec<DaemonCall>,
}

impl Default for RecordingDaemon {
    fn default() -> Self {
        Self {
            known_hashes: Vec::new(),
            assigned_id: Some("new-torrent-id".to_string()),
            fail_add: false,
            calls: Vec::new(),
        }
    }
}

impl RecordingDaemon {
    /// Daemon with no torrents that assigns `new-torrent-id` on add.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `info_hash` as already registered.
    #[must_use]
    pub fn knowing(mut self, info_hash: &InfoHash) -> Self {
        self.known_hashes.push(info_hash.as_str().to_string());
        self
    }

    /// Accept added torrents without returning an identifier.
    #[must_use]
    pub fn without_torrent_id(mut self) -> Self {
        self.assigned_id = None;
        self
    }

    /// Fail every `add_torrent` call.
    #[must_use]
    pub fn failing_add(mut self) -> Self {
        self.fail_add = true;
        self
    }

    /// Calls received so far, in order.
    #[must_use]
    pub fn calls(&self) -> &[DaemonCall] {
        &self.calls
    }

    /// Number of `add_torrent` calls received.
    #[must_use]
    pub fn add_calls(&self) -> usize {
        self.calls
            .iter()
            .filter(|call| matches!(call, DaemonCall::AddTorrent { .. }))
            .count()
    }

    /// `rename_folder` calls received.
    #[must_use]
    pub fn rename_calls(&self) -> Vec<&DaemonCall> {
        self.calls
            .iter()
            .filter(|call| matches!(call, DaemonCall::RenameFolder { .. }))
            .collect()
    }
}

#[async_trait]
impl TorrentDaemon for RecordingDaemon {
    async fn is_already_added(&mut self, info_hash: &InfoHash) -> anyhow::Result<bool> {
        self.calls
            .push(DaemonCall::IsAlreadyAdded(info_hash.as_str().to_string()));
        Ok(self
            .known_hashes
            .iter()
            .any(|known| known == info_hash.as_str()))
    }

    async fn add_torrent(
        &mut self,
        torrent_file: &Path,
        download_location: &str,
    ) -> anyhow::Result<Option<String>> {
        self.calls.push(DaemonCall::AddTorrent {
            torrent_file: torrent_file.to_path_buf(),
            download_location: download_location.to_string(),
        });
        if self.fail_add {
            bail!("daemon rejected torrent");
        }
        Ok(self.assigned_id.clone())
    }

    async fn torrent_status(&mut self, torrent_id: &str) -> anyhow::Result<Option<TorrentStatus>> {
        self.calls
            .push(DaemonCall::TorrentStatus(torrent_id.to_string()));
        Ok(Some(TorrentStatus {
            name: Some("fake".to_string()),
            save_path: None,
        }))
    }

    async fn rename_folder(
        &mut self,
        torrent_id: &str,
        rename_from: &str,
        rename_to: &str,
    ) -> anyhow::Result<()> {
        self.calls.push(DaemonCall::RenameFolder {
            torrent_id: torrent_id.to_string(),
            from: rename_from.to_string(),
            to: rename_to.to_string(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::sample_info_hash;

    #[tokio::test]
    async fn locator_records_queries() {
        let locator = FakeLocator::new().with("a.bin", &["/data/a.bin"]);
        let found = locator.locate("a.bin").await.expect("locate");
        assert_eq!(found, vec![LocationCandidate::new("/data/a.bin")]);
        assert!(locator.locate("b.bin").await.expect("locate").is_empty());
        assert_eq!(locator.queries(), vec!["a.bin", "b.bin"]);
    }

    #[tokio::test]
    async fn daemon_reports_known_hashes() {
        let hash = sample_info_hash();
        let mut daemon = RecordingDaemon::new().knowing(&hash);
        assert!(daemon.is_already_added(&hash).await.expect("query"));
        assert_eq!(daemon.calls().len(), 1);
    }
}
