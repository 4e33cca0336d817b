//! Adapter traits and the import pipeline that sequences them.

use std::path::Path;

use async_trait::async_trait;
use tracing::{debug, info, instrument};

use crate::error::{ImportError, ImportResult};
use crate::model::{
    ImportOutcome, InfoHash, LocationCandidate, ResolvedLocation, TorrentDescriptor,
    TorrentStatus,
};
use crate::resolve::{resolve_location, search_names};

/// Parses a torrent file into a [`TorrentDescriptor`].
#[async_trait]
pub trait DescriptorReader: Send + Sync {
    /// Read the descriptor of the torrent stored at `torrent_file`.
    async fn read_descriptor(&self, torrent_file: &Path) -> anyhow::Result<TorrentDescriptor>;
}

/// Looks up absolute paths whose basename equals a given file name.
#[async_trait]
pub trait FileLocator: Send + Sync {
    /// Return every indexed path whose basename is exactly `file_name`.
    /// Zero matches is not an error.
    async fn locate(&self, file_name: &str) -> anyhow::Result<Vec<LocationCandidate>>;
}

/// Remote download daemon the torrent is registered with.
#[async_trait]
pub trait TorrentDaemon: Send {
    /// Whether the daemon already tracks the torrent with this info hash.
    async fn is_already_added(&mut self, info_hash: &InfoHash) -> anyhow::Result<bool>;

    /// Submit the torrent file, paused, pointing at `download_location`.
    /// Returns the daemon's identifier for the new torrent, if it gave one.
    async fn add_torrent(
        &mut self,
        torrent_file: &Path,
        download_location: &str,
    ) -> anyhow::Result<Option<String>>;

    /// Status of a registered torrent; `None` when the daemon has no entry.
    async fn torrent_status(&mut self, torrent_id: &str) -> anyhow::Result<Option<TorrentStatus>>;

    /// Rename the torrent's top-level folder.
    async fn rename_folder(
        &mut self,
        torrent_id: &str,
        rename_from: &str,
        rename_to: &str,
    ) -> anyhow::Result<()>;
}

/// Sequential pipeline: read, check for duplicates, locate, resolve, add,
/// rename.
pub struct Importer<R, L, D> {
    reader: R,
    locator: L,
    daemon: D,
}

impl<R, L, D> Importer<R, L, D>
where
    R: DescriptorReader,
    L: FileLocator,
    D: TorrentDaemon,
{
    /// Assemble a pipeline over a connected daemon.
    pub const fn new(reader: R, locator: L, daemon: D) -> Self {
        Self {
            reader,
            locator,
            daemon,
        }
    }

    /// Borrow the daemon adapter.
    pub const fn daemon(&self) -> &D {
        &self.daemon
    }

    /// Borrow the locator adapter.
    pub const fn locator(&self) -> &L {
        &self.locator
    }

    /// Import a single torrent file.
    ///
    /// # Errors
    ///
    /// Fails fast on the first step that fails; see [`ImportError`].
    #[instrument(name = "import", skip_all, fields(torrent = %torrent_file.display()))]
    pub async fn import(&mut self, torrent_file: &Path) -> ImportResult<ImportOutcome> {
        let descriptor = self
            .reader
            .read_descriptor(torrent_file)
            .await
            .map_err(|source| ImportError::Descriptor {
                path: torrent_file.to_path_buf(),
                source,
            })?;
        debug!(?descriptor, "parsed torrent descriptor");

        info!(info_hash = %descriptor.info_hash, "checking whether hash is added");
        let already_added = self
            .daemon
            .is_already_added(&descriptor.info_hash)
            .await
            .map_err(|source| ImportError::Daemon {
                operation: "is_already_added",
                source,
            })?;
        if already_added {
            info!(torrent = %torrent_file.display(), "already added");
            return Ok(ImportOutcome::AlreadyAdded {
                info_hash: descriptor.info_hash,
            });
        }

        let candidate = self.locate_data(&descriptor).await?;
        let location = resolve_location(&descriptor, &candidate)?;
        info!(
            download_location = %location.download_location,
            rename_to = location.rename.as_ref().map(|rename| rename.to.as_str()),
            "resolved torrent location"
        );

        self.register(torrent_file, location).await
    }

    async fn locate_data(&self, descriptor: &TorrentDescriptor) -> ImportResult<LocationCandidate> {
        let names = search_names(descriptor)?;
        debug!(?names, "searching for torrent data");

        for name in &names {
            let mut matches =
                self.locator
                    .locate(name)
                    .await
                    .map_err(|source| ImportError::Locate {
                        name: (*name).to_string(),
                        source,
                    })?;
            info!(name, results = ?matches, "locate results");
            if matches.len() == 1
                && let Some(found) = matches.pop()
            {
                return Ok(found);
            }
        }

        Err(ImportError::NotLocated {
            tried: names.into_iter().map(str::to_string).collect(),
        })
    }

    async fn register(
        &mut self,
        torrent_file: &Path,
        location: ResolvedLocation,
    ) -> ImportResult<ImportOutcome> {
        let torrent_id = self
            .daemon
            .add_torrent(torrent_file, &location.download_location)
            .await
            .map_err(|source| ImportError::Daemon {
                operation: "add_torrent",
                source,
            })?
            .ok_or_else(|| ImportError::MissingTorrentId {
                path: torrent_file.to_path_buf(),
            })?;
        info!(%torrent_id, "added torrent");

        let status = self
            .daemon
            .torrent_status(&torrent_id)
            .await
            .map_err(|source| ImportError::Daemon {
                operation: "torrent_status",
                source,
            })?;
        debug!(?status, "torrent status after add");

        if let Some(rename) = &location.rename {
            info!(from = %rename.from, to = %rename.to, "renaming torrent folder");
            self.daemon
                .rename_folder(&torrent_id, &rename.from, &rename.to)
                .await
                .map_err(|source| ImportError::Daemon {
                    operation: "rename_folder",
                    source,
                })?;
        }

        Ok(ImportOutcome::Added {
            torrent_id,
            location,
            status,
        })
    }
}
