//! # Design
//!
//! - Constant error messages; operational context lives in fields.
//! - Adapter failures keep their `anyhow` chain as the source.
//! - Locate failures are separate variants so callers can tell
//!   "data not found" apart from daemon or parse failures.

use std::path::PathBuf;

use thiserror::Error;

/// Result alias for import pipeline operations.
pub type ImportResult<T> = Result<T, ImportError>;

/// Errors produced while importing a torrent.
#[derive(Debug, Error)]
pub enum ImportError {
    /// The torrent descriptor could not be read.
    #[error("failed to read torrent descriptor")]
    Descriptor {
        /// Torrent file being read.
        path: PathBuf,
        /// Underlying reader failure.
        #[source]
        source: anyhow::Error,
    },
    /// No declared name is eligible for a filesystem search.
    #[error("torrent declares no searchable top-level entries")]
    NoSearchCandidates {
        /// Declared torrent name.
        torrent: String,
    },
    /// The filesystem index lookup itself failed.
    #[error("filesystem lookup failed")]
    Locate {
        /// Name being searched for.
        name: String,
        /// Underlying locator failure.
        #[source]
        source: anyhow::Error,
    },
    /// No search name resolved to exactly one path.
    #[error("could not locate files from torrent")]
    NotLocated {
        /// Names tried, in search order.
        tried: Vec<String>,
    },
    /// The located path cannot anchor the torrent's data.
    #[error("located path cannot anchor the torrent")]
    InvalidLocation {
        /// Offending path.
        path: PathBuf,
        /// Static reason for the rejection.
        reason: &'static str,
    },
    /// A daemon call failed.
    #[error("daemon operation failed")]
    Daemon {
        /// Daemon operation identifier.
        operation: &'static str,
        /// Underlying daemon failure.
        #[source]
        source: anyhow::Error,
    },
    /// The daemon accepted the torrent without returning an identifier.
    #[error("daemon returned no torrent identifier")]
    MissingTorrentId {
        /// Torrent file that was submitted.
        path: PathBuf,
    },
}

impl ImportError {
    /// Whether the failure means the data could not be uniquely located.
    #[must_use]
    pub const fn is_unlocated(&self) -> bool {
        matches!(
            self,
            Self::NoSearchCandidates { .. } | Self::NotLocated { .. } | Self::InvalidLocation { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unlocated_classification() {
        assert!(ImportError::NotLocated { tried: vec![] }.is_unlocated());
        assert!(
            ImportError::NoSearchCandidates {
                torrent: "demo".into()
            }
            .is_unlocated()
        );
        assert!(
            !ImportError::Daemon {
                operation: "add_torrent",
                source: anyhow::anyhow!("boom"),
            }
            .is_unlocated()
        );
        assert!(
            !ImportError::MissingTorrentId {
                path: PathBuf::from("/tmp/demo.torrent")
            }
            .is_unlocated()
        );
    }
}
