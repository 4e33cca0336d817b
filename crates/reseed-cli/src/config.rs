//! Validated settings for one import run.

use std::path::PathBuf;

use reseed_deluge::DaemonEndpoint;

use crate::cli::Cli;
use crate::error::{CliError, CliResult};

/// Everything the import command needs, checked before any I/O.
#[derive(Debug, Clone)]
pub(crate) struct ImportSettings {
    pub(crate) endpoint: DaemonEndpoint,
    pub(crate) torrent_file: PathBuf,
    pub(crate) torrent_info_bin: PathBuf,
    pub(crate) locate_bin: PathBuf,
}

impl ImportSettings {
    pub(crate) fn from_cli(cli: &Cli) -> CliResult<Self> {
        let host = cli.host.trim();
        if host.is_empty() {
            return Err(CliError::validation("daemon host must not be empty"));
        }
        if cli.port == 0 {
            return Err(CliError::validation("daemon port must be between 1 and 65535"));
        }
        if cli.username.is_empty() {
            return Err(CliError::validation("daemon username must not be empty"));
        }
        if cli.torrent_file.as_os_str().is_empty() {
            return Err(CliError::validation("torrent file path must not be empty"));
        }

        Ok(Self {
            endpoint: DaemonEndpoint {
                host: host.to_string(),
                port: cli.port,
                username: cli.username.clone(),
                password: cli.password.clone(),
            },
            torrent_file: cli.torrent_file.clone(),
            torrent_info_bin: cli.torrent_info_bin.clone(),
            locate_bin: cli.locate_bin.clone(),
        })
    }
}
