//! The import command: wires the real adapters into the pipeline.

use std::path::Path;

use reseed_core::{DescriptorReader, FileLocator, ImportOutcome, Importer, TorrentDaemon};
use reseed_deluge::DelugeClient;
use reseed_fsops::{HelperCommand, LocateIndex, TorrentInfoReader};

use crate::config::ImportSettings;
use crate::error::{CliError, CliResult};

/// Connect to the daemon, then run the import pipeline against the real
/// helper programs.
pub(crate) async fn handle_import(settings: &ImportSettings) -> CliResult<ImportOutcome> {
    let daemon = DelugeClient::connect(&settings.endpoint)
        .await
        .map_err(CliError::failure)?;
    let reader = TorrentInfoReader::new(HelperCommand::new(&settings.torrent_info_bin));
    let locator = LocateIndex::new(HelperCommand::new(&settings.locate_bin));

    import_with(reader, locator, daemon, &settings.torrent_file).await
}

pub(crate) async fn import_with<R, L, D>(
    reader: R,
    locator: L,
    daemon: D,
    torrent_file: &Path,
) -> CliResult<ImportOutcome>
where
    R: DescriptorReader,
    L: FileLocator,
    D: TorrentDaemon,
{
    let mut importer = Importer::new(reader, locator, daemon);
    Ok(importer.import(torrent_file).await?)
}
