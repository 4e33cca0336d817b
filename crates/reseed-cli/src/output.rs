//! Output renderers for the import result.

use std::fmt::Write as _;

use anyhow::anyhow;
use reseed_core::ImportOutcome;

use crate::cli::OutputFormat;
use crate::error::{CliError, CliResult};

pub(crate) fn render_outcome(outcome: &ImportOutcome, format: OutputFormat) -> CliResult<()> {
    print!("{}", format_outcome(outcome, format)?);
    Ok(())
}

pub(crate) fn format_outcome(outcome: &ImportOutcome, format: OutputFormat) -> CliResult<String> {
    match format {
        OutputFormat::Json => {
            let text = serde_json::to_string_pretty(outcome)
                .map_err(|err| CliError::failure(anyhow!("failed to format JSON: {err}")))?;
            Ok(format!("{text}\n"))
        }
        OutputFormat::Table => Ok(format_table(outcome)),
    }
}

fn format_table(outcome: &ImportOutcome) -> String {
    let mut out = String::new();
    match outcome {
        ImportOutcome::AlreadyAdded { info_hash } => {
            let _ = writeln!(out, "already added: {info_hash}");
        }
        ImportOutcome::Added {
            torrent_id,
            location,
            status,
        } => {
            let _ = writeln!(out, "added: {torrent_id}");
            let _ = writeln!(out, "location: {}", location.download_location);
            if let Some(rename) = &location.rename {
                let _ = writeln!(out, "renamed: {} -> {}", rename.from, rename.to);
            }
            if let Some(status) = status {
                if let Some(name) = &status.name {
                    let _ = writeln!(out, "name: {name}");
                }
                if let Some(save_path) = &status.save_path {
                    let _ = writeln!(out, "save path: {save_path}");
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use reseed_core::{FolderRename, ResolvedLocation, TorrentStatus};
    use reseed_test_support::fixtures::{SAMPLE_INFO_HASH, sample_info_hash};

    use super::*;

    fn added() -> ImportOutcome {
        ImportOutcome::Added {
            torrent_id: "deadbeef".to_string(),
            location: ResolvedLocation {
                download_location: "/data/music".to_string(),
                rename: Some(FolderRename {
                    from: "Album".to_string(),
                    to: "Album (2001)".to_string(),
                }),
            },
            status: Some(TorrentStatus {
                name: Some("Album".to_string()),
                save_path: Some("/data/music".to_string()),
            }),
        }
    }

    #[test]
    fn table_lists_added_details() {
        let text = format_outcome(&added(), OutputFormat::Table).expect("format");
        assert_eq!(
            text,
            "added: deadbeef\nlocation: /data/music\nrenamed: Album -> Album (2001)\nname: Album\nsave path: /data/music\n"
        );
    }

    #[test]
    fn table_reports_already_added() {
        let outcome = ImportOutcome::AlreadyAdded {
            info_hash: sample_info_hash(),
        };
        let text = format_outcome(&outcome, OutputFormat::Table).expect("format");
        assert_eq!(text, format!("already added: {SAMPLE_INFO_HASH}\n"));
    }

    #[test]
    fn json_is_tagged_by_outcome() {
        let text = format_outcome(&added(), OutputFormat::Json).expect("format");
        let value: serde_json::Value = serde_json::from_str(&text).expect("json");
        assert_eq!(value["outcome"], "added");
        assert_eq!(value["torrent_id"], "deadbeef");
        assert_eq!(value["location"]["rename"]["to"], "Album (2001)");
    }
}
