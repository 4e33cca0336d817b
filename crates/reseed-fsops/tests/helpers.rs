#![cfg(unix)]

use std::path::{Path, PathBuf};

use anyhow::Result;
use reseed_core::{DescriptorReader, FileLocator, ImportOutcome, Importer, LocationCandidate};
use reseed_fsops::{FsOpsError, HelperCommand, LocateIndex, TorrentInfoReader};
use reseed_test_support::fixtures::{SAMPLE_INFO_HASH, multi_file, write_shell_script};
use reseed_test_support::mocks::{FakeReader, RecordingDaemon};
use tempfile::TempDir;

fn script(dir: &TempDir, name: &str, body: &str) -> Result<HelperCommand> {
    let path: PathBuf = write_shell_script(dir.path(), name, body)?;
    Ok(HelperCommand::new("sh").arg(path))
}

#[tokio::test]
async fn reader_parses_helper_output() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let body = format!(
        r#"cat <<'EOF'
{{"info_hash": "{SAMPLE_INFO_HASH}", "torrent": {{"info": {{"name": "Album", "files": [{{"path": ["cover.jpg"]}}]}}}}}}
EOF"#
    );
    let reader = TorrentInfoReader::new(script(&dir, "torrent-info.sh", &body)?);

    let desc = reader.read_descriptor(Path::new("/tmp/demo.torrent")).await?;

    assert_eq!(desc.name, "Album");
    assert_eq!(desc.info_hash.as_str(), SAMPLE_INFO_HASH);
    assert_eq!(desc.files.map(|files| files.len()), Some(1));
    Ok(())
}

#[tokio::test]
async fn reader_receives_torrent_path_argument() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let body = format!(
        r#"printf '{{"info_hash": "{SAMPLE_INFO_HASH}", "torrent": {{"info": {{"name": "%s"}}}}}}' "$(basename "$1")""#
    );
    let reader = TorrentInfoReader::new(script(&dir, "torrent-info.sh", &body)?);

    let desc = reader.read(Path::new("/tmp/some file.torrent")).await?;

    assert_eq!(desc.name, "some file.torrent");
    Ok(())
}

#[tokio::test]
async fn reader_treats_stderr_as_fatal() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let body = format!(
        r#"echo '{{"info_hash": "{SAMPLE_INFO_HASH}", "torrent": {{"info": {{"name": "x"}}}}}}'
echo 'warning: odd torrent' >&2"#
    );
    let reader = TorrentInfoReader::new(script(&dir, "torrent-info.sh", &body)?);

    let err = reader
        .read(Path::new("/tmp/demo.torrent"))
        .await
        .expect_err("stderr output is fatal");

    assert!(
        matches!(err, FsOpsError::HelperFailed { ref stderr, .. } if stderr == "warning: odd torrent")
    );
    Ok(())
}

#[tokio::test]
async fn reader_rejects_non_zero_exit() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let reader = TorrentInfoReader::new(script(&dir, "torrent-info.sh", "exit 2")?);

    let err = reader
        .read(Path::new("/tmp/demo.torrent"))
        .await
        .expect_err("exit status is fatal");

    assert!(matches!(err, FsOpsError::HelperFailed { status: Some(2), .. }));
    Ok(())
}

#[tokio::test]
async fn locator_passes_anchored_pattern_and_splits_lines() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let log = dir.path().join("args.log");
    let body = format!(
        r#"printf '%s\n' "$@" > '{}'
printf '/data/a/it'"'"'s here.txt\n\n/data/b/it'"'"'s here.txt\n'"#,
        log.display()
    );
    let locator = LocateIndex::new(script(&dir, "locate.sh", &body)?);

    let found = locator.locate("it's here.txt").await?;

    assert_eq!(
        found,
        vec![
            LocationCandidate::new("/data/a/it's here.txt"),
            LocationCandidate::new("/data/b/it's here.txt"),
        ]
    );
    let args = std::fs::read_to_string(log)?;
    assert_eq!(args, "-b\n--regex\n^it's\\ here\\.txt$\n");
    Ok(())
}

#[tokio::test]
async fn locator_treats_exit_one_without_output_as_no_match() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let locator = LocateIndex::new(script(&dir, "locate.sh", "exit 1")?);

    let found = locator.find("missing.bin").await?;

    assert!(found.is_empty());
    Ok(())
}

const STALE_WARNING: &str = "echo 'locate: warning: database /var/cache/locate/locatedb is more than 8 days old (actual age is 12.3 days)' >&2";

#[tokio::test]
async fn locator_treats_stale_warning_with_exit_one_as_no_match() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let body = format!("{STALE_WARNING}\nexit 1");
    let locator = LocateIndex::new(script(&dir, "locate.sh", &body)?);

    let found = locator.find("missing.bin").await?;

    assert!(found.is_empty());
    Ok(())
}

#[tokio::test]
async fn importer_moves_past_stale_index_misses() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let body = format!(
        r#"{STALE_WARNING}
case "$3" in
  '^b\.bin$') echo /data/Pack/b.bin ;;
  *) exit 1 ;;
esac"#
    );
    let locator = LocateIndex::new(script(&dir, "locate.sh", &body)?);
    let reader = FakeReader::new(multi_file("Pack", &["a.bin", "b.bin"]));
    let mut importer = Importer::new(reader, locator, RecordingDaemon::new());

    let outcome = importer.import(Path::new("/tmp/pack.torrent")).await?;

    let ImportOutcome::Added { location, .. } = outcome else {
        panic!("expected torrent to be added");
    };
    assert_eq!(location.download_location, "/data");
    assert!(location.rename.is_none());
    assert_eq!(importer.daemon().add_calls(), 1);
    Ok(())
}

#[tokio::test]
async fn locator_surfaces_real_failures() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let body = "echo 'locate: can not stat () `/var/lib/mlocate/mlocate.db'\"'\"': No such file' >&2\nexit 1";
    let locator = LocateIndex::new(script(&dir, "locate.sh", body)?);

    let err = locator.find("x.bin").await.expect_err("database missing");

    assert!(matches!(err, FsOpsError::HelperFailed { status: Some(1), .. }));
    Ok(())
}

#[tokio::test]
async fn locator_tolerates_warnings_on_success() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let body = "echo 'locate: warning: database is old' >&2\necho /data/x.bin";
    let locator = LocateIndex::new(script(&dir, "locate.sh", body)?);

    let found = locator.find("x.bin").await?;

    assert_eq!(found, vec!["/data/x.bin".to_string()]);
    Ok(())
}
