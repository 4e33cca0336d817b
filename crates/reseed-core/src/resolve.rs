//! Choosing what to search for and turning a located path into a daemon
//! download location.

use std::path::Path;

use crate::error::{ImportError, ImportResult};
use crate::model::{FolderRename, LocationCandidate, ResolvedLocation, TorrentDescriptor};

/// Top-level entries starting with this prefix are never searched.
pub const RESERVED_NAME_PREFIX: &str = "___";

/// Names to look up in the filesystem index, in the order they are tried.
///
/// Single-file torrents search for their declared name. Multi-file torrents
/// search their top-level files only, skipping reserved names, shortest
/// first with ties kept in declaration order.
///
/// # Errors
///
/// Returns [`ImportError::NoSearchCandidates`] when a multi-file torrent has
/// no eligible top-level entry.
pub fn search_names(descriptor: &TorrentDescriptor) -> ImportResult<Vec<&str>> {
    let Some(files) = descriptor.files.as_deref() else {
        return Ok(vec![descriptor.name.as_str()]);
    };

    let mut names: Vec<&str> = files
        .iter()
        .filter_map(|entry| match entry.path.as_slice() {
            [name] => Some(name.as_str()),
            _ => None,
        })
        .filter(|name| !name.starts_with(RESERVED_NAME_PREFIX))
        .collect();

    if names.is_empty() {
        return Err(ImportError::NoSearchCandidates {
            torrent: descriptor.name.clone(),
        });
    }

    names.sort_by_key(|name| name.chars().count());
    Ok(names)
}

/// Compute the download location (and optional folder rename) for a
/// located file.
///
/// # Errors
///
/// Returns [`ImportError::InvalidLocation`] when the path is not absolute,
/// lacks the ancestors the layout needs, or is not valid UTF-8.
pub fn resolve_location(
    descriptor: &TorrentDescriptor,
    candidate: &LocationCandidate,
) -> ImportResult<ResolvedLocation> {
    let path = candidate.path();
    if !path.is_absolute() {
        return Err(invalid(path, "located path is not absolute"));
    }
    let file_dir = path
        .parent()
        .ok_or_else(|| invalid(path, "located path has no parent directory"))?;

    if descriptor.is_single_file() {
        return Ok(ResolvedLocation {
            download_location: utf8(file_dir)?.to_string(),
            rename: None,
        });
    }

    let download_dir = file_dir
        .parent()
        .ok_or_else(|| invalid(path, "torrent folder has no parent directory"))?;
    let folder_name = file_dir
        .file_name()
        .ok_or_else(|| invalid(path, "torrent folder has no name"))?
        .to_str()
        .ok_or_else(|| invalid(path, "path is not valid UTF-8"))?;

    let rename = (folder_name != descriptor.name).then(|| FolderRename {
        from: descriptor.name.clone(),
        to: folder_name.to_string(),
    });

    Ok(ResolvedLocation {
        download_location: utf8(download_dir)?.to_string(),
        rename,
    })
}

fn utf8(path: &Path) -> ImportResult<&str> {
    path.to_str()
        .ok_or_else(|| invalid(path, "path is not valid UTF-8"))
}

fn invalid(path: &Path, reason: &'static str) -> ImportError {
    ImportError::InvalidLocation {
        path: path.to_path_buf(),
        reason,
    }
}
