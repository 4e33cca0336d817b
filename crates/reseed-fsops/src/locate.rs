//! Filesystem lookup through the system `locate` index.
//!
//! Lookups run `locate -b --regex '^<name>$'`, so they match basenames
//! exactly against the prebuilt database rather than walking the disk. The
//! index must have been refreshed after the data was written.

use async_trait::async_trait;
use reseed_core::{FileLocator, LocationCandidate};
use tracing::{info, warn};

use crate::command::HelperCommand;
use crate::error::FsOpsResult;

/// Program run when no override is configured.
pub const DEFAULT_LOCATE_PROGRAM: &str = "locate";

/// `locate` exit code meaning "nothing matched".
const NO_MATCH_STATUS: i32 = 1;

/// Stderr fragments printed when the index database cannot be read at all.
/// `locate` exits with [`NO_MATCH_STATUS`] in that case too.
const UNREADABLE_DATABASE_MARKERS: &[&str] = &[
    "can not stat",
    "cannot stat",
    "could not open",
    "no such file or directory",
    "permission denied",
];

/// Characters preceded by a backslash in a search pattern.
const ESCAPED_CHARS: &[char] = &[
    '(', ')', '[', ']', '{', '}', '?', '*', '+', '-', '|', '^', '$', '\\', '.', '&', '~', '#',
    ' ', '\t', '\n', '\r', '\x0b', '\x0c',
];

/// Escape `name` so the index's regex engine matches it literally.
///
/// The single quote is left bare: GNU regex reads `\'` as an end-of-buffer
/// anchor.
#[must_use]
pub fn escape_pattern(name: &str) -> String {
    let mut escaped = String::with_capacity(name.len() * 2);
    for ch in name.chars() {
        if ESCAPED_CHARS.contains(&ch) {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// Anchored pattern matching exactly the basename `name`.
#[must_use]
pub fn basename_pattern(name: &str) -> String {
    format!("^{}$", escape_pattern(name))
}

/// Locator backed by the `locate` database.
#[derive(Debug, Clone)]
pub struct LocateIndex {
    helper: HelperCommand,
}

impl Default for LocateIndex {
    fn default() -> Self {
        Self::new(HelperCommand::new(DEFAULT_LOCATE_PROGRAM))
    }
}

impl LocateIndex {
    /// Locator over a specific helper command.
    #[must_use]
    pub const fn new(helper: HelperCommand) -> Self {
        Self { helper }
    }

    /// Paths whose basename is exactly `file_name`, in index order.
    ///
    /// # Errors
    ///
    /// Returns an [`crate::FsOpsError`] when the index program fails for a
    /// reason other than finding no match.
    pub async fn find(&self, file_name: &str) -> FsOpsResult<Vec<String>> {
        let program = self.helper.program();
        let pattern = basename_pattern(file_name);
        info!(program = %program.display(), %pattern, "querying locate index");
        let output = self
            .helper
            .output(["-b", "--regex", pattern.as_str()])
            .await?;

        let stderr = output.stderr_text();
        let no_match = output.status.code() == Some(NO_MATCH_STATUS)
            && output.stdout.iter().all(u8::is_ascii_whitespace)
            && !reports_unreadable_database(&stderr);
        if !output.status.success() && !no_match {
            return Err(output.failure(program));
        }
        if !stderr.is_empty() {
            warn!(program = %program.display(), %stderr, "locate reported warnings");
        }
        if no_match {
            return Ok(Vec::new());
        }

        let stdout = output.stdout_text(program)?;
        Ok(stdout
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(str::to_string)
            .collect())
    }
}

fn reports_unreadable_database(stderr: &str) -> bool {
    let stderr = stderr.to_ascii_lowercase();
    UNREADABLE_DATABASE_MARKERS
        .iter()
        .any(|marker| stderr.contains(marker))
}

#[async_trait]
impl FileLocator for LocateIndex {
    async fn locate(&self, file_name: &str) -> anyhow::Result<Vec<LocationCandidate>> {
        let paths = self.find(file_name).await?;
        Ok(paths.into_iter().map(LocationCandidate::new).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_names_pass_through() {
        assert_eq!(escape_pattern("Movie_2001"), "Movie_2001");
    }

    #[test]
    fn metacharacters_are_escaped() {
        assert_eq!(
            escape_pattern("a.b (1) [x]+{y}?*|^$\\"),
            "a\\.b\\ \\(1\\)\\ \\[x\\]\\+\\{y\\}\\?\\*\\|\\^\\$\\\\"
        );
        assert_eq!(escape_pattern("a-b&c~d#e"), "a\\-b\\&c\\~d\\#e");
    }

    #[test]
    fn single_quote_is_not_escaped() {
        assert_eq!(
            escape_pattern("Don't Stop.mp3"),
            "Don't\\ Stop\\.mp3"
        );
    }

    #[test]
    fn pattern_is_anchored() {
        assert_eq!(basename_pattern("a.txt"), "^a\\.txt$");
    }

    #[test]
    fn stale_database_warning_is_not_unreadable() {
        assert!(!reports_unreadable_database(
            "locate: warning: database `/var/cache/locate/locatedb' is more than 8 days old (actual age is 12.3 days)"
        ));
        assert!(!reports_unreadable_database(""));
    }

    #[test]
    fn missing_database_is_unreadable() {
        assert!(reports_unreadable_database(
            "locate: can not stat () `/var/lib/mlocate/mlocate.db': No such file or directory"
        ));
        assert!(reports_unreadable_database(
            "plocate: could not open database /var/lib/plocate/plocate.db: No such file or directory"
        ));
    }

    #[test]
    fn non_ascii_is_literal() {
        assert_eq!(escape_pattern("Amélie.mkv"), "Amélie\\.mkv");
    }
}
