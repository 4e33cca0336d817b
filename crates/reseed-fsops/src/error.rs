//! # Design
//!
//! - Structured, constant-message errors for the helper-program adapters.
//! - Capture the program, its exit status, and its stderr so failures are
//!   reproducible from the log alone.

use std::io;
use std::path::PathBuf;

use reseed_core::InvalidInfoHash;
use thiserror::Error;

/// Result type for helper-program operations.
pub type FsOpsResult<T> = Result<T, FsOpsError>;

/// Errors produced by the descriptor reader and filesystem locator.
#[derive(Debug, Error)]
pub enum FsOpsError {
    /// The helper program could not be started or waited on.
    #[error("failed to run helper program")]
    Spawn {
        /// Program that failed to run.
        program: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// The helper exited unsuccessfully or reported errors on stderr.
    #[error("helper program reported failure")]
    HelperFailed {
        /// Program that failed.
        program: PathBuf,
        /// Exit code, when the process exited normally.
        status: Option<i32>,
        /// Captured stderr, trimmed.
        stderr: String,
    },
    /// The helper wrote non-UTF-8 output.
    #[error("helper program output is not valid utf-8")]
    InvalidOutput {
        /// Program that produced the output.
        program: PathBuf,
        /// Underlying UTF-8 error.
        source: std::string::FromUtf8Error,
    },
    /// The descriptor JSON did not have the expected shape.
    #[error("torrent descriptor json is malformed")]
    Json {
        /// Torrent file being described.
        path: PathBuf,
        /// Underlying JSON error.
        source: serde_json::Error,
    },
    /// The descriptor carried an unusable info hash.
    #[error("torrent descriptor has an invalid info hash")]
    InfoHash {
        /// Torrent file being described.
        path: PathBuf,
        /// Underlying validation error.
        source: InvalidInfoHash,
    },
}
