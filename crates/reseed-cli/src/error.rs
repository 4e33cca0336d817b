//! Error classification for the command line.

use std::fmt::{self, Display, Formatter};

use reseed_core::ImportError;

/// Errors surfaced to the user, grouped by exit code.
#[derive(Debug)]
pub(crate) enum CliError {
    Validation(String),
    Unlocated(anyhow::Error),
    Failure(anyhow::Error),
}

/// Convenience alias for functions returning a `CliError`.
pub(crate) type CliResult<T> = Result<T, CliError>;

impl CliError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn failure(error: impl Into<anyhow::Error>) -> Self {
        Self::Failure(error.into())
    }

    pub(crate) const fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) => 2,
            Self::Failure(_) => 3,
            Self::Unlocated(_) => 4,
        }
    }

    pub(crate) fn display_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::Unlocated(error) | Self::Failure(error) => format!("{error:#}"),
        }
    }
}

impl From<ImportError> for CliError {
    fn from(error: ImportError) -> Self {
        if error.is_unlocated() {
            Self::Unlocated(error.into())
        } else {
            Self::Failure(error.into())
        }
    }
}

impl Display for CliError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str("cli error")
    }
}

impl std::error::Error for CliError {}
