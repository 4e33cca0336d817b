//! Helper-program invocation with captured output.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};

use tokio::process::Command;
use tracing::debug;

use crate::error::{FsOpsError, FsOpsResult};

/// An external program plus any leading arguments it always receives.
#[derive(Debug, Clone)]
pub struct HelperCommand {
    program: PathBuf,
    leading_args: Vec<OsString>,
}

/// Captured result of a finished helper run.
#[derive(Debug)]
pub struct HelperOutput {
    /// Exit status of the process.
    pub status: ExitStatus,
    /// Raw stdout bytes.
    pub stdout: Vec<u8>,
    /// Raw stderr bytes.
    pub stderr: Vec<u8>,
}

impl HelperOutput {
    /// Stderr as trimmed, lossily decoded text.
    #[must_use]
    pub fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.stderr).trim().to_string()
    }

    /// Stdout decoded as UTF-8.
    ///
    /// # Errors
    ///
    /// Returns [`FsOpsError::InvalidOutput`] when stdout is not UTF-8.
    pub fn stdout_text(self, program: &Path) -> FsOpsResult<String> {
        String::from_utf8(self.stdout).map_err(|source| FsOpsError::InvalidOutput {
            program: program.to_path_buf(),
            source,
        })
    }

    /// Build the failure error for this run.
    #[must_use]
    pub fn failure(&self, program: &Path) -> FsOpsError {
        FsOpsError::HelperFailed {
            program: program.to_path_buf(),
            status: self.status.code(),
            stderr: self.stderr_text(),
        }
    }
}

impl HelperCommand {
    /// Wrap a program name or path, resolved through `PATH` when bare.
    #[must_use]
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            leading_args: Vec::new(),
        }
    }

    /// Add an argument passed before every call's own arguments.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.leading_args.push(arg.into());
        self
    }

    /// The program being run.
    #[must_use]
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Run the program to completion with `args` appended, capturing stdout
    /// and stderr. Stdin is closed.
    ///
    /// # Errors
    ///
    /// Returns [`FsOpsError::Spawn`] when the process cannot be started.
    pub async fn output<I, S>(&self, args: I) -> FsOpsResult<HelperOutput>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut command = Command::new(&self.program);
        command
            .args(&self.leading_args)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        debug!(command = ?command.as_std(), "running helper program");

        let output = command.output().await.map_err(|source| FsOpsError::Spawn {
            program: self.program.clone(),
            source,
        })?;

        Ok(HelperOutput {
            status: output.status,
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn captures_both_streams() {
        let helper = HelperCommand::new("sh").arg("-c");
        let output = helper
            .output(["echo out; echo err >&2; exit 3"])
            .await
            .expect("sh runs");
        assert_eq!(output.status.code(), Some(3));
        assert_eq!(output.stderr_text(), "err");
        assert_eq!(output.stdout_text(Path::new("sh")).expect("utf-8"), "out\n");
    }

    #[tokio::test]
    async fn missing_program_is_a_spawn_error() {
        let helper = HelperCommand::new("/definitely/not/a/program");
        let err = helper.output(["x"]).await.expect_err("cannot spawn");
        assert!(matches!(err, FsOpsError::Spawn { .. }));
    }
}
