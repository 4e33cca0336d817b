//! Argument parsing, logging setup, and dispatch.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use reseed_fsops::{DEFAULT_LOCATE_PROGRAM, DEFAULT_TORRENT_INFO_PROGRAM};
use reseed_telemetry::{
    DEFAULT_LOG_LEVEL, LogFormat, LoggingConfig, init_logging, new_trace_id, run_span,
};
use tracing::{Instrument, error, info};

use crate::commands::import::handle_import;
use crate::config::ImportSettings;
use crate::error::{CliError, CliResult};
use crate::output::render_outcome;

/// Parses CLI arguments, runs the import, and reports failures on stderr.
/// Returns the process exit code.
pub async fn run() -> i32 {
    let cli = Cli::parse();

    let logging = LoggingConfig {
        level: &cli.log_level,
        format: cli.log_format.into(),
    };
    if let Err(err) = init_logging(&logging) {
        let err = CliError::failure(err);
        eprintln!("error: {}", err.display_message());
        return err.exit_code();
    }

    let trace_id = new_trace_id();
    let result = dispatch(cli).instrument(run_span(&trace_id)).await;

    match result {
        Ok(()) => 0,
        Err(err) => {
            let exit_code = err.exit_code();
            let message = err.display_message();
            error!(%trace_id, exit_code, "run failed");
            eprintln!("error: {message}");
            exit_code
        }
    }
}

async fn dispatch(cli: Cli) -> CliResult<()> {
    let settings = ImportSettings::from_cli(&cli)?;
    info!(
        host = %settings.endpoint.host,
        port = settings.endpoint.port,
        torrent = %settings.torrent_file.display(),
        "starting import"
    );
    let outcome = handle_import(&settings).await?;
    render_outcome(&outcome, cli.output)
}

#[derive(Debug, Parser)]
#[command(
    name = "reseed",
    version,
    about = "Register already-downloaded torrent data with a Deluge daemon",
    long_about = "Finds the data of TORRENT_FILE through the locate index, then adds the \
                  torrent to the Deluge daemon paused and pointing at that data, renaming \
                  the torrent's folder when the on-disk name differs."
)]
pub(crate) struct Cli {
    #[arg(help = "Deluge daemon host")]
    pub(crate) host: String,
    #[arg(help = "Deluge daemon RPC port")]
    pub(crate) port: u16,
    #[arg(help = "Daemon account name")]
    pub(crate) username: String,
    #[arg(help = "Daemon account password")]
    pub(crate) password: String,
    #[arg(help = "Path to the .torrent file to import")]
    pub(crate) torrent_file: PathBuf,
    #[arg(
        long,
        env = "RESEED_TORRENT_INFO_BIN",
        default_value = DEFAULT_TORRENT_INFO_PROGRAM,
        help = "Program printing a torrent's metadata as JSON"
    )]
    pub(crate) torrent_info_bin: PathBuf,
    #[arg(
        long,
        env = "RESEED_LOCATE_BIN",
        default_value = DEFAULT_LOCATE_PROGRAM,
        help = "Program querying the filesystem index"
    )]
    pub(crate) locate_bin: PathBuf,
    #[arg(
        long,
        env = "RESEED_LOG_LEVEL",
        default_value = DEFAULT_LOG_LEVEL,
        help = "Log level or filter directive; RUST_LOG takes precedence"
    )]
    pub(crate) log_level: String,
    #[arg(
        long,
        env = "RESEED_LOG_FORMAT",
        value_enum,
        default_value_t = LogFormatArg::Pretty
    )]
    pub(crate) log_format: LogFormatArg,
    #[arg(
        long = "output",
        alias = "format",
        value_enum,
        default_value_t = OutputFormat::Table,
        help = "Select output format for the import result"
    )]
    pub(crate) output: OutputFormat,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Table,
    Json,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum LogFormatArg {
    Pretty,
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(value: LogFormatArg) -> Self {
        match value {
            LogFormatArg::Pretty => Self::Pretty,
            LogFormatArg::Json => Self::Json,
        }
    }
}
