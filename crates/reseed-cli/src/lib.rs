#![forbid(unsafe_code)]
#![deny(
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::redundant_pub_crate)]

//! Command-line entry point that registers already-downloaded torrent data
//! with a Deluge daemon.
//!
//! Layout:
//! - `cli.rs`: argument parsing, logging setup, and dispatch
//! - `config.rs`: validation of parsed arguments into import settings
//! - `commands/`: the import command wiring adapters into the pipeline
//! - `error.rs`: error classification and exit codes
//! - `output.rs`: outcome renderers
//! - `main.rs`: thin entrypoint delegating to `run()`

pub(crate) mod cli;
pub(crate) mod commands;
pub(crate) mod config;
pub(crate) mod error;
pub(crate) mod output;

pub use cli::run;
