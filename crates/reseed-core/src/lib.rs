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

//! Domain model and import pipeline for registering on-disk torrent data
//! with a download daemon.
//!
//! Layout: `model.rs` (descriptor, candidates, resolved locations),
//! `resolve.rs` (search-name selection and location computation),
//! `service.rs` (adapter traits and the `Importer` pipeline), `error.rs`.

pub mod error;
pub mod model;
pub mod resolve;
pub mod service;

pub use error::{ImportError, ImportResult};
pub use model::{
    FileEntry, FolderRename, ImportOutcome, InfoHash, InvalidInfoHash, LocationCandidate,
    ResolvedLocation, TorrentDescriptor, TorrentStatus,
};
pub use resolve::{RESERVED_NAME_PREFIX, resolve_location, search_names};
pub use service::{DescriptorReader, FileLocator, Importer, TorrentDaemon};
