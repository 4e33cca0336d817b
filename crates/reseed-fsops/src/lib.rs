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
#![allow(clippy::module_name_repetitions)]

//! Local helper-program adapters: the torrent descriptor reader and the
//! filesystem index lookup.
//!
//! Layout: `command.rs` (helper process invocation), `descriptor.rs`
//! (`torrent-info` JSON reader), `locate.rs` (`locate` index lookup and
//! pattern escaping), `error.rs`.

pub mod command;
pub mod descriptor;
pub mod error;
pub mod locate;

pub use command::{HelperCommand, HelperOutput};
pub use descriptor::{DEFAULT_TORRENT_INFO_PROGRAM, TorrentInfoReader};
pub use error::{FsOpsError, FsOpsResult};
pub use locate::{DEFAULT_LOCATE_PROGRAM, LocateIndex, basename_pattern, escape_pattern};
