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

//! Minimal Deluge 2 daemon client.
//!
//! Speaks the daemon's native RPC protocol: rencode payloads, zlib
//! compressed, framed with a version byte and a big-endian length, over TLS.
//! Only the handful of calls the importer needs are exposed.

pub mod client;
pub mod error;
pub mod rencode;
pub mod rpc;
pub mod tls;
pub mod transport;

pub use client::{DaemonEndpoint, DelugeClient};
pub use error::{DelugeError, DelugeResult};
pub use rencode::{DecodeError, Value};
pub use rpc::RpcSession;
