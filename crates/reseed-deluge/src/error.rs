//! # Design
//!
//! - Keep error messages constant; carry hosts, methods, and lengths in fields.
//! - Remote exceptions are surfaced with the daemon's own type and message.

use std::io;
use std::path::PathBuf;

use thiserror::Error;
use tokio_rustls::rustls;

use crate::rencode::DecodeError;

/// Result type for daemon operations.
pub type DelugeResult<T> = Result<T, DelugeError>;

/// Errors raised while talking to a Deluge daemon.
#[derive(Debug, Error)]
pub enum DelugeError {
    /// The TCP connection could not be established.
    #[error("failed to connect to daemon")]
    Connect {
        /// `host:port` being dialled.
        address: String,
        /// Underlying IO error.
        source: io::Error,
    },
    /// The daemon host is not usable as a TLS server name.
    #[error("daemon host is not a valid tls server name")]
    InvalidServerName {
        /// Host as configured.
        host: String,
    },
    /// The TLS client could not be configured.
    #[error("failed to configure tls")]
    TlsConfig {
        /// Underlying rustls error.
        source: rustls::Error,
    },
    /// The TLS handshake failed.
    #[error("tls handshake with daemon failed")]
    Handshake {
        /// Underlying IO error.
        source: io::Error,
    },
    /// Reading or writing the established connection failed.
    #[error("daemon connection io failed")]
    Io {
        /// Step that failed.
        operation: &'static str,
        /// Underlying IO error.
        source: io::Error,
    },
    /// A frame carried an unknown protocol version.
    #[error("daemon speaks an unsupported protocol version")]
    UnsupportedProtocol {
        /// Version byte received.
        version: u8,
    },
    /// A frame declared a body larger than allowed.
    #[error("daemon message exceeds the size limit")]
    FrameTooLarge {
        /// Declared or inflated length.
        length: usize,
    },
    /// A frame body could not be compressed or inflated.
    #[error("daemon message compression failed")]
    Compression {
        /// Underlying zlib error.
        source: io::Error,
    },
    /// A frame body was not valid rencode.
    #[error("daemon message could not be decoded")]
    Decode {
        /// Underlying decode error.
        source: DecodeError,
    },
    /// A message did not have the RPC envelope shape.
    #[error("daemon sent an unexpected message")]
    UnexpectedMessage {
        /// What was wrong with it.
        reason: &'static str,
    },
    /// A response answered a different request.
    #[error("daemon response does not match the request")]
    RequestIdMismatch {
        /// Request id that was sent.
        expected: i64,
        /// Request id in the response.
        actual: i64,
    },
    /// The daemon raised an exception for a call.
    #[error("daemon call {method} failed: {exception}: {message}")]
    Remote {
        /// RPC method invoked.
        method: String,
        /// Exception class name.
        exception: String,
        /// Exception arguments, joined.
        message: String,
    },
    /// A call returned a value of the wrong shape.
    #[error("daemon call returned an unexpected value")]
    UnexpectedResponse {
        /// RPC method invoked.
        method: &'static str,
        /// What was wrong with it.
        reason: &'static str,
    },
    /// Login succeeded at the RPC level but granted no access.
    #[error("daemon rejected the login")]
    LoginRejected {
        /// Account used.
        username: String,
    },
    /// The torrent file could not be read for upload.
    #[error("failed to read torrent file")]
    TorrentFile {
        /// File being uploaded.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
}
