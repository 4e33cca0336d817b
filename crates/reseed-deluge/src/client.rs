//! Typed daemon calls used by the importer.

use std::fmt;
use std::path::Path;

use anyhow::Result as AnyResult;
use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose};
use reseed_core::{InfoHash, TorrentDaemon, TorrentStatus};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio_rustls::client::TlsStream;
use tracing::{debug, info, instrument};

use crate::error::{DelugeError, DelugeResult};
use crate::rencode::Value;
use crate::rpc::RpcSession;
use crate::tls;

/// Client version announced at login; Deluge 2 refuses logins without one.
pub const CLIENT_VERSION: &str = "2.0.4";

/// Status fields requested for every torrent lookup.
const STATUS_KEYS: [&str; 2] = ["name", "save_path"];

/// Where and as whom to connect.
#[derive(Clone, PartialEq, Eq)]
pub struct DaemonEndpoint {
    /// Daemon host name or address.
    pub host: String,
    /// Daemon RPC port.
    pub port: u16,
    /// Account name from the daemon's auth file.
    pub username: String,
    /// Account password.
    pub password: String,
}

impl fmt::Debug for DaemonEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DaemonEndpoint")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// An authenticated daemon connection.
#[derive(Debug)]
pub struct DelugeClient<S> {
    session: RpcSession<S>,
}

impl DelugeClient<TlsStream<TcpStream>> {
    /// Connect over TLS and log in.
    ///
    /// # Errors
    ///
    /// Returns a [`DelugeError`] when the connection or the login fails.
    #[instrument(name = "deluge.connect", skip_all, fields(host = %endpoint.host, port = endpoint.port))]
    pub async fn connect(endpoint: &DaemonEndpoint) -> DelugeResult<Self> {
        let stream = tls::connect(&endpoint.host, endpoint.port).await?;
        let mut client = Self::new(stream);
        let level = client.login(&endpoint.username, &endpoint.password).await?;
        info!(username = %endpoint.username, auth_level = level, "connected to daemon");
        Ok(client)
    }
}

impl<S> DelugeClient<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Wrap an established stream; call [`Self::login`] before anything else.
    pub const fn new(stream: S) -> Self {
        Self {
            session: RpcSession::new(stream),
        }
    }

    /// Authenticate and return the granted auth level.
    ///
    /// # Errors
    ///
    /// Returns [`DelugeError::Remote`] for bad credentials and
    /// [`DelugeError::LoginRejected`] when no access is granted.
    pub async fn login(&mut self, username: &str, password: &str) -> DelugeResult<i64> {
        let result = self
            .session
            .call(
                "daemon.login",
                vec![Value::from(username), Value::from(password)],
                vec![(Value::from("client_version"), Value::from(CLIENT_VERSION))],
            )
            .await?;
        match result.as_i64() {
            Some(level) if level > 0 => Ok(level),
            _ => Err(DelugeError::LoginRejected {
                username: username.to_string(),
            }),
        }
    }

    /// Name and save path of a torrent, or `None` when the daemon does not
    /// track it.
    ///
    /// # Errors
    ///
    /// Returns a [`DelugeError`] when the call fails or the reply is not a
    /// dictionary.
    pub async fn torrent_status(&mut self, torrent_id: &str) -> DelugeResult<Option<TorrentStatus>> {
        let filter = Value::dict([("id", Value::from(torrent_id))]);
        let keys = Value::List(STATUS_KEYS.iter().copied().map(Value::from).collect());
        let result = self
            .session
            .call("core.get_torrents_status", vec![filter, keys], Vec::new())
            .await?;
        if !matches!(result, Value::Dict(_)) {
            return Err(DelugeError::UnexpectedResponse {
                method: "core.get_torrents_status",
                reason: "reply is not a dictionary",
            });
        }

        let status = match result.get(torrent_id) {
            Some(entry @ Value::Dict(fields)) if !fields.is_empty() => Some(TorrentStatus {
                name: entry.get("name").and_then(Value::as_str).map(str::to_string),
                save_path: entry
                    .get("save_path")
                    .and_then(Value::as_str)
                    .map(str::to_string),
            }),
            _ => None,
        };
        debug!(torrent_id, ?status, "torrent status");
        Ok(status)
    }

    /// Whether a torrent with `info_hash` is already registered.
    ///
    /// # Errors
    ///
    /// Propagates failures from [`Self::torrent_status`].
    pub async fn is_already_added(&mut self, info_hash: &InfoHash) -> DelugeResult<bool> {
        Ok(self.torrent_status(info_hash.as_str()).await?.is_some())
    }

    /// Upload a torrent file, paused, with its data at `download_location`.
    /// Returns the daemon's torrent id when one was assigned.
    ///
    /// # Errors
    ///
    /// Returns [`DelugeError::TorrentFile`] when the file cannot be read, or
    /// a call error from the daemon.
    pub async fn add_torrent_file(
        &mut self,
        torrent_file: &Path,
        download_location: &str,
    ) -> DelugeResult<Option<String>> {
        let bytes = tokio::fs::read(torrent_file)
            .await
            .map_err(|source| DelugeError::TorrentFile {
                path: torrent_file.to_path_buf(),
                source,
            })?;
        let encoded = general_purpose::STANDARD.encode(&bytes);
        let options = Value::dict([
            ("add_paused", Value::Bool(true)),
            ("download_location", Value::from(download_location)),
        ]);

        let result = self
            .session
            .call(
                "core.add_torrent_file",
                vec![
                    Value::from(torrent_file.to_string_lossy().into_owned()),
                    Value::from(encoded),
                    options,
                ],
                Vec::new(),
            )
            .await?;
        match result {
            Value::None => Ok(None),
            other => other
                .as_str()
                .map(|id| Some(id.to_string()))
                .ok_or(DelugeError::UnexpectedResponse {
                    method: "core.add_torrent_file",
                    reason: "torrent id is not text",
                }),
        }
    }

    /// Rename a torrent's top-level folder. Both names are sent with a
    /// trailing `/`.
    ///
    /// # Errors
    ///
    /// Returns a [`DelugeError`] when the daemon rejects the rename.
    pub async fn rename_folder(
        &mut self,
        torrent_id: &str,
        rename_from: &str,
        rename_to: &str,
    ) -> DelugeResult<()> {
        self.session
            .call(
                "core.rename_folder",
                vec![
                    Value::from(torrent_id),
                    Value::from(format!("{rename_from}/")),
                    Value::from(format!("{rename_to}/")),
                ],
                Vec::new(),
            )
            .await?;
        Ok(())
    }
}

#[async_trait]
impl<S> TorrentDaemon for DelugeClient<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn is_already_added(&mut self, info_hash: &InfoHash) -> AnyResult<bool> {
        Ok(Self::is_already_added(self, info_hash).await?)
    }

    async fn add_torrent(
        &mut self,
        torrent_file: &Path,
        download_location: &str,
    ) -> AnyResult<Option<String>> {
        Ok(self.add_torrent_file(torrent_file, download_location).await?)
    }

    async fn torrent_status(&mut self, torrent_id: &str) -> AnyResult<Option<TorrentStatus>> {
        Ok(Self::torrent_status(self, torrent_id).await?)
    }

    async fn rename_folder(
        &mut self,
        torrent_id: &str,
        rename_from: &str,
        rename_to: &str,
    ) -> AnyResult<()> {
        Ok(Self::rename_folder(self, torrent_id, rename_from, rename_to).await?)
    }
}
