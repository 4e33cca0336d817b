//! TLS connection setup.
//!
//! Deluge daemons generate a self-signed certificate on first start, so the
//! client accepts any certificate while still checking handshake signatures.

use std::sync::Arc;

use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tokio_rustls::client::TlsStream;
use tokio_rustls::rustls::client::danger::{
    HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier,
};
use tokio_rustls::rustls::crypto::{self, CryptoProvider};
use tokio_rustls::rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use tokio_rustls::rustls::{self, ClientConfig, DigitallySignedStruct, SignatureScheme};
use tracing::debug;

use crate::error::{DelugeError, DelugeResult};

/// Certificate verifier that trusts whatever the daemon presents.
#[derive(Debug)]
struct AcceptAnyCertificate {
    provider: Arc<CryptoProvider>,
}

impl ServerCertVerifier for AcceptAnyCertificate {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        crypto::verify_tls12_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        crypto::verify_tls13_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider
            .signature_verification_algorithms
            .supported_schemes()
    }
}

fn client_config() -> DelugeResult<ClientConfig> {
    let provider = Arc::new(crypto::ring::default_provider());
    let config = ClientConfig::builder_with_provider(Arc::clone(&provider))
        .with_safe_default_protocol_versions()
        .map_err(|source| DelugeError::TlsConfig { source })?
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(AcceptAnyCertificate { provider }))
        .with_no_client_auth();
    Ok(config)
}

/// Open a TLS session to `host:port`.
///
/// # Errors
///
/// Returns a [`DelugeError`] when the host is unusable, the TCP connection
/// fails, or the handshake fails.
pub async fn connect(host: &str, port: u16) -> DelugeResult<TlsStream<TcpStream>> {
    let server_name =
        ServerName::try_from(host.to_string()).map_err(|_| DelugeError::InvalidServerName {
            host: host.to_string(),
        })?;
    let connector = TlsConnector::from(Arc::new(client_config()?));

    let address = format!("{host}:{port}");
    let tcp = TcpStream::connect(&address)
        .await
        .map_err(|source| DelugeError::Connect {
            address: address.clone(),
            source,
        })?;
    debug!(%address, "tcp connection established");

    let stream = connector
        .connect(server_name, tcp)
        .await
        .map_err(|source| DelugeError::Handshake { source })?;
    debug!(%address, "tls handshake complete");
    Ok(stream)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_config_builds() {
        client_config().expect("config");
    }

    #[tokio::test]
    async fn rejects_unusable_host() {
        let err = connect("bad host name", 58846).await.expect_err("invalid");
        assert!(matches!(err, DelugeError::InvalidServerName { .. }));
    }

    #[tokio::test]
    async fn refused_connection_is_reported() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let port = listener.local_addr().expect("addr").port();
        drop(listener);
        let err = connect("127.0.0.1", port).await.expect_err("refused");
        assert!(matches!(err, DelugeError::Connect { .. }));
    }
}
