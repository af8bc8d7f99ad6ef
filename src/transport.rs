//! Raw transport (spec §4.1): direct TCP/TLS dial, or an upstream HTTP CONNECT
//! tunnel, with deadline-bounded reads/writes. TLS certificate validation is
//! intentionally disabled — probes are adversarial and must reach whatever is
//! behind the given address regardless of its certificate.

use once_cell::sync::Lazy;
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{DigitallySignedStruct, SignatureScheme};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;

use crate::error::{Result, SmugglexError};

/// Accepts any server certificate. This is the only supported mode: the probe
/// must be able to reach arbitrary, possibly self-signed, targets.
#[derive(Debug)]
struct NoVerify;

impl ServerCertVerifier for NoVerify {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> std::result::Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        vec![
            SignatureScheme::RSA_PKCS1_SHA1,
            SignatureScheme::ECDSA_SHA1_Legacy,
            SignatureScheme::RSA_PKCS1_SHA256,
            SignatureScheme::ECDSA_NISTP256_SHA256,
            SignatureScheme::RSA_PKCS1_SHA384,
            SignatureScheme::ECDSA_NISTP384_SHA384,
            SignatureScheme::RSA_PKCS1_SHA512,
            SignatureScheme::ECDSA_NISTP521_SHA512,
            SignatureScheme::RSA_PSS_SHA256,
            SignatureScheme::RSA_PSS_SHA384,
            SignatureScheme::RSA_PSS_SHA512,
            SignatureScheme::ED25519,
        ]
    }
}

static TLS_CONFIG: Lazy<Arc<rustls::ClientConfig>> = Lazy::new(|| {
    Arc::new(
        rustls::ClientConfig::builder()
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(NoVerify))
            .with_no_client_auth(),
    )
});

/// A trait alias for a boxed, unpin, send-able duplex stream.
pub trait AsyncReadWrite: AsyncRead + AsyncWrite + Unpin + Send {}
impl<T: AsyncRead + AsyncWrite + Unpin + Send> AsyncReadWrite for T {}

async fn tls_wrap(
    stream: TcpStream,
    host: &str,
) -> Result<tokio_rustls::client::TlsStream<TcpStream>> {
    let connector = TlsConnector::from(Arc::clone(&TLS_CONFIG));
    let domain = ServerName::try_from(host.to_string())?;
    Ok(connector.connect(domain, stream).await?)
}

/// Establishes a connection to `host:port`, optionally through an upstream
/// HTTP CONNECT proxy, optionally wrapped in TLS with SNI set to `host`.
/// Every failure mode (dial, proxy handshake, TLS handshake) surfaces as a
/// `SmugglexError` that the probe engine maps to `ProbeOutcome::SocketError`.
pub async fn connect(
    host: &str,
    port: u16,
    timeout: Duration,
    tls: bool,
    proxy: Option<(&str, u16)>,
) -> Result<Box<dyn AsyncReadWrite>> {
    match proxy {
        Some((proxy_host, proxy_port)) => {
            let tcp = tokio::time::timeout(
                timeout,
                TcpStream::connect((proxy_host, proxy_port)),
            )
            .await??;
            let tcp = connect_tunnel(tcp, host, port, timeout).await?;
            if tls {
                let tls_stream = tokio::time::timeout(timeout, tls_wrap(tcp, host)).await??;
                Ok(Box::new(tls_stream))
            } else {
                Ok(Box::new(tcp))
            }
        }
        None => {
            let tcp = tokio::time::timeout(timeout, TcpStream::connect((host, port))).await??;
            if tls {
                let tls_stream = tokio::time::timeout(timeout, tls_wrap(tcp, host)).await??;
                Ok(Box::new(tls_stream))
            } else {
                Ok(Box::new(tcp))
            }
        }
    }
}

/// Sends `CONNECT host:port HTTP/1.1` to an already-dialed proxy connection
/// and drains its response. The first line must contain `"200"`; remaining
/// header lines are consumed until a bare `\r\n` or EOF.
async fn connect_tunnel(
    mut tcp: TcpStream,
    host: &str,
    port: u16,
    timeout: Duration,
) -> Result<TcpStream> {
    let target = format!("{}:{}", host, port);
    let request = format!("CONNECT {target} HTTP/1.1\r\nHost: {target}\r\n\r\n");
    tokio::time::timeout(timeout, tcp.write_all(request.as_bytes())).await??;

    let mut reader = BufReader::new(&mut tcp);
    let mut first_line = String::new();
    let n = tokio::time::timeout(timeout, reader.read_line(&mut first_line)).await??;
    if n == 0 {
        return Err(SmugglexError::Proxy(
            "proxy closed connection before CONNECT response".to_string(),
        ));
    }
    if !first_line.contains("200") {
        return Err(SmugglexError::Proxy(format!(
            "proxy CONNECT failed: {}",
            first_line.trim_end()
        )));
    }

    loop {
        let mut line = String::new();
        let n = tokio::time::timeout(timeout, reader.read_line(&mut line)).await??;
        if n == 0 || line == "\r\n" {
            break;
        }
    }

    Ok(tcp)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_verify_accepts_any_certificate() {
        let verifier = NoVerify;
        let cert = CertificateDer::from(vec![0u8; 4]);
        let server_name = ServerName::try_from("example.com").unwrap();
        let result = verifier.verify_server_cert(&cert, &[], &server_name, &[], UnixTime::now());
        assert!(result.is_ok());
    }

    #[test]
    fn no_verify_supports_common_signature_schemes() {
        let verifier = NoVerify;
        let schemes = verifier.supported_verify_schemes();
        assert!(schemes.contains(&SignatureScheme::ED25519));
        assert!(schemes.contains(&SignatureScheme::RSA_PKCS1_SHA256));
    }
}
