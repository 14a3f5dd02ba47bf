use crate::error::FetchError;
use async_trait::async_trait;
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{ClientConfig, DigitallySignedStruct, SignatureScheme};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_rustls::TlsConnector;

/// 服务器在握手中出示的证书链（叶证书 + 中间证书，DER 编码）
#[derive(Debug, Clone)]
pub struct FetchedCertificate {
    leaf: CertificateDer<'static>,
    intermediates: Vec<CertificateDer<'static>>,
}

impl FetchedCertificate {
    pub fn new(leaf: CertificateDer<'static>, intermediates: Vec<CertificateDer<'static>>) -> Self {
        Self {
            leaf,
            intermediates,
        }
    }

    /// 叶证书（服务器出示链中的第一张）
    pub fn leaf(&self) -> &CertificateDer<'static> {
        &self.leaf
    }

    /// 中间证书（链校验时使用，可为空）
    pub fn intermediates(&self) -> &[CertificateDer<'static>] {
        &self.intermediates
    }
}

/// Retrieves the certificate a server presents for a domain. Trait seam so
/// the orchestrator can be driven by a mock in tests.
#[async_trait]
pub trait CertificateFetcher: Send + Sync {
    /// Single attempt, no retries; retry policy, if any, belongs to the
    /// caller.
    async fn fetch(&self, domain: &str, port: u16) -> Result<FetchedCertificate, FetchError>;
}

/// 基于 tokio + rustls 的生产抓取器
pub struct TlsFetcher {
    connect_timeout: Duration,
}

impl TlsFetcher {
    pub fn new(connect_timeout_secs: u64) -> Self {
        Self {
            connect_timeout: Duration::from_secs(connect_timeout_secs),
        }
    }
}

#[async_trait]
impl CertificateFetcher for TlsFetcher {
    async fn fetch(&self, domain: &str, port: u16) -> Result<FetchedCertificate, FetchError> {
        // Handshake with verification disabled: the fetcher's job is to
        // retrieve the certificate, not to judge its trust. Expired or
        // self-signed certificates must still come back so the classifier
        // can report them instead of losing them as connection errors.
        let config = ClientConfig::builder()
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(AcceptAnyServerCert))
            .with_no_client_auth();
        let connector = TlsConnector::from(Arc::new(config));

        let server_name =
            ServerName::try_from(domain.to_string()).map_err(|e| FetchError::Unreachable {
                reason: format!("invalid domain name: {e}"),
            })?;

        let addr = format!("{domain}:{port}");
        let tcp = timeout(self.connect_timeout, TcpStream::connect(&addr))
            .await
            .map_err(|_| FetchError::Timeout {
                domain: domain.to_string(),
                port,
                timeout_secs: self.connect_timeout.as_secs(),
            })?
            .map_err(|e| FetchError::Unreachable {
                reason: format!("TCP connection failed: {e}"),
            })?;

        // SNI = domain; the handshake shares the same time budget
        let tls_stream = timeout(self.connect_timeout, connector.connect(server_name, tcp))
            .await
            .map_err(|_| FetchError::Timeout {
                domain: domain.to_string(),
                port,
                timeout_secs: self.connect_timeout.as_secs(),
            })?
            .map_err(|e| FetchError::Unreachable {
                reason: format!("TLS handshake failed: {e}"),
            })?;

        let (_io, conn) = tls_stream.into_inner();
        let certs = conn
            .peer_certificates()
            .ok_or_else(|| FetchError::Unreachable {
                reason: "no peer certificates presented".to_string(),
            })?;

        let mut iter = certs.iter();
        let leaf = iter
            .next()
            .map(|c| c.clone().into_owned())
            .ok_or_else(|| FetchError::Unreachable {
                reason: "empty certificate chain".to_string(),
            })?;
        let intermediates = iter.map(|c| c.clone().into_owned()).collect();

        Ok(FetchedCertificate::new(leaf, intermediates))
    }
}

/// Accepts every server certificate during the handshake. Trust is judged
/// afterwards by the classifier's chain-validation pass.
#[derive(Debug)]
struct AcceptAnyServerCert;

impl ServerCertVerifier for AcceptAnyServerCert {
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
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        vec![
            SignatureScheme::ECDSA_NISTP256_SHA256,
            SignatureScheme::ECDSA_NISTP384_SHA384,
            SignatureScheme::ECDSA_NISTP521_SHA512,
            SignatureScheme::ED25519,
            SignatureScheme::RSA_PSS_SHA256,
            SignatureScheme::RSA_PSS_SHA384,
            SignatureScheme::RSA_PSS_SHA512,
            SignatureScheme::RSA_PKCS1_SHA256,
            SignatureScheme::RSA_PKCS1_SHA384,
            SignatureScheme::RSA_PKCS1_SHA512,
        ]
    }
}
