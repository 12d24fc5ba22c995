use std::sync::Arc;

use crate::{ConnectorFn, DynStream, FetchError};

/// Plain TCP connector for non-TLS endpoints (local fixtures, proxies).
pub fn tcp_connector() -> Arc<ConnectorFn> {
    Arc::new(|host: &str, port: u16| {
        let host = host.to_string();
        Box::pin(async move {
            let stream = tokio::net::TcpStream::connect((host.as_str(), port))
                .await
                .map_err(|_| FetchError::Connection)?;
            Ok(Box::pin(stream) as DynStream)
        })
    })
}

/// rustls connector that skips certificate verification. For development
/// only.
#[cfg(feature = "tls_client")]
pub fn rustls_connector_insecure() -> Arc<ConnectorFn> {
    use rustls::pki_types::ServerName;
    use rustls::ClientConfig;
    use tokio_rustls::TlsConnector;

    let mut cfg = ClientConfig::builder()
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(NoVerifier))
        .with_no_client_auth();
    cfg.alpn_protocols = vec![b"http/1.1".to_vec()];
    let tls = TlsConnector::from(Arc::new(cfg));
    Arc::new(move |host: &str, port: u16| {
        let host_owned = host.to_string();
        let tls = tls.clone();
        Box::pin(async move {
            let tcp = tokio::net::TcpStream::connect((host_owned.as_str(), port))
                .await
                .map_err(|_| FetchError::Connection)?;
            let server_name = ServerName::try_from(host_owned.clone())
                .map_err(|_| FetchError::InvalidMessage)?;
            let stream = tls
                .connect(server_name, tcp)
                .await
                .map_err(|_| FetchError::Connection)?;
            Ok(Box::pin(stream) as DynStream)
        })
    })
}

// Development-only certificate verifier (accepts any cert). Do not use in
// production.
#[cfg(feature = "tls_client")]
#[derive(Debug)]
struct NoVerifier;

#[cfg(feature = "tls_client")]
impl rustls::client::danger::ServerCertVerifier for NoVerifier {
    fn verify_server_cert(
        &self,
        _end_entity: &rustls::pki_types::CertificateDer<'_>,
        _intermediates: &[rustls::pki_types::CertificateDer<'_>],
        _server_name: &rustls::pki_types::ServerName<'_>,
        _ocsp_response: &[u8],
        _now: rustls::pki_types::UnixTime,
    ) -> Result<rustls::client::danger::ServerCertVerified, rustls::Error> {
        Ok(rustls::client::danger::ServerCertVerified::assertion())
    }
    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &rustls::pki_types::CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }
    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &rustls::pki_types::CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }
    fn supported_verify_schemes(&self) -> Vec<rustls::SignatureScheme> {
        use rustls::SignatureScheme::*;
        vec![
            ECDSA_NISTP256_SHA256,
            ECDSA_NISTP384_SHA384,
            ED25519,
            RSA_PKCS1_SHA256,
            RSA_PKCS1_SHA384,
            RSA_PKCS1_SHA512,
            RSA_PSS_SHA256,
            RSA_PSS_SHA384,
            RSA_PSS_SHA512,
        ]
    }
}
