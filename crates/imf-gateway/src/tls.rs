// SPDX-FileCopyrightText: 2026 iMessageForwarder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mutual-TLS server configuration for the authenticated listener.
//!
//! Every client must present a certificate that chains to the configured
//! trust anchor. Without an explicit client CA the server certificate is
//! pinned: a client presenting that exact certificate is accepted, and so is
//! any certificate it signed when it is itself a CA.

use std::path::Path;
use std::sync::Arc;

use imf_config::model::TlsConfig;
use imf_core::ImfError;
use rustls::client::danger::HandshakeSignatureValid;
use rustls::crypto::CryptoProvider;
use rustls::pki_types::pem::PemObject;
use rustls::pki_types::{CertificateDer, PrivateKeyDer, UnixTime};
use rustls::server::danger::{ClientCertVerified, ClientCertVerifier};
use rustls::server::WebPkiClientVerifier;
use rustls::{DigitallySignedStruct, DistinguishedName, RootCertStore, ServerConfig, SignatureScheme};
use tokio_rustls::TlsAcceptor;
use tracing::warn;

/// Build a rustls server config requiring client certificates.
///
/// `cert_pem` may hold a chain; `trust_pem` holds one or more CA certificates.
pub fn build_server_config(
    cert_pem: &[u8],
    key_pem: &[u8],
    trust_pem: &[u8],
) -> Result<Arc<ServerConfig>, ImfError> {
    let provider = crypto_provider();
    let trust = parse_certificates(trust_pem)?;
    if trust.is_empty() {
        return Err(ImfError::Tls("no trust anchor certificates found".into()));
    }
    let verifier = webpki_verifier(trust, &provider)?;
    finish_server_config(provider, verifier, cert_pem, key_pem)
}

/// Build a server config that accepts the server's own certificate as a
/// client certificate, for deployments where one self-signed pair is shared
/// by both ends.
pub fn build_pinned_server_config(
    cert_pem: &[u8],
    key_pem: &[u8],
) -> Result<Arc<ServerConfig>, ImfError> {
    let provider = crypto_provider();
    let chain = parse_certificates(cert_pem)?;
    let Some(leaf) = chain.first().cloned() else {
        return Err(ImfError::Tls("no server certificates found".into()));
    };
    let inner = webpki_verifier(vec![leaf.clone()], &provider)?;
    let verifier = Arc::new(PinnedClientVerifier {
        pinned: leaf,
        inner,
    });
    finish_server_config(provider, verifier, cert_pem, key_pem)
}

fn webpki_verifier(
    trust: Vec<CertificateDer<'static>>,
    provider: &Arc<CryptoProvider>,
) -> Result<Arc<dyn ClientCertVerifier>, ImfError> {
    let mut roots = RootCertStore::empty();
    for cert in trust {
        roots
            .add(cert)
            .map_err(|e| ImfError::Tls(format!("failed to add trust anchor: {e}")))?;
    }
    WebPkiClientVerifier::builder_with_provider(Arc::new(roots), provider.clone())
        .build()
        .map_err(|e| ImfError::Tls(format!("client verifier error: {e}")))
}

fn finish_server_config(
    provider: Arc<CryptoProvider>,
    verifier: Arc<dyn ClientCertVerifier>,
    cert_pem: &[u8],
    key_pem: &[u8],
) -> Result<Arc<ServerConfig>, ImfError> {
    let chain = parse_certificates(cert_pem)?;
    if chain.is_empty() {
        return Err(ImfError::Tls("no server certificates found".into()));
    }
    let key = PrivateKeyDer::from_pem_slice(key_pem)
        .map_err(|e| ImfError::Tls(format!("failed to parse private key: {e}")))?;

    let config = ServerConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .map_err(|e| ImfError::Tls(format!("protocol versions: {e}")))?
        .with_client_cert_verifier(verifier)
        .with_single_cert(chain, key)
        .map_err(|e| ImfError::Tls(format!("server config error: {e}")))?;

    Ok(Arc::new(config))
}

/// Accepts one exact certificate, and otherwise defers to path validation.
///
/// webpki refuses a CA certificate as an end entity, so a self-signed CA
/// pair presented by the client would never validate against itself.
#[derive(Debug)]
struct PinnedClientVerifier {
    pinned: CertificateDer<'static>,
    inner: Arc<dyn ClientCertVerifier>,
}

impl ClientCertVerifier for PinnedClientVerifier {
    fn client_auth_mandatory(&self) -> bool {
        true
    }

    fn root_hint_subjects(&self) -> &[DistinguishedName] {
        self.inner.root_hint_subjects()
    }

    fn verify_client_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        now: UnixTime,
    ) -> Result<ClientCertVerified, rustls::Error> {
        if end_entity.as_ref() == self.pinned.as_ref() {
            return Ok(ClientCertVerified::assertion());
        }
        self.inner.verify_client_cert(end_entity, intermediates, now)
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        self.inner.verify_tls12_signature(message, cert, dss)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        self.inner.verify_tls13_signature(message, cert, dss)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.inner.supported_verify_schemes()
    }
}

/// Load TLS material from the configured files and build an acceptor.
pub fn load_acceptor(config: &TlsConfig) -> Result<TlsAcceptor, ImfError> {
    let cert_pem = read(&config.cert_path)?;
    let key_pem = read(&config.key_path)?;
    let server_config = match &config.client_ca_path {
        Some(path) => build_server_config(&cert_pem, &key_pem, &read(path)?)?,
        None => {
            warn!(
                cert_path = %config.cert_path,
                "tls.client_ca_path is not set, pinning the server certificate for client authentication"
            );
            build_pinned_server_config(&cert_pem, &key_pem)?
        }
    };
    Ok(TlsAcceptor::from(server_config))
}

/// The ring-backed provider used for every TLS config in the relay.
pub fn crypto_provider() -> Arc<CryptoProvider> {
    Arc::new(rustls::crypto::ring::default_provider())
}

fn read(path: impl AsRef<Path>) -> Result<Vec<u8>, ImfError> {
    let path = path.as_ref();
    std::fs::read(path).map_err(|e| ImfError::Tls(format!("failed to read {}: {e}", path.display())))
}

fn parse_certificates(pem: &[u8]) -> Result<Vec<CertificateDer<'static>>, ImfError> {
    CertificateDer::pem_slice_iter(pem)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| ImfError::Tls(format!("failed to parse certificates: {e}")))
}
