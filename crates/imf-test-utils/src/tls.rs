// SPDX-FileCopyrightText: 2026 iMessageForwarder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Throwaway certificates for mutual-TLS tests.
//!
//! All functions panic on failure; they are only meant for tests.

use rcgen::{
    BasicConstraints, Certificate, CertificateParams, DnType, ExtendedKeyUsagePurpose, IsCa,
    KeyPair, KeyUsagePurpose,
};

/// A self-signed CA that can issue leaf certificates.
pub struct TestCa {
    pub cert_pem: Vec<u8>,
    pub key_pem: Vec<u8>,
    cert: Certificate,
    key: KeyPair,
}

/// A PEM-encoded leaf certificate and its private key.
pub struct TestCert {
    pub cert_pem: Vec<u8>,
    pub key_pem: Vec<u8>,
}

/// Which side of the handshake a leaf certificate is for.
#[derive(Debug, Clone, Copy)]
pub enum CertUsage {
    Server,
    Client,
}

/// Generate a self-signed CA certificate.
pub fn generate_test_ca(common_name: &str) -> TestCa {
    let mut params = CertificateParams::new(vec![common_name.to_string()])
        .expect("CA params should be valid");
    params
        .distinguished_name
        .push(DnType::CommonName, common_name);
    params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
    params.key_usages = vec![
        KeyUsagePurpose::KeyCertSign,
        KeyUsagePurpose::CrlSign,
        KeyUsagePurpose::DigitalSignature,
    ];

    let key = KeyPair::generate().expect("key generation should succeed");
    let cert = params
        .self_signed(&key)
        .expect("self-signing should succeed");

    TestCa {
        cert_pem: cert.pem().into_bytes(),
        key_pem: key.serialize_pem().into_bytes(),
        cert,
        key,
    }
}

/// Generate a leaf certificate for `name` signed by `ca`.
pub fn generate_signed_cert(ca: &TestCa, name: &str, usage: CertUsage) -> TestCert {
    let mut params =
        CertificateParams::new(vec![name.to_string()]).expect("leaf params should be valid");
    params.distinguished_name.push(DnType::CommonName, name);
    params.is_ca = IsCa::NoCa;
    params.extended_key_usages = vec![match usage {
        CertUsage::Server => ExtendedKeyUsagePurpose::ServerAuth,
        CertUsage::Client => ExtendedKeyUsagePurpose::ClientAuth,
    }];

    let key = KeyPair::generate().expect("leaf key generation should succeed");
    let cert = params
        .signed_by(&key, &ca.cert, &ca.key)
        .expect("leaf signing should succeed");

    TestCert {
        cert_pem: cert.pem().into_bytes(),
        key_pem: key.serialize_pem().into_bytes(),
    }
}
