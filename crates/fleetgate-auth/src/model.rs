use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::net::IpAddr;
use std::sync::Arc;
use thiserror::Error;
use x509_parser::extensions::ParsedExtension;
use x509_parser::prelude::{FromDer, GeneralName, X509Certificate};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CertificateError {
    #[error("malformed certificate: {0}")]
    Malformed(String),
}

/// A DER-encoded certificate as presented during the TLS handshake.
///
/// Nothing here verifies the certificate; the transport already did that
/// before the call reached the gate.
#[derive(Clone, PartialEq, Eq)]
pub struct Certificate {
    der: Arc<[u8]>,
}

impl Certificate {
    pub fn from_der(der: impl Into<Vec<u8>>) -> Self {
        let der: Vec<u8> = der.into();
        Self {
            der: Arc::from(der),
        }
    }

    pub fn der(&self) -> &[u8] {
        &self.der
    }

    pub fn fingerprint_sha256(&self) -> [u8; 32] {
        Sha256::digest(&self.der).into()
    }

    pub fn fingerprint_hex(&self) -> String {
        hex::encode(self.fingerprint_sha256())
    }

    /// First common name of the subject, `None` when the subject carries no CN.
    pub fn subject_common_name(&self) -> Result<Option<String>, CertificateError> {
        let cert = self.parse()?;
        let common_name = cert
            .subject()
            .iter_common_name()
            .find_map(|name| name.as_str().ok().map(str::to_string));
        Ok(common_name)
    }

    /// Full subject DN in RFC 4514 order, for display only.
    pub fn subject_dn(&self) -> Result<String, CertificateError> {
        Ok(self.parse()?.subject().to_string())
    }

    pub fn subject_alt_names(&self) -> Result<Vec<String>, CertificateError> {
        let cert = self.parse()?;
        let mut sans = Vec::new();
        for extension in cert.extensions() {
            let ParsedExtension::SubjectAlternativeName(subject_alt_name) =
                extension.parsed_extension()
            else {
                continue;
            };
            for name in &subject_alt_name.general_names {
                let value = match name {
                    GeneralName::DNSName(value) => Some((*value).to_string()),
                    GeneralName::URI(value) => Some((*value).to_string()),
                    GeneralName::RFC822Name(value) => Some((*value).to_string()),
                    GeneralName::IPAddress(raw) if raw.len() == 4 => {
                        Some(IpAddr::from([raw[0], raw[1], raw[2], raw[3]]).to_string())
                    }
                    GeneralName::IPAddress(raw) if raw.len() == 16 => {
                        let mut octets = [0_u8; 16];
                        octets.copy_from_slice(raw);
                        Some(IpAddr::from(octets).to_string())
                    }
                    _ => None,
                };
                if let Some(value) = value {
                    let value = value.trim();
                    if !value.is_empty() {
                        sans.push(value.to_string());
                    }
                }
            }
        }
        Ok(sans)
    }

    fn parse(&self) -> Result<X509Certificate<'_>, CertificateError> {
        let (_remaining, cert) = X509Certificate::from_der(&self.der)
            .map_err(|err| CertificateError::Malformed(err.to_string()))?;
        Ok(cert)
    }
}

impl std::fmt::Debug for Certificate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Certificate")
            .field("len", &self.der.len())
            .field("sha256", &self.fingerprint_hex())
            .finish()
    }
}

/// Certificates presented by the peer, leaf first.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PeerCertificateChain(Vec<Certificate>);

impl PeerCertificateChain {
    pub fn new(certificates: Vec<Certificate>) -> Self {
        Self(certificates)
    }

    pub fn leaf(&self) -> Option<&Certificate> {
        self.0.first()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Certificate> {
        self.0.iter()
    }
}

impl FromIterator<Certificate> for PeerCertificateChain {
    fn from_iter<I: IntoIterator<Item = Certificate>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Everything the delegate gets to decide on.
#[derive(Clone, Debug)]
pub struct DeviceAuthnInput {
    /// `/package.Service/Method`
    pub full_method: String,
    pub device_id: String,
    pub chain: PeerCertificateChain,
}

/// Call-scoped context produced by a delegate on success.
///
/// The gate does not look inside; it hands this value to the handler as-is.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AuthenticatedCall {
    pub device_id: String,
    pub full_method: String,
    #[serde(default)]
    pub claims: Map<String, Value>,
}

impl AuthenticatedCall {
    pub fn new(device_id: impl Into<String>, full_method: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            full_method: full_method.into(),
            claims: Map::new(),
        }
    }

    pub fn with_claim(mut self, key: impl Into<String>, value: Value) -> Self {
        self.claims.insert(key.into(), value);
        self
    }

    pub fn claim(&self, key: &str) -> Option<&Value> {
        self.claims.get(key)
    }
}
