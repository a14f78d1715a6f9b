use super::DeviceAuthenticator;
use crate::errors::{self, AuthError};
use crate::model::{AuthenticatedCall, DeviceAuthnInput};
use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::json;
use std::collections::{HashMap, HashSet};
use subtle::ConstantTimeEq;

#[derive(Clone, Debug)]
pub struct DeviceRecord {
    pub fingerprint: [u8; 32],
    /// `None` allows every method.
    pub allowed_methods: Option<HashSet<String>>,
}

/// In-memory registry pinning each device id to its leaf certificate.
#[derive(Default)]
pub struct PinnedCertificateRegistry {
    devices: RwLock<HashMap<String, DeviceRecord>>,
}

impl PinnedCertificateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pin(&self, device_id: impl Into<String>, fingerprint: [u8; 32]) {
        self.devices.write().insert(
            device_id.into(),
            DeviceRecord {
                fingerprint,
                allowed_methods: None,
            },
        );
    }

    pub fn pin_with_methods<I, S>(&self, device_id: impl Into<String>, fingerprint: [u8; 32], methods: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.devices.write().insert(
            device_id.into(),
            DeviceRecord {
                fingerprint,
                allowed_methods: Some(methods.into_iter().map(Into::into).collect()),
            },
        );
    }

    pub fn revoke(&self, device_id: &str) -> bool {
        self.devices.write().remove(device_id).is_some()
    }

    pub fn len(&self) -> usize {
        self.devices.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.read().is_empty()
    }
}

#[async_trait]
impl DeviceAuthenticator for PinnedCertificateRegistry {
    async fn authenticate(&self, input: &DeviceAuthnInput) -> Result<AuthenticatedCall, AuthError> {
        let record = self
            .devices
            .read()
            .get(&input.device_id)
            .cloned()
            .ok_or_else(|| errors::unauthenticated("device is not registered"))?;

        let leaf = input
            .chain
            .leaf()
            .ok_or_else(|| errors::unauthenticated("no leaf certificate"))?;
        let presented = leaf.fingerprint_sha256();
        if presented[..].ct_eq(&record.fingerprint[..]).unwrap_u8() != 1 {
            return Err(errors::unauthenticated(
                "certificate does not match registered device",
            ));
        }

        if let Some(allowed) = record.allowed_methods.as_ref() {
            if !allowed.contains(&input.full_method) {
                return Err(errors::forbidden("method not allowed for device"));
            }
        }

        Ok(AuthenticatedCall::new(&input.device_id, &input.full_method)
            .with_claim("fingerprint", json!(hex::encode(presented))))
    }
}

/// Parses a hex SHA-256 fingerprint, tolerating `:` separators.
pub fn parse_fingerprint(value: &str) -> Option<[u8; 32]> {
    let compact: String = value.chars().filter(|c| *c != ':').collect();
    let bytes = hex::decode(compact).ok()?;
    bytes.try_into().ok()
}
