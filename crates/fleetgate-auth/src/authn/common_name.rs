use super::DeviceAuthenticator;
use crate::errors::{self, AuthError};
use crate::model::{AuthenticatedCall, DeviceAuthnInput};
use async_trait::async_trait;
use serde_json::json;

/// Accepts a call when the leaf certificate's subject CN is the claimed device id.
///
/// Suitable for fleets whose issuing CA writes the device id into the CN.
pub struct CommonNameAuthenticator;

#[async_trait]
impl DeviceAuthenticator for CommonNameAuthenticator {
    async fn authenticate(&self, input: &DeviceAuthnInput) -> Result<AuthenticatedCall, AuthError> {
        let leaf = input
            .chain
            .leaf()
            .ok_or_else(|| errors::unauthenticated("no leaf certificate"))?;
        let common_name = leaf
            .subject_common_name()
            .map_err(|err| errors::unauthenticated(&err.to_string()))?
            .ok_or_else(|| {
                errors::unauthenticated("leaf certificate has no subject common name")
            })?;

        if common_name != input.device_id {
            return Err(errors::unauthenticated(
                "certificate subject does not match device id",
            ));
        }

        Ok(
            AuthenticatedCall::new(&input.device_id, &input.full_method)
                .with_claim("subject_cn", json!(common_name))
                .with_claim("fingerprint", json!(leaf.fingerprint_hex())),
        )
    }
}
