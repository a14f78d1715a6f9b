use crate::errors::AuthError;
use crate::model::{AuthenticatedCall, DeviceAuthnInput};
use async_trait::async_trait;

#[cfg(feature = "authn-common-name")]
pub mod common_name;
#[cfg(feature = "authn-pinned")]
pub mod pinned;

/// The registry that renders the final accept/deny decision for a device.
///
/// Implementations may do network or storage I/O. The gate drops the returned
/// future when the call is cancelled or its deadline passes, so implementations
/// must not rely on running to completion.
#[async_trait]
pub trait DeviceAuthenticator: Send + Sync {
    async fn authenticate(&self, input: &DeviceAuthnInput) -> Result<AuthenticatedCall, AuthError>;
}

#[async_trait]
impl<T: DeviceAuthenticator + ?Sized> DeviceAuthenticator for std::sync::Arc<T> {
    async fn authenticate(&self, input: &DeviceAuthnInput) -> Result<AuthenticatedCall, AuthError> {
        (**self).authenticate(input).await
    }
}
