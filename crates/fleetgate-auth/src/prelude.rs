pub use crate::authn::DeviceAuthenticator;
pub use crate::errors::AuthError;
pub use crate::model::{
    AuthenticatedCall, Certificate, CertificateError, DeviceAuthnInput, PeerCertificateChain,
};

#[cfg(feature = "authn-common-name")]
pub use crate::authn::common_name::CommonNameAuthenticator;
#[cfg(feature = "authn-pinned")]
pub use crate::authn::pinned::{parse_fingerprint, DeviceRecord, PinnedCertificateRegistry};
