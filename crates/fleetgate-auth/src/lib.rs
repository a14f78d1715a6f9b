//! Authorization delegate SPI for the admission gate.
//!
//! The gate never decides on its own whether a device is who it claims to be;
//! it hands the claimed id and the peer's certificate chain to a
//! [`authn::DeviceAuthenticator`] and forwards whatever that returns.

pub mod authn;
pub mod errors;
pub mod model;
pub mod prelude;
