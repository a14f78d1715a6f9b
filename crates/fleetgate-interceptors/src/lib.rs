//! Admission interceptors for device-facing RPCs.
//!
//! A call passes through an [`InterceptorChain`] of [`Stage`]s before it
//! reaches its handler. The fleet deployment installs two stages: a cheap
//! syntactic check of the device id carried in the request payload, then the
//! authentication stage that ties the `device_id` metadata to the peer's
//! certificate chain through a [`fleetgate_auth::authn::DeviceAuthenticator`].

pub mod accessors;
pub mod adapters;
pub mod context;
pub mod device_id;
pub mod errors;
pub mod fields;
pub mod prelude;
pub mod stages;

pub use stages::{ChainBuilder, InterceptorChain, Stage, StageOutcome};
