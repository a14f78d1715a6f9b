//! Error codes and the shared error object for the admission gate.
//!
//! Every rejection the gate produces is an [`model::ErrorObj`] built from a
//! registered [`code::ErrorCode`]; the registry fixes the gRPC/HTTP status,
//! retry class and severity so call sites only choose the code and messages.

pub mod code;
pub mod kind;
#[cfg(feature = "grpc")]
pub mod mapping_grpc;
pub mod model;
pub mod prelude;
pub mod render;
