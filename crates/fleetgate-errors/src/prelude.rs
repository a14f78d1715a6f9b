pub use crate::{
    code::{codes, spec_of, CodeSpec, ErrorCode, REGISTRY},
    kind::{ErrorKind, RetryClass, Severity},
    model::{ErrorBuilder, ErrorObj},
    render::{AuditErrorView, PublicErrorView},
};

#[cfg(feature = "grpc")]
pub use crate::mapping_grpc::to_grpc_status;
