pub use crate::accessors::{metadata_device_id, peer_certificates};
pub use crate::adapters::memory::OwnedCall;
pub use crate::context::{CallContext, ProtoCall, DEVICE_ID_KEY, REQUEST_ID_KEY};
pub use crate::device_id::{DeviceIdPolicy, DeviceIdViolation, MAX_DEVICE_ID_LEN};
pub use crate::errors::{InterceptError, Rejection};
pub use crate::fields::{DeviceIdField, DeviceIdRegistry};
pub use crate::stages::device_authn::{DenialDetail, DeviceAuthnStage};
pub use crate::stages::device_id_guard::DeviceIdGuardStage;
pub use crate::stages::{ChainBuilder, InterceptorChain, Stage, StageOutcome};

#[cfg(feature = "with-tonic")]
pub use crate::adapters::tonic::{call_context, rejection_to_status, serve_unary, TonicCall};
