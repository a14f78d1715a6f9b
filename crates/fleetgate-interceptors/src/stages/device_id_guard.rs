use crate::context::{CallContext, ProtoCall};
use crate::device_id::DeviceIdPolicy;
use crate::errors::InterceptError;
use crate::fields::DeviceIdRegistry;
use crate::stages::{Stage, StageOutcome};
use async_trait::async_trait;
use serde_json::json;

/// Syntactic check of the device id carried in the request payload.
///
/// Only requests whose type is in the registry are inspected. A malformed id
/// is refused with `InvalidArgument` and the RPC's own rejection value.
pub struct DeviceIdGuardStage {
    pub registry: DeviceIdRegistry,
    pub policy: DeviceIdPolicy,
}

impl DeviceIdGuardStage {
    pub fn new(registry: DeviceIdRegistry) -> Self {
        Self {
            registry,
            policy: DeviceIdPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: DeviceIdPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn check(&self, call: &dyn ProtoCall) -> Result<(), InterceptError> {
        let Some((field, device_id)) = self.registry.lookup(call.message()) else {
            return Ok(());
        };
        self.policy.check(device_id).map_err(|violation| {
            InterceptError::invalid_argument("invalid device id")
                .dev_msg(violation.to_string())
                .meta_kv("rpc", json!(field.rpc()))
                .meta_kv("rule", json!(violation.rule()))
                .with_boxed_response(field.rejected_response())
                .with_details(field.rejection_details())
        })
    }
}

#[async_trait]
impl Stage for DeviceIdGuardStage {
    fn name(&self) -> &'static str {
        "device_id_guard"
    }

    async fn handle(
        &self,
        _cx: &CallContext,
        call: &mut dyn ProtoCall,
    ) -> Result<StageOutcome, InterceptError> {
        self.check(call)?;
        Ok(StageOutcome::Continue)
    }
}
