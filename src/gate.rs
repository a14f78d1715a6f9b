//! The fleet deployment of the admission chain.

use crate::config::GateConfig;
use fleetgate_api::{
    methods, ConfigRequest, ConfigResponse, EnrollRequest, EnrollResponse, HeartbeatAck,
    HeartbeatReport, RegisterRequest, RegisterResponse,
};
use fleetgate_auth::prelude::DeviceAuthenticator;
use fleetgate_interceptors::prelude::*;
use std::any::Any;
use std::future::Future;
use std::sync::Arc;

fn enroll_device_id(req: &EnrollRequest) -> &str {
    &req.device_id
}

fn config_device_id(req: &ConfigRequest) -> &str {
    &req.device_id
}

fn register_device_id(req: &RegisterRequest) -> &str {
    &req.device_id
}

fn heartbeat_device_id(req: &HeartbeatReport) -> &str {
    &req.device_id
}

/// Device-originated requests whose payload carries a device id.
pub fn fleet_device_id_registry() -> DeviceIdRegistry {
    DeviceIdRegistry::new()
        .register(methods::ENROLL, enroll_device_id, EnrollResponse::rejected)
        .register(methods::GET_CONFIG, config_device_id, ConfigResponse::rejected)
        .register(methods::REGISTER, register_device_id, RegisterResponse::rejected)
        .register(methods::HEARTBEAT, heartbeat_device_id, HeartbeatAck::rejected)
}

pub struct AdmissionGate {
    chain: InterceptorChain,
}

impl AdmissionGate {
    /// Payload format check first, then certificate-backed authentication.
    pub fn standard(config: &GateConfig, authenticator: Arc<dyn DeviceAuthenticator>) -> Self {
        let chain = InterceptorChain::builder()
            .stage(
                DeviceIdGuardStage::new(fleet_device_id_registry())
                    .with_policy(config.device_id_policy()),
            )
            .stage(
                DeviceAuthnStage::new(authenticator)
                    .with_denial_detail(config.authn.denial_detail),
            )
            .build();
        tracing::debug!(stages = ?chain.stage_names(), "admission chain assembled");
        Self { chain }
    }

    pub fn chain(&self) -> &InterceptorChain {
        &self.chain
    }

    pub async fn admit(
        &self,
        cx: CallContext,
        call: &mut dyn ProtoCall,
    ) -> Result<CallContext, InterceptError> {
        self.chain.admit(cx, call).await
    }

    /// Guards a unary tonic handler.
    pub async fn serve<T, Rsp, F, Fut>(
        &self,
        full_method: &str,
        request: tonic::Request<T>,
        handler: F,
    ) -> Result<tonic::Response<Rsp>, tonic::Status>
    where
        T: Any + Send + Sync,
        F: FnOnce(CallContext, tonic::Request<T>) -> Fut + Send,
        Fut: Future<Output = Result<tonic::Response<Rsp>, tonic::Status>>,
    {
        serve_unary(&self.chain, full_method, request, handler).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleetgate_api::ListDevicesRequest;

    #[test]
    fn registry_covers_device_originated_requests() {
        let registry = fleet_device_id_registry();
        assert_eq!(registry.len(), 4);
        assert!(registry.contains::<EnrollRequest>());
        assert!(registry.contains::<ConfigRequest>());
        assert!(registry.contains::<RegisterRequest>());
        assert!(registry.contains::<HeartbeatReport>());
        assert!(!registry.contains::<ListDevicesRequest>());
    }

    #[test]
    fn config_request_rejects_with_empty_response() {
        let registry = fleet_device_id_registry();
        let request = ConfigRequest {
            device_id: "edge-007".into(),
            known_revision: 3,
        };
        let (field, device_id) = registry.lookup(&request).expect("registered");
        assert_eq!(device_id, "edge-007");
        assert_eq!(field.rpc(), methods::GET_CONFIG);
        let rejected = field
            .rejected_response()
            .downcast::<ConfigResponse>()
            .expect("config response");
        assert_eq!(*rejected, ConfigResponse::default());
    }
}
