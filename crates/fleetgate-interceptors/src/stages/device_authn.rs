use crate::accessors::{metadata_device_id, peer_certificates};
use crate::context::{CallContext, ProtoCall};
use crate::errors::InterceptError;
use crate::stages::{Stage, StageOutcome};
use async_trait::async_trait;
use fleetgate_auth::prelude::{AuthenticatedCall, DeviceAuthenticator, DeviceAuthnInput};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

pub const GENERIC_DENIAL: &str = "device authentication failed";

/// What a caller learns when the delegate refuses it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialDetail {
    /// The delegate's own message.
    #[default]
    Forward,
    /// A fixed message; the delegate's stays in the log.
    Generic,
}

/// Ties the claimed device id to the peer's certificate chain.
pub struct DeviceAuthnStage {
    authenticator: Arc<dyn DeviceAuthenticator>,
    denial: DenialDetail,
}

impl DeviceAuthnStage {
    pub fn new(authenticator: Arc<dyn DeviceAuthenticator>) -> Self {
        Self {
            authenticator,
            denial: DenialDetail::default(),
        }
    }

    pub fn with_denial_detail(mut self, denial: DenialDetail) -> Self {
        self.denial = denial;
        self
    }

    /// Gathers what the delegate decides on. Refuses calls without a peer
    /// chain or a `device_id` metadata value.
    pub fn input_for(call: &dyn ProtoCall) -> Result<DeviceAuthnInput, InterceptError> {
        Ok(DeviceAuthnInput {
            full_method: call.full_method().to_string(),
            chain: peer_certificates(call)?,
            device_id: metadata_device_id(call)?,
        })
    }

    /// Asks the delegate, bounded by the call's cancellation and deadline.
    pub async fn authenticate(
        &self,
        cx: &CallContext,
        input: DeviceAuthnInput,
    ) -> Result<AuthenticatedCall, InterceptError> {
        let outcome = cx.bounded(self.authenticator.authenticate(&input)).await?;
        outcome.map_err(|err| {
            let err = err.into_inner();
            tracing::warn!(
                target: "fleetgate::authn",
                request_id = %cx.request_id(),
                method = %input.full_method,
                device_id = %input.device_id,
                error = ?err.to_audit(),
                "device authentication failed"
            );
            let message = match self.denial {
                DenialDetail::Forward => err.message_user.as_str(),
                DenialDetail::Generic => GENERIC_DENIAL,
            };
            let denied = InterceptError::permission_denied(message)
                .meta_kv("reason", json!("delegate_denied"))
                .meta_kv("delegate_code", json!(err.code.0));
            match err.message_dev {
                Some(dev) => denied.dev_msg(dev),
                None => denied,
            }
        })
    }
}

#[async_trait]
impl Stage for DeviceAuthnStage {
    fn name(&self) -> &'static str {
        "device_authn"
    }

    async fn handle(
        &self,
        cx: &CallContext,
        call: &mut dyn ProtoCall,
    ) -> Result<StageOutcome, InterceptError> {
        let input = Self::input_for(call)?;
        let info = self.authenticate(cx, input).await?;
        Ok(StageOutcome::Authenticated(info))
    }
}
