use async_trait::async_trait;
use fleetgate_api::{methods, HeartbeatAck, HeartbeatReport};
use fleetgate_auth::prelude::*;
use fleetgate_interceptors::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::instrument::WithSubscriber;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::Layer;

/// Counts `warn` records on the authentication target.
#[derive(Clone, Default)]
struct AuthnWarnings(Arc<AtomicUsize>);

impl<S: Subscriber> Layer<S> for AuthnWarnings {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let meta = event.metadata();
        if *meta.level() == Level::WARN && meta.target() == "fleetgate::authn" {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }
}

enum Verdict {
    Allow,
    Deny,
    Hang,
}

struct Delegate(Verdict);

#[async_trait]
impl DeviceAuthenticator for Delegate {
    async fn authenticate(&self, input: &DeviceAuthnInput) -> Result<AuthenticatedCall, AuthError> {
        match self.0 {
            Verdict::Allow => Ok(AuthenticatedCall::new(&input.device_id, &input.full_method)),
            Verdict::Deny => Err(fleetgate_auth::errors::unauthenticated("unknown device")),
            Verdict::Hang => {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(AuthenticatedCall::new(&input.device_id, &input.full_method))
            }
        }
    }
}

fn chain(verdict: Verdict) -> InterceptorChain {
    let registry = DeviceIdRegistry::new().register(
        methods::HEARTBEAT,
        |req: &HeartbeatReport| req.device_id.as_str(),
        HeartbeatAck::rejected,
    );
    InterceptorChain::builder()
        .stage(DeviceIdGuardStage::new(registry))
        .stage(DeviceAuthnStage::new(Arc::new(Delegate(verdict))))
        .build()
}

fn heartbeat(device_id: &str) -> OwnedCall {
    OwnedCall::new(
        methods::HEARTBEAT,
        HeartbeatReport {
            device_id: device_id.into(),
            uptime_secs: 1,
            healthy: true,
        },
    )
}

fn leaf() -> Certificate {
    Certificate::from_der(b"edge-007-leaf".to_vec())
}

fn full_call(device_id: &str) -> OwnedCall {
    heartbeat(device_id)
        .with_metadata(DEVICE_ID_KEY, "edge-007")
        .with_peer_certificates([leaf()])
}

async fn authn_warnings(verdict: Verdict, cx: CallContext, mut call: OwnedCall) -> usize {
    let warnings = AuthnWarnings::default();
    let subscriber = tracing_subscriber::registry().with(warnings.clone());
    let chain = chain(verdict);
    let _ = chain
        .admit(cx, &mut call)
        .with_subscriber(subscriber)
        .await;
    warnings.0.load(Ordering::SeqCst)
}

#[tokio::test]
async fn delegate_denial_is_logged_once() {
    let count = authn_warnings(Verdict::Deny, CallContext::default(), full_call("edge-007")).await;
    assert_eq!(count, 1);
}

#[tokio::test]
async fn admitted_call_logs_nothing() {
    let count = authn_warnings(Verdict::Allow, CallContext::default(), full_call("edge-007")).await;
    assert_eq!(count, 0);
}

#[tokio::test]
async fn gate_refusals_before_the_delegate_are_not_logged() {
    let missing_chain = heartbeat("edge-007").with_metadata(DEVICE_ID_KEY, "edge-007");
    let missing_id = heartbeat("edge-007").with_peer_certificates([leaf()]);
    let bad_format = full_call("a\"b");

    for call in [missing_chain, missing_id, bad_format] {
        let count = authn_warnings(Verdict::Deny, CallContext::default(), call).await;
        assert_eq!(count, 0);
    }
}

#[tokio::test]
async fn cancelled_authentication_is_not_logged() {
    let token = CancellationToken::new();
    token.cancel();
    let cx = CallContext::default().with_cancel_token(token);

    let count = authn_warnings(Verdict::Hang, cx, full_call("edge-007")).await;
    assert_eq!(count, 0);
}
