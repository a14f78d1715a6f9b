use crate::errors::InterceptError;
use fleetgate_auth::prelude::{AuthenticatedCall, PeerCertificateChain};
use std::any::Any;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Metadata key carrying the claimed device id.
pub const DEVICE_ID_KEY: &str = "device_id";
/// Metadata key a caller may use to pin the request id used in logs and errors.
pub const REQUEST_ID_KEY: &str = "x-request-id";

/// Framework-neutral view of an inbound call.
pub trait ProtoCall: Send {
    /// `/package.Service/Method`
    fn full_method(&self) -> &str;

    /// Every value sent under `key`, in arrival order. A value that is not
    /// valid text shows up as an empty string so positions are preserved.
    fn metadata(&self, key: &str) -> Vec<String>;

    /// Chain presented during the TLS handshake, `None` without mutual TLS.
    fn peer_certificates(&self) -> Option<PeerCertificateChain>;

    /// The decoded request message.
    fn message(&self) -> &(dyn Any + Send);
}

/// Per-call context threaded through the chain into the handler.
///
/// Values are never mutated in place; a stage that learns something new
/// (the authenticated identity) produces a new context.
#[derive(Clone, Debug)]
pub struct CallContext {
    request_id: String,
    deadline: Option<Instant>,
    cancel_token: CancellationToken,
    authenticated: Option<Arc<AuthenticatedCall>>,
}

impl Default for CallContext {
    fn default() -> Self {
        Self::new(uuid::Uuid::new_v4().to_string())
    }
}

impl CallContext {
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            deadline: None,
            cancel_token: CancellationToken::new(),
            authenticated: None,
        }
    }

    /// Uses the caller's `x-request-id` when present, a fresh UUID otherwise.
    pub fn for_call(call: &dyn ProtoCall) -> Self {
        match call
            .metadata(REQUEST_ID_KEY)
            .into_iter()
            .next()
            .filter(|id| !id.is_empty())
        {
            Some(request_id) => Self::new(request_id),
            None => Self::default(),
        }
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn with_cancel_token(mut self, cancel_token: CancellationToken) -> Self {
        self.cancel_token = cancel_token;
        self
    }

    pub(crate) fn with_authenticated(&self, authenticated: AuthenticatedCall) -> Self {
        Self {
            authenticated: Some(Arc::new(authenticated)),
            ..self.clone()
        }
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel_token
    }

    /// Identity established by the authentication stage, if it ran.
    pub fn authenticated(&self) -> Option<&AuthenticatedCall> {
        self.authenticated.as_deref()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }

    pub fn remaining_time(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// Drives `fut` until it finishes, the call is cancelled, or the deadline
    /// passes. In the latter two cases `fut` is dropped unfinished.
    pub async fn bounded<F: Future>(&self, fut: F) -> Result<F::Output, InterceptError> {
        let bounded = async {
            match self.deadline {
                Some(deadline) => tokio::time::timeout_at(deadline, fut)
                    .await
                    .map_err(|_| InterceptError::deadline_exceeded()),
                None => Ok(fut.await),
            }
        };

        tokio::select! {
            biased;
            _ = self.cancel_token.cancelled() => Err(InterceptError::cancelled()),
            outcome = bounded => outcome,
        }
    }
}
