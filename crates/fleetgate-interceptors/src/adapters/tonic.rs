use crate::context::{CallContext, ProtoCall, REQUEST_ID_KEY};
use crate::errors::InterceptError;
use crate::stages::InterceptorChain;
use bytes::Bytes;
use fleetgate_auth::prelude::{Certificate, PeerCertificateChain};
use fleetgate_errors::prelude::to_grpc_status;
use std::any::Any;
use std::future::Future;
use std::time::Duration;
use ::tonic::metadata::{Ascii, MetadataValue};
use ::tonic::{Request, Response, Status};

pub const GRPC_TIMEOUT_KEY: &str = "grpc-timeout";

/// A tonic request seen through [`ProtoCall`].
///
/// tonic does not expose the method path to unary handlers, so the caller
/// passes it in.
pub struct TonicCall<'r, T> {
    full_method: &'r str,
    request: &'r Request<T>,
}

impl<'r, T> TonicCall<'r, T> {
    pub fn new(full_method: &'r str, request: &'r Request<T>) -> Self {
        Self {
            full_method,
            request,
        }
    }
}

impl<T: Any + Send + Sync> ProtoCall for TonicCall<'_, T> {
    fn full_method(&self) -> &str {
        self.full_method
    }

    fn metadata(&self, key: &str) -> Vec<String> {
        self.request
            .metadata()
            .get_all(key)
            .iter()
            .map(|value| value.to_str().map(str::to_string).unwrap_or_default())
            .collect()
    }

    fn peer_certificates(&self) -> Option<PeerCertificateChain> {
        let certs = self.request.peer_certs()?;
        Some(
            certs
                .iter()
                .map(|cert| Certificate::from_der(AsRef::<[u8]>::as_ref(cert).to_vec()))
                .collect(),
        )
    }

    fn message(&self) -> &(dyn Any + Send) {
        self.request.get_ref()
    }
}

/// Context for a tonic request: its `x-request-id` and `grpc-timeout`.
pub fn call_context<T>(request: &Request<T>) -> CallContext {
    let metadata = request.metadata();
    let cx = match metadata
        .get(REQUEST_ID_KEY)
        .and_then(|value| value.to_str().ok())
        .filter(|id| !id.is_empty())
    {
        Some(request_id) => CallContext::new(request_id),
        None => CallContext::default(),
    };
    match metadata
        .get(GRPC_TIMEOUT_KEY)
        .and_then(|value| value.to_str().ok())
        .and_then(parse_grpc_timeout)
    {
        Some(timeout) => cx.with_timeout(timeout),
        None => cx,
    }
}

/// Parses a `grpc-timeout` value: at most eight digits and a unit.
pub fn parse_grpc_timeout(value: &str) -> Option<Duration> {
    if value.len() < 2 || value.len() > 9 || !value.is_ascii() {
        return None;
    }
    let (digits, unit) = value.split_at(value.len() - 1);
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let amount: u64 = digits.parse().ok()?;
    let timeout = match unit {
        "H" => Duration::from_secs(amount * 60 * 60),
        "M" => Duration::from_secs(amount * 60),
        "S" => Duration::from_secs(amount),
        "m" => Duration::from_millis(amount),
        "u" => Duration::from_micros(amount),
        "n" => Duration::from_nanos(amount),
        _ => return None,
    };
    Some(timeout)
}

/// The status sent for a refused call. An encoded rejection value, when
/// present, travels in the status details.
pub fn rejection_to_status(err: &InterceptError) -> Status {
    let base = to_grpc_status(err.error());
    let mut status = match err.details() {
        Some(details) => Status::with_details(
            base.code(),
            base.message(),
            Bytes::copy_from_slice(details),
        ),
        None => base,
    };
    let request_id: Option<MetadataValue<Ascii>> = err
        .error()
        .correlation_id
        .as_deref()
        .and_then(|id| MetadataValue::try_from(id).ok());
    if let Some(value) = request_id {
        status.metadata_mut().insert(REQUEST_ID_KEY, value);
    }
    status
}

/// Runs `chain` in front of a unary tonic handler.
pub async fn serve_unary<T, Rsp, F, Fut>(
    chain: &InterceptorChain,
    full_method: &str,
    request: Request<T>,
    handler: F,
) -> Result<Response<Rsp>, Status>
where
    T: Any + Send + Sync,
    F: FnOnce(CallContext, Request<T>) -> Fut + Send,
    Fut: Future<Output = Result<Response<Rsp>, Status>>,
{
    let cx = call_context(&request);
    let admitted = {
        let mut call = TonicCall::new(full_method, &request);
        chain.admit(cx, &mut call).await
    };
    match admitted {
        Ok(cx) => handler(cx, request).await,
        Err(err) => Err(rejection_to_status(&err)),
    }
}
