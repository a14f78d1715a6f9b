use fleetgate_errors::prelude::*;
use serde_json::Value;
use std::any::Any;
use std::fmt;
use thiserror::Error;

/// A stage's refusal to let a call through.
///
/// Besides the error object it may carry the response value the client
/// should receive alongside the status, type-erased because stages do not
/// know the handler's response type.
#[derive(Error)]
#[error("{}", .error.message_user)]
pub struct InterceptError {
    error: ErrorObj,
    response: Option<Box<dyn Any + Send>>,
    details: Option<Vec<u8>>,
}

impl fmt::Debug for InterceptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterceptError")
            .field("error", &self.error)
            .field("has_response", &self.response.is_some())
            .field("details_len", &self.details.as_ref().map(Vec::len))
            .finish()
    }
}

impl InterceptError {
    pub fn from_error(error: ErrorObj) -> Self {
        Self {
            error,
            response: None,
            details: None,
        }
    }

    pub fn permission_denied(msg: &str) -> Self {
        Self::from_error(
            ErrorBuilder::new(codes::AUTH_PERMISSION_DENIED)
                .user_msg(msg)
                .build(),
        )
    }

    pub fn invalid_argument(msg: &str) -> Self {
        Self::from_error(
            ErrorBuilder::new(codes::REQUEST_INVALID_ARGUMENT)
                .user_msg(msg)
                .build(),
        )
    }

    pub fn cancelled() -> Self {
        Self::from_error(ErrorBuilder::new(codes::CALL_CANCELLED).build())
    }

    pub fn deadline_exceeded() -> Self {
        Self::from_error(ErrorBuilder::new(codes::CALL_DEADLINE_EXCEEDED).build())
    }

    pub fn internal(msg: &str) -> Self {
        Self::from_error(
            ErrorBuilder::new(codes::UNKNOWN_INTERNAL)
                .dev_msg(msg)
                .build(),
        )
    }

    pub fn dev_msg(mut self, msg: impl Into<String>) -> Self {
        self.error.message_dev = Some(msg.into());
        self
    }

    pub fn meta_kv(mut self, key: impl Into<String>, value: Value) -> Self {
        self.error.meta.insert(key.into(), value);
        self
    }

    pub fn correlate(mut self, request_id: &str) -> Self {
        if self.error.correlation_id.is_none() {
            self.error.correlation_id = Some(request_id.to_string());
        }
        self
    }

    pub fn with_response<R: Any + Send>(self, response: R) -> Self {
        self.with_boxed_response(Box::new(response))
    }

    pub fn with_boxed_response(mut self, response: Box<dyn Any + Send>) -> Self {
        self.response = Some(response);
        self
    }

    /// The response value already encoded for the wire.
    pub fn with_details(mut self, details: Vec<u8>) -> Self {
        self.details = Some(details);
        self
    }

    pub fn details(&self) -> Option<&[u8]> {
        self.details.as_deref()
    }

    pub fn error(&self) -> &ErrorObj {
        &self.error
    }

    pub fn code(&self) -> ErrorCode {
        self.error.code
    }

    pub fn has_response(&self) -> bool {
        self.response.is_some()
    }

    pub fn into_inner(self) -> ErrorObj {
        self.error
    }

    pub fn into_parts(self) -> (ErrorObj, Option<Box<dyn Any + Send>>) {
        (self.error, self.response)
    }
}

/// Terminal outcome of a refused call, typed by the handler's response.
///
/// `response` is set when the refusing stage supplied a value of type `R`.
#[derive(Debug)]
pub struct Rejection<R> {
    pub error: ErrorObj,
    pub response: Option<R>,
}

impl<R> Rejection<R> {
    pub fn code(&self) -> ErrorCode {
        self.error.code
    }

    pub fn message(&self) -> &str {
        &self.error.message_user
    }
}

impl<R: Any> From<InterceptError> for Rejection<R> {
    fn from(err: InterceptError) -> Self {
        let (error, response) = err.into_parts();
        let response = response
            .and_then(|boxed| boxed.downcast::<R>().ok())
            .map(|boxed| *boxed);
        Rejection { error, response }
    }
}
