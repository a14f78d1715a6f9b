use fleetgate_errors::prelude::*;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("{}", .0.message_user)]
pub struct AuthError(pub ErrorObj);

impl AuthError {
    pub fn into_inner(self) -> ErrorObj {
        self.0
    }

    pub fn inner(&self) -> &ErrorObj {
        &self.0
    }

    /// Message the delegate is willing to show the caller.
    pub fn public_message(&self) -> &str {
        &self.0.message_user
    }
}

pub fn unauthenticated(msg: &str) -> AuthError {
    AuthError(
        ErrorBuilder::new(codes::AUTH_UNAUTHENTICATED)
            .user_msg(msg)
            .build(),
    )
}

pub fn forbidden(msg: &str) -> AuthError {
    AuthError(ErrorBuilder::new(codes::AUTH_FORBIDDEN).user_msg(msg).build())
}

/// A registry or backend fault. The caller only sees the default message.
pub fn backend_unavailable(detail: &str) -> AuthError {
    AuthError(
        ErrorBuilder::new(codes::UNKNOWN_INTERNAL)
            .dev_msg(detail)
            .build(),
    )
}
