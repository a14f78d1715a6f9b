use crate::kind::{ErrorKind, RetryClass, Severity};
use once_cell::sync::Lazy;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ErrorCode(pub &'static str);

impl Serialize for ErrorCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.0)
    }
}

impl<'de> Deserialize<'de> for ErrorCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        REGISTRY
            .get_key_value(s.as_str())
            .map(|(key, _)| ErrorCode(*key))
            .ok_or_else(|| de::Error::custom(format!("unregistered error code: {s}")))
    }
}

#[derive(Clone, Debug)]
pub struct CodeSpec {
    pub code: ErrorCode,
    pub kind: ErrorKind,
    pub http_status: u16,
    pub grpc_status: i32,
    pub retryable: RetryClass,
    pub severity: Severity,
    pub default_user_msg: &'static str,
}

pub mod codes {
    use super::ErrorCode;

    /// Raised by authorization delegates when the presented identity is unknown
    /// or does not match the registry.
    pub const AUTH_UNAUTHENTICATED: ErrorCode = ErrorCode("AUTH.UNAUTHENTICATED");
    /// Raised by authorization delegates when a known device may not call a method.
    pub const AUTH_FORBIDDEN: ErrorCode = ErrorCode("AUTH.FORBIDDEN");
    /// Every admission failure of the authentication stage surfaces as this code.
    pub const AUTH_PERMISSION_DENIED: ErrorCode = ErrorCode("AUTH.PERMISSION_DENIED");
    pub const REQUEST_INVALID_ARGUMENT: ErrorCode = ErrorCode("REQUEST.INVALID_ARGUMENT");
    pub const CALL_CANCELLED: ErrorCode = ErrorCode("CALL.CANCELLED");
    pub const CALL_DEADLINE_EXCEEDED: ErrorCode = ErrorCode("CALL.DEADLINE_EXCEEDED");
    pub const UNKNOWN_INTERNAL: ErrorCode = ErrorCode("UNKNOWN.INTERNAL");
}

// Numeric values follow the canonical gRPC status code table.
mod grpc {
    pub const CANCELLED: i32 = 1;
    pub const INVALID_ARGUMENT: i32 = 3;
    pub const DEADLINE_EXCEEDED: i32 = 4;
    pub const PERMISSION_DENIED: i32 = 7;
    pub const INTERNAL: i32 = 13;
    pub const UNAUTHENTICATED: i32 = 16;
}

pub static REGISTRY: Lazy<HashMap<&'static str, CodeSpec>> = Lazy::new(|| {
    use codes::*;

    let mut map = HashMap::new();
    let mut add = |spec: CodeSpec| {
        let key = spec.code.0;
        if map.insert(key, spec).is_some() {
            panic!("duplicate error code: {}", key);
        }
    };

    add(CodeSpec {
        code: AUTH_UNAUTHENTICATED,
        kind: ErrorKind::Auth,
        http_status: 401,
        grpc_status: grpc::UNAUTHENTICATED,
        retryable: RetryClass::Never,
        severity: Severity::Warn,
        default_user_msg: "Device identity could not be verified.",
    });

    add(CodeSpec {
        code: AUTH_FORBIDDEN,
        kind: ErrorKind::Auth,
        http_status: 403,
        grpc_status: grpc::PERMISSION_DENIED,
        retryable: RetryClass::Never,
        severity: Severity::Warn,
        default_user_msg: "Device is not allowed to perform this call.",
    });

    add(CodeSpec {
        code: AUTH_PERMISSION_DENIED,
        kind: ErrorKind::Auth,
        http_status: 403,
        grpc_status: grpc::PERMISSION_DENIED,
        retryable: RetryClass::Never,
        severity: Severity::Warn,
        default_user_msg: "permission denied",
    });

    add(CodeSpec {
        code: REQUEST_INVALID_ARGUMENT,
        kind: ErrorKind::Request,
        http_status: 400,
        grpc_status: grpc::INVALID_ARGUMENT,
        retryable: RetryClass::Never,
        severity: Severity::Info,
        default_user_msg: "invalid argument",
    });

    add(CodeSpec {
        code: CALL_CANCELLED,
        kind: ErrorKind::Call,
        http_status: 499,
        grpc_status: grpc::CANCELLED,
        retryable: RetryClass::Transient,
        severity: Severity::Info,
        default_user_msg: "call cancelled",
    });

    add(CodeSpec {
        code: CALL_DEADLINE_EXCEEDED,
        kind: ErrorKind::Call,
        http_status: 504,
        grpc_status: grpc::DEADLINE_EXCEEDED,
        retryable: RetryClass::Transient,
        severity: Severity::Info,
        default_user_msg: "deadline exceeded",
    });

    add(CodeSpec {
        code: UNKNOWN_INTERNAL,
        kind: ErrorKind::Unknown,
        http_status: 500,
        grpc_status: grpc::INTERNAL,
        retryable: RetryClass::Transient,
        severity: Severity::Critical,
        default_user_msg: "Internal error. Please retry later.",
    });

    map
});

pub fn spec_of(code: ErrorCode) -> &'static CodeSpec {
    REGISTRY.get(code.0).expect("unregistered ErrorCode")
}
