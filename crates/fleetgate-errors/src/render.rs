use crate::model::ErrorObj;
use serde::Serialize;
use serde_json::{Map, Value};

/// What a caller is allowed to see.
#[derive(Debug, Serialize)]
pub struct PublicErrorView {
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
}

/// What goes into diagnostic logs.
#[derive(Debug, Serialize)]
pub struct AuditErrorView {
    pub code: &'static str,
    pub kind: &'static str,
    pub grpc_status: i32,
    pub retryable: &'static str,
    pub severity: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_dev: Option<String>,
    pub meta: Map<String, Value>,
}

impl ErrorObj {
    pub fn to_public(&self) -> PublicErrorView {
        PublicErrorView {
            code: self.code.0,
            message: self.message_user.clone(),
            correlation_id: self.correlation_id.clone(),
        }
    }

    pub fn to_audit(&self) -> AuditErrorView {
        AuditErrorView {
            code: self.code.0,
            kind: self.kind.as_str(),
            grpc_status: self.grpc_status,
            retryable: self.retryable.as_str(),
            severity: self.severity.as_str(),
            message: self.message_user.clone(),
            message_dev: self.message_dev.clone(),
            meta: self.meta.clone(),
        }
    }
}
