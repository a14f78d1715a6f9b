//! Fleet service messages.
//!
//! Each device-originated request carries the id of the device it speaks for.
//! Every response type has a `rejected()` shape that the gate returns when
//! that id is malformed, so clients that only read the structured response
//! still see a refusal.

use serde::{Deserialize, Serialize};

pub mod methods {
    pub const ENROLL: &str = "/fleet.v1.FleetService/Enroll";
    pub const GET_CONFIG: &str = "/fleet.v1.FleetService/GetConfig";
    pub const REGISTER: &str = "/fleet.v1.FleetService/Register";
    pub const HEARTBEAT: &str = "/fleet.v1.FleetService/Heartbeat";
    pub const LIST_DEVICES: &str = "/fleet.v1.FleetService/ListDevices";
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrollRequest {
    pub device_id: String,
    /// PEM certificate signing request.
    #[serde(default)]
    pub csr: String,
    #[serde(default)]
    pub labels: Vec<String>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrollStatus {
    #[default]
    Unspecified,
    Accepted,
    Pending,
    Refused,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrollResponse {
    pub status: EnrollStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate_pem: Option<String>,
}

impl EnrollResponse {
    pub fn rejected() -> Self {
        Self {
            status: EnrollStatus::Refused,
            certificate_pem: None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigRequest {
    pub device_id: String,
    #[serde(default)]
    pub known_revision: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigResponse {
    #[serde(default)]
    pub revision: u64,
    #[serde(default)]
    pub document: String,
}

impl ConfigResponse {
    pub fn rejected() -> Self {
        Self::default()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub device_id: String,
    #[serde(default)]
    pub hardware_model: String,
    #[serde(default)]
    pub firmware_version: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub registered: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fleet_id: Option<String>,
}

impl RegisterResponse {
    pub fn rejected() -> Self {
        Self {
            registered: false,
            fleet_id: None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeartbeatReport {
    pub device_id: String,
    #[serde(default)]
    pub uptime_secs: u64,
    #[serde(default)]
    pub healthy: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeartbeatAck {}

impl HeartbeatAck {
    pub fn rejected() -> Self {
        Self {}
    }
}

/// Operator-side request; carries no device id and is never format-checked.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListDevicesRequest {
    #[serde(default)]
    pub page_size: u32,
    #[serde(default)]
    pub page_token: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListDevicesResponse {
    pub device_ids: Vec<String>,
    #[serde(default)]
    pub next_page_token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_shapes_are_negative() {
        assert_eq!(EnrollResponse::rejected().status, EnrollStatus::Refused);
        assert!(!RegisterResponse::rejected().registered);
        assert_eq!(ConfigResponse::rejected(), ConfigResponse::default());
    }

    #[test]
    fn enroll_status_uses_snake_case_on_the_wire() {
        let encoded = serde_json::to_value(EnrollResponse::rejected()).unwrap();
        assert_eq!(encoded, serde_json::json!({"status": "refused"}));
    }
}
