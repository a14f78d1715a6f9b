use crate::context::{ProtoCall, DEVICE_ID_KEY};
use crate::errors::InterceptError;
use fleetgate_auth::prelude::PeerCertificateChain;
use serde_json::json;

/// Chain presented by the peer, leaf first. Absent or empty chains are refused.
pub fn peer_certificates(call: &dyn ProtoCall) -> Result<PeerCertificateChain, InterceptError> {
    match call.peer_certificates() {
        Some(chain) if !chain.is_empty() => Ok(chain),
        _ => Err(InterceptError::permission_denied("missing peer certificates")
            .meta_kv("reason", json!("missing_peer_certificate"))),
    }
}

/// Claimed device id from the `device_id` metadata key. Only the first value
/// counts; an empty first value is treated as missing.
pub fn metadata_device_id(call: &dyn ProtoCall) -> Result<String, InterceptError> {
    match call.metadata(DEVICE_ID_KEY).into_iter().next() {
        Some(device_id) if !device_id.is_empty() => Ok(device_id),
        _ => Err(
            InterceptError::permission_denied("cannot retrieve device id from metadata")
                .meta_kv("reason", json!("missing_device_id")),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::OwnedCall;
    use fleetgate_auth::prelude::Certificate;
    use fleetgate_errors::prelude::codes;

    const METHOD: &str = "/fleet.v1.FleetService/Heartbeat";

    #[test]
    fn refuses_missing_or_empty_chain() {
        let call = OwnedCall::new(METHOD, ());
        let err = peer_certificates(&call).unwrap_err();
        assert!(err.error().is(codes::AUTH_PERMISSION_DENIED));
        assert_eq!(err.to_string(), "missing peer certificates");

        let call = OwnedCall::new(METHOD, ()).with_peer_chain(PeerCertificateChain::default());
        assert!(peer_certificates(&call).is_err());
    }

    #[test]
    fn returns_chain_leaf_first() {
        let call = OwnedCall::new(METHOD, ()).with_peer_certificates([
            Certificate::from_der(b"leaf".to_vec()),
            Certificate::from_der(b"ca".to_vec()),
        ]);
        let chain = peer_certificates(&call).expect("chain");
        assert_eq!(chain.leaf().map(Certificate::der), Some(&b"leaf"[..]));
    }

    #[test]
    fn only_first_metadata_value_counts() {
        let call = OwnedCall::new(METHOD, ())
            .with_metadata(DEVICE_ID_KEY, "edge-007")
            .with_metadata(DEVICE_ID_KEY, "edge-008");
        assert_eq!(metadata_device_id(&call).unwrap(), "edge-007");

        let call = OwnedCall::new(METHOD, ())
            .with_metadata(DEVICE_ID_KEY, "")
            .with_metadata(DEVICE_ID_KEY, "edge-008");
        let err = metadata_device_id(&call).unwrap_err();
        assert_eq!(err.to_string(), "cannot retrieve device id from metadata");
    }

    #[test]
    fn missing_key_is_refused() {
        let call = OwnedCall::new(METHOD, ()).with_metadata("device-id", "edge-007");
        assert!(metadata_device_id(&call).is_err());
    }
}
