use fleetgate_auth::prelude::*;
use fleetgate_errors::prelude::codes;

const ENROLL: &str = "/fleet.v1.FleetService/Enroll";
const HEARTBEAT: &str = "/fleet.v1.FleetService/Heartbeat";

fn chain_of(der: &[u8]) -> PeerCertificateChain {
    PeerCertificateChain::new(vec![
        Certificate::from_der(der.to_vec()),
        Certificate::from_der(b"issuer".to_vec()),
    ])
}

fn input(method: &str, device_id: &str, chain: PeerCertificateChain) -> DeviceAuthnInput {
    DeviceAuthnInput {
        full_method: method.into(),
        device_id: device_id.into(),
        chain,
    }
}

#[test]
fn certificate_fingerprint_is_sha256_of_der() {
    let cert = Certificate::from_der(b"abc".to_vec());
    assert_eq!(
        cert.fingerprint_hex(),
        "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
    );
    assert_eq!(
        parse_fingerprint("BA:78:16:bf:8f:01:cf:ea:41:41:40:de:5d:ae:22:23:b0:03:61:a3:96:17:7a:9c:b4:10:ff:61:f2:00:15:ad"),
        Some(cert.fingerprint_sha256())
    );
    assert_eq!(parse_fingerprint("abcd"), None);
    assert_eq!(parse_fingerprint("not hex"), None);
}

#[test]
fn chain_reports_leaf_first() {
    let chain = chain_of(b"leaf");
    assert_eq!(chain.len(), 2);
    assert_eq!(chain.leaf().map(Certificate::der), Some(&b"leaf"[..]));
    assert!(PeerCertificateChain::default().leaf().is_none());
}

#[tokio::test]
async fn pinned_registry_accepts_matching_leaf() {
    let registry = PinnedCertificateRegistry::new();
    let leaf = Certificate::from_der(b"edge-007-cert".to_vec());
    registry.pin("edge-007", leaf.fingerprint_sha256());

    let call = registry
        .authenticate(&input(ENROLL, "edge-007", chain_of(b"edge-007-cert")))
        .await
        .expect("authenticated");

    assert_eq!(call.device_id, "edge-007");
    assert_eq!(call.full_method, ENROLL);
    assert_eq!(
        call.claim("fingerprint").and_then(|v| v.as_str()),
        Some(leaf.fingerprint_hex().as_str())
    );
}

#[tokio::test]
async fn pinned_registry_rejects_other_certificate() {
    let registry = PinnedCertificateRegistry::new();
    registry.pin(
        "edge-007",
        Certificate::from_der(b"edge-007-cert".to_vec()).fingerprint_sha256(),
    );

    let err = registry
        .authenticate(&input(ENROLL, "edge-007", chain_of(b"edge-008-cert")))
        .await
        .unwrap_err();
    assert!(err.inner().is(codes::AUTH_UNAUTHENTICATED));
    assert_eq!(
        err.public_message(),
        "certificate does not match registered device"
    );
}

#[tokio::test]
async fn pinned_registry_rejects_unknown_and_revoked_devices() {
    let registry = PinnedCertificateRegistry::new();
    let err = registry
        .authenticate(&input(ENROLL, "ghost", chain_of(b"x")))
        .await
        .unwrap_err();
    assert_eq!(err.public_message(), "device is not registered");

    registry.pin("edge-007", Certificate::from_der(b"x".to_vec()).fingerprint_sha256());
    assert_eq!(registry.len(), 1);
    assert!(registry.revoke("edge-007"));
    assert!(!registry.revoke("edge-007"));
    assert!(registry
        .authenticate(&input(ENROLL, "edge-007", chain_of(b"x")))
        .await
        .is_err());
}

#[tokio::test]
async fn pinned_registry_enforces_method_allow_list() {
    let registry = PinnedCertificateRegistry::new();
    let fingerprint = Certificate::from_der(b"x".to_vec()).fingerprint_sha256();
    registry.pin_with_methods("edge-007", fingerprint, [HEARTBEAT]);

    assert!(registry
        .authenticate(&input(HEARTBEAT, "edge-007", chain_of(b"x")))
        .await
        .is_ok());
    let err = registry
        .authenticate(&input(ENROLL, "edge-007", chain_of(b"x")))
        .await
        .unwrap_err();
    assert!(err.inner().is(codes::AUTH_FORBIDDEN));
}

#[tokio::test]
async fn common_name_rejects_unparseable_leaf() {
    let err = CommonNameAuthenticator
        .authenticate(&input(ENROLL, "edge-007", chain_of(b"definitely not der")))
        .await
        .unwrap_err();
    assert!(err.inner().is(codes::AUTH_UNAUTHENTICATED));
    assert!(err.public_message().starts_with("malformed certificate"));
}

#[tokio::test]
async fn common_name_rejects_empty_chain() {
    let err = CommonNameAuthenticator
        .authenticate(&input(ENROLL, "edge-007", PeerCertificateChain::default()))
        .await
        .unwrap_err();
    assert_eq!(err.public_message(), "no leaf certificate");
}

const EDGE_007_DER: &[u8] = include_bytes!("fixtures/edge-007.der");
const NO_CN_DER: &[u8] = include_bytes!("fixtures/no-cn.der");

#[test]
fn certificate_names_are_read_from_der() {
    let cert = Certificate::from_der(EDGE_007_DER.to_vec());
    assert_eq!(cert.subject_common_name().unwrap().as_deref(), Some("edge-007"));
    assert_eq!(
        cert.subject_alt_names().unwrap(),
        vec!["edge-007.fleet.local", "10.0.0.7", "fd00::7"]
    );
    assert_eq!(
        cert.fingerprint_hex(),
        "54f23fda62ae1722439973a5cb7b41aee577feabeb33f65809384cb3d1230bbe"
    );
}

#[test]
fn subject_without_common_name_has_none() {
    let cert = Certificate::from_der(NO_CN_DER.to_vec());
    assert_eq!(cert.subject_common_name().unwrap(), None);
    assert_eq!(cert.subject_dn().unwrap(), "O=edge-007");
    assert!(cert.subject_alt_names().unwrap().is_empty());
}

#[tokio::test]
async fn common_name_accepts_matching_leaf() {
    let call = CommonNameAuthenticator
        .authenticate(&input(HEARTBEAT, "edge-007", chain_of(EDGE_007_DER)))
        .await
        .expect("authenticated");

    assert_eq!(call.device_id, "edge-007");
    assert_eq!(
        call.claim("subject_cn").and_then(|v| v.as_str()),
        Some("edge-007")
    );
}

#[tokio::test]
async fn common_name_rejects_other_device() {
    let err = CommonNameAuthenticator
        .authenticate(&input(HEARTBEAT, "edge-008", chain_of(EDGE_007_DER)))
        .await
        .unwrap_err();
    assert!(err.inner().is(codes::AUTH_UNAUTHENTICATED));
    assert_eq!(
        err.public_message(),
        "certificate subject does not match device id"
    );
}

#[tokio::test]
async fn common_name_never_falls_back_to_the_subject_dn() {
    for claimed in ["O=edge-007", "edge-007"] {
        let err = CommonNameAuthenticator
            .authenticate(&input(HEARTBEAT, claimed, chain_of(NO_CN_DER)))
            .await
            .unwrap_err();
        assert_eq!(
            err.public_message(),
            "leaf certificate has no subject common name"
        );
    }
}
