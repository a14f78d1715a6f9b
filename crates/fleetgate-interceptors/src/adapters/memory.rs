use crate::context::ProtoCall;
use fleetgate_auth::prelude::{Certificate, PeerCertificateChain};
use std::any::Any;

/// A self-contained call, for tests and for callers that already decoded the
/// request outside any RPC framework.
pub struct OwnedCall {
    full_method: String,
    metadata: Vec<(String, String)>,
    peer: Option<PeerCertificateChain>,
    message: Box<dyn Any + Send>,
}

impl OwnedCall {
    pub fn new<M: Any + Send>(full_method: impl Into<String>, message: M) -> Self {
        Self {
            full_method: full_method.into(),
            metadata: Vec::new(),
            peer: None,
            message: Box::new(message),
        }
    }

    /// Appends a value; repeated keys keep their insertion order.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.push((key.into(), value.into()));
        self
    }

    pub fn with_peer_chain(mut self, chain: PeerCertificateChain) -> Self {
        self.peer = Some(chain);
        self
    }

    pub fn with_peer_certificates(self, certs: impl IntoIterator<Item = Certificate>) -> Self {
        self.with_peer_chain(certs.into_iter().collect())
    }
}

impl ProtoCall for OwnedCall {
    fn full_method(&self) -> &str {
        &self.full_method
    }

    fn metadata(&self, key: &str) -> Vec<String> {
        self.metadata
            .iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.clone())
            .collect()
    }

    fn peer_certificates(&self) -> Option<PeerCertificateChain> {
        self.peer.clone()
    }

    fn message(&self) -> &(dyn Any + Send) {
        &*self.message
    }
}
