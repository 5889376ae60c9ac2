use std::net::SocketAddr;

/// Lookup of pre-shared keys (RFC 4279).
///
/// Read-only from the driver's point of view; one store may safely back
/// any number of concurrent handshakes.
pub trait PskStore: Send + Sync {
    /// The identity to present to the given peer, if one is provisioned.
    fn identity(&self, peer: &SocketAddr) -> Option<String>;

    /// The key for an identity, if known.
    fn key(&self, identity: &str) -> Option<Vec<u8>>;
}

/// A store holding exactly one identity/key pair, used for every peer.
pub struct StaticPskStore {
    identity: String,
    key: Vec<u8>,
}

impl StaticPskStore {
    pub fn new(identity: impl Into<String>, key: &[u8]) -> Self {
        StaticPskStore {
            identity: identity.into(),
            key: key.to_vec(),
        }
    }
}

impl PskStore for StaticPskStore {
    fn identity(&self, _peer: &SocketAddr) -> Option<String> {
        Some(self.identity.clone())
    }

    fn key(&self, identity: &str) -> Option<Vec<u8>> {
        (identity == self.identity).then(|| self.key.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_store_answers_any_peer() {
        let store = StaticPskStore::new("ID", b"KEY");
        let peer: SocketAddr = "10.0.0.1:5684".parse().unwrap();

        assert_eq!(store.identity(&peer).as_deref(), Some("ID"));
        assert_eq!(store.key("ID"), Some(b"KEY".to_vec()));
        assert_eq!(store.key("OTHER"), None);
    }
}
