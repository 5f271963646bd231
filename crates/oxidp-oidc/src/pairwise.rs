//! Pairwise subject identifiers.
//!
//! Clients registered with `subject_type=pairwise` never see the raw
//! principal name. Instead each (subject, sector identifier) pair gets a
//! random UUID minted on first use and persisted, so repeated calls are
//! stable while different sectors cannot correlate users.

use tracing::debug;
use uuid::Uuid;

use crate::client::Client;

/// Lookup key: the raw subject and the client's sector identifier.
type PairwiseKey = (String, String);

/// Mints and remembers pairwise subject identifiers.
#[derive(Debug, Default)]
pub struct PairwiseIdentifierService {
    identifiers: oxidp_store::KeyedStore<PairwiseKey, String>,
}

impl PairwiseIdentifierService {
    /// Creates an empty service.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The pairwise identifier for `subject` as seen by `client`.
    ///
    /// Stable: the first call per (subject, sector) mints a fresh UUID
    /// and persists it; later calls return the same value. Clients
    /// sharing a sector identifier see the same pairwise subject.
    #[must_use]
    pub fn identifier_for(&self, subject: &str, client: &Client) -> String {
        let key = (subject.to_string(), client.sector_identifier().to_string());
        if let Some(existing) = self.identifiers.get(&key) {
            return existing;
        }

        let minted = Uuid::new_v4().to_string();
        debug!(sector = %key.1, "minted new pairwise identifier");
        self.identifiers.insert(key, minted.clone());
        minted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers_are_stable_per_subject_and_sector() {
        let service = PairwiseIdentifierService::new();
        let client = Client::new("c1").with_redirect_uri("https://rp.example/cb");

        let first = service.identifier_for("alice", &client);
        let second = service.identifier_for("alice", &client);
        assert_eq!(first, second);
        assert_ne!(first, "alice");
    }

    #[test]
    fn different_sectors_get_different_identifiers() {
        let service = PairwiseIdentifierService::new();
        let a = Client::new("c1").with_redirect_uri("https://a.example/cb");
        let b = Client::new("c2").with_redirect_uri("https://b.example/cb");

        assert_ne!(
            service.identifier_for("alice", &a),
            service.identifier_for("alice", &b)
        );
    }

    #[test]
    fn shared_sector_identifier_is_shared_across_clients() {
        let service = PairwiseIdentifierService::new();
        let mut a = Client::new("c1");
        a.sector_identifier_uri = Some("https://sector.example".to_string());
        let mut b = Client::new("c2");
        b.sector_identifier_uri = Some("https://sector.example".to_string());

        assert_eq!(
            service.identifier_for("alice", &a),
            service.identifier_for("alice", &b)
        );
    }
}
