//! Authentication results produced by the surrounding identity provider.
//!
//! The SAML IdP's authentication engine is an external collaborator; this
//! crate only consumes its output: a principal name, the instant
//! authentication happened, and the granted authorities describing how it
//! happened (authentication context classes and methods).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Marker prefix tagging a granted authority as an authentication context
/// class reference (`acr`).
pub const ACR_AUTHORITY_PREFIX: &str = "acr:";

/// Marker prefix tagging a granted authority as an authentication method
/// reference (`amr`).
pub const AMR_AUTHORITY_PREFIX: &str = "amr:";

/// The result of a login at the surrounding IdP.
///
/// Produced once per login and recorded in the flow session; consumed to
/// populate the `auth_time`, `acr` and `amr` claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authentication {
    /// Authenticated principal name. Never empty.
    pub principal: String,

    /// When the authentication happened.
    pub auth_time: DateTime<Utc>,

    /// Granted authorities in string form. ACR/AMR entries carry the
    /// [`ACR_AUTHORITY_PREFIX`] / [`AMR_AUTHORITY_PREFIX`] markers.
    pub authorities: Vec<String>,
}

impl Authentication {
    /// Creates an authentication result for `principal` at `auth_time`.
    #[must_use]
    pub fn new(principal: impl Into<String>, auth_time: DateTime<Utc>) -> Self {
        Self {
            principal: principal.into(),
            auth_time,
            authorities: Vec::new(),
        }
    }

    /// Adds a plain granted authority.
    #[must_use]
    pub fn with_authority(mut self, authority: impl Into<String>) -> Self {
        self.authorities.push(authority.into());
        self
    }

    /// Adds an authentication context class reference authority.
    #[must_use]
    pub fn with_class_ref(self, class_ref: &str) -> Self {
        self.with_authority(format!("{ACR_AUTHORITY_PREFIX}{class_ref}"))
    }

    /// Adds an authentication method reference authority.
    #[must_use]
    pub fn with_method_ref(self, method_ref: &str) -> Self {
        self.with_authority(format!("{AMR_AUTHORITY_PREFIX}{method_ref}"))
    }

    /// Extracts the class reference from an authority string, if it
    /// carries the ACR marker.
    #[must_use]
    pub fn class_ref_of(authority: &str) -> Option<&str> {
        authority.strip_prefix(ACR_AUTHORITY_PREFIX)
    }

    /// Extracts the method reference from an authority string, if it
    /// carries the AMR marker.
    #[must_use]
    pub fn method_ref_of(authority: &str) -> Option<&str> {
        authority.strip_prefix(AMR_AUTHORITY_PREFIX)
    }

    /// Age of this authentication in whole seconds at `now`.
    #[must_use]
    pub fn age_seconds(&self, now: DateTime<Utc>) -> i64 {
        (now - self.auth_time).num_seconds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authority_markers_round_trip() {
        let authn = Authentication::new("alice", Utc::now())
            .with_class_ref("urn:mace:incommon:iap:silver")
            .with_method_ref("pwd")
            .with_authority("ROLE_USER");

        let class_refs: Vec<_> = authn
            .authorities
            .iter()
            .filter_map(|a| Authentication::class_ref_of(a))
            .collect();
        let method_refs: Vec<_> = authn
            .authorities
            .iter()
            .filter_map(|a| Authentication::method_ref_of(a))
            .collect();

        assert_eq!(class_refs, vec!["urn:mace:incommon:iap:silver"]);
        assert_eq!(method_refs, vec!["pwd"]);
    }

    #[test]
    fn plain_authorities_match_no_marker() {
        assert_eq!(Authentication::class_ref_of("ROLE_USER"), None);
        assert_eq!(Authentication::method_ref_of("ROLE_USER"), None);
    }

    #[test]
    fn age_in_seconds() {
        let now = Utc::now();
        let authn = Authentication::new("alice", now - chrono::Duration::seconds(42));
        assert_eq!(authn.age_seconds(now), 42);
    }
}
