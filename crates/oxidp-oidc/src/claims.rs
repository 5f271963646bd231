//! ID token claim sets.

use serde::{Deserialize, Serialize};

/// The JWT claim set of an ID token.
///
/// Built once per grant by the minter and never mutated after signing.
/// Optional claims serialize only when present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IdTokenClaims {
    /// Issuer identifier.
    pub iss: String,

    /// Subject identifier, post-pairwise substitution. Client-bound
    /// tokens (registration, resource) carry no subject.
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub sub: String,

    /// Audience: the client id(s) the token is intended for.
    pub aud: Vec<String>,

    /// Issued-at, seconds since the epoch.
    pub iat: i64,

    /// Expiration, seconds since the epoch. Absent when the client has
    /// no configured validity window.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,

    /// Unique token identifier, freshly generated per mint.
    pub jti: String,

    /// When the user authenticated, seconds since the epoch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_time: Option<i64>,

    /// Nonce copied from the authorization request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,

    /// Authentication context class reference.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acr: Option<String>,

    /// Authentication method reference.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amr: Option<String>,

    /// Access token hash, for implicit and hybrid flows.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub at_hash: Option<String>,

    /// Server signing key identifier, duplicated from the JOSE header
    /// for consumers that only read the payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,
}

impl IdTokenClaims {
    /// Creates the base claim set: issuer, subject, single audience,
    /// issued-at and a caller-supplied jti.
    #[must_use]
    pub fn base(
        issuer: impl Into<String>,
        subject: impl Into<String>,
        audience: impl Into<String>,
        issued_at: i64,
        jti: impl Into<String>,
    ) -> Self {
        Self {
            iss: issuer.into(),
            sub: subject.into(),
            aud: vec![audience.into()],
            iat: issued_at,
            jti: jti.into(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_claims_are_omitted_from_json() {
        let claims = IdTokenClaims::base("https://idp.example", "alice", "c1", 1_700_000_000, "j1");
        let json = serde_json::to_value(&claims).unwrap();

        assert_eq!(json["iss"], "https://idp.example");
        assert_eq!(json["aud"], serde_json::json!(["c1"]));
        assert!(json.get("exp").is_none());
        assert!(json.get("nonce").is_none());
        assert!(json.get("acr").is_none());
    }

    #[test]
    fn present_claims_serialize() {
        let mut claims =
            IdTokenClaims::base("https://idp.example", "alice", "c1", 1_700_000_000, "j1");
        claims.exp = Some(1_700_000_600);
        claims.auth_time = Some(1_699_999_990);
        claims.acr = Some("urn:mace:incommon:iap:silver".to_string());

        let json = serde_json::to_value(&claims).unwrap();
        assert_eq!(json["exp"], 1_700_000_600);
        assert_eq!(json["auth_time"], 1_699_999_990);
        assert_eq!(json["acr"], "urn:mace:incommon:iap:silver");
    }
}
