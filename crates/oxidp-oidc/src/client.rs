//! Registered client metadata and the system scope registry.
//!
//! Clients are registered out-of-band (statically or through dynamic
//! registration) and are read-only to the authorization pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{SigningAlgorithm, SubjectType, ALG_NONE};

/// A registered OAuth 2.0 / OIDC client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Client {
    /// Unique client identifier (OAuth `client_id`).
    pub client_id: String,

    /// Display name.
    pub client_name: Option<String>,

    /// Client secret, for HMAC-signed ID tokens and client auth.
    pub client_secret: Option<String>,

    /// Redirect URI allow-list. Matching is literal, no wildcards.
    pub redirect_uris: Vec<String>,

    /// Contact addresses shown on the consent screen.
    pub contacts: Vec<String>,

    /// When the client was registered.
    pub created_at: Option<DateTime<Utc>>,

    /// Default maximum authentication age in seconds, when the request
    /// carries no `max_age` of its own.
    pub default_max_age: Option<i64>,

    /// Subject identifier type.
    pub subject_type: SubjectType,

    /// Sector identifier URI for pairwise subject derivation.
    pub sector_identifier_uri: Option<String>,

    /// Declared ID-token signing algorithm; server default when absent.
    pub id_token_signed_response_alg: Option<SigningAlgorithm>,

    /// Declared ID-token encryption algorithm (JWE `alg`), if any.
    pub id_token_encrypted_response_alg: Option<String>,

    /// Declared ID-token encryption encoding (JWE `enc`), if any.
    pub id_token_encrypted_response_enc: Option<String>,

    /// JWK Set URI for client key material.
    pub jwks_uri: Option<String>,

    /// Inline JWK Set for client key material.
    pub jwks: Option<serde_json::Value>,

    /// ID token lifetime in seconds; no `exp` claim when absent.
    pub id_token_validity_seconds: Option<i64>,

    /// Whether the client always requires the `auth_time` claim.
    pub require_auth_time: bool,
}

impl Client {
    /// Creates a client with the given id and no other metadata.
    #[must_use]
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            ..Self::default()
        }
    }

    /// Adds a registered redirect URI.
    #[must_use]
    pub fn with_redirect_uri(mut self, uri: impl Into<String>) -> Self {
        self.redirect_uris.push(uri.into());
        self
    }

    /// Sets the registration timestamp.
    #[must_use]
    pub const fn with_created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = Some(at);
        self
    }

    /// Sets the declared ID-token signing algorithm.
    #[must_use]
    pub const fn with_signing_alg(mut self, alg: SigningAlgorithm) -> Self {
        self.id_token_signed_response_alg = Some(alg);
        self
    }

    /// Whether `uri` is a literal member of the redirect allow-list.
    #[must_use]
    pub fn is_redirect_uri_registered(&self, uri: &str) -> bool {
        self.redirect_uris.iter().any(|registered| registered == uri)
    }

    /// Whether the encrypted ID-token path applies: a non-`none`
    /// encryption algorithm and encoding are declared and key material
    /// is available (JWK Set URI or inline JWKS).
    #[must_use]
    pub fn wants_encrypted_id_token(&self) -> bool {
        let alg_set = self
            .id_token_encrypted_response_alg
            .as_deref()
            .is_some_and(|alg| alg != ALG_NONE);
        let enc_set = self
            .id_token_encrypted_response_enc
            .as_deref()
            .is_some_and(|enc| enc != ALG_NONE);
        let has_keys = self.jwks_uri.as_deref().is_some_and(|uri| !uri.is_empty())
            || self.jwks.is_some();
        alg_set && enc_set && has_keys
    }

    /// The sector identifier used for pairwise subject derivation: the
    /// declared sector identifier URI, else the first registered
    /// redirect URI, else the client id.
    #[must_use]
    pub fn sector_identifier(&self) -> &str {
        if let Some(uri) = self.sector_identifier_uri.as_deref() {
            return uri;
        }
        self.redirect_uris
            .first()
            .map_or(self.client_id.as_str(), String::as_str)
    }
}

/// A scope known to the server, in canonical registry order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SystemScope {
    /// Scope value as requested on the wire.
    pub value: String,

    /// Human-readable description for the consent screen.
    pub description: Option<String>,
}

impl SystemScope {
    /// Creates a system scope.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            description: None,
        }
    }
}

/// The server's system scopes, in canonical display order.
#[derive(Debug, Clone, Default)]
pub struct ScopeRegistry {
    scopes: Vec<SystemScope>,
}

impl ScopeRegistry {
    /// Creates a registry with the standard OIDC scopes in canonical
    /// order.
    #[must_use]
    pub fn standard() -> Self {
        use crate::types::scopes;
        Self {
            scopes: [
                scopes::OPENID,
                scopes::PROFILE,
                scopes::EMAIL,
                scopes::ADDRESS,
                scopes::PHONE,
            ]
            .into_iter()
            .map(SystemScope::new)
            .collect(),
        }
    }

    /// Creates a registry from an explicit scope list.
    #[must_use]
    pub fn new(scopes: Vec<SystemScope>) -> Self {
        Self { scopes }
    }

    /// All system scopes in canonical order.
    #[must_use]
    pub fn all(&self) -> &[SystemScope] {
        &self.scopes
    }

    /// Orders `requested` scope values for display: system scopes first
    /// in canonical registry order, then any non-system scopes appended
    /// in request order.
    #[must_use]
    pub fn sort_for_display(&self, requested: &[String]) -> Vec<SystemScope> {
        let mut sorted: Vec<SystemScope> = self
            .scopes
            .iter()
            .filter(|s| requested.iter().any(|r| r == &s.value))
            .cloned()
            .collect();

        for value in requested {
            if !sorted.iter().any(|s| &s.value == value) {
                sorted.push(SystemScope::new(value.clone()));
            }
        }
        sorted
    }
}

/// Store of registered clients, keyed by client id.
pub type ClientStore = oxidp_store::KeyedStore<String, Client>;
