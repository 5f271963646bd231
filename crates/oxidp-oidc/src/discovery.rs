//! Discovery document post-processing.
//!
//! The provider's endpoints live under a fixed path prefix inside the
//! surrounding IdP, so the base discovery document produced by the OAuth
//! layer has to be rewritten before publication: the issuer is replaced,
//! every endpoint URL is rebased under the prefix, and the policy,
//! terms-of-service and service-documentation fields are stripped.

use serde_json::Value;
use tracing::debug;

/// Endpoint route constants.
pub mod endpoints {
    /// Authorization endpoint.
    pub const AUTHORIZE: &str = "/authorize";
    /// Login (re-authentication) endpoint.
    pub const LOGIN: &str = "/login";
    /// Token endpoint.
    pub const TOKEN: &str = "/token";
    /// UserInfo endpoint.
    pub const USERINFO: &str = "/userinfo";
    /// Public signing key (JWK Set) endpoint.
    pub const JWK: &str = "/jwk";
    /// Dynamic client registration endpoint.
    pub const REGISTER: &str = "/register";
    /// Token introspection endpoint.
    pub const INTROSPECT: &str = "/introspect";
    /// Token revocation endpoint.
    pub const REVOKE: &str = "/revoke";
    /// Discovery metadata endpoint.
    pub const WELL_KNOWN: &str = "/.well-known/openid-configuration";
    /// WebFinger endpoint.
    pub const WEBFINGER: &str = "/webfinger";
}

/// Discovery document fields rewritten to rebased endpoint URLs.
const ENDPOINT_FIELDS: &[(&str, &str)] = &[
    ("authorization_endpoint", endpoints::AUTHORIZE),
    ("token_endpoint", endpoints::TOKEN),
    ("userinfo_endpoint", endpoints::USERINFO),
    ("jwks_uri", endpoints::JWK),
    ("registration_endpoint", endpoints::REGISTER),
    ("introspection_endpoint", endpoints::INTROSPECT),
    ("revocation_endpoint", endpoints::REVOKE),
];

/// Fields stripped from the published document.
const STRIPPED_FIELDS: &[&str] = &["service_documentation", "op_policy_uri", "op_tos_uri"];

/// Where the provider's endpoints are published.
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    /// Issuer identifier, also the endpoint URL base.
    pub issuer: String,

    /// Path prefix the endpoints live under, e.g. `/profile/oidc`.
    pub path_prefix: String,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            issuer: "https://localhost/idp".to_string(),
            path_prefix: "/profile/oidc".to_string(),
        }
    }
}

/// Rewrites base discovery documents for publication.
#[derive(Debug, Clone, Default)]
pub struct DiscoveryPostProcessor {
    config: DiscoveryConfig,
}

impl DiscoveryPostProcessor {
    /// Creates a post-processor for the given publication config.
    #[must_use]
    pub const fn new(config: DiscoveryConfig) -> Self {
        Self { config }
    }

    /// The full published URL for one endpoint route.
    #[must_use]
    pub fn endpoint_url(&self, route: &str) -> String {
        format!("{}{}{route}", self.config.issuer, self.config.path_prefix)
    }

    /// Rewrites `document` in place: issuer, endpoint URLs, stripped
    /// fields. Endpoint fields absent from the base document are not
    /// added.
    pub fn process(&self, document: &mut Value) {
        let Some(map) = document.as_object_mut() else {
            return;
        };

        map.insert("issuer".to_string(), Value::String(self.config.issuer.clone()));

        for (field, route) in ENDPOINT_FIELDS {
            if map.contains_key(*field) {
                map.insert((*field).to_string(), Value::String(self.endpoint_url(route)));
            }
        }

        for field in STRIPPED_FIELDS {
            if map.remove(*field).is_some() {
                debug!(field, "stripped field from discovery document");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn processor() -> DiscoveryPostProcessor {
        DiscoveryPostProcessor::new(DiscoveryConfig {
            issuer: "https://idp.example".to_string(),
            path_prefix: "/profile/oidc".to_string(),
        })
    }

    #[test]
    fn endpoints_are_rebased_under_the_prefix() {
        let mut document = json!({
            "issuer": "https://upstream.example",
            "authorization_endpoint": "https://upstream.example/authorize",
            "token_endpoint": "https://upstream.example/token",
            "jwks_uri": "https://upstream.example/jwks.json",
            "scopes_supported": ["openid", "profile"],
        });
        processor().process(&mut document);

        assert_eq!(document["issuer"], "https://idp.example");
        assert_eq!(
            document["authorization_endpoint"],
            "https://idp.example/profile/oidc/authorize"
        );
        assert_eq!(document["token_endpoint"], "https://idp.example/profile/oidc/token");
        assert_eq!(document["jwks_uri"], "https://idp.example/profile/oidc/jwk");
        // Non-endpoint fields pass through untouched.
        assert_eq!(document["scopes_supported"], json!(["openid", "profile"]));
    }

    #[test]
    fn absent_endpoint_fields_are_not_invented() {
        let mut document = json!({ "token_endpoint": "https://upstream.example/token" });
        processor().process(&mut document);
        assert!(document.get("registration_endpoint").is_none());
    }

    #[test]
    fn policy_and_documentation_fields_are_stripped() {
        let mut document = json!({
            "service_documentation": "https://upstream.example/docs",
            "op_policy_uri": "https://upstream.example/policy",
            "op_tos_uri": "https://upstream.example/tos",
        });
        processor().process(&mut document);

        assert!(document.get("service_documentation").is_none());
        assert!(document.get("op_policy_uri").is_none());
        assert!(document.get("op_tos_uri").is_none());
        assert_eq!(document["issuer"], "https://idp.example");
    }

    #[test]
    fn endpoint_urls_compose_issuer_prefix_and_route() {
        assert_eq!(
            processor().endpoint_url(endpoints::USERINFO),
            "https://idp.example/profile/oidc/userinfo"
        );
        assert_eq!(
            processor().endpoint_url(endpoints::WEBFINGER),
            "https://idp.example/profile/oidc/webfinger"
        );
    }
}
