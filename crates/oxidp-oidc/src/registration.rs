//! Registration and resource access tokens.
//!
//! Dynamic registration hands the client a bearer token it later uses to
//! manage its own registration; protected-resource registration gets the
//! equivalent resource token. Both are bound to a synthetic client
//! authentication and are rotated revoke-then-mint: at most one lives
//! per client at any time.

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use oxidp_session::Authentication;
use tracing::debug;
use uuid::Uuid;

use crate::claims::IdTokenClaims;
use crate::client::Client;
use crate::error::OidcResult;
use crate::keys::SigningKeyService;
use crate::token::{TokenConfig, TokenEntity, TokenStore};
use crate::types::{scopes, ROLE_CLIENT};

/// Issues and rotates client-bound bearer tokens.
#[derive(Debug)]
pub struct RegistrationTokenIssuer<K> {
    config: TokenConfig,
    keys: K,
}

impl<K: SigningKeyService> RegistrationTokenIssuer<K> {
    /// Creates an issuer over the server key service.
    #[must_use]
    pub const fn new(config: TokenConfig, keys: K) -> Self {
        Self { config, keys }
    }

    /// Issues a registration access token for `client`, revoking any
    /// prior one.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::OidcError::TokenSigning`] when the server
    /// key cannot sign the claim set.
    pub fn create_registration_access_token(
        &self,
        client: &Client,
        tokens: &TokenStore,
        now: DateTime<Utc>,
    ) -> OidcResult<TokenEntity> {
        self.create_associated_token(client, scopes::REGISTRATION_TOKEN, tokens, now)
    }

    /// Issues a resource access token for `client`, revoking any prior
    /// one.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::OidcError::TokenSigning`] when the server
    /// key cannot sign the claim set.
    pub fn create_resource_access_token(
        &self,
        client: &Client,
        tokens: &TokenStore,
        now: DateTime<Utc>,
    ) -> OidcResult<TokenEntity> {
        self.create_associated_token(client, scopes::RESOURCE_TOKEN, tokens, now)
    }

    /// Rotates the registration access token: the old one stops working
    /// the moment the new one is minted.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::OidcError::TokenSigning`] when the server
    /// key cannot sign the claim set.
    pub fn rotate_registration_access_token(
        &self,
        client: &Client,
        tokens: &TokenStore,
        now: DateTime<Utc>,
    ) -> OidcResult<TokenEntity> {
        self.create_registration_access_token(client, tokens, now)
    }

    fn create_associated_token(
        &self,
        client: &Client,
        scope: &str,
        tokens: &TokenStore,
        now: DateTime<Utc>,
    ) -> OidcResult<TokenEntity> {
        let stale: Vec<String> = tokens
            .find_all(|t| t.client_id == client.client_id && t.has_scope(scope))
            .into_iter()
            .map(|t| t.jti)
            .collect();
        for jti in stale {
            debug!(client_id = %client.client_id, jti, "revoking previous token");
            tokens.remove(&jti);
        }

        let expires_at = self
            .config
            .registration_token_validity_seconds
            .map(|secs| now + Duration::seconds(secs));

        // Minimal claim set: audience, issuer, issued-at, expiration and
        // a fresh jti. No subject; the token speaks for the client.
        let claims = IdTokenClaims {
            iss: self.config.issuer.clone(),
            aud: vec![client.client_id.clone()],
            iat: now.timestamp(),
            exp: expires_at.map(|at| at.timestamp()),
            jti: Uuid::new_v4().to_string(),
            ..IdTokenClaims::default()
        };
        let jwt = self.keys.sign(self.keys.default_algorithm(), &claims)?;

        let mut scope_set = HashSet::new();
        scope_set.insert(scope.to_string());
        let entity = TokenEntity {
            jti: claims.jti,
            jwt,
            client_id: client.client_id.clone(),
            scopes: scope_set,
            expires_at,
            authentication: Authentication::new(client.client_id.clone(), now)
                .with_authority(ROLE_CLIENT),
        };
        tokens.insert(entity.jti.clone(), entity.clone());
        debug!(client_id = %client.client_id, scope, "issued client-bound token");
        Ok(entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OidcError;
    use crate::types::SigningAlgorithm;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;
    use jsonwebtoken::EncodingKey;
    use serde::Serialize;

    struct FakeKeys;

    impl SigningKeyService for FakeKeys {
        fn default_algorithm(&self) -> SigningAlgorithm {
            SigningAlgorithm::Rs256
        }

        fn key_id(&self) -> &str {
            "srv-2026"
        }

        fn sign<C: Serialize>(
            &self,
            _algorithm: SigningAlgorithm,
            claims: &C,
        ) -> OidcResult<String> {
            let mut header = jsonwebtoken::Header::new(jsonwebtoken::Algorithm::HS256);
            header.kid = Some(self.key_id().to_string());
            jsonwebtoken::encode(&header, claims, &EncodingKey::from_secret(b"server"))
                .map_err(|e| OidcError::TokenSigning(e.to_string()))
        }
    }

    fn issuer() -> RegistrationTokenIssuer<FakeKeys> {
        RegistrationTokenIssuer::new(
            TokenConfig {
                issuer: "https://idp.example".to_string(),
                registration_token_validity_seconds: Some(3600),
            },
            FakeKeys,
        )
    }

    fn payload_of(jwt: &str) -> serde_json::Value {
        let segment = jwt.split('.').nth(1).unwrap();
        serde_json::from_slice(&URL_SAFE_NO_PAD.decode(segment).unwrap()).unwrap()
    }

    #[test]
    fn registration_token_carries_the_minimal_claim_set() {
        let tokens = TokenStore::new();
        let client = Client::new("c1");
        let now = Utc::now();

        let entity = issuer()
            .create_registration_access_token(&client, &tokens, now)
            .unwrap();
        assert!(entity.has_scope(scopes::REGISTRATION_TOKEN));
        assert!(entity.authentication.authorities.contains(&ROLE_CLIENT.to_string()));

        let payload = payload_of(&entity.jwt);
        assert_eq!(payload["iss"], "https://idp.example");
        assert_eq!(payload["aud"], serde_json::json!(["c1"]));
        assert_eq!(payload["exp"], (now + Duration::seconds(3600)).timestamp());
        assert!(payload.get("sub").is_none());
        assert!(payload.get("nonce").is_none());
    }

    #[test]
    fn rotation_revokes_the_previous_token() {
        let tokens = TokenStore::new();
        let client = Client::new("c1");
        let issuer = issuer();

        let first = issuer
            .create_registration_access_token(&client, &tokens, Utc::now())
            .unwrap();
        let second = issuer
            .rotate_registration_access_token(&client, &tokens, Utc::now())
            .unwrap();

        assert_ne!(first.jti, second.jti);
        assert!(tokens.get(&first.jti).is_none());
        assert!(tokens.get(&second.jti).is_some());
    }

    #[test]
    fn registration_and_resource_tokens_do_not_revoke_each_other() {
        let tokens = TokenStore::new();
        let client = Client::new("c1");
        let issuer = issuer();

        let registration = issuer
            .create_registration_access_token(&client, &tokens, Utc::now())
            .unwrap();
        let resource = issuer
            .create_resource_access_token(&client, &tokens, Utc::now())
            .unwrap();

        assert!(tokens.get(&registration.jti).is_some());
        assert!(tokens.get(&resource.jti).is_some());
    }

    #[test]
    fn other_clients_are_untouched_by_rotation() {
        let tokens = TokenStore::new();
        let issuer = issuer();

        let other = issuer
            .create_registration_access_token(&Client::new("c2"), &tokens, Utc::now())
            .unwrap();
        issuer
            .create_registration_access_token(&Client::new("c1"), &tokens, Utc::now())
            .unwrap();
        assert!(tokens.get(&other.jti).is_some());
    }
}
