//! ID token minting and the token entity model.
//!
//! The minter builds the claim set for one authorization grant, then
//! selects one of three issuance paths: encrypted (JWE, when the client
//! declares encryption and has key material), signed (server asymmetric
//! key or the client's own secret for the HMAC family), or unsigned
//! ("plain") when the effective algorithm is `none`.

use std::collections::HashSet;

use aws_lc_rs::digest;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use oxidp_session::Authentication;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::claims::IdTokenClaims;
use crate::client::Client;
use crate::error::{OidcError, OidcResult};
use crate::keys::{encode_unsigned, sign_with_client_secret, EncrypterService, SigningKeyService};
use crate::request::AuthorizationRequest;
use crate::types::{params, scopes, SigningAlgorithm};

/// Server-level token issuance configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenConfig {
    /// Issuer identifier placed in the `iss` claim.
    pub issuer: String,

    /// Lifetime of registration and resource access tokens in seconds;
    /// non-expiring when absent.
    pub registration_token_validity_seconds: Option<i64>,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            issuer: "https://localhost/idp".to_string(),
            registration_token_validity_seconds: None,
        }
    }
}

/// A stored token: access, ID, registration or resource.
///
/// ID token entities share the originating access token's authentication
/// holder and client reference, and carry the reserved `id-token` scope
/// marker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenEntity {
    /// Unique token identifier (the JWT `jti`).
    pub jti: String,

    /// The serialized JWT (or JWE).
    pub jwt: String,

    /// Client the token is bound to.
    pub client_id: String,

    /// Scope set. Reserved markers distinguish special-purpose tokens.
    pub scopes: HashSet<String>,

    /// When the token expires; never, when absent.
    pub expires_at: Option<DateTime<Utc>>,

    /// The authentication this token was issued under.
    pub authentication: Authentication,
}

impl TokenEntity {
    /// Whether the token carries the given reserved scope marker.
    #[must_use]
    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.contains(scope)
    }
}

/// Store of issued tokens, keyed by `jti`.
pub type TokenStore = oxidp_store::KeyedStore<String, TokenEntity>;

/// Mints ID tokens for authorization grants.
#[derive(Debug)]
pub struct IdTokenMinter<K, E> {
    config: TokenConfig,
    keys: K,
    encrypters: E,
}

impl<K: SigningKeyService, E: EncrypterService> IdTokenMinter<K, E> {
    /// Creates a minter over the given key services.
    #[must_use]
    pub const fn new(config: TokenConfig, keys: K, encrypters: E) -> Self {
        Self {
            config,
            keys,
            encrypters,
        }
    }

    /// Mints the ID token for one successful authorization grant.
    ///
    /// `subject` is the resolved subject identifier, post-pairwise
    /// substitution. `access_token` is the access token issued alongside;
    /// its value feeds `at_hash` and its authentication holder and client
    /// reference are shared with the resulting entity.
    ///
    /// # Errors
    ///
    /// - [`OidcError::EncrypterUnavailable`] when the client declares
    ///   ID-token encryption but no encrypter can be resolved.
    /// - [`OidcError::TokenSigning`] when signing fails or an HMAC
    ///   algorithm is declared without a client secret.
    pub fn mint(
        &self,
        client: &Client,
        request: &AuthorizationRequest,
        access_token: &TokenEntity,
        subject: &str,
        now: DateTime<Utc>,
    ) -> OidcResult<TokenEntity> {
        let algorithm = client
            .id_token_signed_response_alg
            .unwrap_or_else(|| self.keys.default_algorithm());
        debug!(client_id = %client.client_id, %algorithm, "minting id token");

        let mut claims = IdTokenClaims::base(
            self.config.issuer.clone(),
            subject,
            client.client_id.clone(),
            now.timestamp(),
            Uuid::new_v4().to_string(),
        );

        self.add_auth_time(&mut claims, client, request);
        self.add_context_references(&mut claims, &access_token.authentication);

        let expires_at = client
            .id_token_validity_seconds
            .map(|secs| now + Duration::seconds(secs));
        claims.exp = expires_at.map(|at| at.timestamp());

        claims.nonce = request.nonce().map(str::to_string);

        if request.response_types.includes_token() {
            claims.at_hash = Some(compute_at_hash(algorithm, &access_token.jwt));
        }

        let jwt = if client.wants_encrypted_id_token() {
            match self.encrypters.encrypt(client, &claims) {
                Some(encrypted) => encrypted?,
                None => {
                    return Err(OidcError::EncrypterUnavailable(client.client_id.clone()));
                }
            }
        } else {
            self.sign(algorithm, client, &mut claims)?
        };

        let mut scope_set = HashSet::new();
        scope_set.insert(scopes::ID_TOKEN.to_string());
        Ok(TokenEntity {
            jti: claims.jti.clone(),
            jwt,
            client_id: access_token.client_id.clone(),
            scopes: scope_set,
            expires_at,
            authentication: access_token.authentication.clone(),
        })
    }

    /// Adds `auth_time` when the request declared `max_age` or an ID
    /// token hint, or the client always requires it.
    ///
    /// The timestamp travels as a millisecond extension recorded at
    /// login; a missing or unparsable value logs and omits the claim.
    fn add_auth_time(
        &self,
        claims: &mut IdTokenClaims,
        client: &Client,
        request: &AuthorizationRequest,
    ) {
        let wanted = request.extensions.contains_key(params::MAX_AGE)
            || request.extensions.contains_key(params::ID_TOKEN)
            || client.require_auth_time;
        if !wanted {
            return;
        }

        match request
            .extensions
            .get(params::AUTH_TIME)
            .and_then(|raw| raw.parse::<i64>().ok())
        {
            Some(millis) => claims.auth_time = Some(millis / 1000),
            None => warn!("auth_time expected but no authentication timestamp is recorded"),
        }
    }

    /// Scans the granted authorities for ACR/AMR markers. Later entries
    /// of the same kind overwrite earlier ones.
    fn add_context_references(&self, claims: &mut IdTokenClaims, authentication: &Authentication) {
        for authority in &authentication.authorities {
            if let Some(class_ref) = Authentication::class_ref_of(authority) {
                claims.acr = Some(class_ref.to_string());
            }
            if let Some(method_ref) = Authentication::method_ref_of(authority) {
                claims.amr = Some(method_ref.to_string());
            }
        }
    }

    fn sign(
        &self,
        algorithm: SigningAlgorithm,
        client: &Client,
        claims: &mut IdTokenClaims,
    ) -> OidcResult<String> {
        if algorithm == SigningAlgorithm::None {
            debug!("client is configured with no signing algorithm; returning a plain jwt");
            return encode_unsigned(claims);
        }

        if algorithm.is_hmac() {
            let secret = client.client_secret.as_deref().ok_or_else(|| {
                OidcError::TokenSigning(format!(
                    "client {} declares {algorithm} but has no secret",
                    client.client_id
                ))
            })?;
            debug!("signing id token with the client secret");
            return sign_with_client_secret(algorithm, secret, self.keys.key_id(), claims);
        }

        // Server key path: the key id travels in the header and as an
        // explicit claim for consumers that only read the payload.
        claims.kid = Some(self.keys.key_id().to_string());
        debug!(kid = %self.keys.key_id(), "signing id token with the server key");
        self.keys.sign(algorithm, claims)
    }
}

/// Computes the OIDC `at_hash`: the left half of the access token value's
/// digest under the signing algorithm's hash, base64url-encoded without
/// padding.
#[must_use]
pub fn compute_at_hash(algorithm: SigningAlgorithm, access_token: &str) -> String {
    let digest_algorithm = match algorithm {
        SigningAlgorithm::Hs384 | SigningAlgorithm::Rs384 | SigningAlgorithm::Es384 => {
            &digest::SHA384
        }
        SigningAlgorithm::Hs512 | SigningAlgorithm::Rs512 => &digest::SHA512,
        _ => &digest::SHA256,
    };
    let hashed = digest::digest(digest_algorithm, access_token.as_bytes());
    let half = &hashed.as_ref()[..hashed.as_ref().len() / 2];
    URL_SAFE_NO_PAD.encode(half)
}
