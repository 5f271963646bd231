//! Signing and encryption key seams.
//!
//! Key management (JWK generation, rotation) lives outside this crate.
//! The minter talks to it through the [`SigningKeyService`] and
//! [`EncrypterService`] traits; [`LocalSigningKeyService`] wraps a
//! single in-process key for deployments and tests that need no
//! rotation.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use jsonwebtoken::{EncodingKey, Header};
use serde::Serialize;

use crate::client::Client;
use crate::error::{OidcError, OidcResult};
use crate::types::SigningAlgorithm;

/// Access to the server's current signing key.
pub trait SigningKeyService: Send + Sync {
    /// The server's default signing algorithm.
    fn default_algorithm(&self) -> SigningAlgorithm;

    /// Identifier of the current signing key.
    fn key_id(&self) -> &str;

    /// Signs the claim set with the server key under `algorithm`.
    ///
    /// # Errors
    ///
    /// Returns [`OidcError::TokenSigning`] when the algorithm has no JWS
    /// mapping or the underlying signature fails.
    fn sign<C: Serialize>(&self, algorithm: SigningAlgorithm, claims: &C) -> OidcResult<String>;
}

/// Encrypts ID tokens with client key material.
pub trait EncrypterService: Send + Sync {
    /// Produces the JWE for `claims` using the client's declared
    /// algorithm, encoding and key material, or `None` when no encrypter
    /// can be resolved for the client.
    fn encrypt<C: Serialize>(&self, client: &Client, claims: &C) -> Option<OidcResult<String>>;
}

/// An encrypter service with no key material at all.
///
/// Deployments without ID-token encryption use this; the minter then
/// fails fast for any client that declares encryption.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoEncrypters;

impl EncrypterService for NoEncrypters {
    fn encrypt<C: Serialize>(&self, _client: &Client, _claims: &C) -> Option<OidcResult<String>> {
        None
    }
}

/// A signing key service over one in-process key.
pub struct LocalSigningKeyService {
    algorithm: SigningAlgorithm,
    key_id: String,
    key: EncodingKey,
}

impl std::fmt::Debug for LocalSigningKeyService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalSigningKeyService")
            .field("algorithm", &self.algorithm)
            .field("key_id", &self.key_id)
            .finish_non_exhaustive()
    }
}

impl LocalSigningKeyService {
    /// Wraps an encoding key under the given default algorithm and key
    /// id.
    #[must_use]
    pub fn new(algorithm: SigningAlgorithm, key_id: impl Into<String>, key: EncodingKey) -> Self {
        Self {
            algorithm,
            key_id: key_id.into(),
            key,
        }
    }

    /// Builds an RSA service from a PKCS#1/PKCS#8 PEM private key.
    ///
    /// # Errors
    ///
    /// Returns [`OidcError::TokenSigning`] when the PEM cannot be parsed.
    pub fn from_rsa_pem(
        algorithm: SigningAlgorithm,
        key_id: impl Into<String>,
        pem: &[u8],
    ) -> OidcResult<Self> {
        let key = EncodingKey::from_rsa_pem(pem)
            .map_err(|e| OidcError::TokenSigning(e.to_string()))?;
        Ok(Self::new(algorithm, key_id, key))
    }
}

impl SigningKeyService for LocalSigningKeyService {
    fn default_algorithm(&self) -> SigningAlgorithm {
        self.algorithm
    }

    fn key_id(&self) -> &str {
        &self.key_id
    }

    fn sign<C: Serialize>(&self, algorithm: SigningAlgorithm, claims: &C) -> OidcResult<String> {
        let jws_algorithm = algorithm.jws_algorithm().ok_or_else(|| {
            OidcError::TokenSigning(format!("algorithm {algorithm} cannot sign"))
        })?;
        let mut header = Header::new(jws_algorithm);
        header.kid = Some(self.key_id.clone());
        jsonwebtoken::encode(&header, claims, &self.key)
            .map_err(|e| OidcError::TokenSigning(e.to_string()))
    }
}

/// Signs a claim set with a client's symmetric secret.
///
/// The HMAC family uses the client secret as key material instead of the
/// server key; the server key id still travels in the header.
///
/// # Errors
///
/// Returns [`OidcError::TokenSigning`] when the algorithm is not in the
/// HMAC family or the signature fails.
pub fn sign_with_client_secret<C: Serialize>(
    algorithm: SigningAlgorithm,
    secret: &str,
    key_id: &str,
    claims: &C,
) -> OidcResult<String> {
    if !algorithm.is_hmac() {
        return Err(OidcError::TokenSigning(format!(
            "algorithm {algorithm} is not symmetric"
        )));
    }
    let jws_algorithm = algorithm
        .jws_algorithm()
        .ok_or_else(|| OidcError::TokenSigning(format!("algorithm {algorithm} cannot sign")))?;
    let mut header = Header::new(jws_algorithm);
    header.kid = Some(key_id.to_string());
    jsonwebtoken::encode(&header, claims, &EncodingKey::from_secret(secret.as_bytes()))
        .map_err(|e| OidcError::TokenSigning(e.to_string()))
}

/// Encodes an unsigned ("plain") JWT: `alg=none` header, payload, empty
/// signature segment.
///
/// # Errors
///
/// Returns [`OidcError::TokenSigning`] when the claims cannot be
/// serialized.
pub fn encode_unsigned<C: Serialize>(claims: &C) -> OidcResult<String> {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
    let payload = serde_json::to_vec(claims)
        .map_err(|e| OidcError::TokenSigning(e.to_string()))?;
    Ok(format!("{header}.{}.", URL_SAFE_NO_PAD.encode(payload)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::claims::IdTokenClaims;

    fn claims() -> IdTokenClaims {
        IdTokenClaims::base("https://idp.example", "alice", "c1", 1_700_000_000, "j1")
    }

    #[test]
    fn unsigned_tokens_have_an_empty_signature_segment() {
        let jwt = encode_unsigned(&claims()).unwrap();
        let segments: Vec<_> = jwt.split('.').collect();
        assert_eq!(segments.len(), 3);
        assert!(segments[2].is_empty());

        let header: serde_json::Value =
            serde_json::from_slice(&URL_SAFE_NO_PAD.decode(segments[0]).unwrap()).unwrap();
        assert_eq!(header["alg"], "none");
    }

    #[test]
    fn hmac_signing_round_trips_with_the_secret() {
        let jwt =
            sign_with_client_secret(SigningAlgorithm::Hs256, "s3cret", "srv-key", &claims())
                .unwrap();

        let mut validation = jsonwebtoken::Validation::new(jsonwebtoken::Algorithm::HS256);
        validation.set_audience(&["c1"]);
        validation.validate_exp = false;
        validation.required_spec_claims.remove("exp");
        let decoded = jsonwebtoken::decode::<IdTokenClaims>(
            &jwt,
            &jsonwebtoken::DecodingKey::from_secret(b"s3cret"),
            &validation,
        )
        .unwrap();
        assert_eq!(decoded.claims.sub, "alice");
        assert_eq!(decoded.header.kid.as_deref(), Some("srv-key"));
    }

    #[test]
    fn asymmetric_algorithms_are_rejected_for_client_secrets() {
        let err = sign_with_client_secret(SigningAlgorithm::Rs256, "s3cret", "k", &claims())
            .unwrap_err();
        assert!(matches!(err, OidcError::TokenSigning(_)));
    }
}
