//! Common OIDC types and constants.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// OIDC prompt values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Prompt {
    /// No UI should be displayed.
    None,
    /// Force re-authentication.
    Login,
    /// Force consent screen.
    Consent,
    /// Force account selection.
    SelectAccount,
}

/// Parses a space-separated `prompt` parameter into known values.
///
/// Unknown prompt tokens are dropped; the policy engine treats requests
/// carrying only unknown tokens the same as requests without special
/// prompt handling (pass-through).
#[must_use]
pub fn parse_prompts(prompt: &str) -> Vec<Prompt> {
    prompt
        .split_whitespace()
        .filter_map(|s| match s {
            "none" => Some(Prompt::None),
            "login" => Some(Prompt::Login),
            "consent" => Some(Prompt::Consent),
            "select_account" => Some(Prompt::SelectAccount),
            _ => None,
        })
        .collect()
}

/// OAuth 2.0 response types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseType {
    /// Authorization code response.
    Code,
    /// Implicit grant - access token.
    Token,
    /// `OpenID` Connect - ID token.
    IdToken,
}

impl fmt::Display for ResponseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Code => "code",
            Self::Token => "token",
            Self::IdToken => "id_token",
        };
        write!(f, "{s}")
    }
}

impl FromStr for ResponseType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "code" => Ok(Self::Code),
            "token" => Ok(Self::Token),
            "id_token" => Ok(Self::IdToken),
            _ => Err(format!("unknown response type: {s}")),
        }
    }
}

/// Combined response types of one request.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResponseTypes(pub HashSet<ResponseType>);

impl ResponseTypes {
    /// Whether the request uses an implicit or hybrid flow (any non-code
    /// response type present).
    #[must_use]
    pub fn is_implicit(&self) -> bool {
        self.0.contains(&ResponseType::Token) || self.0.contains(&ResponseType::IdToken)
    }

    /// Whether the `token` response type is requested.
    #[must_use]
    pub fn includes_token(&self) -> bool {
        self.0.contains(&ResponseType::Token)
    }
}

impl FromStr for ResponseTypes {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut types = HashSet::new();
        for part in s.split_whitespace() {
            types.insert(ResponseType::from_str(part)?);
        }
        Ok(Self(types))
    }
}

/// Subject identifier type for `OpenID` Connect clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SubjectType {
    /// Public subject identifier (same for all clients).
    #[default]
    Public,
    /// Pairwise subject identifier (different per client).
    Pairwise,
}

/// JWS signing algorithms for ID tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SigningAlgorithm {
    /// Unsigned ("plain") JWT.
    #[serde(rename = "none")]
    None,
    /// HMAC with SHA-256.
    #[serde(rename = "HS256")]
    Hs256,
    /// HMAC with SHA-384.
    #[serde(rename = "HS384")]
    Hs384,
    /// HMAC with SHA-512.
    #[serde(rename = "HS512")]
    Hs512,
    /// RSASSA-PKCS1-v1_5 with SHA-256.
    #[serde(rename = "RS256")]
    Rs256,
    /// RSASSA-PKCS1-v1_5 with SHA-384.
    #[serde(rename = "RS384")]
    Rs384,
    /// RSASSA-PKCS1-v1_5 with SHA-512.
    #[serde(rename = "RS512")]
    Rs512,
    /// ECDSA with P-256 and SHA-256.
    #[serde(rename = "ES256")]
    Es256,
    /// ECDSA with P-384 and SHA-384.
    #[serde(rename = "ES384")]
    Es384,
}

impl SigningAlgorithm {
    /// Whether this is one of the HMAC family signed with the client's
    /// own secret rather than the server key.
    #[must_use]
    pub const fn is_hmac(&self) -> bool {
        matches!(self, Self::Hs256 | Self::Hs384 | Self::Hs512)
    }

    /// The corresponding `jsonwebtoken` algorithm, or `None` for
    /// unsigned tokens.
    #[must_use]
    pub const fn jws_algorithm(&self) -> Option<jsonwebtoken::Algorithm> {
        use jsonwebtoken::Algorithm;
        match self {
            Self::None => None,
            Self::Hs256 => Some(Algorithm::HS256),
            Self::Hs384 => Some(Algorithm::HS384),
            Self::Hs512 => Some(Algorithm::HS512),
            Self::Rs256 => Some(Algorithm::RS256),
            Self::Rs384 => Some(Algorithm::RS384),
            Self::Rs512 => Some(Algorithm::RS512),
            Self::Es256 => Some(Algorithm::ES256),
            Self::Es384 => Some(Algorithm::ES384),
        }
    }

    /// The algorithm name as it appears on the wire.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Hs256 => "HS256",
            Self::Hs384 => "HS384",
            Self::Hs512 => "HS512",
            Self::Rs256 => "RS256",
            Self::Rs384 => "RS384",
            Self::Rs512 => "RS512",
            Self::Es256 => "ES256",
            Self::Es384 => "ES384",
        }
    }
}

impl fmt::Display for SigningAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Value marking a declared encryption algorithm or encoding as disabled.
pub const ALG_NONE: &str = "none";

/// Reserved scope markers and the synthetic client authority.
pub mod scopes {
    /// `OpenID` Connect scope (required for OIDC).
    pub const OPENID: &str = "openid";
    /// Profile scope.
    pub const PROFILE: &str = "profile";
    /// Email scope.
    pub const EMAIL: &str = "email";
    /// Address scope.
    pub const ADDRESS: &str = "address";
    /// Phone scope.
    pub const PHONE: &str = "phone";

    /// Reserved scope marking an ID token entity.
    pub const ID_TOKEN: &str = "id-token";
    /// Reserved scope marking a registration access token.
    pub const REGISTRATION_TOKEN: &str = "registration-token";
    /// Reserved scope marking a resource access token.
    pub const RESOURCE_TOKEN: &str = "resource-token";
}

/// Synthetic authority granted to client-bound token authentications.
pub const ROLE_CLIENT: &str = "ROLE_CLIENT";

/// Authorization request extension parameter names.
pub mod params {
    /// `prompt` parameter.
    pub const PROMPT: &str = "prompt";
    /// `max_age` parameter.
    pub const MAX_AGE: &str = "max_age";
    /// `nonce` parameter.
    pub const NONCE: &str = "nonce";
    /// `state` parameter.
    pub const STATE: &str = "state";
    /// `login_hint` parameter.
    pub const LOGIN_HINT: &str = "login_hint";
    /// `acr_values` parameter.
    pub const ACR_VALUES: &str = "acr_values";
    /// Extension recording the authentication timestamp in milliseconds.
    pub const AUTH_TIME: &str = "auth_time";
    /// Extension hinting that an ID token was requested.
    pub const ID_TOKEN: &str = "id_token";
    /// `error` response parameter.
    pub const ERROR: &str = "error";
    /// `login_required` error value for `prompt=none` failures.
    pub const LOGIN_REQUIRED: &str = "login_required";
    /// `interaction_required` error value for consent under `prompt=none`.
    pub const INTERACTION_REQUIRED: &str = "interaction_required";
}
