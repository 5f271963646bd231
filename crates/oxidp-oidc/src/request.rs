//! The incoming authorization request.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{OidcError, OidcResult};
use crate::types::{params, ResponseTypes};

/// A parsed authorization request.
///
/// Immutable once constructed; lives for the duration of one
/// authorization flow and is stashed in the flow session (as its raw
/// parameters) between the authorize and consent steps.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthorizationRequest {
    /// Requesting client id, as received.
    pub client_id: String,

    /// Requested scope values, in request order.
    pub scopes: Vec<String>,

    /// Redirect URI, if supplied.
    pub redirect_uri: Option<String>,

    /// Requested response types.
    pub response_types: ResponseTypes,

    /// Everything else: `prompt`, `max_age`, `acr_values`, `nonce`,
    /// `login_hint`, `state`, and any recorded flow extensions.
    pub extensions: HashMap<String, String>,
}

impl AuthorizationRequest {
    /// Builds a request from first-value-wins query parameters.
    ///
    /// Unknown response-type tokens are ignored. Core parameters are
    /// lifted into fields; all others land in the extension map.
    #[must_use]
    pub fn from_parameters(parameters: &HashMap<String, String>) -> Self {
        let client_id = parameters.get("client_id").cloned().unwrap_or_default();
        let scopes = parameters
            .get("scope")
            .map(|s| s.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default();
        let redirect_uri = parameters.get("redirect_uri").cloned();
        let response_types = parameters
            .get("response_type")
            .map(|s| {
                let mut types = ResponseTypes::default();
                for token in s.split_whitespace() {
                    match token.parse() {
                        Ok(rt) => {
                            types.0.insert(rt);
                        }
                        Err(_) => debug!(token, "ignoring unknown response type"),
                    }
                }
                types
            })
            .unwrap_or_default();

        let extensions = parameters
            .iter()
            .filter(|(k, _)| {
                !matches!(k.as_str(), "client_id" | "scope" | "redirect_uri" | "response_type")
            })
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        Self {
            client_id,
            scopes,
            redirect_uri,
            response_types,
            extensions,
        }
    }

    /// The `prompt` extension, if present.
    #[must_use]
    pub fn prompt(&self) -> Option<&str> {
        self.extensions.get(params::PROMPT).map(String::as_str)
    }

    /// The `state` extension, if present.
    #[must_use]
    pub fn state(&self) -> Option<&str> {
        self.extensions.get(params::STATE).map(String::as_str)
    }

    /// The `nonce` extension, if present and non-empty.
    #[must_use]
    pub fn nonce(&self) -> Option<&str> {
        self.extensions
            .get(params::NONCE)
            .map(String::as_str)
            .filter(|n| !n.is_empty())
    }

    /// The `login_hint` extension, if present.
    #[must_use]
    pub fn login_hint(&self) -> Option<&str> {
        self.extensions.get(params::LOGIN_HINT).map(String::as_str)
    }

    /// The `max_age` extension parsed as integer seconds.
    ///
    /// # Errors
    ///
    /// Returns [`OidcError::InvalidMaxAge`] when the value is not a
    /// valid integer; this is fatal for the request.
    pub fn max_age(&self) -> OidcResult<Option<i64>> {
        match self.extensions.get(params::MAX_AGE) {
            None => Ok(None),
            Some(raw) => raw
                .parse::<i64>()
                .map(Some)
                .map_err(|_| OidcError::InvalidMaxAge(raw.clone())),
        }
    }

    /// Whether the request asks for an implicit or hybrid flow.
    #[must_use]
    pub fn is_implicit(&self) -> bool {
        self.response_types.is_implicit()
    }
}

/// Collapses raw query pairs into a first-value-wins parameter map.
#[must_use]
pub fn first_value_parameters<I, K, V>(pairs: I) -> HashMap<String, String>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    let mut map = HashMap::new();
    for (key, value) in pairs {
        map.entry(key.into()).or_insert_with(|| value.into());
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn core_parameters_are_lifted() {
        let request = AuthorizationRequest::from_parameters(&params(&[
            ("client_id", "c1"),
            ("scope", "openid profile"),
            ("redirect_uri", "https://rp.example/cb"),
            ("response_type", "code"),
            ("state", "xyz"),
            ("nonce", "n-1"),
        ]));

        assert_eq!(request.client_id, "c1");
        assert_eq!(request.scopes, vec!["openid", "profile"]);
        assert_eq!(request.redirect_uri.as_deref(), Some("https://rp.example/cb"));
        assert!(!request.is_implicit());
        assert_eq!(request.state(), Some("xyz"));
        assert_eq!(request.nonce(), Some("n-1"));
    }

    #[test]
    fn empty_nonce_reads_as_absent() {
        let request =
            AuthorizationRequest::from_parameters(&params(&[("client_id", "c1"), ("nonce", "")]));
        assert_eq!(request.nonce(), None);
    }

    #[test]
    fn max_age_parses_or_fails() {
        let ok =
            AuthorizationRequest::from_parameters(&params(&[("client_id", "c1"), ("max_age", "60")]));
        assert_eq!(ok.max_age().unwrap(), Some(60));

        let bad =
            AuthorizationRequest::from_parameters(&params(&[("client_id", "c1"), ("max_age", "soon")]));
        assert!(matches!(bad.max_age(), Err(OidcError::InvalidMaxAge(_))));
    }

    #[test]
    fn first_value_wins_on_multi_valued_params() {
        let map = first_value_parameters(vec![
            ("client_id", "first"),
            ("client_id", "second"),
            ("scope", "openid"),
        ]);
        assert_eq!(map.get("client_id").map(String::as_str), Some("first"));
    }

    #[test]
    fn unknown_response_types_are_ignored() {
        let request = AuthorizationRequest::from_parameters(&params(&[
            ("client_id", "c1"),
            ("response_type", "code badger"),
        ]));
        assert!(!request.is_implicit());
        assert_eq!(request.response_types.0.len(), 1);
    }
}
