//! Per-flow session state carried across authorization redirects.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::authn::Authentication;

/// State of one authorization flow, persisted between the authorize,
/// login, consent and token steps.
///
/// The raw authorization request parameters are stashed here after
/// validation so later steps can rebuild the request without re-parsing
/// the wire; the consent preview is stashed as JSON between the
/// pre-approval and post-approval steps.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FlowSession {
    /// Session identifier.
    pub id: String,

    /// Raw parameters of the validated authorization request
    /// (first-value-wins, as received).
    pub request_parameters: Option<HashMap<String, String>>,

    /// Client id resolved during validation.
    pub client_id: Option<String>,

    /// Login hint saved from the request extensions, if any.
    pub login_hint: Option<String>,

    /// Whether a `prompt=login` has already forced re-authentication in
    /// this session. Toggles off after one use.
    pub prompted: bool,

    /// Current authentication, if the user has logged in. Cleared by the
    /// policy engine to force re-login.
    pub authentication: Option<Authentication>,

    /// CSRF token required by the approval form.
    pub csrf_token: Option<String>,

    /// Consent preview stashed between the pre- and post-approval steps.
    pub consent_response: Option<serde_json::Value>,

    /// When this session was created.
    pub created_at: DateTime<Utc>,
}

impl FlowSession {
    /// Creates an empty flow session with the given id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            created_at: Utc::now(),
            ..Self::default()
        }
    }

    /// Records a login, replacing any previous authentication.
    pub fn set_authentication(&mut self, authentication: Authentication) {
        self.authentication = Some(authentication);
    }

    /// Clears the current authentication, forcing re-login upstream.
    pub fn clear_authentication(&mut self) {
        self.authentication = None;
    }

    /// The authentication timestamp recorded at last login, if any.
    #[must_use]
    pub fn auth_time(&self) -> Option<DateTime<Utc>> {
        self.authentication.as_ref().map(|a| a.auth_time)
    }

    /// Stashes the validated request parameters and resolved client.
    pub fn stash_request(&mut self, parameters: HashMap<String, String>, client_id: &str) {
        self.request_parameters = Some(parameters);
        self.client_id = Some(client_id.to_string());
    }

    /// Saves or removes the login hint, mirroring the request extensions.
    pub fn set_login_hint(&mut self, hint: Option<String>) {
        self.login_hint = hint;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stash_and_clear_authentication() {
        let mut session = FlowSession::new("s1");
        assert!(session.auth_time().is_none());

        session.set_authentication(Authentication::new("alice", Utc::now()));
        assert!(session.auth_time().is_some());

        session.clear_authentication();
        assert!(session.authentication.is_none());
    }

    #[test]
    fn stash_request_records_client() {
        let mut session = FlowSession::new("s1");
        let mut params = HashMap::new();
        params.insert("client_id".to_string(), "c1".to_string());
        session.stash_request(params, "c1");

        assert_eq!(session.client_id.as_deref(), Some("c1"));
        assert!(session.request_parameters.is_some());
    }
}
