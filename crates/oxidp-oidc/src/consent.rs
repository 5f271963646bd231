//! Consent/approval response building.
//!
//! Between the login and token steps the user sees an approval screen
//! listing the requested scopes and a preview of the claims that would
//! be released. This module assembles that screen's data from the
//! stashed authorization request, stashes it in the flow session for the
//! approval form's post-back, and computes the "generally recognized as
//! safe" heuristic that suppresses the first-time-client warning.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use oxidp_session::FlowSession;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::client::{Client, ScopeRegistry, SystemScope};
use crate::error::{OidcError, OidcResult};
use crate::policy::build_error_redirect;
use crate::request::AuthorizationRequest;
use crate::translator::ScopeClaimTranslator;
use crate::types::{params, parse_prompts, Prompt};
use crate::userinfo::UserInfo;

/// A client is "generally recognized as safe" only when the user has
/// approved it more than this many times before.
const GRAS_MIN_APPROVALS: u32 = 1;

/// And only when the client registration is older than this.
const GRAS_MIN_CLIENT_AGE_DAYS: i64 = 7;

/// Per-user approval counters, keyed by (principal, client id).
pub type ApprovalStore = oxidp_store::KeyedStore<(String, String), u32>;

/// Data backing the consent screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsentResponse {
    /// Client asking for approval.
    pub client_id: String,

    /// Display name, when registered.
    pub client_name: Option<String>,

    /// Requested scopes in display order: system scopes in canonical
    /// registry order first, then custom scopes in request order.
    pub scopes: Vec<SystemScope>,

    /// Preview of the claims that would be released: JSON primitives
    /// only. Structured claims stay out of the preview but remain in the
    /// final UserInfo and ID token.
    pub claims: BTreeMap<String, serde_json::Value>,

    /// Contact addresses of the client's operators.
    pub contacts: Vec<String>,

    /// Whether the first-time-client warning is suppressed.
    pub gras: bool,

    /// How many times this user has approved this client before.
    pub approval_count: u32,

    /// CSRF token the approval form must echo.
    pub csrf_token: String,
}

/// Outcome of preparing the consent step.
#[derive(Debug, Clone, PartialEq)]
pub enum ConsentDisposition {
    /// Render the approval screen with this data.
    Render(ConsentResponse),
    /// Skip the screen and redirect the user agent back to the client.
    Redirect(String),
}

/// Builds consent responses for the approval screen.
#[derive(Debug)]
pub struct ConsentResponseBuilder<'a> {
    registry: &'a ScopeRegistry,
    translator: ScopeClaimTranslator,
    approvals: &'a ApprovalStore,
}

impl<'a> ConsentResponseBuilder<'a> {
    /// Creates a builder over the scope registry and approval counters.
    #[must_use]
    pub const fn new(registry: &'a ScopeRegistry, approvals: &'a ApprovalStore) -> Self {
        Self {
            registry,
            translator: ScopeClaimTranslator::new(),
            approvals,
        }
    }

    /// Prepares the consent step from the stashed authorization request.
    ///
    /// When the stashed request carries `prompt=none` the screen cannot
    /// be shown; the flow redirects back to the client with
    /// `error=interaction_required` instead.
    ///
    /// On the render path the built response is also stashed into the
    /// session for [`Self::resume`] after the form posts back.
    ///
    /// # Errors
    ///
    /// - [`OidcError::MissingAuthorizationContext`] when no request was
    ///   stashed in the session.
    /// - [`OidcError::MissingCsrfToken`] when the session carries no
    ///   CSRF token.
    /// - [`OidcError::MissingAuthentication`] when the consent step was
    ///   reached without a login.
    /// - [`OidcError::AccessDenied`] when `prompt=none` applies but no
    ///   redirect URI is available to report `interaction_required` on.
    pub fn prepare(
        &self,
        session: &mut FlowSession,
        client: &Client,
        userinfo: &UserInfo,
        now: DateTime<Utc>,
    ) -> OidcResult<ConsentDisposition> {
        let parameters = session
            .request_parameters
            .clone()
            .ok_or(OidcError::MissingAuthorizationContext)?;
        let request = AuthorizationRequest::from_parameters(&parameters);

        let csrf_token = session
            .csrf_token
            .clone()
            .ok_or(OidcError::MissingCsrfToken)?;

        if let Some(prompt) = request.prompt() {
            if parse_prompts(prompt).contains(&Prompt::None) {
                info!(client_id = %client.client_id, "consent required but prompting is disallowed");
                let Some(redirect_uri) = request.redirect_uri.as_deref() else {
                    return Err(OidcError::AccessDenied(
                        "interaction required but no redirect uri is available".to_string(),
                    ));
                };
                let url = build_error_redirect(
                    redirect_uri,
                    params::INTERACTION_REQUIRED,
                    request.state(),
                    request.is_implicit(),
                );
                return Ok(ConsentDisposition::Redirect(url));
            }
        }

        let principal = session
            .authentication
            .as_ref()
            .map(|a| a.principal.clone())
            .ok_or(OidcError::MissingAuthentication)?;
        let approval_count = self.approval_count(&principal, &client.client_id);

        let response = ConsentResponse {
            client_id: client.client_id.clone(),
            client_name: client.client_name.clone(),
            scopes: self.registry.sort_for_display(&request.scopes),
            claims: self.claims_preview(&request.scopes, userinfo),
            contacts: client.contacts.clone(),
            gras: self.is_generally_recognized_as_safe(approval_count, client, now),
            approval_count,
            csrf_token,
        };

        session.consent_response = serde_json::to_value(&response).ok();
        debug!(client_id = %client.client_id, "stashed consent response into session");
        Ok(ConsentDisposition::Render(response))
    }

    /// Re-reads the stashed consent response after the approval form
    /// posts back.
    ///
    /// # Errors
    ///
    /// Returns [`OidcError::MissingResponseContext`] when no response was
    /// stashed, which means the approval step was reached out of order.
    pub fn resume(&self, session: &FlowSession) -> OidcResult<ConsentResponse> {
        session
            .consent_response
            .clone()
            .and_then(|value| serde_json::from_value(value).ok())
            .ok_or(OidcError::MissingResponseContext)
    }

    /// Records one approval of `client_id` by `principal`.
    pub fn record_approval(&self, principal: &str, client_id: &str) {
        let key = (principal.to_string(), client_id.to_string());
        if !self.approvals.update(&key, |count| *count += 1) {
            self.approvals.insert(key, 1);
        }
    }

    fn approval_count(&self, principal: &str, client_id: &str) -> u32 {
        self.approvals
            .get(&(principal.to_string(), client_id.to_string()))
            .unwrap_or(0)
    }

    fn is_generally_recognized_as_safe(
        &self,
        approval_count: u32,
        client: &Client,
        now: DateTime<Utc>,
    ) -> bool {
        let approved_before = approval_count > GRAS_MIN_APPROVALS;
        let established = client
            .created_at
            .is_some_and(|at| now - at > Duration::days(GRAS_MIN_CLIENT_AGE_DAYS));
        approved_before && established
    }

    fn claims_preview(
        &self,
        scopes: &[String],
        userinfo: &UserInfo,
    ) -> BTreeMap<String, serde_json::Value> {
        let json = userinfo.as_json();
        let mut preview = BTreeMap::new();
        for claim in self.translator.claims_for_scopes(scopes) {
            let Some(value) = json.get(claim) else {
                continue;
            };
            // Structured claims (address) stay out of the preview.
            if value.is_object() || value.is_array() {
                debug!(claim, "omitting structured claim from consent preview");
                continue;
            }
            preview.insert(claim.to_string(), value.clone());
        }
        preview
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxidp_session::Authentication;
    use std::collections::HashMap;

    fn stash(session: &mut FlowSession, pairs: &[(&str, &str)]) {
        let parameters: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        session.stash_request(parameters, "c1");
    }

    fn ready_session(pairs: &[(&str, &str)]) -> FlowSession {
        let mut session = FlowSession::new("s1");
        session.set_authentication(Authentication::new("alice", Utc::now()));
        session.csrf_token = Some("csrf-1".to_string());
        stash(&mut session, pairs);
        session
    }

    fn userinfo() -> UserInfo {
        UserInfo {
            sub: "alice".to_string(),
            given_name: Some("Alice".to_string()),
            email: Some("alice@example.edu".to_string()),
            address: Some(crate::userinfo::Address {
                formatted: Some("1 Main St".to_string()),
            }),
            ..UserInfo::default()
        }
    }

    #[test]
    fn missing_stashed_request_aborts() {
        let registry = ScopeRegistry::standard();
        let approvals = ApprovalStore::new();
        let builder = ConsentResponseBuilder::new(&registry, &approvals);
        let mut session = FlowSession::new("s1");
        session.csrf_token = Some("csrf-1".to_string());

        let err = builder
            .prepare(&mut session, &Client::new("c1"), &userinfo(), Utc::now())
            .unwrap_err();
        assert!(matches!(err, OidcError::MissingAuthorizationContext));
    }

    #[test]
    fn missing_csrf_token_aborts() {
        let registry = ScopeRegistry::standard();
        let approvals = ApprovalStore::new();
        let builder = ConsentResponseBuilder::new(&registry, &approvals);
        let mut session = FlowSession::new("s1");
        stash(&mut session, &[("client_id", "c1"), ("scope", "openid")]);

        let err = builder
            .prepare(&mut session, &Client::new("c1"), &userinfo(), Utc::now())
            .unwrap_err();
        assert!(matches!(err, OidcError::MissingCsrfToken));
    }

    #[test]
    fn missing_authentication_aborts() {
        let registry = ScopeRegistry::standard();
        let approvals = ApprovalStore::new();
        let builder = ConsentResponseBuilder::new(&registry, &approvals);
        let mut session = FlowSession::new("s1");
        session.csrf_token = Some("csrf-1".to_string());
        stash(&mut session, &[("client_id", "c1"), ("scope", "openid")]);

        let err = builder
            .prepare(&mut session, &Client::new("c1"), &userinfo(), Utc::now())
            .unwrap_err();
        assert!(matches!(err, OidcError::MissingAuthentication));
    }

    #[test]
    fn preview_surfaces_primitives_and_hides_structured_claims() {
        let registry = ScopeRegistry::standard();
        let approvals = ApprovalStore::new();
        let builder = ConsentResponseBuilder::new(&registry, &approvals);
        let mut session = ready_session(&[
            ("client_id", "c1"),
            ("scope", "openid profile email address"),
        ]);

        let disposition = builder
            .prepare(&mut session, &Client::new("c1"), &userinfo(), Utc::now())
            .unwrap();
        let ConsentDisposition::Render(response) = disposition else {
            panic!("expected render");
        };

        assert_eq!(response.claims["given_name"], serde_json::json!("Alice"));
        assert_eq!(response.claims["email"], serde_json::json!("alice@example.edu"));
        assert!(!response.claims.contains_key("address"));
        assert_eq!(response.csrf_token, "csrf-1");
        assert!(session.consent_response.is_some());
    }

    #[test]
    fn scopes_keep_canonical_order_with_custom_appended() {
        let registry = ScopeRegistry::standard();
        let approvals = ApprovalStore::new();
        let builder = ConsentResponseBuilder::new(&registry, &approvals);
        let mut session = ready_session(&[("client_id", "c1"), ("scope", "email custom openid")]);

        let ConsentDisposition::Render(response) = builder
            .prepare(&mut session, &Client::new("c1"), &userinfo(), Utc::now())
            .unwrap()
        else {
            panic!("expected render");
        };
        let values: Vec<_> = response.scopes.iter().map(|s| s.value.as_str()).collect();
        assert_eq!(values, vec!["openid", "email", "custom"]);
    }

    #[test]
    fn prompt_none_redirects_with_interaction_required() {
        let registry = ScopeRegistry::standard();
        let approvals = ApprovalStore::new();
        let builder = ConsentResponseBuilder::new(&registry, &approvals);
        let mut session = ready_session(&[
            ("client_id", "c1"),
            ("prompt", "none"),
            ("redirect_uri", "https://rp.example/cb"),
            ("state", "xyz"),
        ]);

        let disposition = builder
            .prepare(&mut session, &Client::new("c1"), &userinfo(), Utc::now())
            .unwrap();
        assert_eq!(
            disposition,
            ConsentDisposition::Redirect(
                "https://rp.example/cb?error=interaction_required&state=xyz".to_string()
            )
        );
    }

    #[test]
    fn prompt_none_without_redirect_uri_is_denied() {
        let registry = ScopeRegistry::standard();
        let approvals = ApprovalStore::new();
        let builder = ConsentResponseBuilder::new(&registry, &approvals);
        let mut session = ready_session(&[("client_id", "c1"), ("prompt", "none")]);

        let err = builder
            .prepare(&mut session, &Client::new("c1"), &userinfo(), Utc::now())
            .unwrap_err();
        assert!(matches!(err, OidcError::AccessDenied(_)));
    }

    #[test]
    fn gras_needs_repeat_approvals_and_an_established_client() {
        let registry = ScopeRegistry::standard();
        let approvals = ApprovalStore::new();
        let builder = ConsentResponseBuilder::new(&registry, &approvals);
        let now = Utc::now();
        let established = Client::new("c1").with_created_at(now - Duration::days(30));

        let render = |builder: &ConsentResponseBuilder<'_>, client: &Client| {
            let mut session = ready_session(&[("client_id", "c1"), ("scope", "openid")]);
            match builder.prepare(&mut session, client, &userinfo(), now).unwrap() {
                ConsentDisposition::Render(response) => response,
                ConsentDisposition::Redirect(url) => panic!("unexpected redirect to {url}"),
            }
        };

        // No prior approvals.
        assert!(!render(&builder, &established).gras);

        builder.record_approval("alice", "c1");
        builder.record_approval("alice", "c1");
        assert_eq!(render(&builder, &established).approval_count, 2);
        assert!(render(&builder, &established).gras);

        // Fresh registration stays flagged despite the approvals.
        let fresh = Client::new("c1").with_created_at(now - Duration::days(1));
        assert!(!render(&builder, &fresh).gras);
    }

    #[test]
    fn resume_requires_the_stashed_response() {
        let registry = ScopeRegistry::standard();
        let approvals = ApprovalStore::new();
        let builder = ConsentResponseBuilder::new(&registry, &approvals);

        let err = builder.resume(&FlowSession::new("s1")).unwrap_err();
        assert!(matches!(err, OidcError::MissingResponseContext));

        let mut session = ready_session(&[("client_id", "c1"), ("scope", "openid")]);
        builder
            .prepare(&mut session, &Client::new("c1"), &userinfo(), Utc::now())
            .unwrap();
        let resumed = builder.resume(&session).unwrap();
        assert_eq!(resumed.client_id, "c1");
    }
}
