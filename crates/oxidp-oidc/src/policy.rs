//! Re-authentication policy for `prompt` and `max_age`.
//!
//! Runs after validation and decides whether the flow proceeds as-is,
//! redirects back to the client, or is denied. Forcing re-login is
//! expressed by clearing the session's authentication; the upstream IdP
//! flow then sends the user through login when it finds none.

use chrono::{DateTime, Utc};
use oxidp_session::FlowSession;
use tracing::{debug, info, warn};

use crate::client::Client;
use crate::error::OidcResult;
use crate::request::AuthorizationRequest;
use crate::types::{params, parse_prompts, Prompt};

/// Final disposition of the policy check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    /// Continue the flow, possibly with a cleared authentication that
    /// causes a login redirect upstream.
    Proceed,
    /// Redirect the user agent to the given URL.
    Redirect(String),
    /// Deny the request outright.
    AccessDenied,
}

/// Evaluates `prompt` and `max_age` semantics for one request.
#[derive(Debug, Default)]
pub struct ReauthPolicy;

impl ReauthPolicy {
    /// Creates the policy engine.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Applies the prompt/max-age rules to the request.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::OidcError::InvalidMaxAge`] when the
    /// request carries a non-numeric `max_age`.
    pub fn evaluate(
        &self,
        request: &AuthorizationRequest,
        client: &Client,
        session: &mut FlowSession,
        now: DateTime<Utc>,
    ) -> OidcResult<Disposition> {
        if let Some(prompt) = request.prompt() {
            debug!(prompt, "authorization request contains prompt");
            return Ok(self.check_prompts(prompt, request, client, session));
        }

        if request.extensions.contains_key(params::MAX_AGE) || client.default_max_age.is_some() {
            self.check_max_age(request, client, session, now)?;
        }
        Ok(Disposition::Proceed)
    }

    fn check_prompts(
        &self,
        prompt: &str,
        request: &AuthorizationRequest,
        client: &Client,
        session: &mut FlowSession,
    ) -> Disposition {
        let prompts = parse_prompts(prompt);

        if prompts.contains(&Prompt::None) {
            return self.check_prompt_none(request, client, session);
        }

        if prompts.contains(&Prompt::Login) {
            if session.prompted {
                // Already forced once in this session; toggle off.
                session.prompted = false;
                debug!("login prompt already handled in this session");
            } else {
                session.prompted = true;
                session.clear_authentication();
                debug!("login prompt forces re-authentication");
            }
            return Disposition::Proceed;
        }

        // Unsupported prompt values pass through without special
        // handling.
        debug!(prompt, "prompt is not supported; proceeding normally");
        Disposition::Proceed
    }

    fn check_prompt_none(
        &self,
        request: &AuthorizationRequest,
        client: &Client,
        session: &FlowSession,
    ) -> Disposition {
        if let Some(authn) = &session.authentication {
            debug!(principal = %authn.principal, "already logged in; continuing without prompt");
            return Disposition::Proceed;
        }

        info!(client_id = %client.client_id, "client requested no prompt without a login");
        if let Some(redirect_uri) = request.redirect_uri.as_deref() {
            let url = build_error_redirect(
                redirect_uri,
                params::LOGIN_REQUIRED,
                request.state(),
                request.is_implicit(),
            );
            debug!(url, "resolved login_required redirect");
            return Disposition::Redirect(url);
        }

        warn!("access denied: no redirect uri is specified for prompt=none");
        Disposition::AccessDenied
    }

    fn check_max_age(
        &self,
        request: &AuthorizationRequest,
        client: &Client,
        session: &mut FlowSession,
        now: DateTime<Utc>,
    ) -> OidcResult<()> {
        // Request value wins over the client's configured default.
        let max_age = match request.max_age()? {
            Some(value) => Some(value),
            None => client.default_max_age,
        };

        if let (Some(max_age), Some(auth_time)) = (max_age, session.auth_time()) {
            let age = (now - auth_time).num_seconds();
            debug!(age, max_age, "evaluating authentication age");
            if age > max_age {
                debug!("authentication is too old; clearing authentication context");
                session.clear_authentication();
            }
        }
        Ok(())
    }
}

/// Builds a redirect to `redirect_uri` carrying an error code and the
/// echoed `state`.
///
/// Parameters are fragment-encoded for implicit response types and
/// query-encoded otherwise.
#[must_use]
pub fn build_error_redirect(
    redirect_uri: &str,
    error: &str,
    state: Option<&str>,
    implicit: bool,
) -> String {
    let mut encoded = format!("{}={}", params::ERROR, urlencoding::encode(error));
    if let Some(state) = state.filter(|s| !s.is_empty()) {
        encoded.push_str(&format!("&{}={}", params::STATE, urlencoding::encode(state)));
    }

    if implicit {
        format!("{redirect_uri}#{encoded}")
    } else if redirect_uri.contains('?') {
        format!("{redirect_uri}&{encoded}")
    } else {
        format!("{redirect_uri}?{encoded}")
    }
}
