//! Authorization request validation.
//!
//! Validates an incoming request against registered client metadata and
//! stashes the validated request in the flow session so the later steps
//! of the browser flow (login, consent, token issuance) can pick it up.

use std::collections::HashMap;

use oxidp_session::FlowSession;
use tracing::debug;

use crate::client::{Client, ClientStore};
use crate::error::{OidcError, OidcResult};
use crate::request::AuthorizationRequest;

/// A validated request together with its resolved client.
#[derive(Debug, Clone)]
pub struct ValidatedRequest {
    /// The parsed, validated authorization request.
    pub request: AuthorizationRequest,
    /// The registered client it is bound to.
    pub client: Client,
}

/// Validates authorization requests against the client store.
#[derive(Debug)]
pub struct AuthorizationRequestValidator<'a> {
    clients: &'a ClientStore,
}

impl<'a> AuthorizationRequestValidator<'a> {
    /// Creates a validator over the given client store.
    #[must_use]
    pub const fn new(clients: &'a ClientStore) -> Self {
        Self { clients }
    }

    /// Validates the raw request parameters and binds the result to a
    /// registered client.
    ///
    /// On success the validated request parameters and login hint are
    /// persisted into `session` for the later flow steps.
    ///
    /// # Errors
    ///
    /// - [`OidcError::MissingClientId`] when no `client_id` is present.
    /// - [`OidcError::UnknownClient`] when the client is not registered.
    /// - [`OidcError::RedirectUriMismatch`] when a redirect URI is
    ///   supplied but is not a literal member of the client's allow-list.
    /// - [`OidcError::InvalidRequest`] for an implicit response type
    ///   without a nonce.
    pub fn validate(
        &self,
        parameters: &HashMap<String, String>,
        session: &mut FlowSession,
    ) -> OidcResult<ValidatedRequest> {
        let request = AuthorizationRequest::from_parameters(parameters);
        if request.client_id.is_empty() {
            return Err(OidcError::MissingClientId);
        }

        if request.is_implicit() && request.nonce().is_none() {
            return Err(OidcError::InvalidRequest(
                "nonce is required for implicit response types".to_string(),
            ));
        }

        debug!(client_id = %request.client_id, "loading client");
        let client = self
            .clients
            .get(&request.client_id)
            .ok_or_else(|| OidcError::UnknownClient(request.client_id.clone()))?;

        self.ensure_redirect_uri_is_authorized(&request, &client)?;

        session.stash_request(parameters.clone(), &client.client_id);
        session.set_login_hint(request.login_hint().map(str::to_string));
        debug!(client_id = %client.client_id, "saved authorization request into session");

        Ok(ValidatedRequest { request, client })
    }

    fn ensure_redirect_uri_is_authorized(
        &self,
        request: &AuthorizationRequest,
        client: &Client,
    ) -> OidcResult<()> {
        match request.redirect_uri.as_deref() {
            None => Ok(()),
            Some(uri) if client.is_redirect_uri_registered(uri) => Ok(()),
            Some(uri) => Err(OidcError::RedirectUriMismatch {
                client_id: client.client_id.clone(),
                redirect_uri: uri.to_string(),
            }),
        }
    }
}
