//! Error types for the OIDC provider core.
//!
//! Follows the OAuth 2.0 / `OpenID` Connect error vocabulary (RFC 6749,
//! `OpenID` Connect Core 1.0) for everything that reaches the wire, plus
//! flow-integrity errors for broken multi-step session state.

use thiserror::Error;

/// Errors raised by the authorization and token issuance pipeline.
#[derive(Debug, Error)]
pub enum OidcError {
    /// No `client_id` parameter was present in the authorization request.
    #[error("no client id is specified in the authorization request")]
    MissingClientId,

    /// The client id did not resolve to a registered client.
    #[error("unknown client: {0}")]
    UnknownClient(String),

    /// The supplied redirect URI is not registered for the client.
    #[error("redirect uri {redirect_uri} is not registered for client {client_id}")]
    RedirectUriMismatch {
        /// Client the request named.
        client_id: String,
        /// Redirect URI the request carried.
        redirect_uri: String,
    },

    /// The `max_age` extension was not a valid integer.
    #[error("invalid max_age value: {0}")]
    InvalidMaxAge(String),

    /// The request is invalid for a reason outside the specific variants.
    #[error("invalid_request: {0}")]
    InvalidRequest(String),

    /// No authorization request was found in the flow session.
    #[error("authorization request could not be loaded from session")]
    MissingAuthorizationContext,

    /// No consent response was stashed in the flow session.
    #[error("consent response could not be loaded from session")]
    MissingResponseContext,

    /// The flow session carries no CSRF token for the approval form.
    #[error("no csrf token is bound to the flow session")]
    MissingCsrfToken,

    /// The consent step was reached without a login in the session.
    #[error("no authentication is bound to the flow session")]
    MissingAuthentication,

    /// The client requires an encrypted ID token but no encrypter could
    /// be located for it.
    #[error("no encrypter available for client {0}")]
    EncrypterUnavailable(String),

    /// Token signing failed.
    #[error("token signing failed: {0}")]
    TokenSigning(String),

    /// Access denied.
    #[error("access denied: {0}")]
    AccessDenied(String),

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl OidcError {
    /// Returns the OAuth 2.0 error code for the wire.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::MissingClientId | Self::InvalidMaxAge(_) | Self::InvalidRequest(_) => {
                "invalid_request"
            }
            Self::UnknownClient(_) | Self::RedirectUriMismatch { .. } => "invalid_client",
            Self::AccessDenied(_) => "access_denied",
            Self::MissingAuthorizationContext
            | Self::MissingResponseContext
            | Self::MissingCsrfToken
            | Self::MissingAuthentication
            | Self::EncrypterUnavailable(_)
            | Self::TokenSigning(_)
            | Self::Internal(_) => "server_error",
        }
    }

    /// Returns the HTTP status for this error in a browser flow.
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        match self {
            Self::MissingClientId | Self::InvalidMaxAge(_) | Self::InvalidRequest(_) => 400,
            Self::UnknownClient(_) | Self::RedirectUriMismatch { .. } | Self::AccessDenied(_) => {
                403
            }
            Self::MissingAuthorizationContext
            | Self::MissingResponseContext
            | Self::MissingCsrfToken
            | Self::MissingAuthentication
            | Self::EncrypterUnavailable(_)
            | Self::TokenSigning(_)
            | Self::Internal(_) => 500,
        }
    }
}

/// Result type for OIDC operations.
pub type OidcResult<T> = Result<T, OidcError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_map_to_forbidden() {
        assert_eq!(OidcError::UnknownClient("c1".into()).http_status(), 403);
        assert_eq!(
            OidcError::RedirectUriMismatch {
                client_id: "c1".into(),
                redirect_uri: "https://rp.example/cb".into(),
            }
            .error_code(),
            "invalid_client"
        );
    }

    #[test]
    fn parse_errors_are_bad_requests() {
        let err = OidcError::InvalidMaxAge("abc".into());
        assert_eq!(err.http_status(), 400);
        assert_eq!(err.error_code(), "invalid_request");
    }

    #[test]
    fn flow_integrity_errors_are_server_errors() {
        assert_eq!(OidcError::MissingCsrfToken.http_status(), 500);
        assert_eq!(OidcError::MissingResponseContext.error_code(), "server_error");
    }
}
