//! # oxidp-session
//!
//! Session-scoped state for the OIDC authorization flow.
//!
//! A browser-driven authorization flow spans several redirects: authorize,
//! login at the surrounding IdP, consent, token issuance. The state that
//! ties those steps together lives in an explicit [`FlowSession`] struct
//! persisted by a [`SessionManager`], rather than in ambient
//! request-thread state.
//!
//! ## Modules
//!
//! - [`authn`] - The authentication result consumed from the external IdP
//! - [`flow`] - Per-flow session state carried across redirects
//! - [`manager`] - Session persistence and CSRF token generation

#![deny(missing_docs)]

pub mod authn;
pub mod flow;
pub mod manager;

pub use authn::{Authentication, ACR_AUTHORITY_PREFIX, AMR_AUTHORITY_PREFIX};
pub use flow::FlowSession;
pub use manager::SessionManager;
