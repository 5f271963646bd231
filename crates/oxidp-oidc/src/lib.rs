//! # oxidp-oidc
//!
//! `OpenID` Connect provider core layered onto a SAML identity provider.
//!
//! This crate implements the authorization-request lifecycle and the
//! token/claims issuance pipeline:
//! - Authorization request validation against registered client metadata
//! - `prompt`/`max_age` re-authentication policy
//! - Consent/approval screen data with the GRAS heuristic
//! - Scope to claim translation and `UserInfo` assembly, including
//!   pairwise subject substitution
//! - Signed/encrypted ID token minting with ACR/AMR propagation
//! - Registration and resource access token issuance
//! - Discovery document post-processing
//!
//! Authentication itself, endpoint HTTP plumbing and key management stay
//! outside: the surrounding IdP supplies an authentication result, and
//! key material enters through the [`keys`] traits.
//!
//! ## Modules
//!
//! - [`claims`] - ID token claim sets
//! - [`client`] - Registered client metadata and the scope registry
//! - [`consent`] - Consent/approval response building
//! - [`discovery`] - Discovery document post-processing
//! - [`error`] - Error types following the RFC 6749 vocabulary
//! - [`keys`] - Signing and encryption key seams
//! - [`pairwise`] - Pairwise subject identifiers
//! - [`policy`] - `prompt`/`max_age` re-authentication policy
//! - [`registration`] - Registration and resource access tokens
//! - [`request`] - The incoming authorization request
//! - [`token`] - ID token minting and the token entity model
//! - [`translator`] - Scope to claim-name translation
//! - [`types`] - Common OIDC types and constants
//! - [`userinfo`] - `UserInfo` assembly from released attributes
//! - [`validator`] - Authorization request validation

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod claims;
pub mod client;
pub mod consent;
pub mod discovery;
pub mod error;
pub mod keys;
pub mod pairwise;
pub mod policy;
pub mod registration;
pub mod request;
pub mod token;
pub mod translator;
pub mod types;
pub mod userinfo;
pub mod validator;

pub use claims::IdTokenClaims;
pub use client::{Client, ClientStore, ScopeRegistry, SystemScope};
pub use consent::{ApprovalStore, ConsentDisposition, ConsentResponse, ConsentResponseBuilder};
pub use discovery::{DiscoveryConfig, DiscoveryPostProcessor};
pub use error::{OidcError, OidcResult};
pub use keys::{EncrypterService, LocalSigningKeyService, NoEncrypters, SigningKeyService};
pub use pairwise::PairwiseIdentifierService;
pub use policy::{Disposition, ReauthPolicy};
pub use registration::RegistrationTokenIssuer;
pub use request::AuthorizationRequest;
pub use token::{IdTokenMinter, TokenConfig, TokenEntity, TokenStore};
pub use translator::ScopeClaimTranslator;
pub use types::{Prompt, ResponseType, ResponseTypes, SigningAlgorithm, SubjectType};
pub use userinfo::{Address, UserInfo, UserInfoAssembler};
pub use validator::{AuthorizationRequestValidator, ValidatedRequest};
