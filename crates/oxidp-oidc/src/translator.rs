//! Scope to claim-name translation.
//!
//! A fixed table mapping the standard OIDC scopes to the claim names
//! they authorize for release. Unknown scopes map to the empty set.

use std::collections::HashSet;

use crate::types::scopes;

/// Claim names released by the `profile` scope.
pub const PROFILE_CLAIMS: [&str; 14] = [
    "name",
    "given_name",
    "family_name",
    "middle_name",
    "nickname",
    "preferred_username",
    "profile",
    "picture",
    "website",
    "gender",
    "zoneinfo",
    "locale",
    "updated_at",
    "birthdate",
];

/// Claim names released by the `email` scope.
pub const EMAIL_CLAIMS: [&str; 2] = ["email", "email_verified"];

/// Claim names released by the `phone` scope.
pub const PHONE_CLAIMS: [&str; 2] = ["phone_number", "phone_number_verified"];

/// Claim names released by the `address` scope.
pub const ADDRESS_CLAIMS: [&str; 1] = ["address"];

/// Translates scope values to OIDC claim names and back.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScopeClaimTranslator;

impl ScopeClaimTranslator {
    /// Creates the translator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// The claim names authorized by one scope value.
    ///
    /// Unknown scopes return the empty set.
    #[must_use]
    pub fn claims_for_scope(&self, scope: &str) -> HashSet<&'static str> {
        match scope {
            scopes::OPENID => HashSet::from(["sub"]),
            scopes::PROFILE => PROFILE_CLAIMS.into_iter().collect(),
            scopes::EMAIL => EMAIL_CLAIMS.into_iter().collect(),
            scopes::PHONE => PHONE_CLAIMS.into_iter().collect(),
            scopes::ADDRESS => ADDRESS_CLAIMS.into_iter().collect(),
            _ => HashSet::new(),
        }
    }

    /// The union of claim names authorized by a set of scope values.
    #[must_use]
    pub fn claims_for_scopes<S: AsRef<str>>(&self, scopes: &[S]) -> HashSet<&'static str> {
        scopes
            .iter()
            .flat_map(|s| self.claims_for_scope(s.as_ref()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_scope_releases_the_full_profile_table() {
        let translator = ScopeClaimTranslator::new();
        let claims = translator.claims_for_scope("profile");
        assert_eq!(claims.len(), PROFILE_CLAIMS.len());
        assert!(claims.contains("given_name"));
        assert!(claims.contains("birthdate"));
        assert!(!claims.contains("email"));
    }

    #[test]
    fn openid_scope_releases_only_sub() {
        let translator = ScopeClaimTranslator::new();
        assert_eq!(translator.claims_for_scope("openid"), HashSet::from(["sub"]));
    }

    #[test]
    fn unknown_scope_releases_nothing() {
        let translator = ScopeClaimTranslator::new();
        assert!(translator.claims_for_scope("unknown").is_empty());
        assert!(translator.claims_for_scope("").is_empty());
    }

    #[test]
    fn scope_union_merges_claims() {
        let translator = ScopeClaimTranslator::new();
        let claims = translator.claims_for_scopes(&["openid", "email", "bogus"]);
        assert!(claims.contains("sub"));
        assert!(claims.contains("email"));
        assert!(claims.contains("email_verified"));
        assert_eq!(claims.len(), 3);
    }
}
