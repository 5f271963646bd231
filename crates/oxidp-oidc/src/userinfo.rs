//! UserInfo assembly from released attributes.
//!
//! The attribute resolution and consent subsystem is an external
//! collaborator; it hands this module a map from attribute name to
//! released values, already filtered by consent. The assembler turns
//! that map into a standard OIDC claims object.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::client::Client;
use crate::pairwise::PairwiseIdentifierService;
use crate::types::SubjectType;

/// A structured `address` claim. Only the formatted representation is
/// released by the attribute pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    /// Full mailing address as a single formatted string.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formatted: Option<String>,
}

/// The claims object served from the UserInfo endpoint and folded into
/// ID tokens.
///
/// Constructed fresh per request from attribute-release data; never
/// persisted here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserInfo {
    /// Subject identifier. Never empty.
    pub sub: String,
    /// Full name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Given name(s).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub given_name: Option<String>,
    /// Surname(s).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub family_name: Option<String>,
    /// Middle name(s).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub middle_name: Option<String>,
    /// Casual name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    /// Shorthand name the user goes by at the provider.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_username: Option<String>,
    /// Profile page URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    /// Profile picture URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
    /// Web page or blog URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    /// Gender.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    /// Time zone database name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zoneinfo: Option<String>,
    /// BCP47 locale.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    /// When the profile was last updated, as released.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    /// Birthday in ISO 8601 format.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birthdate: Option<String>,
    /// Preferred e-mail address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Whether the e-mail address has been verified.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_verified: Option<bool>,
    /// Preferred telephone number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    /// Whether the telephone number has been verified.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number_verified: Option<bool>,
    /// Structured postal address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
}

impl UserInfo {
    /// The claims object as a JSON value, for claim-by-name lookup.
    #[must_use]
    pub fn as_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

type Setter = fn(&mut UserInfo, &str);

fn set_bool(target: &mut Option<bool>, value: &str) {
    *target = Some(value.eq_ignore_ascii_case("true"));
}

/// Claim-name dispatch table. `address` is handled separately since it
/// populates a nested object rather than a flat field.
const SETTERS: &[(&str, Setter)] = &[
    ("sub", |u, v| u.sub = v.to_string()),
    ("name", |u, v| u.name = Some(v.to_string())),
    ("given_name", |u, v| u.given_name = Some(v.to_string())),
    ("family_name", |u, v| u.family_name = Some(v.to_string())),
    ("middle_name", |u, v| u.middle_name = Some(v.to_string())),
    ("nickname", |u, v| u.nickname = Some(v.to_string())),
    ("preferred_username", |u, v| {
        u.preferred_username = Some(v.to_string());
    }),
    ("profile", |u, v| u.profile = Some(v.to_string())),
    ("picture", |u, v| u.picture = Some(v.to_string())),
    ("website", |u, v| u.website = Some(v.to_string())),
    ("gender", |u, v| u.gender = Some(v.to_string())),
    ("zoneinfo", |u, v| u.zoneinfo = Some(v.to_string())),
    ("locale", |u, v| u.locale = Some(v.to_string())),
    ("updated_at", |u, v| u.updated_at = Some(v.to_string())),
    ("birthdate", |u, v| u.birthdate = Some(v.to_string())),
    ("email", |u, v| u.email = Some(v.to_string())),
    ("email_verified", |u, v| set_bool(&mut u.email_verified, v)),
    ("phone_number", |u, v| u.phone_number = Some(v.to_string())),
    ("phone_number_verified", |u, v| {
        set_bool(&mut u.phone_number_verified, v);
    }),
];

/// Builds [`UserInfo`] objects from released attributes.
#[derive(Debug, Default)]
pub struct UserInfoAssembler;

impl UserInfoAssembler {
    /// Creates the assembler.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Assembles the claims object for `principal` from the released
    /// attribute map.
    ///
    /// The principal name seeds both `sub` and `preferred_username`;
    /// released attributes whose names match a recognized claim then
    /// overwrite the matching field (first value wins, coerced to
    /// string). Unrecognized attribute names are ignored.
    #[must_use]
    pub fn assemble(
        &self,
        principal: &str,
        attributes: &HashMap<String, Vec<String>>,
    ) -> UserInfo {
        let mut userinfo = UserInfo {
            sub: principal.to_string(),
            preferred_username: Some(principal.to_string()),
            ..UserInfo::default()
        };

        for (name, values) in attributes {
            let Some(value) = values.first() else {
                continue;
            };
            if name == "address" {
                userinfo.address = Some(Address {
                    formatted: Some(value.clone()),
                });
                continue;
            }
            match SETTERS.iter().find(|(claim, _)| claim == name) {
                Some((_, setter)) => setter(&mut userinfo, value),
                None => debug!(attribute = %name, "no claim mapping for attribute"),
            }
        }

        // Safety net: sub must never end up empty.
        if userinfo.sub.is_empty() {
            warn!("assembled userinfo had an empty sub; resetting to principal");
            userinfo.sub = principal.to_string();
        }
        userinfo
    }

    /// Assembles the claims object for a specific client, substituting a
    /// pairwise subject identifier when the client is registered with
    /// `subject_type=pairwise`.
    #[must_use]
    pub fn assemble_for_client(
        &self,
        principal: &str,
        attributes: &HashMap<String, Vec<String>>,
        client: &Client,
        pairwise: &PairwiseIdentifierService,
    ) -> UserInfo {
        let mut userinfo = self.assemble(principal, attributes);
        if client.subject_type == SubjectType::Pairwise {
            let pairwise_sub = pairwise.identifier_for(&userinfo.sub, client);
            debug!(client_id = %client.client_id, "substituted pairwise subject");
            userinfo.sub = pairwise_sub;
        }
        userinfo
    }
}
