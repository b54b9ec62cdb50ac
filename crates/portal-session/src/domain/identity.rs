//! # Identity Decoder
//!
//! Extracts an `IdentityRecord` from the identity provider's credential.
//!
//! The credential is a compact JWS (`header.payload.signature`). Only the
//! payload is read; the signature is NOT checked here. A successful decode
//! means "these are the claims the provider presented", nothing more. Any
//! authenticity check belongs to a `TokenVerifier` run before decoding.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::DecodeError;

/// The signed-in user as presented by the identity provider.
///
/// Serialized with the provider's claim names so a persisted record reads
/// the same as the token payload it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityRecord {
    pub email: String,
    #[serde(rename = "name", default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(rename = "picture", default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(rename = "sub")]
    pub subject_id: String,
}

impl IdentityRecord {
    /// Check the required fields of a record that did not come straight from
    /// `decode_identity` (e.g. one read back from disk).
    pub fn validate(&self) -> Result<(), DecodeError> {
        if self.email.trim().is_empty() {
            return Err(DecodeError::MissingClaim("email"));
        }
        if self.subject_id.trim().is_empty() {
            return Err(DecodeError::MissingClaim("sub"));
        }
        Ok(())
    }

    /// Name to greet the user with, falling back to the email address.
    pub fn greeting_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.email)
    }
}

/// Raw token payload. Every claim is optional here; requirements are
/// enforced when converting into an `IdentityRecord`.
#[derive(Debug, Default, Deserialize)]
struct IdentityClaims {
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    sub: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    picture: Option<String>,
}

impl IdentityClaims {
    fn into_identity(self) -> Result<IdentityRecord, DecodeError> {
        Ok(IdentityRecord {
            email: non_blank(self.email).ok_or(DecodeError::MissingClaim("email"))?,
            subject_id: non_blank(self.sub).ok_or(DecodeError::MissingClaim("sub"))?,
            display_name: non_blank(self.name),
            avatar_url: non_blank(self.picture),
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Decode a provider credential into an identity record.
///
/// Pure function: no I/O, no signature check.
pub fn decode_identity(credential: &str) -> Result<IdentityRecord, DecodeError> {
    let segments: Vec<&str> = credential.trim().split('.').collect();
    if segments.len() != 3 {
        return Err(DecodeError::MalformedToken {
            found: segments.len(),
        });
    }

    // Some issuers pad the payload even though JWS forbids it.
    let payload = segments[1].trim_end_matches('=');
    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|e| DecodeError::InvalidEncoding(e.to_string()))?;

    let claims: IdentityClaims =
        serde_json::from_slice(&bytes).map_err(|e| DecodeError::InvalidPayload(e.to_string()))?;

    claims.into_identity()
}
