//! Verified meter accounts.

use serde::{Deserialize, Serialize};

use super::IdentityRecord;
use crate::error::IdentifierError;

/// Longest meter number the registry accepts.
pub const MAX_IDENTIFIER_LEN: usize = 20;

/// A meter account the registry confirmed.
///
/// Field names follow the registry's wire format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationRecord {
    #[serde(rename = "meter_number")]
    pub account_id: String,
    #[serde(rename = "customer_name")]
    pub owner_name: String,
    #[serde(
        rename = "customer_address",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub owner_address: Option<String>,
}

/// Verification record as written to the session store: bound to the
/// subject it was verified for, so a record left behind by another login
/// is detected on restore.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedVerification {
    pub subject_id: String,
    #[serde(flatten)]
    pub record: VerificationRecord,
}

impl PersistedVerification {
    pub fn bind(identity: &IdentityRecord, record: VerificationRecord) -> Self {
        Self {
            subject_id: identity.subject_id.clone(),
            record,
        }
    }

    pub fn belongs_to(&self, identity: &IdentityRecord) -> bool {
        self.subject_id == identity.subject_id
    }
}

/// Normalize user input into the form the registry stores: trimmed and
/// upper-cased.
pub fn normalize_identifier(input: &str) -> Result<String, IdentifierError> {
    let normalized = input.trim().to_uppercase();
    if normalized.is_empty() {
        return Err(IdentifierError::Empty);
    }
    let len = normalized.chars().count();
    if len > MAX_IDENTIFIER_LEN {
        return Err(IdentifierError::TooLong {
            len,
            max: MAX_IDENTIFIER_LEN,
        });
    }
    Ok(normalized)
}
