//! Feedback form model.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::{IdentityRecord, VerificationRecord};
use crate::error::DraftError;

/// Kind of feedback being submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackCategory {
    Complaint,
    Suggestion,
    Compliment,
    Inquiry,
    #[default]
    Other,
}

impl FeedbackCategory {
    pub const ALL: [FeedbackCategory; 5] = [
        FeedbackCategory::Complaint,
        FeedbackCategory::Suggestion,
        FeedbackCategory::Compliment,
        FeedbackCategory::Inquiry,
        FeedbackCategory::Other,
    ];

    /// Wire value.
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedbackCategory::Complaint => "complaint",
            FeedbackCategory::Suggestion => "suggestion",
            FeedbackCategory::Compliment => "compliment",
            FeedbackCategory::Inquiry => "inquiry",
            FeedbackCategory::Other => "other",
        }
    }

    /// Display label.
    pub fn label(&self) -> &'static str {
        match self {
            FeedbackCategory::Complaint => "Complaint",
            FeedbackCategory::Suggestion => "Suggestion",
            FeedbackCategory::Compliment => "Compliment",
            FeedbackCategory::Inquiry => "Inquiry",
            FeedbackCategory::Other => "Other",
        }
    }
}

impl fmt::Display for FeedbackCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeedbackCategory {
    type Err = DraftError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        FeedbackCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| DraftError::UnknownCategory(s.to_string()))
    }
}

/// Feedback being composed on the submission screen.
///
/// Serializes to the flat JSON body the submission gateway expects. Unset
/// optional fields go out as empty strings, never `null`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FeedbackDraft {
    pub name: String,
    pub email: String,
    #[serde(default, serialize_with = "empty_if_none", deserialize_with = "none_if_blank")]
    pub phone: Option<String>,
    #[serde(rename = "feedback_type")]
    pub category: FeedbackCategory,
    pub subject: String,
    pub message: String,
    #[serde(
        rename = "meter_number",
        default,
        serialize_with = "empty_if_none",
        deserialize_with = "none_if_blank"
    )]
    pub account_id: Option<String>,
}

fn empty_if_none<S: Serializer>(value: &Option<String>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(value.as_deref().unwrap_or_default())
}

fn none_if_blank<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|v| !v.trim().is_empty()))
}

impl FeedbackDraft {
    /// A fresh draft pre-filled from the session records.
    pub fn seeded(identity: &IdentityRecord, verification: Option<&VerificationRecord>) -> Self {
        Self {
            name: identity.display_name.clone().unwrap_or_default(),
            email: identity.email.clone(),
            phone: None,
            category: FeedbackCategory::default(),
            subject: String::new(),
            message: String::new(),
            account_id: verification.map(|v| v.account_id.clone()),
        }
    }

    /// Clear user input back to the seeded values, as after a successful
    /// submission.
    pub fn reset(&mut self, identity: &IdentityRecord, verification: Option<&VerificationRecord>) {
        *self = Self::seeded(identity, verification);
    }

    /// Required fields must be non-blank.
    pub fn validate(&self) -> Result<(), DraftError> {
        let required = [
            ("name", &self.name),
            ("email", &self.email),
            ("subject", &self.subject),
            ("message", &self.message),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(DraftError::MissingField(field));
            }
        }
        Ok(())
    }
}
