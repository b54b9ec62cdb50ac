//! Error types for the portal session core.
//!
//! Every failure a transition can hit is caught at the `SessionService`
//! boundary and folded into a `SessionError`, which carries a
//! human-readable `user_message()` for the UI.

use thiserror::Error;

use crate::domain::Stage;

/// Shown when a gateway could not be reached or answered garbage.
pub const NETWORK_ERROR_MESSAGE: &str =
    "Network error. Please check your connection and try again.";

/// Shown when the verification gateway rejects without an explanation.
pub const DEFAULT_VERIFICATION_REJECTION: &str = "Invalid meter number. Please try again.";

/// Shown when the submission gateway rejects without an explanation.
pub const DEFAULT_SUBMISSION_REJECTION: &str = "Failed to submit feedback. Please try again.";

/// Shown for any credential that cannot be turned into an identity.
pub const LOGIN_FAILED_MESSAGE: &str = "Login failed. Please try again.";

/// Errors from decoding a provider credential into an identity.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("credential must have 3 dot-separated segments, found {found}")]
    MalformedToken { found: usize },

    #[error("credential payload is not valid base64url: {0}")]
    InvalidEncoding(String),

    #[error("credential payload is not valid JSON: {0}")]
    InvalidPayload(String),

    #[error("credential is missing required claim `{0}`")]
    MissingClaim(&'static str),

    #[error("credential rejected by token verifier: {0}")]
    Untrusted(String),
}

/// Errors from the key-value store backing the session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KVStoreError {
    #[error("I/O error: {message}")]
    IOError { message: String },

    #[error("could not lock {path}: {message}")]
    LockFailed { path: String, message: String },

    #[error("serialization error: {message}")]
    Serialization { message: String },
}

/// Errors from the HTTP gateways that are not a server-side rejection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    #[error("connection failed: {0}")]
    Connection(String),

    #[error("HTTP request failed: {0}")]
    Transport(String),

    #[error("failed to parse response: {0}")]
    MalformedResponse(String),
}

/// Local validation failures for a meter number.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierError {
    #[error("meter number is empty")]
    Empty,

    #[error("meter number has {len} characters, at most {max} allowed")]
    TooLong { len: usize, max: usize },
}

/// Local validation failures for a feedback draft.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DraftError {
    #[error("required field `{0}` is empty")]
    MissingField(&'static str),

    #[error("unknown feedback category: {0}")]
    UnknownCategory(String),
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("API base URL is empty")]
    EmptyBaseUrl,

    #[error("API base URL must start with http:// or https://, got {0}")]
    InvalidBaseUrl(String),

    #[error("session key namespace is empty")]
    EmptyNamespace,
}

/// Errors surfaced by session transitions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("login failed: {0}")]
    Decode(#[from] DecodeError),

    #[error("verification rejected: {message}")]
    VerificationRejected { message: String },

    #[error("submission rejected: {message}")]
    SubmissionRejected { message: String },

    #[error("gateway unavailable: {0}")]
    Transport(#[from] GatewayError),

    #[error("invalid meter number: {0}")]
    InvalidIdentifier(#[from] IdentifierError),

    #[error("invalid feedback: {0}")]
    InvalidDraft(#[from] DraftError),

    #[error("{operation} is not allowed while {stage}")]
    InvalidStage {
        operation: &'static str,
        stage: Stage,
    },

    #[error("meter verification is disabled for this deployment")]
    VerificationDisabled,

    #[error("session changed while the request was in flight")]
    SessionChanged,

    #[error("session store failure: {0}")]
    Storage(#[from] KVStoreError),
}

impl SessionError {
    /// Message suitable for an alert or inline error banner.
    pub fn user_message(&self) -> String {
        match self {
            SessionError::Decode(_) => LOGIN_FAILED_MESSAGE.to_string(),
            SessionError::VerificationRejected { message }
            | SessionError::SubmissionRejected { message } => message.clone(),
            SessionError::Transport(_) => NETWORK_ERROR_MESSAGE.to_string(),
            SessionError::InvalidIdentifier(IdentifierError::Empty) => {
                "Please enter your meter number.".to_string()
            }
            SessionError::InvalidIdentifier(IdentifierError::TooLong { max, .. }) => {
                format!("Meter number must be at most {max} characters.")
            }
            SessionError::InvalidDraft(DraftError::MissingField(field)) => {
                format!("Please fill in the {field} field.")
            }
            SessionError::InvalidDraft(DraftError::UnknownCategory(name)) => {
                format!("Unknown feedback type: {name}.")
            }
            SessionError::InvalidStage { stage, .. } => match stage {
                Stage::Unauthenticated => "Please sign in first.".to_string(),
                Stage::Authenticated => "Please verify your meter number first.".to_string(),
                Stage::Verified => "Your meter number is already verified.".to_string(),
            },
            SessionError::VerificationDisabled => {
                "Meter verification is not enabled for this portal.".to_string()
            }
            SessionError::SessionChanged => {
                "Your session changed while the request was in progress. Please try again."
                    .to_string()
            }
            SessionError::Storage(_) => "Could not save your session. Please try again.".to_string(),
        }
    }

    /// Whether the same action may simply be retried by the user.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SessionError::Transport(_)
                | SessionError::VerificationRejected { .. }
                | SessionError::SubmissionRejected { .. }
                | SessionError::SessionChanged
                | SessionError::Storage(_)
        )
    }
}
