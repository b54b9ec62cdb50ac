//! Inbound Ports (Driving Ports)
//!
//! The API the portal UI (or CLI) drives the session through.

use async_trait::async_trait;

use crate::domain::{FeedbackDraft, IdentityRecord, Screen, SessionState, VerificationRecord};
use crate::error::SessionError;

/// Session state machine API (Driving Port).
///
/// Records are handed out by value; the only way to change them is one of
/// the transitions below, which always replace whole records.
#[async_trait]
pub trait SessionApi: Send + Sync {
    /// Snapshot of the current state.
    fn state(&self) -> SessionState;

    /// Screen the UI should show for the current state.
    fn screen(&self) -> Screen;

    /// Unauthenticated → Authenticated.
    ///
    /// Decode failures leave the state untouched and write nothing.
    /// Logging in over an existing session replaces it.
    fn login(&self, credential: &str) -> Result<IdentityRecord, SessionError>;

    /// Authenticated/Verified → Verified.
    ///
    /// A rejection or transport failure changes nothing. Safe to retry.
    async fn submit_identifier(&self, identifier: &str) -> Result<VerificationRecord, SessionError>;

    /// Draft pre-filled for the feedback screen, if it is reachable.
    fn feedback_draft(&self) -> Option<FeedbackDraft>;

    /// Send a draft from the feedback screen.
    async fn submit_feedback(&self, draft: &FeedbackDraft) -> Result<(), SessionError>;

    /// Any state → Unauthenticated. Clears both persisted records. Never fails.
    fn logout(&self);
}
