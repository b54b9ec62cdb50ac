//! Domain Layer
//!
//! Pure session types and rules. No I/O.

pub mod config;
pub mod feedback;
pub mod identity;
pub mod state;
pub mod verification;

pub use config::{ApiConfig, PortalConfig, SessionConfig};
pub use feedback::{FeedbackCategory, FeedbackDraft};
pub use identity::{decode_identity, IdentityRecord};
pub use state::{Screen, SessionState, Stage};
pub use verification::{
    normalize_identifier, PersistedVerification, VerificationRecord, MAX_IDENTIFIER_LEN,
};
