//! Derived session state and screen routing.

use std::fmt;

use super::{IdentityRecord, VerificationRecord};

/// Coarse stage of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Unauthenticated,
    Authenticated,
    Verified,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Unauthenticated => write!(f, "unauthenticated"),
            Stage::Authenticated => write!(f, "authenticated"),
            Stage::Verified => write!(f, "verified"),
        }
    }
}

/// Session state. Never stored directly; rebuilt from the persisted records.
///
/// `Verified` carries the identity it was verified for, so it cannot exist
/// without the `Authenticated` data.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Unauthenticated,
    Authenticated(IdentityRecord),
    Verified(IdentityRecord, VerificationRecord),
}

impl SessionState {
    pub fn stage(&self) -> Stage {
        match self {
            SessionState::Unauthenticated => Stage::Unauthenticated,
            SessionState::Authenticated(_) => Stage::Authenticated,
            SessionState::Verified(_, _) => Stage::Verified,
        }
    }

    pub fn identity(&self) -> Option<&IdentityRecord> {
        match self {
            SessionState::Unauthenticated => None,
            SessionState::Authenticated(identity) | SessionState::Verified(identity, _) => {
                Some(identity)
            }
        }
    }

    pub fn verification(&self) -> Option<&VerificationRecord> {
        match self {
            SessionState::Verified(_, verification) => Some(verification),
            _ => None,
        }
    }

    /// Which screen the UI shows for this state.
    pub fn screen(&self, require_verification: bool) -> Screen {
        match (self, require_verification) {
            (SessionState::Unauthenticated, _) => Screen::Login,
            (SessionState::Authenticated(_), true) => Screen::Verification,
            (SessionState::Authenticated(_), false) | (SessionState::Verified(_, _), _) => {
                Screen::Feedback
            }
        }
    }
}

/// Top-level screens of the portal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Screen {
    Login,
    Verification,
    Feedback,
}
