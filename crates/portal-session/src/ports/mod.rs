//! Ports Layer
//!
//! Defines the interfaces (traits) for:
//! - Driving Ports (inbound) - API for the UI
//! - Driven Ports (outbound) - Storage and backend dependencies

pub mod inbound;
pub mod outbound;

pub use inbound::SessionApi;
pub use outbound::{
    BatchOperation, KeyValueStore, SubmissionGateway, SubmissionOutcome, TokenVerifier,
    UnsignedClaims, VerificationGateway, VerificationOutcome,
};
