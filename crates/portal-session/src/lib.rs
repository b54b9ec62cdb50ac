//! # Portal Session
//!
//! Session core for the customer feedback portal.
//!
//! ## Architecture
//!
//! This crate follows Hexagonal Architecture (Ports & Adapters):
//!
//! - **Domain Layer** (`domain/`): Pure types and rules, no I/O
//!   - `IdentityRecord` / `decode_identity`: claims extraction from a credential
//!   - `VerificationRecord`: verified meter account
//!   - `FeedbackDraft`: the submission form model
//!   - `SessionState` / `Screen`: derived session stage and routing
//!   - `PortalConfig`: configuration with validation
//!
//! - **Ports Layer** (`ports/`): Trait definitions
//!   - `SessionApi`: Driving port (what the UI calls)
//!   - `KeyValueStore`, `VerificationGateway`, `SubmissionGateway`,
//!     `TokenVerifier`: Driven ports
//!
//! - **Service Layer** (`service/`): Orchestration
//!   - `SessionService`: the session state machine, implements `SessionApi`
//!   - `SessionStore`: typed, self-healing view over a `KeyValueStore`
//!
//! - **Adapters Layer** (`adapters/`): External connections
//!   - `FileBackedKVStore` / `InMemoryKVStore`
//!   - `PortalApiClient`: HTTP client for both gateways
//!
//! ## Session Flow
//!
//! ```text
//!   Unauthenticated ──login(credential)──→ Authenticated ──submit_identifier──→ Verified
//!          ↑                                     │                                 │
//!          └────────────────logout()─────────────┴─────────────────────────────────┘
//! ```
//!
//! With `require_verification = false` the Verified stage is skipped and the
//! feedback screen is reachable straight from Authenticated.
//!
//! ## Invariants
//!
//! - **Verified implies Authenticated**: a verification record only exists
//!   alongside the identity it was verified for.
//! - **Atomic logout**: both persisted records are erased in one batch.
//! - **Corrupt state heals**: undecodable persisted records read as absent.
//! - **Stale responses are dropped**: a gateway reply that resolves after a
//!   logout or re-login is never applied.
//!
//! ## Trust Model
//!
//! `decode_identity` extracts claims without checking the token signature.
//! Deployments that need authenticity plug a `TokenVerifier` into the
//! service; the default `UnsignedClaims` verifier accepts every token.
//!
//! ## Usage Example
//!
//! ```ignore
//! use portal_session::{
//!     FileBackedKVStore, PortalApiClient, PortalConfig, SessionApi, SessionDependencies,
//!     SessionService,
//! };
//! use std::sync::Arc;
//!
//! let config = PortalConfig::from_env();
//! let client = Arc::new(PortalApiClient::new(&config.api)?);
//! let deps = SessionDependencies {
//!     kv_store: FileBackedKVStore::new(config.session.store_path()),
//!     verification: client.clone(),
//!     submission: client,
//! };
//! let session = SessionService::restore(deps, config.session);
//! session.login(&credential)?;
//! session.submit_identifier("58000123456").await?;
//! ```

pub mod adapters;
pub mod domain;
pub mod error;
pub mod ports;
pub mod service;

#[cfg(test)]
pub(crate) mod test_utils;

// Re-exports for convenience
pub use adapters::{FileBackedKVStore, InMemoryKVStore, PortalApiClient};
pub use domain::{
    decode_identity, normalize_identifier, ApiConfig, FeedbackCategory, FeedbackDraft,
    IdentityRecord, PortalConfig, Screen, SessionConfig, SessionState, Stage,
    VerificationRecord,
};
pub use error::{
    ConfigError, DecodeError, DraftError, GatewayError, IdentifierError, KVStoreError,
    SessionError,
};
pub use ports::{
    BatchOperation, KeyValueStore, SessionApi, SubmissionGateway, SubmissionOutcome,
    TokenVerifier, UnsignedClaims, VerificationGateway, VerificationOutcome,
};
pub use service::{SessionDependencies, SessionKey, SessionService, SessionStore};
