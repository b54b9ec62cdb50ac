//! Outbound Ports (Driven Ports)
//!
//! Dependencies the session service needs from the host application:
//! durable storage, the two backend gateways, and an optional token check.

use async_trait::async_trait;

use crate::domain::{FeedbackDraft, VerificationRecord};
use crate::error::{DecodeError, GatewayError, KVStoreError};

/// Abstract interface for key-value storage that survives restarts.
///
/// Production: `FileBackedKVStore`
/// Testing: `InMemoryKVStore`
pub trait KeyValueStore: Send {
    /// Get a value by key.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KVStoreError>;

    /// Put a single key-value pair.
    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), KVStoreError>;

    /// Delete a key. Deleting an absent key is not an error.
    fn delete(&mut self, key: &[u8]) -> Result<(), KVStoreError>;

    /// Execute an atomic batch write.
    ///
    /// Either ALL operations in the batch are applied, or NONE are.
    fn atomic_batch_write(&mut self, operations: Vec<BatchOperation>) -> Result<(), KVStoreError>;

    /// Check if a key exists.
    fn exists(&self, key: &[u8]) -> Result<bool, KVStoreError>;
}

/// Batch operation for atomic writes.
#[derive(Debug, Clone)]
pub enum BatchOperation {
    /// Put a key-value pair.
    Put { key: Vec<u8>, value: Vec<u8> },
    /// Delete a key.
    Delete { key: Vec<u8> },
}

impl BatchOperation {
    /// Create a Put operation.
    pub fn put(key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        BatchOperation::Put {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Create a Delete operation.
    pub fn delete(key: impl Into<Vec<u8>>) -> Self {
        BatchOperation::Delete { key: key.into() }
    }
}

/// Answer from the meter registry for a well-formed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationOutcome {
    /// The registry knows this meter.
    Verified(VerificationRecord),
    /// The registry refused; `message` is what the user should see.
    Rejected { message: String },
}

/// Answer from the feedback endpoint for a well-formed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    Accepted,
    Rejected { message: String },
}

/// Meter registry lookup.
///
/// Implementations must be side-effect free on the server beyond the query
/// itself, so a repeated call with the same identifier is safe.
#[async_trait]
pub trait VerificationGateway: Send + Sync {
    /// Look up a normalized meter number.
    ///
    /// `Err` is reserved for transport failures; a refusal by the registry
    /// is `Ok(VerificationOutcome::Rejected)`.
    async fn verify(&self, identifier: &str) -> Result<VerificationOutcome, GatewayError>;
}

/// Feedback storage endpoint.
#[async_trait]
pub trait SubmissionGateway: Send + Sync {
    async fn submit(&self, draft: &FeedbackDraft) -> Result<SubmissionOutcome, GatewayError>;
}

/// Authenticity check run on a credential before its claims are trusted.
///
/// Kept apart from `decode_identity` so claims extraction stays pure and a
/// deployment can add signature validation without touching the decoder.
pub trait TokenVerifier: Send + Sync {
    fn verify(&self, credential: &str) -> Result<(), DecodeError>;
}

/// Accepts every credential. The portal's default trust model: provider
/// claims are taken as presented.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnsignedClaims;

impl TokenVerifier for UnsignedClaims {
    fn verify(&self, _credential: &str) -> Result<(), DecodeError> {
        Ok(())
    }
}
