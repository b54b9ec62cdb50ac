//! # Persisted Session Store
//!
//! Typed view over a `KeyValueStore`: records go in and out as JSON under
//! namespaced keys.
//!
//! ## Self-Healing Reads
//!
//! A value that fails to deserialize is treated as absent and its key is
//! removed, so one corrupt write cannot wedge every later start.

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use crate::error::KVStoreError;
use crate::ports::outbound::{BatchOperation, KeyValueStore};

/// The two independent records a session persists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionKey {
    /// The signed-in identity.
    Identity,
    /// The verified meter account, bound to an identity.
    Verification,
}

impl SessionKey {
    pub const ALL: [SessionKey; 2] = [SessionKey::Identity, SessionKey::Verification];

    fn suffix(&self) -> &'static str {
        match self {
            SessionKey::Identity => "user",
            SessionKey::Verification => "meter",
        }
    }
}

/// Namespaced, typed session storage.
pub struct SessionStore<S: KeyValueStore> {
    kv: S,
    namespace: String,
}

impl<S: KeyValueStore> SessionStore<S> {
    pub fn new(kv: S, namespace: impl Into<String>) -> Self {
        Self {
            kv,
            namespace: namespace.into(),
        }
    }

    /// Full storage key, e.g. `feedback_portal.user`.
    pub fn key(&self, key: SessionKey) -> Vec<u8> {
        format!("{}.{}", self.namespace, key.suffix()).into_bytes()
    }

    /// Serialize and write a record.
    pub fn save<T: Serialize>(&mut self, key: SessionKey, record: &T) -> Result<(), KVStoreError> {
        let bytes = serde_json::to_vec(record).map_err(|e| KVStoreError::Serialization {
            message: e.to_string(),
        })?;
        let storage_key = self.key(key);
        self.kv.put(&storage_key, &bytes)
    }

    /// Read a record back. Absent, unreadable and corrupt all yield `None`;
    /// a corrupt value is also cleared.
    pub fn load<T: DeserializeOwned>(&mut self, key: SessionKey) -> Option<T> {
        let storage_key = self.key(key);
        let bytes = match self.kv.get(&storage_key) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return None,
            Err(e) => {
                warn!("[portal] Could not read {:?} record: {}", key, e);
                return None;
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("[portal] Discarding corrupt {:?} record: {}", key, e);
                if let Err(e) = self.kv.delete(&storage_key) {
                    warn!("[portal] Could not clear corrupt {:?} record: {}", key, e);
                }
                None
            }
        }
    }

    /// Remove one record. The other key is left alone.
    pub fn clear(&mut self, key: SessionKey) -> Result<(), KVStoreError> {
        let storage_key = self.key(key);
        self.kv.delete(&storage_key)
    }

    /// Remove several records in one atomic batch.
    pub fn clear_all(&mut self, keys: &[SessionKey]) -> Result<(), KVStoreError> {
        let operations = keys
            .iter()
            .map(|key| BatchOperation::delete(self.key(*key)))
            .collect();
        self.kv.atomic_batch_write(operations)
    }

    /// Whether a value (readable or not) is stored under `key`.
    pub fn contains(&self, key: SessionKey) -> bool {
        self.kv.exists(&self.key(key)).unwrap_or(false)
    }

    /// Give back the underlying store.
    pub fn into_inner(self) -> S {
        self.kv
    }
}
