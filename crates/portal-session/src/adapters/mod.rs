//! Adapters Layer
//!
//! Concrete implementations of the driven ports.

pub mod http;
pub mod storage;

pub use http::PortalApiClient;
pub use storage::{FileBackedKVStore, InMemoryKVStore};
