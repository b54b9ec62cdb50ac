//! Service Layer
//!
//! The session state machine and the typed store it persists through.

pub mod session;
pub mod store;


pub use session::{SessionDependencies, SessionService};
pub use store::{SessionKey, SessionStore};
