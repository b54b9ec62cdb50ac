//! HTTP gateway adapter for the portal backend.

mod client;
mod types;

pub use client::{PortalApiClient, PUBLIC_FEEDBACK_PATH, VERIFY_METER_PATH};
pub use types::{ErrorResponse, VerifyMeterRequest, VerifyMeterResponse};
