//! Request/response bodies of the portal backend.

use serde::{Deserialize, Serialize};

/// Body of `POST /auth/customer-meters/verify/`.
#[derive(Debug, Serialize)]
pub struct VerifyMeterRequest<'a> {
    pub meter_number: &'a str,
}

/// Response of the meter registry, for both success and failure.
#[derive(Debug, Default, Deserialize)]
pub struct VerifyMeterResponse {
    #[serde(default)]
    pub verified: bool,
    #[serde(default)]
    pub meter_number: Option<String>,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub customer_address: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Error body any endpoint may return with a non-2xx status.
#[derive(Debug, Default, Deserialize)]
pub struct ErrorResponse {
    #[serde(default)]
    pub error: Option<String>,
}
