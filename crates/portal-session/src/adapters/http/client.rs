//! Portal backend client implementing both gateways over HTTP/JSON.

use async_trait::async_trait;
use reqwest::{Client, Response};
use tracing::{debug, warn};

use super::types::{ErrorResponse, VerifyMeterRequest, VerifyMeterResponse};
use crate::domain::{ApiConfig, FeedbackDraft, VerificationRecord};
use crate::error::{
    GatewayError, DEFAULT_SUBMISSION_REJECTION, DEFAULT_VERIFICATION_REJECTION,
};
use crate::ports::outbound::{
    SubmissionGateway, SubmissionOutcome, VerificationGateway, VerificationOutcome,
};

/// Meter registry lookup path, relative to the API base URL.
pub const VERIFY_METER_PATH: &str = "auth/customer-meters/verify/";

/// Feedback submission path, relative to the API base URL.
pub const PUBLIC_FEEDBACK_PATH: &str = "auth/public-feedback/";

/// Portal backend API client.
pub struct PortalApiClient {
    client: Client,
    base_url: String,
}

impl PortalApiClient {
    /// Create a new client. No timeout is set unless the config asks for one.
    pub fn new(config: &ApiConfig) -> Result<Self, GatewayError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// POST a JSON body, mapping transport failures.
    async fn post<B: serde::Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Response, GatewayError> {
        let url = self.endpoint(path);
        debug!("[portal] POST {}", url);

        self.client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    GatewayError::Connection(format!("Cannot connect to {}", self.base_url))
                } else {
                    GatewayError::Transport(e.to_string())
                }
            })
    }
}

#[async_trait]
impl VerificationGateway for PortalApiClient {
    async fn verify(&self, identifier: &str) -> Result<VerificationOutcome, GatewayError> {
        let response = self
            .post(
                VERIFY_METER_PATH,
                &VerifyMeterRequest {
                    meter_number: identifier,
                },
            )
            .await?;
        let status = response.status();

        let body: VerifyMeterResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::MalformedResponse(e.to_string()))?;

        if !(status.is_success() && body.verified) {
            debug!("[portal] Meter lookup refused with status {}", status);
            return Ok(VerificationOutcome::Rejected {
                message: body
                    .error
                    .unwrap_or_else(|| DEFAULT_VERIFICATION_REJECTION.to_string()),
            });
        }

        let owner_name = body.customer_name.ok_or_else(|| {
            GatewayError::MalformedResponse("verified response without customer_name".to_string())
        })?;

        Ok(VerificationOutcome::Verified(VerificationRecord {
            account_id: body
                .meter_number
                .unwrap_or_else(|| identifier.to_string()),
            owner_name,
            owner_address: body.customer_address.filter(|a| !a.trim().is_empty()),
        }))
    }
}

#[async_trait]
impl SubmissionGateway for PortalApiClient {
    async fn submit(&self, draft: &FeedbackDraft) -> Result<SubmissionOutcome, GatewayError> {
        let response = self.post(PUBLIC_FEEDBACK_PATH, draft).await?;
        let status = response.status();

        if status.is_success() {
            return Ok(SubmissionOutcome::Accepted);
        }

        // The error body is optional; an unreadable one still counts as a rejection.
        let message = match response.json::<ErrorResponse>().await {
            Ok(body) => body.error,
            Err(e) => {
                warn!("[portal] Unreadable error body for status {}: {}", status, e);
                None
            }
        };

        Ok(SubmissionOutcome::Rejected {
            message: message.unwrap_or_else(|| DEFAULT_SUBMISSION_REJECTION.to_string()),
        })
    }
}
