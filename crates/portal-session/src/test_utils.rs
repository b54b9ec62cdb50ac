//! Shared fixtures for unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use parking_lot::Mutex;
use serde_json::json;
use tokio::sync::Semaphore;

use crate::adapters::InMemoryKVStore;
use crate::domain::{FeedbackDraft, SessionConfig, VerificationRecord};
use crate::error::GatewayError;
use crate::ports::outbound::{
    SubmissionGateway, SubmissionOutcome, VerificationGateway, VerificationOutcome,
};
use crate::service::{SessionDependencies, SessionService};

/// Build an unsigned compact JWS carrying `claims`.
pub fn make_credential(claims: &serde_json::Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(json!({ "alg": "RS256", "typ": "JWT" }).to_string());
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{header}.{payload}.c2lnbmF0dXJl")
}

/// Credential for `a@b.com` / subject `123`.
pub fn default_credential() -> String {
    make_credential(&json!({
        "email": "a@b.com",
        "sub": "123",
        "name": "A",
        "picture": "u",
    }))
}

pub fn verified(account_id: &str, owner_name: &str) -> VerificationOutcome {
    VerificationOutcome::Verified(VerificationRecord {
        account_id: account_id.to_string(),
        owner_name: owner_name.to_string(),
        owner_address: None,
    })
}

pub fn rejected(message: &str) -> VerificationOutcome {
    VerificationOutcome::Rejected {
        message: message.to_string(),
    }
}

pub fn session_config(require_verification: bool) -> SessionConfig {
    SessionConfig {
        require_verification,
        ..SessionConfig::default()
    }
}

/// Verification gateway answering from a queue of scripted replies.
#[derive(Default)]
pub struct ScriptedVerificationGateway {
    replies: Mutex<VecDeque<Result<VerificationOutcome, GatewayError>>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedVerificationGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, reply: Result<VerificationOutcome, GatewayError>) {
        self.replies.lock().push_back(reply);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl VerificationGateway for ScriptedVerificationGateway {
    async fn verify(&self, identifier: &str) -> Result<VerificationOutcome, GatewayError> {
        self.calls.lock().push(identifier.to_string());
        self.replies
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(rejected("no scripted reply")))
    }
}

/// Verification gateway whose replies are held until the test releases them,
/// one permit per reply, in call order.
pub struct GatedVerificationGateway {
    replies: Mutex<HashMap<String, VerificationOutcome>>,
    started: Mutex<Vec<String>>,
    gate: Semaphore,
}

impl GatedVerificationGateway {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(HashMap::new()),
            started: Mutex::new(Vec::new()),
            gate: Semaphore::new(0),
        }
    }

    pub fn reply_for(&self, identifier: &str, outcome: VerificationOutcome) {
        self.replies.lock().insert(identifier.to_string(), outcome);
    }

    pub fn started(&self) -> usize {
        self.started.lock().len()
    }

    pub fn release_one(&self) {
        self.gate.add_permits(1);
    }

    /// Yield until `count` calls are parked at the gate.
    pub async fn wait_started(&self, count: usize) {
        while self.started() < count {
            tokio::task::yield_now().await;
        }
    }
}

#[async_trait]
impl VerificationGateway for GatedVerificationGateway {
    async fn verify(&self, identifier: &str) -> Result<VerificationOutcome, GatewayError> {
        self.started.lock().push(identifier.to_string());
        self.gate
            .acquire()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?
            .forget();
        Ok(self
            .replies
            .lock()
            .get(identifier)
            .cloned()
            .unwrap_or_else(|| rejected("unknown meter")))
    }
}

/// Submission gateway that records drafts and answers from a queue.
#[derive(Default)]
pub struct RecordingSubmissionGateway {
    replies: Mutex<VecDeque<Result<SubmissionOutcome, GatewayError>>>,
    submitted: Mutex<Vec<FeedbackDraft>>,
}

impl RecordingSubmissionGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, reply: Result<SubmissionOutcome, GatewayError>) {
        self.replies.lock().push_back(reply);
    }

    pub fn submitted(&self) -> Vec<FeedbackDraft> {
        self.submitted.lock().clone()
    }
}

#[async_trait]
impl SubmissionGateway for RecordingSubmissionGateway {
    async fn submit(&self, draft: &FeedbackDraft) -> Result<SubmissionOutcome, GatewayError> {
        self.submitted.lock().push(draft.clone());
        self.replies
            .lock()
            .pop_front()
            .unwrap_or(Ok(SubmissionOutcome::Accepted))
    }
}

pub type TestService =
    SessionService<InMemoryKVStore, ScriptedVerificationGateway, RecordingSubmissionGateway>;

/// Service over `kv` with fresh scripted gateways.
pub fn make_service(
    kv: InMemoryKVStore,
    require_verification: bool,
) -> (
    TestService,
    Arc<ScriptedVerificationGateway>,
    Arc<RecordingSubmissionGateway>,
) {
    let verification = Arc::new(ScriptedVerificationGateway::new());
    let submission = Arc::new(RecordingSubmissionGateway::new());
    let service = SessionService::restore(
        SessionDependencies {
            kv_store: kv,
            verification: verification.clone(),
            submission: submission.clone(),
        },
        session_config(require_verification),
    );
    (service, verification, submission)
}
