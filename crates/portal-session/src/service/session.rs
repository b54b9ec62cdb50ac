//! # Session Service
//!
//! The session state machine. Owns the session store and the in-memory
//! state behind one mutex, and talks to the gateways through the driven
//! ports.
//!
//! ## Epochs
//!
//! Every `login` and `logout` bumps the session epoch. A gateway call
//! records the epoch it started in and its result is only applied if the
//! epoch is unchanged when it resolves. That is how a late verification
//! reply after a logout is dropped instead of resurrecting the session.
//! The lock is never held across an `.await`.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::store::{SessionKey, SessionStore};
use crate::domain::{
    decode_identity, normalize_identifier, FeedbackDraft, IdentityRecord, PersistedVerification,
    Screen, SessionConfig, SessionState, VerificationRecord,
};
use crate::error::SessionError;
use crate::ports::inbound::SessionApi;
use crate::ports::outbound::{
    KeyValueStore, SubmissionGateway, SubmissionOutcome, TokenVerifier, UnsignedClaims,
    VerificationGateway, VerificationOutcome,
};

/// Dependencies injected into the session service.
pub struct SessionDependencies<S, V, F> {
    pub kv_store: S,
    pub verification: Arc<V>,
    pub submission: Arc<F>,
}

struct SessionInner<S: KeyValueStore> {
    store: SessionStore<S>,
    state: SessionState,
    epoch: u64,
}

/// Session state machine implementation.
///
/// Implements the `SessionApi` port using injected dependencies.
pub struct SessionService<S, V, F>
where
    S: KeyValueStore,
    V: VerificationGateway,
    F: SubmissionGateway,
{
    inner: Mutex<SessionInner<S>>,
    verification: Arc<V>,
    submission: Arc<F>,
    token_verifier: Box<dyn TokenVerifier>,
    config: SessionConfig,
}

impl<S, V, F> SessionService<S, V, F>
where
    S: KeyValueStore,
    V: VerificationGateway,
    F: SubmissionGateway,
{
    /// Rebuild the session from whatever the store holds. Runs before
    /// anything is shown; never fails.
    pub fn restore(deps: SessionDependencies<S, V, F>, config: SessionConfig) -> Self {
        let mut store = SessionStore::new(deps.kv_store, config.key_namespace.clone());
        let state = reconstruct(&mut store, config.require_verification);
        info!("[portal] Session restored at stage {}", state.stage());

        Self {
            inner: Mutex::new(SessionInner {
                store,
                state,
                epoch: 0,
            }),
            verification: deps.verification,
            submission: deps.submission,
            token_verifier: Box::new(UnsignedClaims),
            config,
        }
    }

    /// Check credentials with `verifier` before their claims are decoded.
    pub fn with_token_verifier(mut self, verifier: impl TokenVerifier + 'static) -> Self {
        self.token_verifier = Box::new(verifier);
        self
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Tear the service down and return the store, as a process exit would.
    pub fn into_store(self) -> S {
        self.inner.into_inner().store.into_inner()
    }

    /// Whether the feedback screen is reachable from `state`.
    fn feedback_ready(&self, state: &SessionState) -> bool {
        self.feedback_records(state).is_some()
    }

    fn feedback_records<'a>(
        &self,
        state: &'a SessionState,
    ) -> Option<(&'a IdentityRecord, Option<&'a VerificationRecord>)> {
        match state.screen(self.config.require_verification) {
            Screen::Feedback => state.identity().map(|i| (i, state.verification())),
            _ => None,
        }
    }
}

/// Startup reconstruction.
///
/// Any inconsistency between the two records (a verification record with
/// no identity, or one bound to another subject) clears both and starts
/// over unauthenticated.
fn reconstruct<S: KeyValueStore>(
    store: &mut SessionStore<S>,
    require_verification: bool,
) -> SessionState {
    let identity = store
        .load::<IdentityRecord>(SessionKey::Identity)
        .filter(|identity| match identity.validate() {
            Ok(()) => true,
            Err(e) => {
                warn!("[portal] Persisted identity is unusable: {}", e);
                false
            }
        });

    let Some(identity) = identity else {
        if store.contains(SessionKey::Identity) || store.contains(SessionKey::Verification) {
            warn!("[portal] Clearing leftover session records without a usable identity");
            discard_all(store);
        }
        return SessionState::Unauthenticated;
    };

    if !require_verification {
        return SessionState::Authenticated(identity);
    }

    match store.load::<PersistedVerification>(SessionKey::Verification) {
        None => SessionState::Authenticated(identity),
        Some(persisted) if persisted.belongs_to(&identity) => {
            SessionState::Verified(identity, persisted.record)
        }
        Some(_) => {
            warn!("[portal] Verification record belongs to another identity; clearing session");
            discard_all(store);
            SessionState::Unauthenticated
        }
    }
}

/// Erase both records. If the batch fails, fall back to per-key deletes,
/// identity first: a verification record left alone is cleared at the next
/// start as one without an identity.
fn discard_all<S: KeyValueStore>(store: &mut SessionStore<S>) {
    let Err(e) = store.clear_all(&SessionKey::ALL) else {
        return;
    };
    warn!("[portal] Batch clear failed ({}); clearing records one by one", e);

    for key in SessionKey::ALL {
        if let Err(e) = store.clear(key) {
            warn!("[portal] Could not clear {:?} record: {}", key, e);
        }
    }
}

#[async_trait]
impl<S, V, F> SessionApi for SessionService<S, V, F>
where
    S: KeyValueStore + 'static,
    V: VerificationGateway + 'static,
    F: SubmissionGateway + 'static,
{
    fn state(&self) -> SessionState {
        self.inner.lock().state.clone()
    }

    fn screen(&self) -> Screen {
        self.inner
            .lock()
            .state
            .screen(self.config.require_verification)
    }

    fn login(&self, credential: &str) -> Result<IdentityRecord, SessionError> {
        self.token_verifier.verify(credential)?;
        let identity = decode_identity(credential).map_err(|e| {
            warn!("[portal] Login decode error: {}", e);
            e
        })?;

        let mut inner = self.inner.lock();

        if inner.state.identity().is_some() {
            debug!("[portal] Login replaces the current session");
            inner.store.clear_all(&SessionKey::ALL)?;
            inner.state = SessionState::Unauthenticated;
            inner.epoch += 1;
        }

        inner.store.save(SessionKey::Identity, &identity)?;
        inner.state = SessionState::Authenticated(identity.clone());
        inner.epoch += 1;

        info!("[portal] ✅ Login successful");
        debug!("[portal] Signed in as {} ({})", identity.email, identity.subject_id);
        Ok(identity)
    }

    async fn submit_identifier(&self, identifier: &str) -> Result<VerificationRecord, SessionError> {
        if !self.config.require_verification {
            return Err(SessionError::VerificationDisabled);
        }
        let identifier = normalize_identifier(identifier)?;

        let epoch = {
            let inner = self.inner.lock();
            if inner.state.identity().is_none() {
                return Err(SessionError::InvalidStage {
                    operation: "meter verification",
                    stage: inner.state.stage(),
                });
            }
            inner.epoch
        };

        info!("[portal] Verifying meter number");
        let outcome = self.verification.verify(&identifier).await;

        let mut inner = self.inner.lock();
        if inner.epoch != epoch {
            warn!("[portal] Discarding verification reply for a session that has ended");
            return Err(SessionError::SessionChanged);
        }

        let record = match outcome {
            Ok(VerificationOutcome::Verified(record)) => record,
            Ok(VerificationOutcome::Rejected { message }) => {
                info!("[portal] Meter verification rejected");
                return Err(SessionError::VerificationRejected { message });
            }
            Err(e) => {
                warn!("[portal] Verification gateway error: {}", e);
                return Err(SessionError::Transport(e));
            }
        };

        // Same epoch means same identity as when the call started.
        let Some(identity) = inner.state.identity().cloned() else {
            return Err(SessionError::SessionChanged);
        };

        inner.store.save(
            SessionKey::Verification,
            &PersistedVerification::bind(&identity, record.clone()),
        )?;
        inner.state = SessionState::Verified(identity, record.clone());

        info!("[portal] ✅ Meter {} verified", record.account_id);
        Ok(record)
    }

    fn feedback_draft(&self) -> Option<FeedbackDraft> {
        let inner = self.inner.lock();
        self.feedback_records(&inner.state)
            .map(|(identity, verification)| FeedbackDraft::seeded(identity, verification))
    }

    async fn submit_feedback(&self, draft: &FeedbackDraft) -> Result<(), SessionError> {
        draft.validate()?;

        let payload = {
            let inner = self.inner.lock();
            if !self.feedback_ready(&inner.state) {
                return Err(SessionError::InvalidStage {
                    operation: "feedback submission",
                    stage: inner.state.stage(),
                });
            }
            let mut payload = draft.clone();
            // A verified session always reports the meter it verified.
            if let Some(verification) = inner.state.verification() {
                payload.account_id = Some(verification.account_id.clone());
            }
            payload
        };

        info!("[portal] Submitting {} feedback", payload.category);
        match self.submission.submit(&payload).await {
            Ok(SubmissionOutcome::Accepted) => {
                info!("[portal] ✅ Feedback submitted");
                Ok(())
            }
            Ok(SubmissionOutcome::Rejected { message }) => {
                info!("[portal] Feedback rejected by server");
                Err(SessionError::SubmissionRejected { message })
            }
            Err(e) => {
                warn!("[portal] Submission gateway error: {}", e);
                Err(SessionError::Transport(e))
            }
        }
    }

    fn logout(&self) {
        let mut inner = self.inner.lock();
        inner.epoch += 1;
        inner.state = SessionState::Unauthenticated;
        discard_all(&mut inner.store);
        info!("[portal] Logged out");
    }
}
