//! Best-effort mirroring of the live session to the durable store.
//!
//! Every operation mutates the local [`Session`] first, then makes exactly
//! one store call. A failed call is logged and otherwise ignored: the local
//! copy stays authoritative and the next operation writes the full record
//! again. There is no retry loop and no queue.
//!
//! Ids are assigned here rather than by the store, so a create that timed out
//! after the store committed it is simply repeated under the same id.

use std::sync::Arc;
use std::time::Duration;

use pa_domain::clock::Clock;
use pa_domain::config::StoreConfig;
use pa_domain::error::{Error, Result};
use pa_domain::message::Message;
use pa_domain::scenario::Scenario;
use pa_domain::session::{Session, SessionMetrics, SessionStatus};
use pa_domain::trace::TraceEvent;

use crate::store::SessionStore;

pub struct SessionRecorder {
    store: Arc<dyn SessionStore>,
    clock: Arc<dyn Clock>,
    timeout: Duration,
    session: Option<Session>,
    /// A create for the current session has been acknowledged.
    created: bool,
    synced: bool,
}

impl SessionRecorder {
    pub fn new(store: Arc<dyn SessionStore>, clock: Arc<dyn Clock>, config: &StoreConfig) -> Self {
        Self {
            store,
            clock,
            timeout: Duration::from_millis(config.timeout_ms),
            session: None,
            created: false,
            synced: false,
        }
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Whether the last store call succeeded.
    pub fn is_synced(&self) -> bool {
        self.synced
    }

    /// Whether the store has acknowledged a create for the current session.
    pub fn is_persisted(&self) -> bool {
        self.created
    }

    /// Drop the in-memory record. The store is not touched.
    pub fn clear(&mut self) -> Option<Session> {
        self.created = false;
        self.synced = false;
        self.session.take()
    }

    // ── Operations ──────────────────────────────────────────────────

    /// Start a new active session for `scenario`, replacing any previous one.
    pub async fn create_session(&mut self, scenario: &Scenario) -> &Session {
        let id = uuid::Uuid::new_v4().to_string();
        let mut session = Session::new(scenario, self.clock.now());
        session.id = Some(id.clone());
        self.created = false;
        self.synced = false;
        let session = self.session.insert(session);

        match bounded(self.timeout, self.store.create(&id, session)).await {
            Ok(()) => {
                tracing::info!(session_id = %id, scenario = %session.scenario_id, "session created");
                self.created = true;
                self.synced = true;
            }
            Err(e) => report_sync_failure(Some(id), "create", &e),
        }
        session
    }

    pub async fn update_transcript(
        &mut self,
        transcript: Vec<Message>,
        metrics: SessionMetrics,
    ) -> Result<()> {
        let now = self.clock.now();
        let session = self.session.as_mut().ok_or(Error::NoActiveSession)?;
        if session.status.is_terminal() {
            return Err(Error::SessionClosed(session.status));
        }
        session.set_transcript(transcript);
        session.metadata = metrics;
        session.touch(now);
        self.sync("update_transcript").await;
        Ok(())
    }

    pub async fn pause_session(&mut self) -> Result<()> {
        self.transition(SessionStatus::Paused, "pause").await
    }

    pub async fn resume_session(&mut self) -> Result<()> {
        self.transition(SessionStatus::Active, "resume").await
    }

    pub async fn complete_session(&mut self) -> Result<()> {
        self.transition(SessionStatus::Completed, "complete").await
    }

    pub async fn abandon_session(&mut self) -> Result<()> {
        self.transition(SessionStatus::Abandoned, "abandon").await
    }

    /// Idle expiry; see [`crate::lifecycle::LifecycleManager`].
    pub async fn expire_session(&mut self) -> Result<()> {
        self.transition(SessionStatus::Timeout, "expire").await
    }

    // ── Internals ───────────────────────────────────────────────────

    async fn transition(&mut self, to: SessionStatus, operation: &str) -> Result<()> {
        let now = self.clock.now();
        let session = self.session.as_mut().ok_or(Error::NoActiveSession)?;
        let from = session.status;
        if !from.can_transition_to(to) {
            return Err(Error::InvalidTransition { from, to });
        }

        session.status = to;
        session.touch(now);
        if to.is_terminal() {
            session.close(now);
        }

        TraceEvent::SessionTransition {
            session_id: session.id.clone(),
            from: from.to_string(),
            to: to.to_string(),
        }
        .emit();

        self.sync(operation).await;
        Ok(())
    }

    /// One store call for the current record. A session whose create was
    /// never acknowledged gets created again (same id) instead of updated.
    async fn sync(&mut self, operation: &str) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        let Some(id) = session.id.clone() else {
            return;
        };

        let result = if self.created {
            bounded(self.timeout, self.store.update(&id, session)).await
        } else {
            let created = bounded(self.timeout, self.store.create(&id, session)).await;
            if created.is_ok() {
                tracing::info!(session_id = %id, "session created on deferred sync");
                self.created = true;
            }
            created
        };

        match result {
            Ok(()) => self.synced = true,
            Err(e) => {
                self.synced = false;
                report_sync_failure(Some(id), operation, &e);
            }
        }
    }
}

async fn bounded<T>(
    timeout: Duration,
    fut: impl std::future::Future<Output = Result<T>>,
) -> Result<T> {
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => Err(Error::Timeout(format!(
            "store call exceeded {}ms",
            timeout.as_millis()
        ))),
    }
}

fn report_sync_failure(session_id: Option<String>, operation: &str, error: &Error) {
    tracing::warn!(
        session_id = session_id.as_deref().unwrap_or("-"),
        operation,
        error = %error,
        "session store write failed; keeping local state"
    );
    TraceEvent::SessionSyncFailed {
        session_id,
        operation: operation.to_owned(),
        error: error.to_string(),
    }
    .emit();
}
