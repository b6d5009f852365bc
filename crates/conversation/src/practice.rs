//! One practice session: the orchestrator plus its persisted mirror.
//!
//! Everything a conversation needs is owned here and built explicitly, so a
//! process can run several sessions side by side. Turns are strictly
//! sequential: every mutating call takes `&mut self`.

use std::sync::Arc;

use pa_domain::clock::Clock;
use pa_domain::error::{Error, Result};
use pa_domain::message::Message;
use pa_domain::scenario::Scenario;
use pa_domain::session::{Session, SessionStatus};
use pa_providers::Transcription;
use pa_sessions::{ExpireReason, LifecycleManager, SessionRecorder};

use crate::metrics::TurnMetricsTracker;
use crate::orchestrator::{ConversationStats, DialogueOrchestrator};

pub struct PracticeSession {
    orchestrator: DialogueOrchestrator,
    recorder: SessionRecorder,
    lifecycle: LifecycleManager,
    clock: Arc<dyn Clock>,
}

impl PracticeSession {
    pub fn new(
        orchestrator: DialogueOrchestrator,
        recorder: SessionRecorder,
        lifecycle: LifecycleManager,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            orchestrator,
            recorder,
            lifecycle,
            clock,
        }
    }

    /// Begin `scenario`. Returns the opening line, if the scenario has one.
    pub async fn start(&mut self, scenario: &Scenario) -> Option<String> {
        self.orchestrator.initialize(scenario);
        self.recorder.create_session(scenario).await;

        let opening = self
            .orchestrator
            .transcript()
            .first()
            .map(|m| m.content.clone());
        if opening.is_some() {
            self.sync_transcript().await;
        }
        opening
    }

    /// Run one user turn: record the utterance, generate the reply, mirror.
    ///
    /// A metrics turn opened with `on_user_speaking_start` is closed here,
    /// once the utterance is accepted; a rejected utterance cancels it.
    pub async fn respond(&mut self, user_text: &str) -> Result<String> {
        if let Err(e) = self.ensure_active() {
            self.orchestrator.metrics_mut().cancel_turn();
            return Err(e);
        }
        let tracker = self.orchestrator.metrics_mut();
        if tracker.is_recording() {
            tracker.on_user_speaking_end(Some(user_text));
        }
        self.orchestrator.add_user_message(user_text);
        let reply = self.orchestrator.get_ai_response(user_text).await;
        self.sync_transcript().await;
        Ok(reply)
    }

    /// `NoSpeech` leaves the conversation untouched and yields `None`.
    pub async fn respond_to(&mut self, transcription: Transcription) -> Result<Option<String>> {
        match transcription {
            Transcription::NoSpeech => {
                tracing::debug!("no speech detected, turn skipped");
                self.orchestrator.metrics_mut().cancel_turn();
                Ok(None)
            }
            Transcription::Speech(text) => self.respond(&text).await.map(Some),
        }
    }

    pub async fn pause(&mut self) -> Result<()> {
        self.recorder.pause_session().await
    }

    pub async fn resume(&mut self) -> Result<()> {
        self.recorder.resume_session().await
    }

    /// Finish normally. Returns the final record and clears local state.
    pub async fn complete(&mut self) -> Result<Session> {
        self.recorder.complete_session().await?;
        self.finish()
    }

    pub async fn abandon(&mut self) -> Result<Session> {
        self.recorder.abandon_session().await?;
        self.finish()
    }

    /// Expire the session if it has been idle too long.
    pub async fn expire_if_idle(&mut self) -> Result<Option<(ExpireReason, Session)>> {
        let session = self.recorder.session().ok_or(Error::NoActiveSession)?;
        let Some(reason) = self.lifecycle.should_expire(session, self.clock.now()) else {
            return Ok(None);
        };
        tracing::info!(reason = %reason, "expiring idle session");
        self.recorder.expire_session().await?;
        Ok(Some((reason, self.finish()?)))
    }

    // ── Accessors ───────────────────────────────────────────────────

    pub fn metrics_mut(&mut self) -> &mut TurnMetricsTracker {
        self.orchestrator.metrics_mut()
    }

    pub fn transcript(&self) -> &[Message] {
        self.orchestrator.transcript()
    }

    pub fn stats(&self) -> ConversationStats {
        self.orchestrator.stats()
    }

    pub fn session(&self) -> Option<&Session> {
        self.recorder.session()
    }

    pub fn status(&self) -> Option<SessionStatus> {
        self.recorder.session().map(|s| s.status)
    }

    pub fn is_synced(&self) -> bool {
        self.recorder.is_synced()
    }

    pub fn is_conversation_complete(&self) -> bool {
        self.orchestrator.is_conversation_complete()
    }

    // ── Internals ───────────────────────────────────────────────────

    fn ensure_active(&self) -> Result<()> {
        match self.status() {
            None => Err(Error::NoActiveSession),
            Some(SessionStatus::Active) => Ok(()),
            Some(status) => Err(Error::SessionClosed(status)),
        }
    }

    async fn sync_transcript(&mut self) {
        let transcript = self.orchestrator.transcript().to_vec();
        let metrics = self.orchestrator.session_metrics();
        if let Err(e) = self.recorder.update_transcript(transcript, metrics).await {
            tracing::warn!(error = %e, "transcript not mirrored");
        }
    }

    fn finish(&mut self) -> Result<Session> {
        self.orchestrator.clear();
        self.recorder.clear().ok_or(Error::NoActiveSession)
    }
}
