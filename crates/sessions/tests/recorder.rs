use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::{TimeZone, Utc};
use parking_lot::Mutex;

use pa_domain::clock::ManualClock;
use pa_domain::config::StoreConfig;
use pa_domain::error::{Error, Result};
use pa_domain::message::Message;
use pa_domain::scenario::Scenario;
use pa_domain::session::{Session, SessionMetrics, SessionStatus};
use pa_sessions::{JsonFileStore, SessionRecorder, SessionStore};

/// In-memory store whose availability can be toggled mid-test.
#[derive(Default)]
struct FlakyStore {
    down: AtomicBool,
    hang: AtomicBool,
    /// Commit the create, then stall so the caller times out.
    hang_after_create: AtomicBool,
    creates: AtomicUsize,
    updates: AtomicUsize,
    records: Mutex<Vec<(String, Session)>>,
}

impl FlakyStore {
    fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    fn stored(&self, id: &str) -> Option<Session> {
        self.records
            .lock()
            .iter()
            .find(|(k, _)| k == id)
            .map(|(_, s)| s.clone())
    }
}

#[async_trait::async_trait]
impl SessionStore for FlakyStore {
    async fn create(&self, id: &str, session: &Session) -> Result<()> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        if self.hang.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if self.down.load(Ordering::SeqCst) {
            return Err(Error::Store("connection refused".into()));
        }
        {
            let mut records = self.records.lock();
            match records.iter_mut().find(|(k, _)| k == id) {
                Some((_, stored)) => *stored = session.clone(),
                None => records.push((id.to_owned(), session.clone())),
            }
        }
        if self.hang_after_create.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        Ok(())
    }

    async fn update(&self, id: &str, session: &Session) -> Result<()> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        if self.down.load(Ordering::SeqCst) {
            return Err(Error::Store("connection refused".into()));
        }
        let mut records = self.records.lock();
        match records.iter_mut().find(|(k, _)| k == id) {
            Some((_, stored)) => {
                *stored = session.clone();
                Ok(())
            }
            None => Err(Error::Store(format!("unknown id {id}"))),
        }
    }

    async fn get(&self, id: &str) -> Result<Option<Session>> {
        Ok(self.stored(id))
    }
}

fn scenario() -> Scenario {
    Scenario {
        id: "coffee".into(),
        name: "Coffee Shop".into(),
        description: String::new(),
        system_prompt: "You are a barista.".into(),
        initial_message: Some("Good morning! What can I get you?".into()),
        estimated_minutes: Some(10),
    }
}

fn clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap(),
    ))
}

fn transcript() -> Vec<Message> {
    vec![
        Message::assistant("Good morning! What can I get you?"),
        Message::user("A large coffee, please"),
        Message::assistant("Here's your large coffee, that'll be $4.50"),
    ]
}

#[tokio::test]
async fn happy_path_mirrors_every_step() {
    let store = Arc::new(FlakyStore::default());
    let clock = clock();
    let mut recorder = SessionRecorder::new(store.clone(), clock.clone(), &StoreConfig::default());

    let id = recorder
        .create_session(&scenario())
        .await
        .id
        .clone()
        .unwrap();
    assert!(recorder.is_synced());

    recorder
        .update_transcript(transcript(), SessionMetrics::default())
        .await
        .unwrap();
    assert_eq!(store.stored(&id).unwrap().current_turn, 1);

    clock.advance_ms(95_500);
    recorder.complete_session().await.unwrap();

    let stored = store.stored(&id).unwrap();
    assert_eq!(stored.status, SessionStatus::Completed);
    assert_eq!(stored.duration_secs, Some(95));
    assert_eq!(store.creates.load(Ordering::SeqCst), 1);
    assert_eq!(store.updates.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn store_failure_keeps_local_state() {
    let store = Arc::new(FlakyStore::default());
    let mut recorder = SessionRecorder::new(store.clone(), clock(), &StoreConfig::default());
    recorder.create_session(&scenario()).await;

    store.set_down(true);
    recorder
        .update_transcript(transcript(), SessionMetrics::default())
        .await
        .unwrap();

    assert!(!recorder.is_synced());
    let local = recorder.session().unwrap();
    assert_eq!(local.transcript.len(), 3);
    assert_eq!(local.current_turn, 1);
    // Exactly one attempt, no retry.
    assert_eq!(store.updates.load(Ordering::SeqCst), 1);

    store.set_down(false);
    recorder.pause_session().await.unwrap();
    assert!(recorder.is_synced());
    let id = recorder.session().unwrap().id.clone().unwrap();
    let stored = store.stored(&id).unwrap();
    assert_eq!(stored.status, SessionStatus::Paused);
    assert_eq!(stored.transcript.len(), 3);
}

#[tokio::test]
async fn failed_create_is_retried_by_next_write() {
    let store = Arc::new(FlakyStore::default());
    store.set_down(true);
    let mut recorder = SessionRecorder::new(store.clone(), clock(), &StoreConfig::default());

    let id = recorder
        .create_session(&scenario())
        .await
        .id
        .clone()
        .unwrap();
    assert!(!recorder.is_persisted());
    assert!(!recorder.is_synced());

    store.set_down(false);
    recorder
        .update_transcript(transcript(), SessionMetrics::default())
        .await
        .unwrap();

    assert!(recorder.is_synced());
    assert_eq!(store.creates.load(Ordering::SeqCst), 2);
    assert_eq!(store.updates.load(Ordering::SeqCst), 0);
    assert!(recorder.is_persisted());
    assert_eq!(recorder.session().unwrap().id.as_deref(), Some(id.as_str()));
    assert_eq!(store.stored(&id).unwrap().current_turn, 1);
}

#[tokio::test]
async fn create_committed_after_timeout_is_not_duplicated() {
    let store = Arc::new(FlakyStore::default());
    store.hang_after_create.store(true, Ordering::SeqCst);
    let config = StoreConfig {
        timeout_ms: 50,
        ..Default::default()
    };
    let mut recorder = SessionRecorder::new(store.clone(), clock(), &config);

    let id = recorder
        .create_session(&scenario())
        .await
        .id
        .clone()
        .unwrap();
    assert!(!recorder.is_synced());
    assert_eq!(store.records.lock().len(), 1);

    store.hang_after_create.store(false, Ordering::SeqCst);
    recorder
        .update_transcript(transcript(), SessionMetrics::default())
        .await
        .unwrap();
    recorder.pause_session().await.unwrap();

    assert!(recorder.is_synced());
    assert_eq!(store.creates.load(Ordering::SeqCst), 2);
    assert_eq!(store.updates.load(Ordering::SeqCst), 1);
    let records = store.records.lock();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].0, id);
    assert_eq!(records[0].1.status, SessionStatus::Paused);
    assert_eq!(records[0].1.current_turn, 1);
}

#[tokio::test]
async fn hung_store_is_bounded_by_timeout() {
    let store = Arc::new(FlakyStore::default());
    store.hang.store(true, Ordering::SeqCst);
    let config = StoreConfig {
        timeout_ms: 50,
        ..Default::default()
    };
    let mut recorder = SessionRecorder::new(store.clone(), clock(), &config);

    let session = recorder.create_session(&scenario()).await;
    assert!(session.id.is_some());
    assert_eq!(session.status, SessionStatus::Active);
    assert!(!recorder.is_persisted());
    assert!(!recorder.is_synced());
}

#[tokio::test]
async fn illegal_transitions_are_rejected_without_writing() {
    let store = Arc::new(FlakyStore::default());
    let mut recorder = SessionRecorder::new(store.clone(), clock(), &StoreConfig::default());

    assert!(matches!(
        recorder.pause_session().await,
        Err(Error::NoActiveSession)
    ));

    recorder.create_session(&scenario()).await;
    assert!(matches!(
        recorder.resume_session().await,
        Err(Error::InvalidTransition {
            from: SessionStatus::Active,
            to: SessionStatus::Active
        })
    ));

    recorder.abandon_session().await.unwrap();
    let updates = store.updates.load(Ordering::SeqCst);
    assert!(matches!(
        recorder.pause_session().await,
        Err(Error::InvalidTransition { .. })
    ));
    assert!(matches!(
        recorder
            .update_transcript(transcript(), SessionMetrics::default())
            .await,
        Err(Error::SessionClosed(SessionStatus::Abandoned))
    ));
    assert_eq!(store.updates.load(Ordering::SeqCst), updates);
    assert!(recorder.session().unwrap().duration_secs.is_some());
}

#[tokio::test]
async fn pause_resume_and_expire() {
    let store = Arc::new(FlakyStore::default());
    let mut recorder = SessionRecorder::new(store.clone(), clock(), &StoreConfig::default());
    recorder.create_session(&scenario()).await;

    recorder.pause_session().await.unwrap();
    recorder.resume_session().await.unwrap();
    assert_eq!(recorder.session().unwrap().status, SessionStatus::Active);

    recorder.expire_session().await.unwrap();
    let session = recorder.session().unwrap();
    assert_eq!(session.status, SessionStatus::Timeout);
    assert!(session.end_time.is_some());

    assert!(recorder.clear().is_some());
    assert!(recorder.session().is_none());
}

#[tokio::test]
async fn file_store_round_trip_is_lossless() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(JsonFileStore::new(dir.path()).unwrap());
    let mut recorder = SessionRecorder::new(store.clone(), clock(), &StoreConfig::default());

    recorder.create_session(&scenario()).await;
    let metrics = SessionMetrics {
        turns: Vec::new(),
        fallback_replies: 1,
        summarized: true,
    };
    recorder
        .update_transcript(transcript(), metrics)
        .await
        .unwrap();
    recorder.pause_session().await.unwrap();

    let local = recorder.session().unwrap().clone();
    let reopened = JsonFileStore::new(dir.path()).unwrap();
    let loaded = reopened
        .get(local.id.as_deref().unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(loaded, local);
}
