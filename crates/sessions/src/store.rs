//! Durable session store.
//!
//! The recorder only needs three calls (create, update, get), so the store is
//! a trait. The bundled [`JsonFileStore`] keeps one `<id>.json` file per
//! session under the configured directory, with a write-through cache so
//! reads never hit disk after the first load.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;

use pa_domain::error::{Error, Result};
use pa_domain::session::Session;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Store trait
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[async_trait::async_trait]
pub trait SessionStore: Send + Sync {
    /// Persist a new record under the caller-assigned `id`. Creating the
    /// same id again overwrites the record, so a create whose outcome was
    /// lost can be repeated safely.
    async fn create(&self, id: &str, session: &Session) -> Result<()>;

    /// Overwrite the record stored under `id`.
    async fn update(&self, id: &str, session: &Session) -> Result<()>;

    async fn get(&self, id: &str) -> Result<Option<Session>>;
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// JSON file store
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub struct JsonFileStore {
    dir: PathBuf,
    cache: RwLock<HashMap<String, Session>>,
}

impl JsonFileStore {
    /// Open (creating if needed) the store directory.
    pub fn new(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir).map_err(Error::Io)?;
        tracing::info!(path = %dir.display(), "session store opened");
        Ok(Self {
            dir: dir.to_path_buf(),
            cache: RwLock::new(HashMap::new()),
        })
    }

    pub fn record_path(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }

    /// Write to disk first; only update the cache if I/O succeeds.
    async fn write_record(&self, id: &str, session: &Session) -> Result<()> {
        let json = serde_json::to_string_pretty(session)?;
        let path = self.record_path(id);
        tokio::task::spawn_blocking(move || write_atomic(&path, json.as_bytes()))
            .await
            .map_err(|e| Error::Store(format!("spawn_blocking join: {e}")))??;

        self.cache.write().insert(id.to_owned(), session.clone());
        Ok(())
    }
}

/// Write via a sibling temp file and rename, so a crash never leaves a
/// half-written record behind.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, bytes).map_err(Error::Io)?;
    std::fs::rename(&tmp, path).map_err(Error::Io)?;
    Ok(())
}

#[async_trait::async_trait]
impl SessionStore for JsonFileStore {
    async fn create(&self, id: &str, session: &Session) -> Result<()> {
        let mut record = session.clone();
        record.id = Some(id.to_owned());
        self.write_record(id, &record).await?;
        tracing::debug!(session_id = %id, "session record created");
        Ok(())
    }

    async fn update(&self, id: &str, session: &Session) -> Result<()> {
        let path = self.record_path(id);
        let known = self.cache.read().contains_key(id) || path.exists();
        if !known {
            return Err(Error::Store(format!("no session record with id {id}")));
        }
        let mut record = session.clone();
        record.id = Some(id.to_owned());
        self.write_record(id, &record).await
    }

    async fn get(&self, id: &str) -> Result<Option<Session>> {
        if let Some(cached) = self.cache.read().get(id) {
            return Ok(Some(cached.clone()));
        }

        let path = self.record_path(id);
        let raw = match tokio::task::spawn_blocking(move || std::fs::read_to_string(path))
            .await
            .map_err(|e| Error::Store(format!("spawn_blocking join: {e}")))?
        {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Error::Io(e)),
        };

        let session: Session = serde_json::from_str(&raw)?;
        self.cache.write().insert(id.to_owned(), session.clone());
        Ok(Some(session))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pa_domain::message::Message;
    use pa_domain::scenario::Scenario;

    fn session() -> Session {
        let scenario = Scenario {
            id: "coffee".into(),
            name: "Coffee Shop".into(),
            description: String::new(),
            system_prompt: "You are a barista.".into(),
            initial_message: Some("Good morning! What can I get you?".into()),
            estimated_minutes: Some(10),
        };
        let mut s = Session::new(&scenario, Utc::now());
        s.set_transcript(vec![
            Message::assistant("Good morning! What can I get you?"),
            Message::user("A large coffee, please"),
        ]);
        s
    }

    #[tokio::test]
    async fn create_writes_file_under_given_id() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path()).unwrap();

        store.create("s-1", &session()).await.unwrap();
        assert!(store.record_path("s-1").exists());

        let loaded = store.get("s-1").await.unwrap().unwrap();
        assert_eq!(loaded.id.as_deref(), Some("s-1"));
    }

    #[tokio::test]
    async fn repeated_create_overwrites_one_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path()).unwrap();

        store.create("s-1", &session()).await.unwrap();
        let mut later = session();
        later.current_turn = 4;
        store.create("s-1", &later).await.unwrap();

        let files: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(files, vec![std::ffi::OsString::from("s-1.json")]);
        let reopened = JsonFileStore::new(dir.path()).unwrap();
        assert_eq!(reopened.get("s-1").await.unwrap().unwrap().current_turn, 4);
    }

    #[tokio::test]
    async fn update_unknown_id_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path()).unwrap();
        let err = store.update("missing", &session()).await.unwrap_err();
        assert!(matches!(err, Error::Store(_)));
    }

    #[tokio::test]
    async fn get_missing_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path()).unwrap();
        assert!(store.get("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn records_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let original = session();
        {
            let store = JsonFileStore::new(dir.path()).unwrap();
            store.create("s-1", &original).await.unwrap();
        }

        let reopened = JsonFileStore::new(dir.path()).unwrap();
        let loaded = reopened.get("s-1").await.unwrap().unwrap();
        assert_eq!(loaded.transcript, original.transcript);
        assert_eq!(loaded.status, original.status);
        assert_eq!(loaded.current_turn, original.current_turn);
        assert_eq!(loaded.metadata, original.metadata);
    }
}
