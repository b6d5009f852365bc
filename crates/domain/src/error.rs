use crate::session::SessionStatus;

/// Shared error type used across all Parley crates.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP: {0}")]
    Http(String),

    #[error("timeout: {0}")]
    Timeout(String),

    /// The generation service answered with an error or an unusable body.
    #[error("provider {provider}: {message}")]
    Provider { provider: String, message: String },

    #[error("transcription: {0}")]
    Transcription(String),

    #[error("speech: {0}")]
    Speech(String),

    #[error("store: {0}")]
    Store(String),

    #[error("invalid session transition: {from} -> {to}")]
    InvalidTransition {
        from: SessionStatus,
        to: SessionStatus,
    },

    #[error("session is {0}")]
    SessionClosed(SessionStatus),

    #[error("no active session")]
    NoActiveSession,

    #[error("config: {0}")]
    Config(String),

    #[error("auth: {0}")]
    Auth(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;
