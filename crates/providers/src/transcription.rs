//! Speech-to-text.
//!
//! Talks to any OpenAI-compatible `/audio/transcriptions` endpoint (OpenAI,
//! Groq, a local whisper server). Empty or whitespace-only results come back
//! as [`Transcription::NoSpeech`] so callers can skip the turn.

use crate::util::{from_reqwest, resolve_api_key};
use pa_domain::config::TranscriptionConfig;
use pa_domain::error::{Error, Result};
use reqwest::multipart::{Form, Part};

/// Outcome of one transcription request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transcription {
    Speech(String),
    NoSpeech,
}

impl Transcription {
    pub fn from_text(text: &str) -> Self {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            Self::NoSpeech
        } else {
            Self::Speech(trimmed.to_string())
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Speech(text) => Some(text),
            Self::NoSpeech => None,
        }
    }
}

#[async_trait::async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe an in-memory recording. `filename` carries the format.
    async fn transcribe(&self, audio: &[u8], filename: &str) -> Result<Transcription>;
}

// ── Audio formats ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    Ogg,
    Mp3,
    Wav,
    Webm,
    M4a,
    Flac,
}

impl AudioFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "ogg" | "oga" | "opus" => Some(Self::Ogg),
            "mp3" | "mpeg" | "mpga" => Some(Self::Mp3),
            "wav" => Some(Self::Wav),
            "webm" => Some(Self::Webm),
            "m4a" | "mp4" => Some(Self::M4a),
            "flac" => Some(Self::Flac),
            _ => None,
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Ogg => "audio/ogg",
            Self::Mp3 => "audio/mpeg",
            Self::Wav => "audio/wav",
            Self::Webm => "audio/webm",
            Self::M4a => "audio/mp4",
            Self::Flac => "audio/flac",
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Whisper-compatible transcriber
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub struct WhisperTranscriber {
    url: String,
    model: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl WhisperTranscriber {
    pub fn from_config(cfg: &TranscriptionConfig) -> Result<Self> {
        let auth = &cfg.auth;
        let api_key = if auth.key.is_none() && auth.env.is_none() && auth.service.is_none() {
            None
        } else {
            Some(resolve_api_key(auth)?)
        };

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .map_err(from_reqwest)?;

        Ok(Self {
            url: format!(
                "{}/audio/transcriptions",
                cfg.base_url.trim_end_matches('/')
            ),
            model: cfg.model.clone(),
            api_key,
            client,
        })
    }
}

#[async_trait::async_trait]
impl Transcriber for WhisperTranscriber {
    async fn transcribe(&self, audio: &[u8], filename: &str) -> Result<Transcription> {
        let extension = filename.rsplit('.').next().unwrap_or_default();
        let format = AudioFormat::from_extension(extension)
            .ok_or_else(|| Error::Transcription(format!("unsupported audio format: {extension}")))?;

        let file_part = Part::bytes(audio.to_vec())
            .file_name(filename.to_string())
            .mime_str(format.mime_type())
            .map_err(|e| Error::Transcription(e.to_string()))?;

        let form = Form::new()
            .part("file", file_part)
            .text("model", self.model.clone())
            .text("response_format", "json");

        tracing::debug!(url = %self.url, format = ?format, bytes = audio.len(), "transcribing audio");

        let mut request = self.client.post(&self.url).multipart(form);
        if let Some(key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {key}"));
        }
        let response = request.send().await.map_err(from_reqwest)?;

        let status = response.status();
        let body = response.text().await.map_err(from_reqwest)?;
        if !status.is_success() {
            return Err(Error::Transcription(format!("HTTP {}: {}", status.as_u16(), body)));
        }

        let json: serde_json::Value = serde_json::from_str(&body)?;
        let text = json["text"].as_str().unwrap_or_default();
        Ok(Transcription::from_text(text))
    }
}
