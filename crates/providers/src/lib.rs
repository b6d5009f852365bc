pub mod anthropic;
pub mod generate;
pub mod openai_compat;
pub mod registry;
pub mod speech;
pub mod traits;
pub mod transcription;
pub(crate) mod util;

// Re-exports for convenience.
pub use generate::{Generator, ProviderGenerator};
pub use registry::ProviderRegistry;
pub use speech::{build_speaker, CommandSpeaker, SpeechSynthesizer};
pub use traits::{ChatRequest, ChatResponse, LlmProvider, Usage};
pub use transcription::{Transcriber, Transcription, WhisperTranscriber};
