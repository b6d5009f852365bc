//! Text-to-speech output.

use pa_domain::config::SpeechConfig;
use pa_domain::error::{Error, Result};
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio::sync::Notify;

/// Speaks assistant replies.
///
/// `speak` resolves when playback finishes (`Ok`) or fails (`Err`);
/// `stop` cancels whatever is playing, which then resolves `Ok`.
#[async_trait::async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn speak(&self, text: &str) -> Result<()>;
    fn stop(&self);
}

/// Build the synthesizer named by the config, if any.
pub fn build_speaker(cfg: &SpeechConfig) -> Option<Arc<dyn SpeechSynthesizer>> {
    let cmd = cfg.command.as_ref()?;
    let (program, args) = cmd.split_first()?;
    Some(Arc::new(CommandSpeaker::new(program.clone(), args.to_vec())))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// CommandSpeaker
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Runs an external TTS program with the reply text as its last argument.
pub struct CommandSpeaker {
    program: String,
    args: Vec<String>,
    cancel: Notify,
}

impl CommandSpeaker {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            cancel: Notify::new(),
        }
    }
}

#[async_trait::async_trait]
impl SpeechSynthesizer for CommandSpeaker {
    async fn speak(&self, text: &str) -> Result<()> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .arg(text)
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::Speech(format!("failed to spawn {}: {e}", self.program)))?;

        // Drained concurrently so a chatty program never blocks on a full pipe.
        let stderr = child.stderr.take().map(|mut pipe| {
            tokio::spawn(async move {
                let mut buf = Vec::new();
                let _ = pipe.read_to_end(&mut buf).await;
                String::from_utf8_lossy(&buf).trim().to_owned()
            })
        });

        tokio::select! {
            status = child.wait() => {
                let status = status.map_err(|e| Error::Speech(e.to_string()))?;
                if status.success() {
                    return Ok(());
                }
                let detail = match stderr {
                    Some(reader) => reader.await.unwrap_or_default(),
                    None => String::new(),
                };
                if detail.is_empty() {
                    Err(Error::Speech(format!("{} exited with {status}", self.program)))
                } else {
                    Err(Error::Speech(format!("{} exited with {status}: {detail}", self.program)))
                }
            }
            _ = self.cancel.notified() => {
                if let Some(reader) = stderr {
                    reader.abort();
                }
                let _ = child.kill().await;
                tracing::debug!(program = %self.program, "speech stopped");
                Ok(())
            }
        }
    }

    fn stop(&self) {
        self.cancel.notify_waiters();
    }
}
