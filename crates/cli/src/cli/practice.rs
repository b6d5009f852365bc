//! `parley practice`: interactive practice REPL.
//!
//! Each typed line is one user utterance. `/say <file>` sends a recorded
//! clip through the transcription service instead. Replies are printed and,
//! when a speech command is configured, spoken aloud.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use rustyline::error::ReadlineError;

use pa_conversation::{DialogueOrchestrator, PracticeSession, ThreadRandom};
use pa_domain::clock::{Clock, SystemClock};
use pa_domain::config::Config;
use pa_domain::scenario::Scenario;
use pa_domain::session::Session;
use pa_providers::{build_speaker, ProviderRegistry, SpeechSynthesizer, Transcriber};
use pa_sessions::{JsonFileStore, LifecycleManager, SessionRecorder};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Public entry point
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub async fn practice(config: Config, scenario_id: Option<String>) -> anyhow::Result<()> {
    let scenarios = crate::scenarios::catalogue(&config);
    let scenario = match scenario_id.as_deref() {
        Some(id) => crate::scenarios::find(&scenarios, id)
            .with_context(|| format!("unknown scenario {id:?} (see `parley scenarios`)"))?,
        None => scenarios.first().context("no scenarios available")?,
    }
    .clone();

    let registry = ProviderRegistry::from_config(&config.llm);
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let orchestrator = DialogueOrchestrator::new(
        &config.context,
        &config.llm,
        clock.clone(),
        Box::new(ThreadRandom),
    )
    .with_generator(registry.reply.clone())
    .with_summarizer(registry.summarizer.clone());

    let store = Arc::new(
        JsonFileStore::new(&config.store.path)
            .with_context(|| format!("opening session store {}", config.store.path.display()))?,
    );
    let recorder = SessionRecorder::new(store, clock.clone(), &config.store);
    let lifecycle = LifecycleManager::new(&config.sessions);

    let mut repl = Repl {
        session: PracticeSession::new(orchestrator, recorder, lifecycle, clock),
        speaker: build_speaker(&config.speech),
        transcriber: registry.transcriber.clone(),
    };
    repl.run(&scenario).await
}

struct Repl {
    session: PracticeSession,
    speaker: Option<Arc<dyn SpeechSynthesizer>>,
    transcriber: Option<Arc<dyn Transcriber>>,
}

enum Flow {
    Continue,
    Stop,
}

impl Repl {
    async fn run(&mut self, scenario: &Scenario) -> anyhow::Result<()> {
        let history_path = dirs::home_dir()
            .unwrap_or_default()
            .join(".parley")
            .join("practice_history.txt");
        if let Some(parent) = history_path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let mut rl = rustyline::DefaultEditor::new()?;
        let _ = rl.load_history(&history_path);

        eprintln!("Parley: {}", scenario.name);
        if !scenario.description.is_empty() {
            eprintln!("{}", scenario.description);
        }
        eprintln!("Type /help for commands, Ctrl+D to quit");
        eprintln!();

        if let Some(opening) = self.session.start(scenario).await {
            self.deliver(&opening).await;
        } else {
            self.session.metrics_mut().on_assistant_speaking_end();
        }

        loop {
            let line = match rl.readline("you> ") {
                Ok(line) => line,
                Err(ReadlineError::Interrupted) => {
                    eprintln!("(Use Ctrl+D or /quit to leave)");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    self.abandon().await;
                    break;
                }
                Err(e) => {
                    eprintln!("\x1B[31mreadline error: {e}\x1B[0m");
                    self.abandon().await;
                    break;
                }
            };

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            rl.add_history_entry(&line).ok();

            match self.session.expire_if_idle().await {
                Ok(Some((reason, session))) => {
                    eprintln!("Session expired ({reason}).");
                    print_summary(&session);
                    break;
                }
                Ok(None) => {}
                Err(e) => tracing::debug!(error = %e, "idle check skipped"),
            }

            let flow = if trimmed.starts_with('/') {
                self.handle_slash_command(trimmed).await
            } else {
                self.typed_turn(trimmed).await
            };
            if let Flow::Stop = flow {
                break;
            }
        }

        rl.save_history(&history_path).ok();
        eprintln!("Goodbye!");
        Ok(())
    }

    // ── Turns ───────────────────────────────────────────────────────

    /// A typed line has no audio, so only the response latency is real.
    /// The session closes (or cancels) the metrics turn.
    async fn typed_turn(&mut self, text: &str) -> Flow {
        self.session.metrics_mut().on_user_speaking_start();

        match self.session.respond(text).await {
            Ok(reply) => self.after_reply(&reply).await,
            Err(e) => {
                eprintln!("\x1B[31merror: {e}\x1B[0m");
                Flow::Continue
            }
        }
    }

    async fn spoken_turn(&mut self, path: &str) -> Flow {
        let Some(transcriber) = self.transcriber.clone() else {
            eprintln!("No transcription service configured ([llm.transcription]).");
            return Flow::Continue;
        };
        let audio = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                eprintln!("\x1B[31mcannot read {path}: {e}\x1B[0m");
                return Flow::Continue;
            }
        };
        let filename = Path::new(path)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("audio.wav");

        self.session.metrics_mut().on_user_speaking_start();
        let transcription = match transcriber.transcribe(&audio, filename).await {
            Ok(t) => t,
            Err(e) => {
                self.session.metrics_mut().cancel_turn();
                eprintln!("\x1B[31mtranscription failed: {e}\x1B[0m");
                return Flow::Continue;
            }
        };

        if let Some(text) = transcription.text() {
            eprintln!("(heard) {text}");
        }

        match self.session.respond_to(transcription).await {
            Ok(Some(reply)) => self.after_reply(&reply).await,
            Ok(None) => {
                eprintln!("(no speech detected)");
                Flow::Continue
            }
            Err(e) => {
                eprintln!("\x1B[31merror: {e}\x1B[0m");
                Flow::Continue
            }
        }
    }

    async fn after_reply(&mut self, reply: &str) -> Flow {
        self.deliver(reply).await;
        if self.session.is_conversation_complete() {
            eprintln!("\n(The conversation has come to an end.)");
            self.complete().await;
            return Flow::Stop;
        }
        Flow::Continue
    }

    /// Print and speak an assistant line, then mark the end of its turn.
    async fn deliver(&mut self, text: &str) {
        println!("\x1B[36m{text}\x1B[0m");
        if let Some(speaker) = &self.speaker {
            if let Err(e) = speaker.speak(text).await {
                tracing::warn!(error = %e, "speech playback failed");
            }
        }
        self.session.metrics_mut().on_assistant_speaking_end();
    }

    // ── Slash commands ──────────────────────────────────────────────

    async fn handle_slash_command(&mut self, input: &str) -> Flow {
        let (cmd, arg) = match input.split_once(' ') {
            Some((cmd, arg)) => (cmd, arg.trim()),
            None => (input, ""),
        };

        match cmd {
            "/quit" | "/exit" => {
                self.abandon().await;
                return Flow::Stop;
            }
            "/end" => {
                self.complete().await;
                return Flow::Stop;
            }
            "/say" => {
                if arg.is_empty() {
                    eprintln!("Usage: /say <audio-file>");
                } else {
                    return self.spoken_turn(arg).await;
                }
            }
            "/stats" => match serde_json::to_string_pretty(&self.session.stats()) {
                Ok(json) => eprintln!("{json}"),
                Err(e) => eprintln!("\x1B[31mstats unavailable: {e}\x1B[0m"),
            },
            "/pause" => match self.session.pause().await {
                Ok(()) => eprintln!("Paused. /resume to continue."),
                Err(e) => eprintln!("\x1B[31m{e}\x1B[0m"),
            },
            "/resume" => match self.session.resume().await {
                Ok(()) => {
                    eprintln!("Resumed.");
                    self.session.metrics_mut().on_assistant_speaking_end();
                }
                Err(e) => eprintln!("\x1B[31m{e}\x1B[0m"),
            },
            "/help" => {
                eprintln!("Commands:");
                eprintln!("  /say <file>   Speak a recorded audio clip");
                eprintln!("  /stats        Show conversation statistics");
                eprintln!("  /pause        Pause the session");
                eprintln!("  /resume       Resume a paused session");
                eprintln!("  /end          Finish the session");
                eprintln!("  /quit         Abandon the session and exit");
                eprintln!("  /help         Show this help");
            }
            other => eprintln!("Unknown command: {other}  (type /help for a list)"),
        }
        Flow::Continue
    }

    async fn complete(&mut self) {
        match self.session.complete().await {
            Ok(session) => print_summary(&session),
            Err(e) => eprintln!("\x1B[31m{e}\x1B[0m"),
        }
    }

    async fn abandon(&mut self) {
        if let Some(speaker) = &self.speaker {
            speaker.stop();
        }
        if let Err(e) = self.session.abandon().await {
            tracing::debug!(error = %e, "nothing to abandon");
        }
    }
}

fn print_summary(session: &Session) {
    eprintln!(
        "Session {} ({}): {} turn(s) in {}s",
        session.id.as_deref().unwrap_or("(unsaved)"),
        session.status,
        session.current_turn,
        session.duration_secs.unwrap_or(0),
    );
    let metrics = pa_domain::metrics::ConversationMetrics::from_turns(&session.metadata.turns);
    if metrics.total_turns > 0 {
        eprintln!(
            "  average response time: {} ms, pauses: {}",
            metrics.average_response_time_ms, metrics.total_pauses
        );
    }
    if let Some(trend) = metrics.improvement_trend {
        eprintln!("  trend: {trend}");
    }
}
