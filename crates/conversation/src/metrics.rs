//! Turn metrics tracker.
//!
//! Turns raw speaking/audio signals into one [`TurnMetrics`] record per
//! completed user turn. The caller forwards events; time comes from the
//! injected [`Clock`].

use std::sync::Arc;

use chrono::{DateTime, Utc};

use pa_domain::clock::{elapsed_ms, Clock};
use pa_domain::metrics::{ConversationMetrics, TurnMetrics};
use pa_domain::trace::TraceEvent;

/// A silence longer than this between two sounds counts as a pause.
pub const PAUSE_THRESHOLD_MS: u64 = 500;

pub struct TurnMetricsTracker {
    clock: Arc<dyn Clock>,
    turns: Vec<TurnMetrics>,
    waiting_since: Option<DateTime<Utc>>,
    // ── per-turn scratch ──
    pending_response_ms: Option<u64>,
    /// The consumed `waiting_since`, restored if the turn is cancelled.
    window_opened: Option<DateTime<Utc>>,
    speaking_start: Option<DateTime<Utc>>,
    last_sound: Option<DateTime<Utc>>,
    pauses: Vec<u64>,
}

impl TurnMetricsTracker {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            turns: Vec::new(),
            waiting_since: None,
            pending_response_ms: None,
            window_opened: None,
            speaking_start: None,
            last_sound: None,
            pauses: Vec::new(),
        }
    }

    /// The assistant stopped talking; the user's response window opens.
    pub fn on_assistant_speaking_end(&mut self) {
        self.waiting_since = Some(self.clock.now());
    }

    pub fn on_user_speaking_start(&mut self) {
        let now = self.clock.now();
        self.window_opened = self.waiting_since.take();
        self.pending_response_ms = self.window_opened.map(|since| elapsed_ms(since, now));
        self.speaking_start = Some(now);
        self.last_sound = Some(now);
        self.pauses.clear();
    }

    /// Called per audio frame while recording.
    pub fn on_audio_activity(&mut self, has_sound: bool) {
        if self.speaking_start.is_none() || !has_sound {
            return;
        }
        let now = self.clock.now();
        if let Some(last) = self.last_sound {
            let gap = elapsed_ms(last, now);
            if gap > PAUSE_THRESHOLD_MS {
                self.pauses.push(gap);
            }
        }
        self.last_sound = Some(now);
    }

    /// Close the current turn. Returns `None` if no turn was in progress.
    pub fn on_user_speaking_end(&mut self, transcript: Option<&str>) -> Option<TurnMetrics> {
        let start = self.speaking_start.take()?;
        let now = self.clock.now();
        let speaking_duration_ms = elapsed_ms(start, now);

        let pause_count = self.pauses.len() as u32;
        let longest_pause_ms = self.pauses.iter().copied().max().unwrap_or(0);
        let average_pause_ms = if self.pauses.is_empty() {
            0
        } else {
            self.pauses.iter().sum::<u64>() / self.pauses.len() as u64
        };

        let estimated_word_count = transcript.map(|t| t.split_whitespace().count() as u32);
        let words_per_minute = match estimated_word_count {
            Some(words) if speaking_duration_ms > 0 => {
                Some(words as f64 * 60_000.0 / speaking_duration_ms as f64)
            }
            _ => None,
        };

        let record = TurnMetrics {
            turn_number: self.turns.len() as u32 + 1,
            response_time_ms: self.pending_response_ms.take(),
            speaking_duration_ms,
            pause_count,
            longest_pause_ms,
            average_pause_ms,
            estimated_word_count,
            words_per_minute,
            timestamp: now,
        };

        TraceEvent::TurnRecorded {
            turn_number: record.turn_number,
            response_time_ms: record.response_time_ms,
            speaking_duration_ms,
            pause_count,
        }
        .emit();

        self.turns.push(record.clone());
        self.window_opened = None;
        self.last_sound = None;
        self.pauses.clear();
        Some(record)
    }

    /// Drop the turn in progress without recording it. The response window
    /// it consumed is reopened, so the next attempt still measures latency
    /// from when the assistant stopped speaking.
    pub fn cancel_turn(&mut self) {
        if self.speaking_start.take().is_none() {
            return;
        }
        let opened = self.window_opened.take();
        self.waiting_since = self.waiting_since.or(opened);
        self.pending_response_ms = None;
        self.last_sound = None;
        self.pauses.clear();
    }

    pub fn is_recording(&self) -> bool {
        self.speaking_start.is_some()
    }

    pub fn turns(&self) -> &[TurnMetrics] {
        &self.turns
    }

    pub fn conversation_metrics(&self) -> ConversationMetrics {
        ConversationMetrics::from_turns(&self.turns)
    }

    pub fn reset(&mut self) {
        self.turns.clear();
        self.waiting_since = None;
        self.pending_response_ms = None;
        self.window_opened = None;
        self.speaking_start = None;
        self.last_sound = None;
        self.pauses.clear();
    }
}
