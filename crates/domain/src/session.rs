//! The persisted practice-session record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::message::{count_user_messages, Message};
use crate::metrics::TurnMetrics;
use crate::scenario::Scenario;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Active,
    Paused,
    Completed,
    Abandoned,
    Timeout,
}

impl SessionStatus {
    /// Terminal statuses admit no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Abandoned | Self::Timeout)
    }

    /// Whether `self -> next` is a legal lifecycle step.
    pub fn can_transition_to(self, next: SessionStatus) -> bool {
        use SessionStatus::*;
        match (self, next) {
            (Active, Paused) | (Paused, Active) => true,
            (Active | Paused, Completed | Abandoned | Timeout) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Completed => "completed",
            Self::Abandoned => "abandoned",
            Self::Timeout => "timeout",
        })
    }
}

/// Session-level metadata persisted alongside the transcript.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionMetrics {
    #[serde(default)]
    pub turns: Vec<TurnMetrics>,
    /// Assistant replies that came from the canned fallback list.
    #[serde(default)]
    pub fallback_replies: u32,
    /// Whether older history has been folded into a summary at least once.
    #[serde(default)]
    pub summarized: bool,
}

/// One practice run against a scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Durable-store id, assigned by the recorder when the session starts.
    #[serde(default)]
    pub id: Option<String>,
    pub scenario_id: String,
    pub scenario_name: String,
    pub start_time: DateTime<Utc>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    /// Whole seconds between `start_time` and `end_time`.
    #[serde(default)]
    pub duration_secs: Option<i64>,
    pub status: SessionStatus,
    /// Last local mutation; drives idle expiry.
    pub updated_at: DateTime<Utc>,
    pub current_turn: u32,
    #[serde(default)]
    pub transcript: Vec<Message>,
    #[serde(default)]
    pub metadata: SessionMetrics,
}

impl Session {
    pub fn new(scenario: &Scenario, start_time: DateTime<Utc>) -> Self {
        Self {
            id: None,
            scenario_id: scenario.id.clone(),
            scenario_name: scenario.name.clone(),
            start_time,
            end_time: None,
            duration_secs: None,
            status: SessionStatus::Active,
            updated_at: start_time,
            current_turn: 0,
            transcript: Vec::new(),
            metadata: SessionMetrics::default(),
        }
    }

    /// Replace the transcript, keeping `current_turn` equal to the number
    /// of user messages.
    pub fn set_transcript(&mut self, transcript: Vec<Message>) {
        self.current_turn = count_user_messages(&transcript) as u32;
        self.transcript = transcript;
    }

    pub fn touch(&mut self, at: DateTime<Utc>) {
        self.updated_at = at;
    }

    /// Stamp `end_time` and the whole-second duration.
    pub fn close(&mut self, at: DateTime<Utc>) {
        self.end_time = Some(at);
        self.duration_secs = Some(at.signed_duration_since(self.start_time).num_seconds());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_statuses_are_frozen() {
        use SessionStatus::*;
        for terminal in [Completed, Abandoned, Timeout] {
            for next in [Active, Paused, Completed, Abandoned, Timeout] {
                assert!(!terminal.can_transition_to(next), "{terminal} -> {next}");
            }
        }
    }

    #[test]
    fn pause_and_resume_are_legal() {
        assert!(SessionStatus::Active.can_transition_to(SessionStatus::Paused));
        assert!(SessionStatus::Paused.can_transition_to(SessionStatus::Active));
        assert!(!SessionStatus::Active.can_transition_to(SessionStatus::Active));
    }

    #[test]
    fn set_transcript_tracks_user_turns() {
        let scenario = Scenario {
            id: "s".into(),
            name: "Test".into(),
            description: String::new(),
            system_prompt: "x".into(),
            initial_message: None,
            estimated_minutes: None,
        };
        let mut session = Session::new(&scenario, Utc::now());
        session.set_transcript(vec![
            Message::assistant("hi"),
            Message::user("hello"),
            Message::assistant("how can I help"),
            Message::user("coffee"),
        ]);
        assert_eq!(session.current_turn, 2);
    }

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_string(&SessionStatus::Abandoned).unwrap();
        assert_eq!(json, "\"abandoned\"");
    }
}
