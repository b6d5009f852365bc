//! Per-turn speech metrics and the aggregates derived from them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Number of most recent turns considered when classifying the trend.
pub const TREND_WINDOW: usize = 3;

/// Timing and pause structure of one completed user turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnMetrics {
    /// 1-based, strictly increasing, no gaps.
    pub turn_number: u32,
    /// Milliseconds between the assistant finishing and the user starting.
    /// `None` when no wait window was open (e.g. the very first turn).
    #[serde(default)]
    pub response_time_ms: Option<u64>,
    pub speaking_duration_ms: u64,
    pub pause_count: u32,
    pub longest_pause_ms: u64,
    pub average_pause_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_word_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub words_per_minute: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

impl TurnMetrics {
    /// Response time if one was measured and is positive.
    pub fn measured_response_time(&self) -> Option<u64> {
        self.response_time_ms.filter(|ms| *ms > 0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ImprovementTrend {
    Improving,
    Steady,
    NeedsPractice,
}

impl std::fmt::Display for ImprovementTrend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Improving => "improving",
            Self::Steady => "steady",
            Self::NeedsPractice => "needs-practice",
        })
    }
}

/// Aggregates over a turn history. Always recomputed, never stored on its own.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationMetrics {
    pub total_turns: u32,
    pub average_response_time_ms: u64,
    pub average_speaking_duration_ms: u64,
    pub total_pauses: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub improvement_trend: Option<ImprovementTrend>,
}

impl ConversationMetrics {
    pub fn from_turns(turns: &[TurnMetrics]) -> Self {
        if turns.is_empty() {
            return Self::default();
        }

        let measured: Vec<u64> = turns
            .iter()
            .filter_map(TurnMetrics::measured_response_time)
            .collect();
        let average_response_time_ms = mean(&measured);

        let durations: Vec<u64> = turns.iter().map(|t| t.speaking_duration_ms).collect();
        let average_speaking_duration_ms = mean(&durations);

        let improvement_trend = if turns.len() >= TREND_WINDOW {
            Some(classify_trend(&turns[turns.len() - TREND_WINDOW..]))
        } else {
            None
        };

        Self {
            total_turns: turns.len() as u32,
            average_response_time_ms,
            average_speaking_duration_ms,
            total_pauses: turns.iter().map(|t| t.pause_count).sum(),
            improvement_trend,
        }
    }
}

/// Classify the response-time trend over `window`.
///
/// Only measured response times count. With fewer than two of them the
/// window is `Steady`. Strictly falling times are `Improving`, strictly
/// rising ones `NeedsPractice`, anything else `Steady`.
fn classify_trend(window: &[TurnMetrics]) -> ImprovementTrend {
    let times: Vec<u64> = window
        .iter()
        .filter_map(TurnMetrics::measured_response_time)
        .collect();
    if times.len() < 2 {
        return ImprovementTrend::Steady;
    }

    if times.windows(2).all(|w| w[1] < w[0]) {
        ImprovementTrend::Improving
    } else if times.windows(2).all(|w| w[1] > w[0]) {
        ImprovementTrend::NeedsPractice
    } else {
        ImprovementTrend::Steady
    }
}

fn mean(values: &[u64]) -> u64 {
    if values.is_empty() {
        return 0;
    }
    let sum: u64 = values.iter().sum();
    (sum as f64 / values.len() as f64).round() as u64
}
