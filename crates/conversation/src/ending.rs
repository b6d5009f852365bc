//! Ending policy.
//!
//! Decides, turn by turn, when a scenario should start winding down and
//! which reply should be the last. The decision is probabilistic between the
//! minimum and maximum turn targets, so the random source is injected.

use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use pa_domain::trace::TraceEvent;

/// Chance per turn of starting to wind down once `min_turns` is reached.
pub const SOFT_ENDING_PROBABILITY: f64 = 0.3;
/// Chance per turn, once winding down, that this reply is the last.
pub const FINAL_REPLY_PROBABILITY: f64 = 0.5;

const WIND_DOWN_PROMPT: &str = "\n\n## Pacing\n\
The conversation has been going for a while. Start winding down naturally: \
wrap up the current topic and steer toward a conclusion, without ending abruptly.";

const CLOSING_PROMPT: &str = "\n\n## Pacing\n\
This is your final reply. Bring the conversation to a natural close with a \
friendly closing line that fits the scenario. Do not ask any new questions.";

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Random source
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Uniform draws in `[0, 1)`. A draw `r` succeeds against `p` when `r < p`.
pub trait RandomSource: Send {
    fn next_unit(&mut self) -> f64;
}

/// Production source backed by the thread-local RNG.
#[derive(Debug, Default)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn next_unit(&mut self) -> f64 {
        rand::thread_rng().gen::<f64>()
    }
}

/// Reproducible source for replays and simulations.
pub struct StdRandom {
    rng: StdRng,
}

impl StdRandom {
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl RandomSource for StdRandom {
    fn next_unit(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }
}

/// Replays a fixed list of draws, then repeats `fallback`.
pub struct ScriptedRandom {
    draws: VecDeque<f64>,
    fallback: f64,
}

impl ScriptedRandom {
    pub fn new(draws: impl IntoIterator<Item = f64>, fallback: f64) -> Self {
        Self {
            draws: draws.into_iter().collect(),
            fallback,
        }
    }

    /// Every draw fails any probability below 1.0.
    pub fn never() -> Self {
        Self::new(Vec::new(), 0.999_999)
    }

    /// Every draw succeeds against any positive probability.
    pub fn always() -> Self {
        Self::new(Vec::new(), 0.0)
    }
}

impl RandomSource for ScriptedRandom {
    fn next_unit(&mut self) -> f64 {
        self.draws.pop_front().unwrap_or(self.fallback)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Turn targets
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnTargets {
    pub estimated_turns: usize,
    pub min_turns: usize,
    pub max_turns: usize,
}

impl TurnTargets {
    /// `estimated = ceil(minutes * 0.8)`, at least 1; `min = max(3, est - 2)`;
    /// `max = est + 3`.
    pub fn for_minutes(estimated_minutes: Option<u32>) -> Self {
        let minutes = estimated_minutes.unwrap_or(0) as usize;
        // ceil(m * 4 / 5) in integers.
        let estimated_turns = ((minutes * 4).div_ceil(5)).max(1);
        Self {
            estimated_turns,
            min_turns: estimated_turns.saturating_sub(2).max(3),
            max_turns: estimated_turns + 3,
        }
    }

    /// Probability of entering the wind-down at `user_turns`.
    pub fn soft_probability(&self, user_turns: usize) -> f64 {
        if user_turns < self.min_turns {
            0.0
        } else if user_turns >= self.max_turns {
            1.0
        } else {
            SOFT_ENDING_PROBABILITY
        }
    }

    /// Probability that the reply at `user_turns` is the last one.
    pub fn final_probability(&self, user_turns: usize) -> f64 {
        if user_turns >= self.max_turns {
            1.0
        } else {
            FINAL_REPLY_PROBABILITY
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Policy
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EndingState {
    NotEnding,
    EndingSoft,
    EndingFinal,
}

impl EndingState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotEnding => "not_ending",
            Self::EndingSoft => "ending_soft",
            Self::EndingFinal => "ending_final",
        }
    }
}

pub struct EndingPolicy {
    targets: TurnTargets,
    state: EndingState,
    rng: Box<dyn RandomSource>,
}

impl EndingPolicy {
    pub fn new(rng: Box<dyn RandomSource>) -> Self {
        Self {
            targets: TurnTargets::for_minutes(None),
            state: EndingState::NotEnding,
            rng,
        }
    }

    pub fn reset(&mut self, estimated_minutes: Option<u32>) {
        self.targets = TurnTargets::for_minutes(estimated_minutes);
        self.state = EndingState::NotEnding;
    }

    pub fn state(&self) -> EndingState {
        self.state
    }

    pub fn targets(&self) -> TurnTargets {
        self.targets
    }

    /// True once the final-reply decision has been made.
    pub fn is_conversation_complete(&self) -> bool {
        self.state == EndingState::EndingFinal
    }

    /// Evaluate one turn. The turn that enters the wind-down also gets its
    /// final-reply decision, so reaching `max_turns` ends in a single step.
    pub fn advance(&mut self, user_turns: usize) -> EndingState {
        let before = self.state;

        if self.state == EndingState::NotEnding {
            let p = self.targets.soft_probability(user_turns);
            if p > 0.0 && self.draw(p) {
                self.state = EndingState::EndingSoft;
            }
        }

        if self.state == EndingState::EndingSoft {
            let p = self.targets.final_probability(user_turns);
            if self.draw(p) {
                self.state = EndingState::EndingFinal;
            }
        }

        if self.state != before {
            TraceEvent::EndingTransition {
                from: before.as_str().into(),
                to: self.state.as_str().into(),
                user_turns,
                min_turns: self.targets.min_turns,
                max_turns: self.targets.max_turns,
            }
            .emit();
        }
        self.state
    }

    /// `base` plus the pacing block for the current state.
    pub fn decorate_system_prompt(&self, base: &str) -> String {
        match self.state {
            EndingState::NotEnding => base.to_string(),
            EndingState::EndingSoft => format!("{base}{WIND_DOWN_PROMPT}"),
            EndingState::EndingFinal => format!("{base}{CLOSING_PROMPT}"),
        }
    }

    fn draw(&mut self, p: f64) -> bool {
        p >= 1.0 || self.rng.next_unit() < p
    }
}
