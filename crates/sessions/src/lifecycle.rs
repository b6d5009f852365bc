//! Idle expiry.
//!
//! A session that sits active or paused past the idle window is moved to
//! `timeout` by the caller; this module only answers whether that is due.

use chrono::{DateTime, Utc};

use pa_domain::config::SessionsConfig;
use pa_domain::session::Session;

/// Why a session should be expired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpireReason {
    IdleTimeout { idle_minutes: u32 },
}

impl std::fmt::Display for ExpireReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IdleTimeout { idle_minutes } => write!(f, "idle timeout ({idle_minutes}m)"),
        }
    }
}

pub struct LifecycleManager {
    idle_minutes: Option<u32>,
}

impl LifecycleManager {
    pub fn new(config: &SessionsConfig) -> Self {
        Self {
            idle_minutes: config.idle_minutes,
        }
    }

    pub fn should_expire(&self, session: &Session, now: DateTime<Utc>) -> Option<ExpireReason> {
        if session.status.is_terminal() {
            return None;
        }
        let idle = self.idle_minutes?;
        let elapsed = now.signed_duration_since(session.updated_at).num_minutes();
        if elapsed >= idle as i64 {
            Some(ExpireReason::IdleTimeout { idle_minutes: idle })
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use pa_domain::scenario::Scenario;
    use pa_domain::session::SessionStatus;

    fn session_at(t: DateTime<Utc>) -> Session {
        let scenario = Scenario {
            id: "hotel".into(),
            name: "Hotel Check-in".into(),
            description: String::new(),
            system_prompt: "You are a receptionist.".into(),
            initial_message: None,
            estimated_minutes: Some(8),
        };
        Session::new(&scenario, t)
    }

    #[test]
    fn idle_past_window_expires() {
        let start = Utc::now();
        let manager = LifecycleManager::new(&SessionsConfig {
            idle_minutes: Some(30),
        });
        let session = session_at(start);

        assert!(manager
            .should_expire(&session, start + Duration::minutes(29))
            .is_none());
        assert_eq!(
            manager.should_expire(&session, start + Duration::minutes(30)),
            Some(ExpireReason::IdleTimeout { idle_minutes: 30 })
        );
    }

    #[test]
    fn activity_resets_the_window() {
        let start = Utc::now();
        let manager = LifecycleManager::new(&SessionsConfig {
            idle_minutes: Some(10),
        });
        let mut session = session_at(start);
        session.touch(start + Duration::minutes(8));
        assert!(manager
            .should_expire(&session, start + Duration::minutes(15))
            .is_none());
    }

    #[test]
    fn disabled_or_terminal_never_expires() {
        let start = Utc::now();
        let later = start + Duration::days(2);

        let disabled = LifecycleManager::new(&SessionsConfig { idle_minutes: None });
        assert!(disabled.should_expire(&session_at(start), later).is_none());

        let manager = LifecycleManager::new(&SessionsConfig::default());
        let mut done = session_at(start);
        done.status = SessionStatus::Completed;
        assert!(manager.should_expire(&done, later).is_none());
    }
}
