use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::agents::{AgentState, AgentType};

use super::patterns;

/// Output growth (chars/sec) above which the agent counts as generating
pub const GENERATING_VELOCITY: f64 = 10.0;

/// Default quiet period after which a busy agent counts as stalled
pub const DEFAULT_STALL_AFTER_SECS: i64 = 300;

/// Maximum length of the raw sample kept in a snapshot
const RAW_SAMPLE_BYTES: usize = 400;

/// One classification of a pane's activity
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivitySnapshot {
    /// Classified state
    pub state: AgentState,
    /// Confidence in the classification (0-1)
    pub confidence: f64,
    /// Characters of new output per second since the previous capture
    pub velocity: f64,
    /// When new output was last observed, if ever
    pub last_output: Option<DateTime<Utc>>,
    /// Provider rate-limit message visible in recent output
    pub rate_limited: bool,
    /// Tail of the capture the classification was based on
    pub raw_sample: String,
}

/// Stateful classifier for a single pane
///
/// Keeps the previous capture so that output velocity can be tracked across
/// calls. One instance per pane lives in the [`ActivityMonitor`](super::ActivityMonitor).
#[derive(Debug, Clone)]
pub struct ActivityClassifier {
    agent_type: Option<AgentType>,
    previous: Option<String>,
    last_capture_at: Option<DateTime<Utc>>,
    last_output_at: Option<DateTime<Utc>>,
    last_state: AgentState,
    stall_after: Duration,
}

impl Default for ActivityClassifier {
    fn default() -> Self {
        Self::new(Duration::seconds(DEFAULT_STALL_AFTER_SECS))
    }
}

impl ActivityClassifier {
    /// Create a classifier with a custom stall threshold
    pub fn new(stall_after: Duration) -> Self {
        Self {
            agent_type: None,
            previous: None,
            last_capture_at: None,
            last_output_at: None,
            last_state: AgentState::Unknown,
            stall_after,
        }
    }

    /// Set the agent type hosted in this pane
    pub fn set_agent_type(&mut self, agent_type: AgentType) {
        self.agent_type = Some(agent_type);
    }

    pub fn agent_type(&self) -> Option<&AgentType> {
        self.agent_type.as_ref()
    }

    /// Classify a fresh capture taken at `now`
    pub fn classify(&mut self, content: &str, now: DateTime<Utc>) -> ActivitySnapshot {
        let changed = self.changed_chars(content);
        let velocity = match self.last_capture_at {
            Some(prev) if changed > 0 => {
                let elapsed = (now - prev).num_milliseconds().max(1) as f64 / 1000.0;
                changed as f64 / elapsed
            }
            _ => 0.0,
        };
        if changed > 0 && self.previous.is_some() {
            self.last_output_at = Some(now);
        }

        let (state, confidence) = self.decide(content, velocity, now);

        self.previous = Some(content.to_string());
        self.last_capture_at = Some(now);
        self.last_state = state;

        ActivitySnapshot {
            state,
            confidence,
            velocity,
            last_output: self.last_output_at,
            rate_limited: patterns::is_rate_limited(content),
            raw_sample: patterns::safe_tail(content, RAW_SAMPLE_BYTES).to_string(),
        }
    }

    fn decide(&self, content: &str, velocity: f64, now: DateTime<Utc>) -> (AgentState, f64) {
        if patterns::detect_error(content).is_some() {
            return (AgentState::Error, 0.9);
        }
        if velocity >= GENERATING_VELOCITY {
            let confidence = (0.6 + velocity / 200.0).min(0.95);
            return (AgentState::Generating, confidence);
        }
        if patterns::is_thinking(content) {
            return (AgentState::Thinking, 0.8);
        }
        if velocity > 0.0 {
            return (AgentState::Thinking, 0.5);
        }
        if patterns::has_idle_prompt(content) {
            return (AgentState::Waiting, 0.85);
        }
        if self.last_state.is_busy() || self.last_state == AgentState::Stalled {
            let quiet_since = self.last_output_at.or(self.last_capture_at);
            if quiet_since.is_some_and(|t| now - t >= self.stall_after) {
                return (AgentState::Stalled, 0.7);
            }
            return (self.last_state, 0.4);
        }
        (AgentState::Unknown, 0.3)
    }

    /// Characters in `content` past the common prefix with the previous capture
    fn changed_chars(&self, content: &str) -> usize {
        let Some(previous) = self.previous.as_deref() else {
            return 0;
        };
        if previous == content {
            return 0;
        }
        let common = previous
            .chars()
            .zip(content.chars())
            .take_while(|(a, b)| a == b)
            .count();
        content.chars().count().saturating_sub(common).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn test_first_capture_has_no_velocity() {
        let mut c = ActivityClassifier::default();
        let snap = c.classify("hello\n> ", at(0));
        assert_eq!(snap.velocity, 0.0);
        assert_eq!(snap.last_output, None);
        assert_eq!(snap.state, AgentState::Waiting);
    }

    #[test]
    fn test_fast_growth_is_generating() {
        let mut c = ActivityClassifier::default();
        c.classify("start", at(0));
        let grown = format!("start{}", "x".repeat(200));
        let snap = c.classify(&grown, at(2));
        assert_eq!(snap.state, AgentState::Generating);
        assert_eq!(snap.velocity, 100.0);
        assert_eq!(snap.last_output, Some(at(2)));
    }

    #[test]
    fn test_slow_growth_is_thinking() {
        let mut c = ActivityClassifier::default();
        c.classify("start", at(0));
        let snap = c.classify("start.", at(5));
        assert_eq!(snap.state, AgentState::Thinking);
        assert!(snap.velocity > 0.0 && snap.velocity < GENERATING_VELOCITY);
    }

    #[test]
    fn test_error_wins() {
        let mut c = ActivityClassifier::default();
        let snap = c.classify("doing work\nError: connection reset\n> ", at(0));
        assert_eq!(snap.state, AgentState::Error);
    }

    #[test]
    fn test_rate_limited_flag() {
        let mut c = ActivityClassifier::default();
        let snap = c.classify("Claude usage limit reached\n> ", at(0));
        assert!(snap.rate_limited);
        assert_eq!(snap.state, AgentState::Waiting);
    }

    #[test]
    fn test_busy_then_quiet_becomes_stalled() {
        let mut c = ActivityClassifier::new(Duration::seconds(60));
        c.classify("start", at(0));
        let grown = format!("start{}", "y".repeat(500));
        assert_eq!(c.classify(&grown, at(1)).state, AgentState::Generating);

        // Quiet but not long enough
        let snap = c.classify(&grown, at(30));
        assert_eq!(snap.state, AgentState::Generating);

        let snap = c.classify(&grown, at(120));
        assert_eq!(snap.state, AgentState::Stalled);
        assert_eq!(snap.last_output, Some(at(1)));
    }

    #[test]
    fn test_no_signal_is_unknown() {
        let mut c = ActivityClassifier::default();
        let snap = c.classify("some log line", at(0));
        assert_eq!(snap.state, AgentState::Unknown);
    }
}
