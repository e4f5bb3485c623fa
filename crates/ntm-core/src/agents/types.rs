use std::fmt;

use serde::{Deserialize, Serialize};

/// Family of AI coding agent hosted in a pane
///
/// The three supported families form a closed set. `Custom` is the escape hatch
/// for families added through configuration; it never appears in
/// [`AgentType::all_variants`] and therefore never in task rankings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AgentType {
    Claude,
    Codex,
    Gemini,
    Custom(String),
}

impl AgentType {
    /// Parse agent type from a short tag or a full name ("cc", "claude", ...)
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim().to_lowercase().as_str() {
            "cc" | "claude" | "claude-code" => Some(AgentType::Claude),
            "cod" | "codex" => Some(AgentType::Codex),
            "gmi" | "gemini" => Some(AgentType::Gemini),
            _ => None,
        }
    }

    /// Detect the agent type from a pane title of the form `<session>__<tag>_<n>`
    ///
    /// Anything after the index (e.g. `proj__cc_2_opus`) is ignored.
    pub fn from_pane_title(title: &str) -> Option<Self> {
        let (_, suffix) = title.rsplit_once("__")?;
        let tag = suffix.split('_').next()?;
        Self::from_tag(tag)
    }

    /// Detect the agent type from pane title first, then the running command
    ///
    /// The command is only trusted on exact matches so that editors or pagers
    /// opened on files named after an agent are not picked up.
    pub fn from_detection(command: &str, title: &str) -> Option<Self> {
        if let Some(agent_type) = Self::from_pane_title(title) {
            return Some(agent_type);
        }

        match command.to_lowercase().as_str() {
            "claude" => Some(AgentType::Claude),
            "codex" => Some(AgentType::Codex),
            "gemini" => Some(AgentType::Gemini),
            _ => None,
        }
    }

    /// Short tag used in pane titles and robot output
    pub fn tag(&self) -> &str {
        match self {
            AgentType::Claude => "cc",
            AgentType::Codex => "cod",
            AgentType::Gemini => "gmi",
            AgentType::Custom(name) => name,
        }
    }

    /// Short name for display
    pub fn short_name(&self) -> &str {
        match self {
            AgentType::Claude => "Claude",
            AgentType::Codex => "Codex",
            AgentType::Gemini => "Gemini",
            AgentType::Custom(name) => name,
        }
    }

    /// Get all standard agent type variants (excluding Custom)
    pub fn all_variants() -> Vec<AgentType> {
        vec![AgentType::Claude, AgentType::Codex, AgentType::Gemini]
    }
}

impl From<String> for AgentType {
    fn from(value: String) -> Self {
        Self::from_tag(&value).unwrap_or(AgentType::Custom(value))
    }
}

impl From<AgentType> for String {
    fn from(value: AgentType) -> Self {
        value.tag().to_string()
    }
}

impl fmt::Display for AgentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// Discrete activity state produced by the activity classifier
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AgentState {
    /// Idle at its prompt, ready for work
    Waiting,
    /// Reasoning before producing output
    Thinking,
    /// Actively streaming output
    Generating,
    /// Was busy but has produced nothing for a long time
    Stalled,
    /// Error visible in recent output
    Error,
    /// Not enough signal to decide
    #[default]
    Unknown,
}

impl AgentState {
    /// Get the display label
    pub fn label(&self) -> &'static str {
        match self {
            AgentState::Waiting => "WAITING",
            AgentState::Thinking => "THINKING",
            AgentState::Generating => "GENERATING",
            AgentState::Stalled => "STALLED",
            AgentState::Error => "ERROR",
            AgentState::Unknown => "UNKNOWN",
        }
    }

    /// Check if the agent is currently busy with work
    pub fn is_busy(&self) -> bool {
        matches!(self, AgentState::Thinking | AgentState::Generating)
    }
}

impl fmt::Display for AgentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Coarse health derived from the activity state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthState {
    #[default]
    Healthy,
    Degraded,
    Unhealthy,
    RateLimited,
}

impl HealthState {
    /// Derive health from activity state
    pub fn from_state(state: AgentState) -> Self {
        match state {
            AgentState::Waiting | AgentState::Thinking | AgentState::Generating => {
                HealthState::Healthy
            }
            AgentState::Stalled => HealthState::Degraded,
            AgentState::Error => HealthState::Unhealthy,
            AgentState::Unknown => HealthState::Healthy,
        }
    }
}

impl fmt::Display for HealthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HealthState::Healthy => write!(f, "healthy"),
            HealthState::Degraded => write!(f, "degraded"),
            HealthState::Unhealthy => write!(f, "unhealthy"),
            HealthState::RateLimited => write!(f, "rate_limited"),
        }
    }
}
