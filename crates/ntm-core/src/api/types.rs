use serde::Serialize;

use crate::agents::AgentType;
use crate::effectiveness::{AgentTaskEffectiveness, AssignmentMode, TaskType};
use crate::routing::{
    exclude_panes, filter_by_panes, filter_by_type, get_available_agents, get_best_agent,
    ScoredAgent, ScoringReport,
};

/// Typed errors returned by the [`RoutingCore`](super::RoutingCore) facade
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The tmux session does not exist
    #[error("session not found: {session}")]
    SessionNotFound { session: String },

    /// Panes of the session could not be listed
    #[error("pane enumeration failed: {0}")]
    PaneEnumeration(#[source] anyhow::Error),

    /// Invalid input (e.g. unknown agent type, empty task label)
    #[error("invalid input: {message}")]
    InvalidInput { message: String },

    /// Outcome history could not be read or written
    #[error("persistence failed: {0}")]
    Persistence(#[source] anyhow::Error),

    /// Any other failure inside the core
    #[error("internal error: {0}")]
    Internal(#[source] anyhow::Error),
}

impl ApiError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        ApiError::InvalidInput {
            message: message.into(),
        }
    }

    /// Classify a pane listing failure
    pub(crate) fn enumeration(session: &str, err: anyhow::Error) -> Self {
        let text = format!("{:#}", err);
        if text.contains("can't find session") || text.contains("no such session") {
            ApiError::SessionNotFound {
                session: session.to_string(),
            }
        } else {
            ApiError::PaneEnumeration(err)
        }
    }
}

/// Parse a known agent type tag or name
pub(crate) fn parse_agent_type(value: &str) -> Result<AgentType, ApiError> {
    AgentType::from_tag(value)
        .ok_or_else(|| ApiError::invalid(format!("unknown agent type: {}", value)))
}

/// Parse a task label; empty labels are rejected
pub(crate) fn parse_task_type(value: &str) -> Result<TaskType, ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::invalid("task type must not be empty"));
    }
    Ok(TaskType::parse(value))
}

/// Narrowing applied to a scoring pass before picking a recommendation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteFilter {
    /// Agent type tag ("cc", "cod", "gmi"); empty keeps all
    pub agent_type: String,
    /// Only these pane indices; empty keeps all
    pub panes: Vec<u32>,
    /// Never these pane indices
    pub exclude_panes: Vec<u32>,
    /// List excluded agents too
    pub include_excluded: bool,
}

impl RouteFilter {
    /// Apply type and pane filters, keeping pane order
    pub fn apply(&self, agents: &[ScoredAgent]) -> Vec<ScoredAgent> {
        let by_type = filter_by_type(agents, &self.agent_type);
        let by_panes = filter_by_panes(&by_type, &self.panes);
        exclude_panes(&by_panes, &self.exclude_panes)
    }
}

/// Outcome of a routing query
#[derive(Debug, Clone, Serialize)]
pub struct RouteResult {
    pub session: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_type: Option<TaskType>,
    /// Best available agent after filtering
    pub recommendation: Option<ScoredAgent>,
    /// Available agents by score, or every filtered agent with `include_excluded`
    pub agents: Vec<ScoredAgent>,
    pub total: usize,
    pub available: usize,
    pub skipped: usize,
}

impl RouteResult {
    pub(crate) fn from_report(report: ScoringReport, filter: &RouteFilter) -> Self {
        let filtered = filter.apply(&report.agents);
        let available = get_available_agents(&filtered);
        let recommendation = get_best_agent(&filtered).cloned();
        let available_count = available.len();
        let agents = if filter.include_excluded {
            filtered
        } else {
            available
        };

        Self {
            session: report.session,
            task_type: report.task_type,
            recommendation,
            total: report.agents.len(),
            available: available_count,
            agents,
            skipped: report.skipped,
        }
    }
}

/// Historical effectiveness of one agent type on one task type
#[derive(Debug, Clone, Serialize)]
pub struct EffectivenessReport {
    #[serde(flatten)]
    pub effectiveness: AgentTaskEffectiveness,
    pub mode: AssignmentMode,
    /// Bonus applied in rankings (-0.6..=0.6)
    pub bonus: f64,
    pub reason: String,
}
