//! Ensemble mode assignments and how routing output feeds them.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::agents::AgentType;
use crate::routing::{get_available_agents, ScoredAgent};

/// Lifecycle of one mode assignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStatus {
    Pending,
    Injecting,
    Active,
    Done,
    Error,
}

impl AssignmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssignmentStatus::Pending => "pending",
            AssignmentStatus::Injecting => "injecting",
            AssignmentStatus::Active => "active",
            AssignmentStatus::Done => "done",
            AssignmentStatus::Error => "error",
        }
    }

    /// Done or Error
    pub fn is_terminal(&self) -> bool {
        matches!(self, AssignmentStatus::Done | AssignmentStatus::Error)
    }
}

impl fmt::Display for AssignmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One reasoning mode of an ensemble run and the agent type that should run it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModeAssignment {
    pub mode_id: String,
    pub agent_type: AgentType,
    pub status: AssignmentStatus,
}

impl ModeAssignment {
    pub fn new(mode_id: impl Into<String>, agent_type: AgentType, status: AssignmentStatus) -> Self {
        Self {
            mode_id: mode_id.into(),
            agent_type,
            status,
        }
    }
}

/// Assignment totals by lifecycle bucket
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AssignmentCounts {
    /// Pending or Injecting
    pub pending: usize,
    /// Active
    pub working: usize,
    pub done: usize,
    pub error: usize,
}

impl AssignmentCounts {
    pub fn from_assignments(assignments: &[ModeAssignment]) -> Self {
        let mut counts = Self::default();
        for a in assignments {
            match a.status {
                AssignmentStatus::Pending | AssignmentStatus::Injecting => counts.pending += 1,
                AssignmentStatus::Active => counts.working += 1,
                AssignmentStatus::Done => counts.done += 1,
                AssignmentStatus::Error => counts.error += 1,
            }
        }
        counts
    }

    pub fn total(&self) -> usize {
        self.pending + self.working + self.done + self.error
    }
}

/// Pair each pending assignment with the best unused agent of its type
///
/// Agents are taken in ranking order (see [`get_available_agents`]); excluded
/// agents are never used and each pane receives at most one assignment.
/// Assignments with no matching agent left are omitted from the result.
pub fn plan_assignments(
    assignments: &[ModeAssignment],
    agents: &[ScoredAgent],
) -> Vec<(String, String)> {
    let ranked = get_available_agents(agents);
    let mut used: HashSet<&str> = HashSet::new();
    let mut plan = Vec::new();

    for assignment in assignments
        .iter()
        .filter(|a| a.status == AssignmentStatus::Pending)
    {
        let pick = ranked.iter().find(|agent| {
            agent.agent_type == assignment.agent_type && !used.contains(agent.pane_id.as_str())
        });
        match pick {
            Some(agent) => {
                used.insert(agent.pane_id.as_str());
                plan.push((assignment.mode_id.clone(), agent.pane_id.clone()));
            }
            None => {
                debug!(
                    mode = %assignment.mode_id,
                    agent_type = %assignment.agent_type.tag(),
                    "No available agent for assignment"
                );
            }
        }
    }
    plan
}
