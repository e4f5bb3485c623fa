//! Mutating action methods on [`RoutingCore`].

use chrono::{DateTime, Utc};
use tracing::info;

use crate::effectiveness::AssignmentMode;
use crate::ensemble::{plan_assignments, ModeAssignment};

use super::core::RoutingCore;
use super::types::{parse_agent_type, parse_task_type, ApiError};

impl RoutingCore {
    /// Record a task outcome and refresh learned capability scores
    pub fn record_outcome(&self, agent: &str, task: &str, success: bool) -> Result<(), ApiError> {
        self.record_outcome_at(agent, task, success, Utc::now())
    }

    pub fn record_outcome_at(
        &self,
        agent: &str,
        task: &str,
        success: bool,
        now: DateTime<Utc>,
    ) -> Result<(), ApiError> {
        let agent_type = parse_agent_type(agent)?;
        let task_type = parse_task_type(task)?;
        info!(agent = %agent_type, task = %task_type, success, "Recording task outcome");

        self.store()
            .record_outcome(agent_type, task_type, success, now)
            .map_err(ApiError::Persistence)?;
        self.integrator().sync_learned(now);
        Ok(())
    }

    pub fn mode(&self) -> AssignmentMode {
        self.integrator().get_mode()
    }

    /// Change the assignment mode; unknown names are weighted like balanced
    pub fn set_mode(&self, mode: &str) -> Result<AssignmentMode, ApiError> {
        if mode.trim().is_empty() {
            return Err(ApiError::invalid("mode must not be empty"));
        }
        let mode = AssignmentMode::parse(mode);
        self.integrator().set_mode(mode.clone());
        Ok(mode)
    }

    /// Drop outcomes older than the history window
    pub fn prune_history(&self) -> Result<usize, ApiError> {
        self.store()
            .prune(Utc::now())
            .map_err(ApiError::Persistence)
    }

    /// Score a session and pair its pending assignments with agents
    pub fn plan_session_assignments(
        &self,
        session: &str,
        assignments: &[ModeAssignment],
    ) -> Result<Vec<(String, String)>, ApiError> {
        let report = self.score_session(session, "")?;
        Ok(plan_assignments(assignments, &report.agents))
    }
}
