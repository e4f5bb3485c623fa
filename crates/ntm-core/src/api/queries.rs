//! Read-only query methods on [`RoutingCore`].

use chrono::{DateTime, Utc};

use crate::effectiveness::Ranking;
use crate::routing::{get_available_agents, get_best_agent, ScoredAgent, ScoringReport};

use super::core::RoutingCore;
use super::types::{
    parse_agent_type, parse_task_type, ApiError, EffectivenessReport, RouteFilter, RouteResult,
};

impl RoutingCore {
    // =========================================================
    // Routing queries
    // =========================================================

    /// Score every agent pane of a session
    pub fn score_session(&self, session: &str, prompt: &str) -> Result<ScoringReport, ApiError> {
        self.score_session_at(session, prompt, Utc::now())
    }

    pub fn score_session_at(
        &self,
        session: &str,
        prompt: &str,
        now: DateTime<Utc>,
    ) -> Result<ScoringReport, ApiError> {
        self.scorer()
            .score_agents_at(session, prompt, now)
            .map_err(|e| ApiError::enumeration(session, e))
    }

    /// Recommend an agent for a prompt, applying pane and type filters
    pub fn route(
        &self,
        session: &str,
        prompt: &str,
        filter: &RouteFilter,
    ) -> Result<RouteResult, ApiError> {
        let report = self.score_session(session, prompt)?;
        Ok(RouteResult::from_report(report, filter))
    }

    /// Highest-scoring available agent of a session
    pub fn best_agent(&self, session: &str, prompt: &str) -> Result<Option<ScoredAgent>, ApiError> {
        let report = self.score_session(session, prompt)?;
        Ok(get_best_agent(&report.agents).cloned())
    }

    /// Available agents of a session, best first
    pub fn available_agents(
        &self,
        session: &str,
        prompt: &str,
    ) -> Result<Vec<ScoredAgent>, ApiError> {
        let report = self.score_session(session, prompt)?;
        Ok(get_available_agents(&report.agents))
    }

    // =========================================================
    // Effectiveness queries
    // =========================================================

    /// Rank the known agent types for a task label
    pub fn rank_for_task(&self, task: &str) -> Result<Ranking, ApiError> {
        let task_type = parse_task_type(task)?;
        self.integrator()
            .rank_agents_for_task(&task_type)
            .map_err(ApiError::Internal)
    }

    /// History and current bonus for an agent/task pair
    pub fn effectiveness(&self, agent: &str, task: &str) -> Result<EffectivenessReport, ApiError> {
        self.effectiveness_at(agent, task, Utc::now())
    }

    pub fn effectiveness_at(
        &self,
        agent: &str,
        task: &str,
        now: DateTime<Utc>,
    ) -> Result<EffectivenessReport, ApiError> {
        let agent_type = parse_agent_type(agent)?;
        let task_type = parse_task_type(task)?;
        let (bonus, reason) = self
            .integrator()
            .effectiveness_bonus_at(&agent_type, &task_type, now);

        Ok(EffectivenessReport {
            effectiveness: self.store().effectiveness(&agent_type, &task_type, now),
            mode: self.integrator().get_mode(),
            bonus,
            reason,
        })
    }
}
