use std::sync::Arc;
use std::thread;

use anyhow::Result;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use tracing::debug;

use crate::activity::{ActivityMonitor, ActivitySnapshot};
use crate::agents::{AgentState, AgentType, HealthState};
use crate::context::{ContextIndicatorParser, ContextUsageProvider};
use crate::effectiveness::{EffectivenessIntegrator, TaskType};
use crate::tmux::{PaneInfo, PaneSource};

use super::affinity::{AffinityMatcher, NoAffinity};
use super::config::RoutingConfig;

/// Score points per unit of effectiveness bonus
pub const EFFECTIVENESS_POINTS: f64 = 20.0;

/// An agent with its computed routing score
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredAgent {
    // Identity
    pub pane_id: String,
    pub agent_type: AgentType,
    pub pane_index: u32,

    // Observed
    pub state: AgentState,
    pub confidence: f64,
    pub velocity: f64,
    /// Context usage percent (0-100)
    pub context_usage: f64,
    pub last_activity: Option<DateTime<Utc>>,
    pub health_state: HealthState,
    pub rate_limited: bool,

    // Scoring results
    /// Final composite score (0-100); 0 when excluded
    pub score: f64,
    /// If true, agent should not receive work
    pub excluded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude_reason: Option<String>,
    /// Pre-exclusion breakdown, always populated
    pub score_detail: ScoreBreakdown,
}

impl ScoredAgent {
    /// Blank agent in `Unknown` state
    pub fn new(pane_id: impl Into<String>, agent_type: AgentType, pane_index: u32) -> Self {
        Self {
            pane_id: pane_id.into(),
            agent_type,
            pane_index,
            state: AgentState::Unknown,
            confidence: 0.0,
            velocity: 0.0,
            context_usage: 0.0,
            last_activity: None,
            health_state: HealthState::from_state(AgentState::Unknown),
            rate_limited: false,
            score: 0.0,
            excluded: false,
            exclude_reason: None,
            score_detail: ScoreBreakdown::default(),
        }
    }
}

/// How a score was calculated
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    /// 0-100
    pub context_score: f64,
    /// Raw -100..100 state score normalized to 0-100
    pub state_score: f64,
    /// 0-100
    pub recency_score: f64,
    /// 0..affinity_bonus (if enabled)
    pub affinity_bonus: f64,
    /// Historical effectiveness adjustment in points (0 without an integrator)
    pub effectiveness_bonus: f64,

    // Weighted contributions
    pub context_contrib: f64,
    pub state_contrib: f64,
    pub recency_contrib: f64,
}

/// Classified pane ready to be scored
#[derive(Debug, Clone)]
pub struct AgentObservation {
    pub pane_id: String,
    pub agent_type: AgentType,
    pub pane_index: u32,
    pub activity: ActivitySnapshot,
    pub context_usage: f64,
}

/// Result of scoring one session
#[derive(Debug, Clone, Serialize)]
pub struct ScoringReport {
    pub session: String,
    /// One entry per recognized and classified agent pane, in pane order
    pub agents: Vec<ScoredAgent>,
    /// Agent panes dropped because capture or classification failed
    pub skipped: usize,
    /// Task type inferred from the prompt, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_type: Option<TaskType>,
}

/// Scores agents for routing decisions
pub struct AgentScorer {
    config: RoutingConfig,
    source: Arc<dyn PaneSource>,
    monitor: Mutex<ActivityMonitor>,
    affinity: Box<dyn AffinityMatcher>,
    context: Box<dyn ContextUsageProvider>,
    effectiveness: Option<Arc<EffectivenessIntegrator>>,
}

impl AgentScorer {
    /// Create a scorer over a pane source with the given configuration
    pub fn new(config: RoutingConfig, source: Arc<dyn PaneSource>) -> Self {
        Self {
            config,
            source,
            monitor: Mutex::new(ActivityMonitor::default()),
            affinity: Box::new(NoAffinity),
            context: Box::new(ContextIndicatorParser),
            effectiveness: None,
        }
    }

    pub fn with_monitor(mut self, monitor: ActivityMonitor) -> Self {
        self.monitor = Mutex::new(monitor);
        self
    }

    pub fn with_affinity(mut self, affinity: Box<dyn AffinityMatcher>) -> Self {
        self.affinity = affinity;
        self
    }

    pub fn with_context_provider(mut self, context: Box<dyn ContextUsageProvider>) -> Self {
        self.context = context;
        self
    }

    /// Blend historical effectiveness into scores for prompts with a known task type
    pub fn with_effectiveness(mut self, integrator: Arc<EffectivenessIntegrator>) -> Self {
        self.effectiveness = Some(integrator);
        self
    }

    pub fn config(&self) -> &RoutingConfig {
        &self.config
    }

    /// Drop the persistent classifier of a closed pane
    pub fn forget_pane(&self, pane_id: &str) -> bool {
        self.monitor.lock().remove(pane_id)
    }

    /// Score every agent pane of a session
    pub fn score_agents(&self, session: &str, prompt: &str) -> Result<Vec<ScoredAgent>> {
        Ok(self.score_agents_report(session, prompt)?.agents)
    }

    /// Score every agent pane of a session, reporting skipped panes
    pub fn score_agents_report(&self, session: &str, prompt: &str) -> Result<ScoringReport> {
        self.score_agents_at(session, prompt, Utc::now())
    }

    /// Score every agent pane of a session as of `now`
    ///
    /// Only pane enumeration failure is an error. Panes without a recognizable
    /// agent are ignored; panes whose capture fails are counted as skipped.
    pub fn score_agents_at(
        &self,
        session: &str,
        prompt: &str,
        now: DateTime<Utc>,
    ) -> Result<ScoringReport> {
        let panes = self.source.list_panes(session)?;

        let agent_panes: Vec<(PaneInfo, AgentType)> = panes
            .into_iter()
            .filter_map(|pane| {
                let agent_type = pane.detect_agent_type()?;
                Some((pane, agent_type))
            })
            .collect();
        let recognized = agent_panes.len();

        // Capture in parallel so one slow pane does not hold up the rest
        let captures: Vec<(PaneInfo, AgentType, Result<String>)> = thread::scope(|s| {
            let handles: Vec<_> = agent_panes
                .into_iter()
                .map(|(pane, agent_type)| {
                    let source = &self.source;
                    s.spawn(move || {
                        let content = source.capture_pane(&pane);
                        (pane, agent_type, content)
                    })
                })
                .collect();
            handles.into_iter().filter_map(|h| h.join().ok()).collect()
        });

        let mut observations = Vec::with_capacity(captures.len());
        {
            let mut monitor = self.monitor.lock();
            for (pane, agent_type, content) in captures {
                let content = match content {
                    Ok(content) => content,
                    Err(e) => {
                        debug!(pane = %pane.target, error = %e, "Skipping pane, capture failed");
                        continue;
                    }
                };
                let activity = monitor
                    .get_or_create(&pane.pane_id, agent_type.clone())
                    .classify(&content, now);
                let context_usage = self
                    .context
                    .context_usage(&pane, &content)
                    .unwrap_or(0.0)
                    .clamp(0.0, 100.0);
                observations.push(AgentObservation {
                    pane_id: pane.pane_id,
                    agent_type,
                    pane_index: pane.pane_index,
                    activity,
                    context_usage,
                });
            }
        }

        let task_type = TaskType::infer(prompt);
        let agents: Vec<ScoredAgent> = observations
            .into_iter()
            .map(|obs| self.score_observation(obs, prompt, task_type.as_ref(), now))
            .collect();

        let skipped = recognized - agents.len();
        if skipped > 0 {
            debug!(session, skipped, "Some agent panes could not be classified");
        }

        Ok(ScoringReport {
            session: session.to_string(),
            agents,
            skipped,
            task_type,
        })
    }

    /// Score one classified pane
    pub fn score_observation(
        &self,
        obs: AgentObservation,
        prompt: &str,
        task_type: Option<&TaskType>,
        now: DateTime<Utc>,
    ) -> ScoredAgent {
        let mut agent = ScoredAgent {
            state: obs.activity.state,
            confidence: obs.activity.confidence,
            velocity: obs.activity.velocity,
            context_usage: obs.context_usage,
            last_activity: obs.activity.last_output,
            health_state: HealthState::from_state(obs.activity.state),
            rate_limited: obs.activity.rate_limited,
            ..ScoredAgent::new(obs.pane_id, obs.agent_type, obs.pane_index)
        };

        agent.score_detail = self.calculate_score_components(&agent, prompt, task_type, now);

        if let Some(reason) = self.check_exclusion(&agent) {
            agent.excluded = true;
            agent.exclude_reason = Some(reason.to_string());
            agent.score = 0.0;
        } else {
            agent.score = Self::calculate_final_score(&agent.score_detail);
        }
        agent
    }

    /// Compute the individual score components
    pub fn calculate_score_components(
        &self,
        agent: &ScoredAgent,
        prompt: &str,
        task_type: Option<&TaskType>,
        now: DateTime<Utc>,
    ) -> ScoreBreakdown {
        let mut d = ScoreBreakdown {
            context_score: (100.0 - agent.context_usage).max(0.0),
            state_score: (Self::state_to_score(agent.state) + 100.0) / 2.0,
            recency_score: Self::recency_to_score(agent.last_activity, now),
            ..Default::default()
        };

        if self.config.affinity_enabled && !prompt.is_empty() {
            let cap = self.config.affinity_bonus.max(0.0);
            d.affinity_bonus = self
                .affinity
                .compute_affinity(agent, prompt, cap)
                .clamp(0.0, cap);
        }

        if let (Some(integrator), Some(task)) = (&self.effectiveness, task_type) {
            let (bonus, _) = integrator.effectiveness_bonus_at(&agent.agent_type, task, now);
            d.effectiveness_bonus = bonus * EFFECTIVENESS_POINTS;
        }

        d.context_contrib = d.context_score * self.config.context_weight;
        d.state_contrib = d.state_score * self.config.state_weight;
        d.recency_contrib = d.recency_score * self.config.recency_weight;
        d
    }

    /// Raw state score (-100..100)
    pub fn state_to_score(state: AgentState) -> f64 {
        match state {
            AgentState::Waiting => 100.0,
            AgentState::Thinking => 50.0,
            AgentState::Generating => 0.0,
            AgentState::Stalled => -50.0,
            AgentState::Error => -100.0,
            AgentState::Unknown => 25.0,
        }
    }

    /// Availability score from time since last output (0-100)
    ///
    /// Very recent output means the agent is busy; moderate idleness means it
    /// is ready; very long idleness is slightly discounted as possibly stale.
    pub fn recency_to_score(last_activity: Option<DateTime<Utc>>, now: DateTime<Utc>) -> f64 {
        let Some(last) = last_activity else {
            return 50.0;
        };
        let age_secs = (now - last).num_seconds().max(0);

        if age_secs < 60 {
            20.0
        } else if age_secs < 5 * 60 {
            50.0
        } else if age_secs < 30 * 60 {
            80.0
        } else {
            70.0
        }
    }

    /// First matching exclusion rule, if any
    pub fn check_exclusion(&self, agent: &ScoredAgent) -> Option<&'static str> {
        if agent.state == AgentState::Error {
            return Some("agent in ERROR state");
        }
        if self.config.exclude_if_rate_limited && agent.rate_limited {
            return Some("agent is rate limited");
        }
        if agent.health_state == HealthState::Unhealthy {
            return Some("agent is unhealthy");
        }
        if agent.context_usage > self.config.exclude_context_above {
            return Some("context usage above threshold");
        }
        if self.config.exclude_if_generating && agent.state == AgentState::Generating {
            return Some("agent is currently generating");
        }
        None
    }

    /// Sum of contributions and bonuses, clamped to 0-100 and rounded to 2 places
    pub fn calculate_final_score(d: &ScoreBreakdown) -> f64 {
        let score = d.context_contrib
            + d.state_contrib
            + d.recency_contrib
            + d.affinity_bonus
            + d.effectiveness_bonus;
        (score.clamp(0.0, 100.0) * 100.0).round() / 100.0
    }
}
