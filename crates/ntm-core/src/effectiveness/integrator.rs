use std::fmt;
use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::agents::AgentType;

use super::capability::CapabilityMatrix;
use super::store::{EffectivenessStore, DEFAULT_WINDOW_DAYS};
use super::task::TaskType;

/// How much weight historical effectiveness receives
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AssignmentMode {
    /// Trust history heavily
    Exploitation,
    /// Favor exploration, minimize bias from history
    Learning,
    #[default]
    Balanced,
    /// Unrecognised mode name; weighted like Balanced
    Unknown(String),
}

impl AssignmentMode {
    pub fn parse(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "exploitation" | "exploit" => AssignmentMode::Exploitation,
            "learning" | "learn" | "explore" => AssignmentMode::Learning,
            "balanced" => AssignmentMode::Balanced,
            _ => AssignmentMode::Unknown(name.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            AssignmentMode::Exploitation => "exploitation",
            AssignmentMode::Learning => "learning",
            AssignmentMode::Balanced => "balanced",
            AssignmentMode::Unknown(name) => name,
        }
    }

    /// Weight applied to the centered historical score
    pub fn weight(&self) -> f64 {
        match self {
            AssignmentMode::Exploitation => 0.6,
            AssignmentMode::Learning => 0.2,
            AssignmentMode::Balanced | AssignmentMode::Unknown(_) => 0.4,
        }
    }
}

impl From<String> for AssignmentMode {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<AssignmentMode> for String {
    fn from(value: AssignmentMode) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for AssignmentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Effectiveness scoring settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectivenessConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    #[serde(default)]
    pub mode: AssignmentMode,

    /// History window in days
    #[serde(default = "default_window_days")]
    pub window_days: u32,

    /// Samples required before history influences scores
    #[serde(default = "default_min_samples")]
    pub min_samples: usize,
}

fn default_enabled() -> bool {
    true
}

fn default_window_days() -> u32 {
    DEFAULT_WINDOW_DAYS
}

fn default_min_samples() -> usize {
    3
}

impl Default for EffectivenessConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            mode: AssignmentMode::default(),
            window_days: default_window_days(),
            min_samples: default_min_samples(),
        }
    }
}

impl EffectivenessConfig {
    /// Mode weight, or 0 when effectiveness scoring is disabled
    pub fn effectiveness_weight(&self) -> f64 {
        if !self.enabled {
            return 0.0;
        }
        self.mode.weight()
    }
}

/// One agent type's position in a task ranking
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankingEntry {
    /// 1-based rank
    pub rank: usize,
    pub agent_type: AgentType,
    /// Composite score (0-1)
    pub score: f64,
    pub capability_score: f64,
    pub effectiveness_bonus: f64,
    pub reason: String,
}

/// Agent types ordered by suitability for a task type
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ranking {
    pub task_type: TaskType,
    pub mode: AssignmentMode,
    pub rankings: Vec<RankingEntry>,
}

/// Blends capability and historical effectiveness into bonuses and rankings
///
/// The config lock is held only to copy the config out; scoring itself runs
/// lock-free so mode changes never wait on a slow query.
pub struct EffectivenessIntegrator {
    config: RwLock<EffectivenessConfig>,
    store: Arc<EffectivenessStore>,
    matrix: Arc<CapabilityMatrix>,
}

impl EffectivenessIntegrator {
    /// Create an integrator with an in-memory store; `None` uses defaults
    pub fn new(config: Option<EffectivenessConfig>) -> Self {
        let config = config.unwrap_or_default();
        let store = Arc::new(EffectivenessStore::new(config.window_days));
        Self::with_components(config, store, Arc::new(CapabilityMatrix::new()))
    }

    /// Create an integrator over an existing store and matrix
    pub fn with_components(
        config: EffectivenessConfig,
        store: Arc<EffectivenessStore>,
        matrix: Arc<CapabilityMatrix>,
    ) -> Self {
        Self {
            config: RwLock::new(config),
            store,
            matrix,
        }
    }

    /// Snapshot of the current config
    pub fn config(&self) -> EffectivenessConfig {
        self.config.read().clone()
    }

    /// Replace the config
    ///
    /// The history window belongs to the store and is fixed at construction;
    /// `window_days` is reset to the store's window.
    pub fn set_config(&self, mut config: EffectivenessConfig) {
        let window_days = self.store.window_days();
        if config.window_days != window_days {
            debug!(
                requested = config.window_days,
                window_days, "History window is fixed by the store, ignoring change"
            );
            config.window_days = window_days;
        }
        *self.config.write() = config;
    }

    pub fn get_mode(&self) -> AssignmentMode {
        self.config.read().mode.clone()
    }

    pub fn set_mode(&self, mode: AssignmentMode) {
        debug!(mode = %mode, "Assignment mode changed");
        self.config.write().mode = mode;
    }

    pub fn store(&self) -> &Arc<EffectivenessStore> {
        &self.store
    }

    pub fn matrix(&self) -> &Arc<CapabilityMatrix> {
        &self.matrix
    }

    /// Bonus (-weight..=weight) for assigning `task_type` to `agent_type`
    pub fn get_effectiveness_bonus(
        &self,
        agent_type: &AgentType,
        task_type: &TaskType,
    ) -> (f64, String) {
        self.effectiveness_bonus_at(agent_type, task_type, Utc::now())
    }

    /// Same as [`get_effectiveness_bonus`](Self::get_effectiveness_bonus) at a fixed time
    pub fn effectiveness_bonus_at(
        &self,
        agent_type: &AgentType,
        task_type: &TaskType,
        now: DateTime<Utc>,
    ) -> (f64, String) {
        let config = self.config();
        if !config.enabled {
            return (0.0, "effectiveness scoring disabled".to_string());
        }

        let history = self.store.effectiveness(agent_type, task_type, now);
        if !history.has_data || history.sample_count < config.min_samples {
            return (0.0, "insufficient historical data".to_string());
        }

        let bonus = (history.score - 0.5) * 2.0 * config.effectiveness_weight();
        let reason = format!(
            "historical score {:.2} from {} samples ({:.0}% confidence, {} mode)",
            history.score,
            history.sample_count,
            history.confidence * 100.0,
            config.mode
        );
        (bonus, reason)
    }

    /// Rank every known agent type for a task type
    pub fn rank_agents_for_task(&self, task_type: &TaskType) -> Result<Ranking> {
        self.rank_agents_for_task_at(task_type, Utc::now())
    }

    pub fn rank_agents_for_task_at(
        &self,
        task_type: &TaskType,
        now: DateTime<Utc>,
    ) -> Result<Ranking> {
        let mut entries: Vec<RankingEntry> = AgentType::all_variants()
            .into_iter()
            .map(|agent_type| {
                let capability = self.matrix.get_score(&agent_type, task_type);
                let (bonus, bonus_reason) =
                    self.effectiveness_bonus_at(&agent_type, task_type, now);
                let score = (capability + bonus).clamp(0.0, 1.0);
                RankingEntry {
                    rank: 0,
                    agent_type,
                    score,
                    capability_score: capability,
                    effectiveness_bonus: bonus,
                    reason: format!("capability {:.2}; {}", capability, bonus_reason),
                }
            })
            .collect();

        // Stable sort keeps agent-type order among equal scores
        entries.sort_by(|a, b| b.score.total_cmp(&a.score));
        for (i, entry) in entries.iter_mut().enumerate() {
            entry.rank = i + 1;
        }

        Ok(Ranking {
            task_type: task_type.clone(),
            mode: self.get_mode(),
            rankings: entries,
        })
    }

    /// Copy well-sampled history into the capability matrix as learned scores
    ///
    /// Returns the number of pairs written.
    pub fn sync_learned(&self, now: DateTime<Utc>) -> usize {
        let min_samples = self.config.read().min_samples;
        let mut written = 0;
        for entry in self.store.all_effectiveness(now) {
            if entry.sample_count >= min_samples {
                self.matrix
                    .set_learned(entry.agent_type, entry.task_type, entry.score);
                written += 1;
            }
        }
        debug!(written, "Synced learned capability scores");
        written
    }
}

static DEFAULT_INTEGRATOR: Lazy<Arc<EffectivenessIntegrator>> =
    Lazy::new(|| Arc::new(EffectivenessIntegrator::new(None)));

/// Process-wide integrator, constructed on first access
///
/// Prefer passing an integrator explicitly (see `RoutingCoreBuilder`); this
/// exists for callers without access to one.
pub fn default_integrator() -> Arc<EffectivenessIntegrator> {
    Arc::clone(&DEFAULT_INTEGRATOR)
}

/// Mode of the process-wide integrator
pub fn get_assignment_mode() -> AssignmentMode {
    DEFAULT_INTEGRATOR.get_mode()
}

/// Set the mode of the process-wide integrator
pub fn set_assignment_mode(mode: AssignmentMode) {
    DEFAULT_INTEGRATOR.set_mode(mode);
}

/// Bonus from the process-wide integrator
pub fn get_effectiveness_bonus(agent_type: &AgentType, task_type: &TaskType) -> (f64, String) {
    DEFAULT_INTEGRATOR.get_effectiveness_bonus(agent_type, task_type)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_750_000_000, 0).unwrap()
    }

    fn record(ei: &EffectivenessIntegrator, agent: AgentType, task: TaskType, wins: usize, losses: usize) {
        for i in 0..wins + losses {
            ei.store()
                .record_outcome(agent.clone(), task.clone(), i < wins, now())
                .unwrap();
        }
    }

    #[test]
    fn test_default_config() {
        let cfg = EffectivenessConfig::default();
        assert!(cfg.enabled);
        assert_eq!(cfg.mode, AssignmentMode::Balanced);
        assert_eq!(cfg.window_days, 14);
        assert_eq!(cfg.min_samples, 3);
    }

    #[test]
    fn test_effectiveness_weight() {
        let cases = [
            (AssignmentMode::Exploitation, true, 0.6),
            (AssignmentMode::Learning, true, 0.2),
            (AssignmentMode::Balanced, true, 0.4),
            (AssignmentMode::Balanced, false, 0.0),
            (AssignmentMode::Exploitation, false, 0.0),
            (AssignmentMode::parse("unknown"), true, 0.4),
        ];
        for (mode, enabled, want) in cases {
            let cfg = EffectivenessConfig {
                enabled,
                mode: mode.clone(),
                ..Default::default()
            };
            assert_eq!(cfg.effectiveness_weight(), want, "mode {:?}", mode);
        }
    }

    #[test]
    fn test_mode_strings() {
        assert_eq!(AssignmentMode::Exploitation.as_str(), "exploitation");
        assert_eq!(AssignmentMode::Learning.as_str(), "learning");
        assert_eq!(AssignmentMode::Balanced.as_str(), "balanced");
        let parsed: AssignmentMode = serde_json::from_str("\"Learning\"").unwrap();
        assert_eq!(parsed, AssignmentMode::Learning);
        assert_eq!(
            AssignmentMode::parse("yolo"),
            AssignmentMode::Unknown("yolo".to_string())
        );
    }

    #[test]
    fn test_new_with_custom_config() {
        let ei = EffectivenessIntegrator::new(None);
        assert_eq!(ei.get_mode(), AssignmentMode::Balanced);

        let ei = EffectivenessIntegrator::new(Some(EffectivenessConfig {
            mode: AssignmentMode::Exploitation,
            ..Default::default()
        }));
        assert_eq!(ei.get_mode(), AssignmentMode::Exploitation);
    }

    #[test]
    fn test_set_config_keeps_store_window() {
        let integrator = EffectivenessIntegrator::new(None);
        integrator.set_config(EffectivenessConfig {
            window_days: 30,
            min_samples: 1,
            mode: AssignmentMode::Learning,
            ..Default::default()
        });

        let config = integrator.config();
        assert_eq!(config.window_days, integrator.store().window_days());
        assert_eq!(config.window_days, DEFAULT_WINDOW_DAYS);
        assert_eq!(config.min_samples, 1);
        assert_eq!(config.mode, AssignmentMode::Learning);
    }

    #[test]
    fn test_set_get_mode() {
        let ei = EffectivenessIntegrator::new(None);
        ei.set_mode(AssignmentMode::Exploitation);
        assert_eq!(ei.get_mode(), AssignmentMode::Exploitation);
        ei.set_mode(AssignmentMode::Learning);
        assert_eq!(ei.get_mode(), AssignmentMode::Learning);
    }

    #[test]
    fn test_bonus_disabled() {
        let ei = EffectivenessIntegrator::new(Some(EffectivenessConfig {
            enabled: false,
            ..Default::default()
        }));
        let (bonus, reason) = ei.get_effectiveness_bonus(&AgentType::Claude, &TaskType::Bug);
        assert_eq!(bonus, 0.0);
        assert_eq!(reason, "effectiveness scoring disabled");
    }

    #[test]
    fn test_bonus_no_data() {
        let ei = EffectivenessIntegrator::new(None);
        let (bonus, reason) = ei.get_effectiveness_bonus(
            &AgentType::Custom("nonexistent".to_string()),
            &TaskType::parse("invalid_task"),
        );
        assert_eq!(bonus, 0.0);
        assert_eq!(reason, "insufficient historical data");
    }

    #[test]
    fn test_bonus_below_min_samples() {
        let ei = EffectivenessIntegrator::new(None);
        record(&ei, AgentType::Claude, TaskType::Bug, 2, 0);
        let (bonus, reason) = ei.effectiveness_bonus_at(&AgentType::Claude, &TaskType::Bug, now());
        assert_eq!(bonus, 0.0);
        assert_eq!(reason, "insufficient historical data");
    }

    #[test]
    fn test_bonus_scales_with_mode() {
        let ei = EffectivenessIntegrator::new(None);
        // 4 wins, 0 losses -> score (4+1)/(4+2) = 5/6
        record(&ei, AgentType::Codex, TaskType::Bug, 4, 0);
        let centered = (5.0 / 6.0 - 0.5) * 2.0;

        let (bonus, reason) = ei.effectiveness_bonus_at(&AgentType::Codex, &TaskType::Bug, now());
        assert!((bonus - centered * 0.4).abs() < 1e-9);
        assert!(reason.contains("4 samples"));

        ei.set_mode(AssignmentMode::Exploitation);
        let (bonus, _) = ei.effectiveness_bonus_at(&AgentType::Codex, &TaskType::Bug, now());
        assert!((bonus - centered * 0.6).abs() < 1e-9);

        // Poor history gives a penalty
        record(&ei, AgentType::Gemini, TaskType::Bug, 0, 4);
        let (bonus, _) = ei.effectiveness_bonus_at(&AgentType::Gemini, &TaskType::Bug, now());
        assert!(bonus < 0.0);
    }

    #[test]
    fn test_rank_agents_for_task() {
        let ei = EffectivenessIntegrator::new(None);
        let ranking = ei.rank_agents_for_task(&TaskType::Bug).unwrap();

        assert_eq!(ranking.task_type, TaskType::Bug);
        assert_eq!(ranking.rankings.len(), 3);
        for (i, r) in ranking.rankings.iter().enumerate() {
            assert_eq!(r.rank, i + 1);
        }
        for pair in ranking.rankings.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
        // Codex has the highest base score for bugs
        assert_eq!(ranking.rankings[0].agent_type, AgentType::Codex);
    }

    #[test]
    fn test_rank_ties_keep_agent_order() {
        let ei = EffectivenessIntegrator::new(None);
        let ranking = ei
            .rank_agents_for_task(&TaskType::Other("unlisted".to_string()))
            .unwrap();
        let order: Vec<AgentType> = ranking.rankings.iter().map(|r| r.agent_type.clone()).collect();
        assert_eq!(order, AgentType::all_variants());
        assert!(ranking.rankings.iter().all(|r| r.score == 0.5));
    }

    #[test]
    fn test_history_changes_ranking() {
        let ei = EffectivenessIntegrator::new(Some(EffectivenessConfig {
            mode: AssignmentMode::Exploitation,
            ..Default::default()
        }));
        record(&ei, AgentType::Gemini, TaskType::Bug, 10, 0);
        record(&ei, AgentType::Codex, TaskType::Bug, 0, 10);

        let ranking = ei.rank_agents_for_task_at(&TaskType::Bug, now()).unwrap();
        assert_eq!(ranking.rankings[0].agent_type, AgentType::Gemini);
        assert_eq!(ranking.rankings[2].agent_type, AgentType::Codex);
        assert_eq!(ranking.mode, AssignmentMode::Exploitation);
    }

    #[test]
    fn test_sync_learned() {
        let ei = EffectivenessIntegrator::new(None);
        record(&ei, AgentType::Claude, TaskType::Bug, 3, 1);
        record(&ei, AgentType::Codex, TaskType::Bug, 1, 0);

        assert_eq!(ei.sync_learned(now()), 1);
        let learned = ei.matrix().get_score(&AgentType::Claude, &TaskType::Bug);
        assert!((learned - 4.0 / 6.0).abs() < 1e-9);
        assert_eq!(ei.matrix().get_score(&AgentType::Codex, &TaskType::Bug), 0.85);
    }

    #[test]
    fn test_concurrent_access() {
        let ei = Arc::new(EffectivenessIntegrator::new(None));
        record(&ei, AgentType::Claude, TaskType::Bug, 5, 1);

        let handles: Vec<_> = (0..10)
            .map(|i| {
                let ei = Arc::clone(&ei);
                thread::spawn(move || {
                    for _ in 0..200 {
                        if i % 2 == 0 {
                            ei.set_mode(AssignmentMode::Exploitation);
                            let _ = ei.get_mode();
                            ei.set_mode(AssignmentMode::Learning);
                        } else {
                            let (bonus, reason) = ei.effectiveness_bonus_at(
                                &AgentType::Claude,
                                &TaskType::Bug,
                                now(),
                            );
                            assert!(bonus.abs() <= 0.6);
                            assert!(!reason.is_empty());
                        }
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert!(matches!(
            ei.get_mode(),
            AssignmentMode::Exploitation | AssignmentMode::Learning
        ));
    }

    #[test]
    fn test_default_integrator_singleton() {
        let a = default_integrator();
        let b = default_integrator();
        assert!(Arc::ptr_eq(&a, &b));

        set_assignment_mode(AssignmentMode::Learning);
        assert_eq!(get_assignment_mode(), AssignmentMode::Learning);
        set_assignment_mode(AssignmentMode::Balanced);

        let (_, reason) = get_effectiveness_bonus(&AgentType::Claude, &TaskType::Bug);
        assert!(!reason.is_empty());
    }
}
