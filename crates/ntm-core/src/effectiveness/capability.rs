use std::collections::HashMap;

use parking_lot::RwLock;

use crate::agents::AgentType;

use super::task::TaskType;

/// Score returned for pairs present in neither table
pub const DEFAULT_CAPABILITY_SCORE: f64 = 0.5;

/// Built-in suitability of each agent family per task type
const BASE_SCORES: &[(AgentType, TaskType, f64)] = &[
    (AgentType::Claude, TaskType::Bug, 0.80),
    (AgentType::Claude, TaskType::Feature, 0.85),
    (AgentType::Claude, TaskType::Refactor, 0.90),
    (AgentType::Claude, TaskType::Documentation, 0.85),
    (AgentType::Claude, TaskType::Testing, 0.75),
    (AgentType::Claude, TaskType::Analysis, 0.90),
    (AgentType::Codex, TaskType::Bug, 0.85),
    (AgentType::Codex, TaskType::Feature, 0.90),
    (AgentType::Codex, TaskType::Refactor, 0.75),
    (AgentType::Codex, TaskType::Documentation, 0.65),
    (AgentType::Codex, TaskType::Testing, 0.85),
    (AgentType::Codex, TaskType::Analysis, 0.70),
    (AgentType::Gemini, TaskType::Bug, 0.70),
    (AgentType::Gemini, TaskType::Feature, 0.75),
    (AgentType::Gemini, TaskType::Refactor, 0.70),
    (AgentType::Gemini, TaskType::Documentation, 0.90),
    (AgentType::Gemini, TaskType::Testing, 0.70),
    (AgentType::Gemini, TaskType::Analysis, 0.85),
];

type Key = (AgentType, TaskType);

/// Static and learned suitability scores per (agent type, task type)
///
/// The base table is fixed at construction. Learned scores override it and
/// can be cleared to fall back to the base table.
pub struct CapabilityMatrix {
    base: HashMap<Key, f64>,
    learned: RwLock<HashMap<Key, f64>>,
}

impl Default for CapabilityMatrix {
    fn default() -> Self {
        Self::new()
    }
}

impl CapabilityMatrix {
    /// Create a matrix seeded with the built-in base scores
    pub fn new() -> Self {
        let base = BASE_SCORES
            .iter()
            .map(|(agent, task, score)| ((agent.clone(), task.clone()), *score))
            .collect();
        Self {
            base,
            learned: RwLock::new(HashMap::new()),
        }
    }

    /// Learned score if present, else base score, else the default
    pub fn get_score(&self, agent_type: &AgentType, task_type: &TaskType) -> f64 {
        let key = (agent_type.clone(), task_type.clone());
        if let Some(score) = self.learned.read().get(&key) {
            return *score;
        }
        self.base
            .get(&key)
            .copied()
            .unwrap_or(DEFAULT_CAPABILITY_SCORE)
    }

    /// Base-table score, ignoring learned overrides
    pub fn base_score(&self, agent_type: &AgentType, task_type: &TaskType) -> Option<f64> {
        self.base
            .get(&(agent_type.clone(), task_type.clone()))
            .copied()
    }

    /// Insert or overwrite a learned score (clamped to 0-1, NaN ignored)
    pub fn set_learned(&self, agent_type: AgentType, task_type: TaskType, score: f64) {
        if score.is_nan() {
            return;
        }
        self.learned
            .write()
            .insert((agent_type, task_type), score.clamp(0.0, 1.0));
    }

    /// Remove every learned override
    pub fn clear_learned(&self) {
        self.learned.write().clear();
    }

    pub fn learned_count(&self) -> usize {
        self.learned.read().len()
    }
}
