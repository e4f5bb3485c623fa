use std::sync::Arc;

use crate::effectiveness::{CapabilityMatrix, TaskType};

use super::scorer::ScoredAgent;

/// Prompt-to-agent affinity used for the optional routing bonus
///
/// Implementations return a bonus in `[0, cap]` score points; the scorer
/// clamps anything outside that range.
pub trait AffinityMatcher: Send + Sync {
    fn compute_affinity(&self, agent: &ScoredAgent, prompt: &str, cap: f64) -> f64;
}

/// Matcher that never awards a bonus
#[derive(Debug, Default, Clone, Copy)]
pub struct NoAffinity;

impl AffinityMatcher for NoAffinity {
    fn compute_affinity(&self, _agent: &ScoredAgent, _prompt: &str, _cap: f64) -> f64 {
        0.0
    }
}

/// Awards the agent family's capability score for the prompt's inferred task type
pub struct CapabilityAffinity {
    matrix: Arc<CapabilityMatrix>,
}

impl CapabilityAffinity {
    pub fn new(matrix: Arc<CapabilityMatrix>) -> Self {
        Self { matrix }
    }
}

impl AffinityMatcher for CapabilityAffinity {
    fn compute_affinity(&self, agent: &ScoredAgent, prompt: &str, cap: f64) -> f64 {
        TaskType::infer(prompt)
            .map(|task| self.matrix.get_score(&agent.agent_type, &task) * cap)
            .unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::AgentType;

    #[test]
    fn test_no_affinity() {
        let agent = ScoredAgent::new("%1", AgentType::Claude, 1);
        assert_eq!(NoAffinity.compute_affinity(&agent, "fix the bug", 20.0), 0.0);
    }

    #[test]
    fn test_capability_affinity() {
        let matcher = CapabilityAffinity::new(Arc::new(CapabilityMatrix::new()));
        let agent = ScoredAgent::new("%1", AgentType::Claude, 1);
        let bonus = matcher.compute_affinity(&agent, "fix the login bug", 20.0);
        assert!((bonus - 16.0).abs() < 1e-9);
        assert_eq!(matcher.compute_affinity(&agent, "hello", 20.0), 0.0);
    }
}
