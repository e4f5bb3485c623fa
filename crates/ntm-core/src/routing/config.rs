use serde::{Deserialize, Serialize};

/// Weights and exclusion thresholds for agent routing
///
/// The three weights are expected to sum to 1.0. This is not enforced here;
/// see [`RoutingConfig::weights_balanced`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingConfig {
    #[serde(default = "default_context_weight")]
    pub context_weight: f64,

    #[serde(default = "default_state_weight")]
    pub state_weight: f64,

    #[serde(default = "default_recency_weight")]
    pub recency_weight: f64,

    /// Enable prompt affinity bonus
    #[serde(default)]
    pub affinity_enabled: bool,

    /// Maximum affinity bonus in score points
    #[serde(default = "default_affinity_bonus")]
    pub affinity_bonus: f64,

    /// Exclude agents whose context usage (percent) is above this
    #[serde(default = "default_exclude_context_above")]
    pub exclude_context_above: f64,

    #[serde(default = "default_true")]
    pub exclude_if_generating: bool,

    #[serde(default = "default_true")]
    pub exclude_if_rate_limited: bool,

    /// Kept for config compatibility; agents in ERROR are always excluded
    #[serde(default = "default_true", rename = "exclude_if_error")]
    pub exclude_if_error_state: bool,
}

fn default_context_weight() -> f64 {
    0.4
}

fn default_state_weight() -> f64 {
    0.4
}

fn default_recency_weight() -> f64 {
    0.2
}

fn default_affinity_bonus() -> f64 {
    20.0
}

fn default_exclude_context_above() -> f64 {
    85.0
}

fn default_true() -> bool {
    true
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            context_weight: default_context_weight(),
            state_weight: default_state_weight(),
            recency_weight: default_recency_weight(),
            affinity_enabled: false,
            affinity_bonus: default_affinity_bonus(),
            exclude_context_above: default_exclude_context_above(),
            exclude_if_generating: true,
            exclude_if_rate_limited: true,
            exclude_if_error_state: true,
        }
    }
}

impl RoutingConfig {
    pub fn weight_sum(&self) -> f64 {
        self.context_weight + self.state_weight + self.recency_weight
    }

    /// Whether the weights sum to 1.0 (within float tolerance)
    pub fn weights_balanced(&self) -> bool {
        (self.weight_sum() - 1.0).abs() < 1e-9
    }
}
