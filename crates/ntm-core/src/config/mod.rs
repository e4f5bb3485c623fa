//! Settings-file sections owned by the core library.
//!
//! The `[routing]` section deserializes straight into
//! [`RoutingConfig`](crate::routing::RoutingConfig); the sections here cover
//! effectiveness learning and activity tracking.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::activity::{DEFAULT_MAX_TRACKED_PANES, DEFAULT_STALL_AFTER_SECS};
use crate::effectiveness::{
    AssignmentMode, EffectivenessConfig, EffectivenessStore, DEFAULT_WINDOW_DAYS,
};
use crate::routing::RoutingConfig;

/// `[effectiveness]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectivenessSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// exploitation, learning or balanced
    #[serde(default)]
    pub mode: AssignmentMode,

    #[serde(default = "default_window_days")]
    pub window_days: u32,

    #[serde(default = "default_min_samples")]
    pub min_samples: usize,

    /// Outcome history file (default: `<data dir>/ntm/effectiveness.json`)
    #[serde(default)]
    pub store_path: Option<PathBuf>,

    /// Keep history on disk; false keeps it in memory for the process lifetime
    #[serde(default = "default_true")]
    pub persist: bool,
}

fn default_true() -> bool {
    true
}

fn default_window_days() -> u32 {
    DEFAULT_WINDOW_DAYS
}

fn default_min_samples() -> usize {
    3
}

impl Default for EffectivenessSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            mode: AssignmentMode::default(),
            window_days: default_window_days(),
            min_samples: default_min_samples(),
            store_path: None,
            persist: true,
        }
    }
}

impl EffectivenessSettings {
    /// Integrator configuration for these settings
    pub fn to_config(&self) -> EffectivenessConfig {
        EffectivenessConfig {
            enabled: self.enabled,
            mode: self.mode.clone(),
            window_days: self.window_days,
            min_samples: self.min_samples,
        }
    }

    /// Where outcomes are persisted, `None` for an in-memory store
    pub fn resolved_store_path(&self) -> Option<PathBuf> {
        if !self.persist {
            return None;
        }
        self.store_path
            .clone()
            .or_else(EffectivenessStore::default_path)
    }

    pub fn validate(&mut self) {
        if self.window_days == 0 {
            self.window_days = 1;
        }
        if let AssignmentMode::Unknown(name) = &self.mode {
            warn!(mode = %name, "Unknown assignment mode, weighting as balanced");
        }
    }
}

/// `[activity]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivitySettings {
    /// Lines captured from each pane per scoring pass
    #[serde(default = "default_capture_lines")]
    pub capture_lines: u32,

    /// Upper bound on per-pane classifiers kept between passes
    #[serde(default = "default_max_tracked_panes")]
    pub max_tracked_panes: usize,

    /// Seconds without output after which a busy agent counts as stalled
    #[serde(default = "default_stall_after_secs")]
    pub stall_after_secs: i64,
}

fn default_capture_lines() -> u32 {
    100
}

fn default_max_tracked_panes() -> usize {
    DEFAULT_MAX_TRACKED_PANES
}

fn default_stall_after_secs() -> i64 {
    DEFAULT_STALL_AFTER_SECS
}

impl Default for ActivitySettings {
    fn default() -> Self {
        Self {
            capture_lines: default_capture_lines(),
            max_tracked_panes: default_max_tracked_panes(),
            stall_after_secs: default_stall_after_secs(),
        }
    }
}

impl ActivitySettings {
    pub fn validate(&mut self) {
        self.capture_lines = self.capture_lines.clamp(10, 10_000);
        self.max_tracked_panes = self.max_tracked_panes.max(1);
        self.stall_after_secs = self.stall_after_secs.max(1);
    }
}

/// Clamp routing values to usable ranges
///
/// Weights that do not sum to 1.0 are accepted and only logged.
pub fn validate_routing(config: &mut RoutingConfig) {
    for weight in [
        &mut config.context_weight,
        &mut config.state_weight,
        &mut config.recency_weight,
    ] {
        if !weight.is_finite() || *weight < 0.0 {
            *weight = 0.0;
        }
    }
    if !config.affinity_bonus.is_finite() || config.affinity_bonus < 0.0 {
        config.affinity_bonus = 0.0;
    }
    if !config.exclude_context_above.is_finite() {
        config.exclude_context_above = 100.0;
    }
    config.exclude_context_above = config.exclude_context_above.clamp(0.0, 100.0);

    if !config.weights_balanced() {
        warn!(
            sum = config.weight_sum(),
            "Routing weights do not sum to 1.0, scores may leave the 0-100 range before clamping"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_effectiveness_defaults() {
        let s: EffectivenessSettings = toml::from_str("").unwrap();
        assert_eq!(s, EffectivenessSettings::default());
        assert_eq!(s.to_config(), EffectivenessConfig::default());
    }

    #[test]
    fn test_effectiveness_parse() {
        let s: EffectivenessSettings = toml::from_str(
            r#"
            mode = "exploitation"
            min_samples = 5
            store_path = "/tmp/ntm/eff.json"
            "#,
        )
        .unwrap();
        assert_eq!(s.mode, AssignmentMode::Exploitation);
        assert_eq!(s.to_config().min_samples, 5);
        assert_eq!(
            s.resolved_store_path(),
            Some(PathBuf::from("/tmp/ntm/eff.json"))
        );
    }

    #[test]
    fn test_in_memory_store_has_no_path() {
        let s = EffectivenessSettings {
            persist: false,
            store_path: Some(PathBuf::from("/tmp/x.json")),
            ..Default::default()
        };
        assert_eq!(s.resolved_store_path(), None);
    }

    #[test]
    fn test_unknown_mode_kept() {
        let mut s: EffectivenessSettings = toml::from_str(r#"mode = "yolo""#).unwrap();
        s.validate();
        assert_eq!(s.mode, AssignmentMode::Unknown("yolo".to_string()));
        assert_eq!(s.to_config().effectiveness_weight(), 0.4);
    }

    #[test]
    fn test_activity_validate() {
        let mut a = ActivitySettings {
            capture_lines: 0,
            max_tracked_panes: 0,
            stall_after_secs: -5,
        };
        a.validate();
        assert_eq!(a.capture_lines, 10);
        assert_eq!(a.max_tracked_panes, 1);
        assert_eq!(a.stall_after_secs, 1);
    }

    #[test]
    fn test_validate_routing_clamps() {
        let mut c = RoutingConfig {
            context_weight: -1.0,
            affinity_bonus: f64::NAN,
            exclude_context_above: 150.0,
            ..Default::default()
        };
        validate_routing(&mut c);
        assert_eq!(c.context_weight, 0.0);
        assert_eq!(c.affinity_bonus, 0.0);
        assert_eq!(c.exclude_context_above, 100.0);
    }

    #[test]
    fn test_unbalanced_weights_accepted() {
        let mut c = RoutingConfig {
            context_weight: 0.5,
            state_weight: 0.5,
            recency_weight: 0.5,
            ..Default::default()
        };
        validate_routing(&mut c);
        assert_eq!(c.weight_sum(), 1.5);
    }
}
