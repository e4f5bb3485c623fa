//! Builder for constructing a [`RoutingCore`] instance.
//!
//! ```ignore
//! let core = RoutingCoreBuilder::new()
//!     .routing(settings.routing.clone())
//!     .effectiveness(settings.effectiveness.clone())
//!     .with_source(Arc::new(TmuxClient::new()))
//!     .build()?;
//! ```

use std::sync::Arc;

use chrono::Duration;
use tracing::debug;

use crate::activity::ActivityMonitor;
use crate::config::{ActivitySettings, EffectivenessSettings};
use crate::effectiveness::{CapabilityMatrix, EffectivenessIntegrator, EffectivenessStore};
use crate::routing::{AffinityMatcher, AgentScorer, CapabilityAffinity, RoutingConfig};
use crate::tmux::{PaneSource, TmuxClient};

use super::core::RoutingCore;
use super::types::ApiError;

/// Builder for constructing a [`RoutingCore`] Facade instance
#[derive(Default)]
pub struct RoutingCoreBuilder {
    routing: RoutingConfig,
    effectiveness: EffectivenessSettings,
    activity: ActivitySettings,
    source: Option<Arc<dyn PaneSource>>,
    integrator: Option<Arc<EffectivenessIntegrator>>,
    affinity: Option<Box<dyn AffinityMatcher>>,
}

impl RoutingCoreBuilder {
    /// Create a builder with default settings
    pub fn new() -> Self {
        Self::default()
    }

    pub fn routing(mut self, config: RoutingConfig) -> Self {
        self.routing = config;
        self
    }

    pub fn effectiveness(mut self, settings: EffectivenessSettings) -> Self {
        self.effectiveness = settings;
        self
    }

    pub fn activity(mut self, settings: ActivitySettings) -> Self {
        self.activity = settings;
        self
    }

    /// Use a custom pane source instead of tmux
    pub fn with_source(mut self, source: Arc<dyn PaneSource>) -> Self {
        self.source = Some(source);
        self
    }

    /// Share an existing integrator instead of creating one from settings
    pub fn with_integrator(mut self, integrator: Arc<EffectivenessIntegrator>) -> Self {
        self.integrator = Some(integrator);
        self
    }

    /// Use a custom affinity matcher (only consulted when affinity is enabled)
    pub fn with_affinity(mut self, affinity: Box<dyn AffinityMatcher>) -> Self {
        self.affinity = Some(affinity);
        self
    }

    /// Build the `RoutingCore` instance
    ///
    /// Opens the outcome store when persistence is enabled; a corrupt or
    /// unreadable store file is a [`ApiError::Persistence`] error.
    pub fn build(self) -> Result<RoutingCore, ApiError> {
        let integrator = match self.integrator {
            Some(integrator) => integrator,
            None => {
                let config = self.effectiveness.to_config();
                let store = match self.effectiveness.resolved_store_path() {
                    Some(path) => {
                        debug!(path = ?path, "Opening effectiveness store");
                        EffectivenessStore::open(path, config.window_days)
                            .map_err(ApiError::Persistence)?
                    }
                    None => EffectivenessStore::new(config.window_days),
                };
                Arc::new(EffectivenessIntegrator::with_components(
                    config,
                    Arc::new(store),
                    Arc::new(CapabilityMatrix::new()),
                ))
            }
        };

        let source: Arc<dyn PaneSource> = match self.source {
            Some(source) => source,
            None => Arc::new(TmuxClient::with_capture_lines(self.activity.capture_lines)),
        };

        let monitor = ActivityMonitor::new(
            self.activity.max_tracked_panes,
            Duration::seconds(self.activity.stall_after_secs),
        );

        let affinity: Box<dyn AffinityMatcher> = match self.affinity {
            Some(affinity) => affinity,
            None => Box::new(CapabilityAffinity::new(Arc::clone(integrator.matrix()))),
        };

        let scorer = AgentScorer::new(self.routing, source)
            .with_monitor(monitor)
            .with_affinity(affinity)
            .with_effectiveness(Arc::clone(&integrator));

        Ok(RoutingCore::new(scorer, integrator))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effectiveness::AssignmentMode;
    use crate::tmux::fake::FakePaneSource;

    fn in_memory() -> EffectivenessSettings {
        EffectivenessSettings {
            persist: false,
            ..Default::default()
        }
    }

    #[test]
    fn test_builder_defaults() {
        let core = RoutingCoreBuilder::new()
            .effectiveness(in_memory())
            .with_source(Arc::new(FakePaneSource::new()))
            .build()
            .unwrap();

        assert_eq!(core.routing_config(), &RoutingConfig::default());
        assert_eq!(core.integrator().get_mode(), AssignmentMode::Balanced);
        assert!(core.store().path().is_none());
    }

    #[test]
    fn test_builder_with_integrator() {
        let integrator = Arc::new(EffectivenessIntegrator::new(None));
        let core = RoutingCoreBuilder::new()
            .with_integrator(Arc::clone(&integrator))
            .with_source(Arc::new(FakePaneSource::new()))
            .build()
            .unwrap();

        assert!(Arc::ptr_eq(core.integrator(), &integrator));
    }

    #[test]
    fn test_builder_opens_store_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("effectiveness.json");
        let core = RoutingCoreBuilder::new()
            .effectiveness(EffectivenessSettings {
                store_path: Some(path.clone()),
                ..Default::default()
            })
            .with_source(Arc::new(FakePaneSource::new()))
            .build()
            .unwrap();

        assert_eq!(core.store().path(), Some(path.as_path()));
    }

    #[test]
    fn test_builder_rejects_corrupt_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("effectiveness.json");
        std::fs::write(&path, "not json").unwrap();

        let result = RoutingCoreBuilder::new()
            .effectiveness(EffectivenessSettings {
                store_path: Some(path),
                ..Default::default()
            })
            .with_source(Arc::new(FakePaneSource::new()))
            .build();

        assert!(matches!(result, Err(ApiError::Persistence(_))));
    }
}
