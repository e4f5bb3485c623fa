//! RoutingCore, the Facade entry-point for routing consumers.
//!
//! This struct owns the scorer and the effectiveness integrator. Consumers
//! never need to wire classifiers, stores or matrices themselves.

use std::sync::Arc;

use crate::effectiveness::{EffectivenessIntegrator, EffectivenessStore};
use crate::routing::{AgentScorer, RoutingConfig};

/// The Facade over routing and effectiveness learning
///
/// Constructed via [`RoutingCoreBuilder`](super::builder::RoutingCoreBuilder).
pub struct RoutingCore {
    scorer: AgentScorer,
    integrator: Arc<EffectivenessIntegrator>,
}

impl RoutingCore {
    /// Create a new RoutingCore instance (prefer `RoutingCoreBuilder`)
    pub(crate) fn new(scorer: AgentScorer, integrator: Arc<EffectivenessIntegrator>) -> Self {
        Self { scorer, integrator }
    }

    pub fn routing_config(&self) -> &RoutingConfig {
        self.scorer.config()
    }

    pub fn scorer(&self) -> &AgentScorer {
        &self.scorer
    }

    pub fn integrator(&self) -> &Arc<EffectivenessIntegrator> {
        &self.integrator
    }

    pub(crate) fn store(&self) -> &Arc<EffectivenessStore> {
        self.integrator.store()
    }
}
