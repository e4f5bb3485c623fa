use std::collections::HashMap;

use chrono::Duration;
use tracing::debug;

use crate::agents::AgentType;

use super::classifier::{ActivityClassifier, DEFAULT_STALL_AFTER_SECS};

/// Default upper bound on tracked panes
pub const DEFAULT_MAX_TRACKED_PANES: usize = 256;

struct Tracked {
    classifier: ActivityClassifier,
    last_used: u64,
}

/// Pane-keyed registry of persistent activity classifiers
///
/// Classifiers live across scoring passes so velocity trends survive. The map
/// is bounded: when full, the least recently used pane is evicted, and panes
/// can be dropped explicitly when they close.
pub struct ActivityMonitor {
    classifiers: HashMap<String, Tracked>,
    max_entries: usize,
    stall_after: Duration,
    tick: u64,
}

impl Default for ActivityMonitor {
    fn default() -> Self {
        Self::new(
            DEFAULT_MAX_TRACKED_PANES,
            Duration::seconds(DEFAULT_STALL_AFTER_SECS),
        )
    }
}

impl ActivityMonitor {
    pub fn new(max_entries: usize, stall_after: Duration) -> Self {
        Self {
            classifiers: HashMap::new(),
            max_entries: max_entries.max(1),
            stall_after,
            tick: 0,
        }
    }

    /// Get the classifier for a pane, creating it on first sight
    pub fn get_or_create(&mut self, pane_id: &str, agent_type: AgentType) -> &mut ActivityClassifier {
        self.tick += 1;
        let tick = self.tick;

        if !self.classifiers.contains_key(pane_id) && self.classifiers.len() >= self.max_entries {
            self.evict_lru();
        }

        let stall_after = self.stall_after;
        let tracked = self
            .classifiers
            .entry(pane_id.to_string())
            .or_insert_with(|| Tracked {
                classifier: ActivityClassifier::new(stall_after),
                last_used: tick,
            });
        tracked.last_used = tick;
        tracked.classifier.set_agent_type(agent_type);
        &mut tracked.classifier
    }

    /// Drop the classifier of a closed pane
    pub fn remove(&mut self, pane_id: &str) -> bool {
        self.classifiers.remove(pane_id).is_some()
    }

    /// Keep only classifiers whose pane id satisfies `keep`
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&str) -> bool,
    {
        self.classifiers.retain(|id, _| keep(id));
    }

    pub fn contains(&self, pane_id: &str) -> bool {
        self.classifiers.contains_key(pane_id)
    }

    pub fn len(&self) -> usize {
        self.classifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classifiers.is_empty()
    }

    fn evict_lru(&mut self) {
        let oldest = self
            .classifiers
            .iter()
            .min_by_key(|(_, t)| t.last_used)
            .map(|(id, _)| id.clone());
        if let Some(id) = oldest {
            debug!(pane_id = %id, "Evicting least recently used activity classifier");
            self.classifiers.remove(&id);
        }
    }
}
