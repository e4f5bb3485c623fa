//! Agent routing: score agent panes and pick where the next unit of work goes.
//!
//! A scoring pass classifies each agent pane, combines context headroom,
//! activity state and recency into a weighted 0-100 score, then applies hard
//! exclusion rules. Ordering and filtering are separate pure functions in
//! [`select`].

mod affinity;
mod config;
mod scorer;
pub mod select;

pub use affinity::{AffinityMatcher, CapabilityAffinity, NoAffinity};
pub use config::RoutingConfig;
pub use scorer::{
    AgentObservation, AgentScorer, ScoreBreakdown, ScoredAgent, ScoringReport,
    EFFECTIVENESS_POINTS,
};
pub use select::{
    exclude_panes, filter_by_panes, filter_by_type, get_available_agents, get_best_agent,
};
