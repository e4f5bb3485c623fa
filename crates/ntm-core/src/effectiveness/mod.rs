//! Effectiveness learning: historical outcomes, capability scores and the
//! integrator that turns them into routing bonuses and task rankings.

mod capability;
mod integrator;
mod store;
mod task;

pub use capability::{CapabilityMatrix, DEFAULT_CAPABILITY_SCORE};
pub use integrator::{
    default_integrator, get_assignment_mode, get_effectiveness_bonus, set_assignment_mode,
    AssignmentMode, EffectivenessConfig, EffectivenessIntegrator, Ranking, RankingEntry,
};
pub use store::{AgentTaskEffectiveness, EffectivenessStore, TaskOutcome, DEFAULT_WINDOW_DAYS};
pub use task::TaskType;
