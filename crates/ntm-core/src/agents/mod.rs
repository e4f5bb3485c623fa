mod types;

pub use types::{AgentState, AgentType, HealthState};
