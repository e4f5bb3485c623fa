//! Activity classification: what each agent pane is doing right now.

mod classifier;
mod monitor;
mod patterns;

pub use classifier::{
    ActivityClassifier, ActivitySnapshot, DEFAULT_STALL_AFTER_SECS, GENERATING_VELOCITY,
};
pub use monitor::{ActivityMonitor, DEFAULT_MAX_TRACKED_PANES};
