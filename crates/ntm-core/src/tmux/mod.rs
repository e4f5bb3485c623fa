mod client;
mod pane;

pub use client::TmuxClient;
pub use pane::PaneInfo;

use anyhow::Result;

/// Source of panes and their captured output
///
/// The scorer depends on this seam instead of tmux directly so that pane
/// enumeration and capture can be faked in tests.
pub trait PaneSource: Send + Sync {
    /// List every pane of a session. Failure here is fatal to a scoring pass.
    fn list_panes(&self, session: &str) -> Result<Vec<PaneInfo>>;

    /// Capture the recent plain-text output of one pane
    fn capture_pane(&self, pane: &PaneInfo) -> Result<String>;
}
