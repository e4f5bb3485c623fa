use crate::agents::AgentType;

/// Information about a tmux pane
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaneInfo {
    /// Stable tmux pane identifier (e.g. "%12")
    pub pane_id: String,
    /// Full target identifier (session:window.pane)
    pub target: String,
    /// Session name
    pub session: String,
    /// Window index
    pub window_index: u32,
    /// Pane index
    pub pane_index: u32,
    /// Current command running in the pane
    pub command: String,
    /// Process ID
    pub pid: u32,
    /// Pane title
    pub title: String,
}

impl PaneInfo {
    /// Parse a pane info line from tmux list-panes output
    /// Format: pane_id\tsession:window.pane\tcommand\tpid\ttitle
    pub fn parse(line: &str) -> Option<Self> {
        let parts: Vec<&str> = line.splitn(5, '\t').collect();
        if parts.len() < 5 {
            return None;
        }

        let target = parts[1];
        let (session, window_pane) = target.split_once(':')?;
        let (window_str, pane_str) = window_pane.split_once('.')?;
        let window_index = window_str.parse().ok()?;
        let pane_index = pane_str.parse().ok()?;

        Some(Self {
            pane_id: parts[0].to_string(),
            target: target.to_string(),
            session: session.to_string(),
            window_index,
            pane_index,
            command: parts[2].to_string(),
            pid: parts[3].parse().unwrap_or(0),
            title: parts[4].to_string(),
        })
    }

    /// Detect the agent type running in this pane
    pub fn detect_agent_type(&self) -> Option<AgentType> {
        AgentType::from_detection(&self.command, &self.title)
    }
}
