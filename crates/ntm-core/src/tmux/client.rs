use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::process::Command;

use super::pane::PaneInfo;
use super::PaneSource;

/// Regex pattern for validating tmux session names
static SESSION_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_.-]+$").expect("Invalid SESSION_PATTERN regex"));

/// Regex pattern for validating tmux target format (session:window.pane)
static TARGET_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_.-]+:\d+\.\d+$").expect("Invalid TARGET_PATTERN regex"));

/// Validate session name to prevent command injection
fn validate_session(session: &str) -> Result<()> {
    if !SESSION_PATTERN.is_match(session) {
        anyhow::bail!("Invalid tmux session name: {}", session);
    }
    Ok(())
}

/// Validate tmux target format to prevent command injection
fn validate_target(target: &str) -> Result<()> {
    if !TARGET_PATTERN.is_match(target) {
        anyhow::bail!("Invalid tmux target format: {}", target);
    }
    Ok(())
}

/// Client for interacting with tmux
pub struct TmuxClient {
    /// Number of lines to capture from pane
    capture_lines: u32,
}

impl Default for TmuxClient {
    fn default() -> Self {
        Self::new()
    }
}

impl TmuxClient {
    /// Creates a new TmuxClient with default settings
    pub fn new() -> Self {
        Self { capture_lines: 100 }
    }

    /// Creates a new TmuxClient with custom capture lines
    pub fn with_capture_lines(capture_lines: u32) -> Self {
        Self { capture_lines }
    }

    /// Check if tmux is available and running
    pub fn is_available(&self) -> bool {
        Command::new("tmux")
            .arg("list-sessions")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    /// Lists all panes of one session
    pub fn list_session_panes(&self, session: &str) -> Result<Vec<PaneInfo>> {
        validate_session(session)?;

        // Tab separator handles spaces in titles
        let output = Command::new("tmux")
            .args([
                "list-panes",
                "-s",
                "-t",
                session,
                "-F",
                "#{pane_id}\t#{session_name}:#{window_index}.#{pane_index}\t#{pane_current_command}\t#{pane_pid}\t#{pane_title}",
            ])
            .output()
            .context("Failed to execute tmux list-panes")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("tmux list-panes failed for {}: {}", session, stderr.trim());
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(stdout.lines().filter_map(PaneInfo::parse).collect())
    }

    /// Captures the content of a specific pane without ANSI codes
    pub fn capture_pane_plain(&self, target: &str) -> Result<String> {
        validate_target(target)?;
        let start_line = format!("-{}", self.capture_lines);

        let output = Command::new("tmux")
            .args(["capture-pane", "-p", "-t", target, "-S", &start_line])
            .output()
            .context("Failed to execute tmux capture-pane")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("tmux capture-pane failed for {}: {}", target, stderr.trim());
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

impl PaneSource for TmuxClient {
    fn list_panes(&self, session: &str) -> Result<Vec<PaneInfo>> {
        self.list_session_panes(session)
    }

    fn capture_pane(&self, pane: &PaneInfo) -> Result<String> {
        self.capture_pane_plain(&pane.target)
    }
}
