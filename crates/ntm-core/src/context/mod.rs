//! Context-window usage of agent panes.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::tmux::PaneInfo;

/// Claude Code: "Context left until auto-compact: 12%"
static AUTO_COMPACT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Context left until auto-compact:\s*(\d{1,3})%")
        .expect("Invalid AUTO_COMPACT_PATTERN regex")
});

/// Codex / Gemini: "37% context left"
static CONTEXT_LEFT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{1,3})% context left").expect("Invalid CONTEXT_LEFT_PATTERN regex")
});

/// Supplies the context usage percentage (0-100) of a pane
pub trait ContextUsageProvider: Send + Sync {
    /// Usage for the pane, `None` when unknown
    fn context_usage(&self, pane: &PaneInfo, content: &str) -> Option<f64>;
}

/// Parses the context-left indicators printed by the agent CLIs
#[derive(Debug, Default, Clone, Copy)]
pub struct ContextIndicatorParser;

impl ContextUsageProvider for ContextIndicatorParser {
    fn context_usage(&self, _pane: &PaneInfo, content: &str) -> Option<f64> {
        parse_context_left(content).map(|left| 100.0 - f64::from(left))
    }
}

/// Find the most recent "context left" percentage in the capture
pub fn parse_context_left(content: &str) -> Option<u8> {
    for line in content.lines().rev().take(30) {
        let caps = AUTO_COMPACT_PATTERN
            .captures(line)
            .or_else(|| CONTEXT_LEFT_PATTERN.captures(line));
        if let Some(pct) = caps
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse::<u8>().ok())
        {
            return Some(pct.min(100));
        }
    }
    None
}
