use once_cell::sync::Lazy;
use regex::Regex;

/// Error lines printed by agent CLIs
static ERROR_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?im)^[ \t]*(?:API Error|Error:|ERROR\b|✗|❌|panicked at)")
        .expect("Invalid ERROR_PATTERN regex")
});

/// Provider rate / usage limit messages
static RATE_LIMIT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)rate[ -]limit(?:ed)?|usage limit|quota exceeded|too many requests|\b429\b|limit will reset",
    )
    .expect("Invalid RATE_LIMIT_PATTERN regex")
});

/// Indicators that the agent is working but not yet streaming
static THINKING_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)esc to interrupt|thinking…|thinking\.\.\.|[⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏✻✽]")
        .expect("Invalid THINKING_PATTERN regex")
});

/// Idle input prompts (claude `>`, codex `›`, gemini `>` / "Type your message")
static PROMPT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^[ \t]*(?:[│|][ \t]*)?(?:>|›|❯)[ \t]*(?:[│|][ \t]*)?$|Type your message")
        .expect("Invalid PROMPT_PATTERN regex")
});

/// Number of trailing bytes scanned for error and rate-limit messages
const TAIL_BYTES: usize = 600;

/// Number of trailing lines scanned for prompts and spinners
const TAIL_LINES: usize = 8;

/// Get the last n bytes of a string safely, respecting UTF-8 boundaries
pub(crate) fn safe_tail(s: &str, n: usize) -> &str {
    if s.len() <= n {
        s
    } else {
        let start = s.len() - n;
        let start = s
            .char_indices()
            .map(|(i, _)| i)
            .find(|&i| i >= start)
            .unwrap_or(s.len());
        &s[start..]
    }
}

/// Last non-empty lines of the capture joined back together
fn tail_lines(content: &str, n: usize) -> String {
    let lines: Vec<&str> = content
        .lines()
        .rev()
        .filter(|l| !l.trim().is_empty())
        .take(n)
        .collect();
    lines.into_iter().rev().collect::<Vec<_>>().join("\n")
}

/// Return the matching error line, if any
pub(crate) fn detect_error(content: &str) -> Option<String> {
    let recent = safe_tail(content, TAIL_BYTES);
    ERROR_PATTERN
        .find(recent)
        .map(|m| {
            let start = m.start();
            let end = recent[start..]
                .find('\n')
                .map(|i| start + i)
                .unwrap_or(recent.len());
            recent[start..end].trim().to_string()
        })
}

pub(crate) fn is_rate_limited(content: &str) -> bool {
    RATE_LIMIT_PATTERN.is_match(safe_tail(content, TAIL_BYTES))
}

pub(crate) fn is_thinking(content: &str) -> bool {
    THINKING_PATTERN.is_match(&tail_lines(content, TAIL_LINES))
}

pub(crate) fn has_idle_prompt(content: &str) -> bool {
    PROMPT_PATTERN.is_match(&tail_lines(content, TAIL_LINES))
}
