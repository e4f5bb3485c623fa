use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Kind of work item routed to an agent
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TaskType {
    Bug,
    Feature,
    Refactor,
    Documentation,
    Testing,
    Analysis,
    /// Any task label outside the known set (stored lowercased)
    Other(String),
}

/// Keyword rules for inferring the task type of a prompt, checked in order
static INFERENCE_RULES: Lazy<Vec<(TaskType, Regex)>> = Lazy::new(|| {
    [
        (
            TaskType::Bug,
            r"(?i)\b(?:fix(?:es|ed)?|bugs?|crash(?:es)?|broken|regression|failing|panics?)\b",
        ),
        (
            TaskType::Refactor,
            r"(?i)\b(?:refactor\w*|clean ?up|simplify|restructure|rename|extract)\b",
        ),
        (
            TaskType::Testing,
            r"(?i)\b(?:tests?|testing|coverage|unit test|e2e|fixtures?)\b",
        ),
        (
            TaskType::Documentation,
            r"(?i)\b(?:docs?|document\w*|readme|changelog|docstrings?)\b",
        ),
        (
            TaskType::Analysis,
            r"(?i)\b(?:analy[sz]e|analysis|investigate|review|explain|audit|profile)\b",
        ),
        (
            TaskType::Feature,
            r"(?i)\b(?:add|implement|feature|build|create|support|introduce)\b",
        ),
    ]
    .into_iter()
    .map(|(task, pattern)| (task, Regex::new(pattern).expect("Invalid task inference regex")))
    .collect()
});

impl TaskType {
    /// Parse a task label ("bug", "docs", ...); unknown labels become `Other`
    pub fn parse(label: &str) -> Self {
        let lower = label.trim().to_lowercase();
        match lower.as_str() {
            "bug" | "bugfix" | "fix" => TaskType::Bug,
            "feature" | "feat" => TaskType::Feature,
            "refactor" | "refactoring" => TaskType::Refactor,
            "docs" | "doc" | "documentation" => TaskType::Documentation,
            "test" | "tests" | "testing" => TaskType::Testing,
            "analysis" | "review" | "research" => TaskType::Analysis,
            _ => TaskType::Other(lower),
        }
    }

    /// Infer the task type from free-text prompt keywords
    pub fn infer(prompt: &str) -> Option<Self> {
        if prompt.trim().is_empty() {
            return None;
        }
        INFERENCE_RULES
            .iter()
            .find(|(_, re)| re.is_match(prompt))
            .map(|(task, _)| task.clone())
    }

    /// Canonical label
    pub fn as_str(&self) -> &str {
        match self {
            TaskType::Bug => "bug",
            TaskType::Feature => "feature",
            TaskType::Refactor => "refactor",
            TaskType::Documentation => "docs",
            TaskType::Testing => "testing",
            TaskType::Analysis => "analysis",
            TaskType::Other(label) => label,
        }
    }

    /// All known task types (excluding Other)
    pub fn all_known() -> Vec<TaskType> {
        vec![
            TaskType::Bug,
            TaskType::Feature,
            TaskType::Refactor,
            TaskType::Documentation,
            TaskType::Testing,
            TaskType::Analysis,
        ]
    }
}

impl From<String> for TaskType {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<TaskType> for String {
    fn from(value: TaskType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_labels() {
        assert_eq!(TaskType::parse("bug"), TaskType::Bug);
        assert_eq!(TaskType::parse("Docs"), TaskType::Documentation);
        assert_eq!(
            TaskType::parse("Invalid_Task"),
            TaskType::Other("invalid_task".to_string())
        );
    }

    #[test]
    fn test_infer_from_prompt() {
        assert_eq!(
            TaskType::infer("Fix the crash in the parser"),
            Some(TaskType::Bug)
        );
        assert_eq!(
            TaskType::infer("Refactor the session store"),
            Some(TaskType::Refactor)
        );
        assert_eq!(
            TaskType::infer("write unit tests for routing"),
            Some(TaskType::Testing)
        );
        assert_eq!(
            TaskType::infer("Update the README"),
            Some(TaskType::Documentation)
        );
        assert_eq!(
            TaskType::infer("Implement OAuth login"),
            Some(TaskType::Feature)
        );
        assert_eq!(TaskType::infer("hello there"), None);
        assert_eq!(TaskType::infer("   "), None);
    }

    #[test]
    fn test_serde_roundtrip_label() {
        let json = serde_json::to_string(&TaskType::Documentation).unwrap();
        assert_eq!(json, "\"docs\"");
        let parsed: TaskType = serde_json::from_str("\"feat\"").unwrap();
        assert_eq!(parsed, TaskType::Feature);
    }
}
