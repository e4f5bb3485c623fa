//! Historical task outcomes per (agent type, task type) with time decay.
//!
//! Outcomes are appended as they are reported and aggregated on query: only
//! outcomes inside the window count, each weighted by an exponential decay
//! whose half-life is half the window. The aggregate is smoothed with a
//! Beta(1, 1) prior so that a pair without history scores 0.5.

use std::collections::BTreeSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::agents::AgentType;

use super::task::TaskType;

/// Default history window in days
pub const DEFAULT_WINDOW_DAYS: u32 = 14;

/// Sample count at which confidence reaches 0.5
const CONFIDENCE_HALF_SAMPLES: f64 = 5.0;

/// Store file format version
const STORE_VERSION: u32 = 1;

/// One reported task outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskOutcome {
    pub agent_type: AgentType,
    pub task_type: TaskType,
    pub success: bool,
    pub recorded_at: DateTime<Utc>,
}

impl TaskOutcome {
    pub fn new(agent_type: AgentType, task_type: TaskType, success: bool, recorded_at: DateTime<Utc>) -> Self {
        Self {
            agent_type,
            task_type,
            success,
            recorded_at,
        }
    }
}

/// Aggregated effectiveness of an agent type on a task type
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentTaskEffectiveness {
    pub agent_type: AgentType,
    pub task_type: TaskType,
    /// Smoothed success score (0-1)
    pub score: f64,
    /// Outcomes inside the window
    pub sample_count: usize,
    /// Confidence in the score (0-1), grows with sample count
    pub confidence: f64,
    pub has_data: bool,
    /// Whether any counted outcome was down-weighted by age
    pub decay_applied: bool,
}

#[derive(Debug, Default, Deserialize)]
struct StoreFile {
    version: u32,
    outcomes: Vec<TaskOutcome>,
}

#[derive(Serialize)]
struct StoreFileRef<'a> {
    version: u32,
    outcomes: &'a [TaskOutcome],
}

/// Outcome history, optionally backed by a JSON file
pub struct EffectivenessStore {
    outcomes: RwLock<Vec<TaskOutcome>>,
    window_days: u32,
    path: Option<PathBuf>,
}

impl Default for EffectivenessStore {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_DAYS)
    }
}

impl EffectivenessStore {
    /// Create an in-memory store
    pub fn new(window_days: u32) -> Self {
        Self {
            outcomes: RwLock::new(Vec::new()),
            window_days: window_days.max(1),
            path: None,
        }
    }

    /// Open a file-backed store, loading existing history if the file exists
    pub fn open(path: impl Into<PathBuf>, window_days: u32) -> Result<Self> {
        let path = path.into();
        let outcomes = if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read effectiveness store: {:?}", path))?;
            let file: StoreFile = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse effectiveness store: {:?}", path))?;
            debug!(
                path = ?path,
                version = file.version,
                outcomes = file.outcomes.len(),
                "Loaded effectiveness store"
            );
            file.outcomes
        } else {
            Vec::new()
        };

        Ok(Self {
            outcomes: RwLock::new(outcomes),
            window_days: window_days.max(1),
            path: Some(path),
        })
    }

    /// Default store location (`<data dir>/ntm/effectiveness.json`)
    pub fn default_path() -> Option<PathBuf> {
        dirs::data_dir().map(|p| p.join("ntm").join("effectiveness.json"))
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn window_days(&self) -> u32 {
        self.window_days
    }

    /// Append an outcome and persist if file-backed
    ///
    /// The outcome is kept only if it reached disk.
    pub fn record(&self, outcome: TaskOutcome) -> Result<()> {
        let mut outcomes = self.outcomes.write();
        outcomes.push(outcome);
        if let Err(e) = self.write_file(&outcomes) {
            outcomes.pop();
            return Err(e);
        }
        Ok(())
    }

    /// Convenience wrapper around [`record`](Self::record)
    pub fn record_outcome(
        &self,
        agent_type: AgentType,
        task_type: TaskType,
        success: bool,
        now: DateTime<Utc>,
    ) -> Result<()> {
        self.record(TaskOutcome::new(agent_type, task_type, success, now))
    }

    /// Aggregate the history of one pair as of `now`
    pub fn effectiveness(
        &self,
        agent_type: &AgentType,
        task_type: &TaskType,
        now: DateTime<Utc>,
    ) -> AgentTaskEffectiveness {
        let outcomes = self.outcomes.read();
        let half_life = f64::from(self.window_days) / 2.0;

        let mut weighted_successes = 0.0;
        let mut weighted_total = 0.0;
        let mut sample_count = 0;
        let mut decay_applied = false;

        for outcome in outcomes
            .iter()
            .filter(|o| &o.agent_type == agent_type && &o.task_type == task_type)
        {
            let age_days = age_in_days(outcome.recorded_at, now);
            if age_days > f64::from(self.window_days) {
                continue;
            }
            let weight = 0.5_f64.powf(age_days / half_life);
            if weight < 1.0 {
                decay_applied = true;
            }
            sample_count += 1;
            weighted_total += weight;
            if outcome.success {
                weighted_successes += weight;
            }
        }

        let n = sample_count as f64;
        AgentTaskEffectiveness {
            agent_type: agent_type.clone(),
            task_type: task_type.clone(),
            score: (weighted_successes + 1.0) / (weighted_total + 2.0),
            sample_count,
            confidence: n / (n + CONFIDENCE_HALF_SAMPLES),
            has_data: sample_count > 0,
            decay_applied,
        }
    }

    /// Aggregates for every pair with at least one outcome in the window
    pub fn all_effectiveness(&self, now: DateTime<Utc>) -> Vec<AgentTaskEffectiveness> {
        let pairs: BTreeSet<(AgentType, TaskType)> = self
            .outcomes
            .read()
            .iter()
            .map(|o| (o.agent_type.clone(), o.task_type.clone()))
            .collect();

        pairs
            .iter()
            .map(|(agent, task)| self.effectiveness(agent, task, now))
            .filter(|e| e.has_data)
            .collect()
    }

    /// Drop outcomes that fell out of the window; returns how many were removed
    pub fn prune(&self, now: DateTime<Utc>) -> Result<usize> {
        let window = f64::from(self.window_days);
        let mut outcomes = self.outcomes.write();
        let kept: Vec<TaskOutcome> = outcomes
            .iter()
            .filter(|o| age_in_days(o.recorded_at, now) <= window)
            .cloned()
            .collect();
        let removed = outcomes.len() - kept.len();
        if removed > 0 {
            self.write_file(&kept)?;
            *outcomes = kept;
            debug!(removed, "Pruned expired effectiveness outcomes");
        }
        Ok(removed)
    }

    /// Forget all history
    pub fn clear(&self) -> Result<()> {
        let mut outcomes = self.outcomes.write();
        self.write_file(&[])?;
        outcomes.clear();
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.outcomes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.read().is_empty()
    }

    /// Write the history to disk (no-op for in-memory stores)
    pub fn save(&self) -> Result<()> {
        let outcomes = self.outcomes.write();
        self.write_file(&outcomes)
    }

    /// Atomically replace the store file with `outcomes`
    ///
    /// Callers hold the outcomes write lock, so writes never interleave. Each write
    /// goes through its own temp file in the target directory.
    fn write_file(&self, outcomes: &[TaskOutcome]) -> Result<()> {
        let Some(path) = self.path.as_ref() else {
            return Ok(());
        };

        let json = serde_json::to_string_pretty(&StoreFileRef {
            version: STORE_VERSION,
            outcomes,
        })
        .context("Failed to serialize effectiveness store")?;

        let dir = path
            .parent()
            .filter(|d| !d.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create store directory: {:?}", dir))?;

        let mut temp = NamedTempFile::new_in(dir)
            .with_context(|| format!("Failed to create temp store file in {:?}", dir))?;
        temp.write_all(json.as_bytes())
            .context("Failed to write temp store file")?;
        temp.as_file()
            .sync_all()
            .context("Failed to sync temp store file")?;
        temp.persist(path)
            .with_context(|| format!("Failed to rename store file: {:?}", path))?;

        Ok(())
    }
}

/// Age of a timestamp in fractional days (future timestamps count as 0)
fn age_in_days(at: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    ((now - at).num_seconds().max(0) as f64) / 86_400.0
}
