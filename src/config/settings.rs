use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ntm_core::config::{validate_routing, ActivitySettings, EffectivenessSettings};
use ntm_core::routing::RoutingConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming an alternative config file
pub const CONFIG_ENV: &str = "NTM_CONFIG";

/// Command line arguments
#[derive(Parser, Debug)]
#[command(author, version, about = "Route work across tmux-hosted AI coding agents")]
pub struct Config {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Number of lines to capture from panes
    #[arg(short = 'l', long, global = true)]
    pub capture_lines: Option<u32>,

    /// Effectiveness history file
    #[arg(long, global = true)]
    pub store: Option<PathBuf>,

    /// Assignment mode (exploitation, learning, balanced)
    #[arg(long, global = true)]
    pub mode: Option<String>,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Subcommand
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Score the agents of a session and recommend one
    Route {
        /// tmux session name
        session: String,

        /// Prompt to route; enables task inference and affinity
        #[arg(short, long, default_value = "")]
        prompt: String,

        /// Only agents of this type (cc, cod, gmi)
        #[arg(short = 't', long, default_value = "")]
        agent_type: String,

        /// Only these pane indices
        #[arg(long, value_delimiter = ',')]
        panes: Vec<u32>,

        /// Never these pane indices
        #[arg(long, value_delimiter = ',')]
        exclude_panes: Vec<u32>,

        /// List excluded agents too
        #[arg(short, long)]
        all: bool,

        /// Re-score every N seconds until interrupted
        #[arg(short, long)]
        watch: Option<u64>,
    },
    /// Rank agent types for a task type
    Rank {
        /// Task type (bug, feature, refactor, docs, testing, analysis)
        task: String,
    },
    /// Record the outcome of a finished task
    Record {
        /// Agent type (cc, cod, gmi)
        agent: String,

        /// Task type
        task: String,

        #[arg(long, conflicts_with = "failure", required_unless_present = "failure")]
        success: bool,

        #[arg(long)]
        failure: bool,
    },
    /// Show historical effectiveness of an agent type on a task type
    Effectiveness {
        /// Agent type (cc, cod, gmi)
        agent: String,

        /// Task type
        task: String,
    },
}

impl Config {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

/// Application settings (from config file)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Routing weights and exclusion rules
    #[serde(default)]
    pub routing: RoutingConfig,

    /// Effectiveness learning
    #[serde(default)]
    pub effectiveness: EffectivenessSettings,

    /// Pane capture and activity tracking
    #[serde(default)]
    pub activity: ActivitySettings,

    /// JSON output
    #[serde(default)]
    pub output: OutputSettings,
}

/// Output settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputSettings {
    /// Pretty-print JSON output
    #[serde(default)]
    pub pretty: bool,
}

impl Settings {
    /// Load settings from config file or use defaults
    ///
    /// Lookup order: explicit path, `NTM_CONFIG`, then the default locations.
    pub fn load(path: Option<&PathBuf>) -> Result<Self> {
        // Try custom path first
        if let Some(p) = path {
            if p.exists() {
                return Self::read(p);
            }
        }

        if let Some(p) = std::env::var_os(CONFIG_ENV).map(PathBuf::from) {
            if p.exists() {
                return Self::read(&p);
            }
        }

        // Try default config locations
        let default_paths = [
            dirs::config_dir().map(|p| p.join("ntm/config.toml")),
            dirs::home_dir().map(|p| p.join(".config/ntm/config.toml")),
            dirs::home_dir().map(|p| p.join(".ntm.toml")),
        ];

        for path in default_paths.iter().flatten() {
            if path.exists() {
                return Self::read(path);
            }
        }

        // Return defaults if no config file found
        Ok(Self::default())
    }

    fn read(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    /// Merge CLI config into settings (CLI takes precedence)
    pub fn merge_cli(&mut self, cli: &Config) {
        if let Some(capture_lines) = cli.capture_lines {
            self.activity.capture_lines = capture_lines;
        }
        if let Some(store) = &cli.store {
            self.effectiveness.store_path = Some(store.clone());
        }
        if let Some(mode) = &cli.mode {
            self.effectiveness.mode = mode.clone().into();
        }
        if cli.pretty {
            self.output.pretty = true;
        }
    }

    /// Validate and normalize settings values
    ///
    /// Out-of-range values are clamped; unbalanced weights are only warned about.
    pub fn validate(&mut self) {
        validate_routing(&mut self.routing);
        self.effectiveness.validate();
        self.activity.validate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ntm_core::effectiveness::AssignmentMode;
    use pretty_assertions::assert_eq;

    fn cli(args: &[&str]) -> Config {
        Config::try_parse_from(args).expect("Should parse CLI")
    }

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.routing.context_weight, 0.4);
        assert_eq!(settings.routing.exclude_context_above, 85.0);
        assert!(settings.effectiveness.enabled);
        assert_eq!(settings.activity.capture_lines, 100);
        assert!(!settings.output.pretty);
    }

    #[test]
    fn test_parse_toml() {
        let toml = r#"
            [routing]
            context_weight = 0.5
            state_weight = 0.3
            exclude_if_generating = false

            [effectiveness]
            mode = "learning"

            [activity]
            capture_lines = 200
        "#;

        let settings: Settings = toml::from_str(toml).expect("Should parse TOML");
        assert_eq!(settings.routing.context_weight, 0.5);
        assert_eq!(settings.routing.recency_weight, 0.2);
        assert!(!settings.routing.exclude_if_generating);
        assert_eq!(settings.effectiveness.mode, AssignmentMode::Learning);
        assert_eq!(settings.activity.capture_lines, 200);
        assert_eq!(settings.activity.stall_after_secs, 300);
    }

    #[test]
    fn test_load_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[routing]\naffinity_enabled = true\n").unwrap();

        let settings = Settings::load(Some(&path)).unwrap();
        assert!(settings.routing.affinity_enabled);
    }

    #[test]
    fn test_load_from_env() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ntm.toml");
        std::fs::write(&path, "[effectiveness]\nmin_samples = 7\n").unwrap();

        temp_env::with_var(CONFIG_ENV, Some(&path), || {
            let settings = Settings::load(None).unwrap();
            assert_eq!(settings.effectiveness.min_samples, 7);
        });
    }

    #[test]
    fn test_load_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[routing\n").unwrap();

        assert!(Settings::load(Some(&path)).is_err());
    }

    #[test]
    fn test_merge_cli() {
        let mut settings = Settings::default();
        let cli = cli(&[
            "ntm",
            "--mode",
            "exploitation",
            "--store",
            "/tmp/eff.json",
            "-l",
            "50",
            "--pretty",
            "rank",
            "bug",
        ]);
        settings.merge_cli(&cli);

        assert_eq!(settings.effectiveness.mode, AssignmentMode::Exploitation);
        assert_eq!(
            settings.effectiveness.store_path,
            Some(PathBuf::from("/tmp/eff.json"))
        );
        assert_eq!(settings.activity.capture_lines, 50);
        assert!(settings.output.pretty);
    }

    #[test]
    fn test_validate_keeps_unbalanced_weights() {
        let mut settings = Settings::default();
        settings.routing.recency_weight = 0.6;
        settings.activity.capture_lines = 0;
        settings.validate();

        assert_eq!(settings.routing.recency_weight, 0.6);
        assert_eq!(settings.activity.capture_lines, 10);
    }

    #[test]
    fn test_parse_route_command() {
        let cli = cli(&[
            "ntm", "route", "proj", "-p", "fix bug", "--panes", "1,2", "--exclude-panes", "3",
            "--all",
        ]);
        assert_eq!(
            cli.command,
            Command::Route {
                session: "proj".to_string(),
                prompt: "fix bug".to_string(),
                agent_type: String::new(),
                panes: vec![1, 2],
                exclude_panes: vec![3],
                all: true,
                watch: None,
            }
        );
    }

    #[test]
    fn test_record_requires_outcome() {
        assert!(Config::try_parse_from(["ntm", "record", "cc", "bug"]).is_err());
        assert!(
            Config::try_parse_from(["ntm", "record", "cc", "bug", "--success", "--failure"])
                .is_err()
        );

        let cli = cli(&["ntm", "record", "cc", "bug", "--failure"]);
        assert!(matches!(cli.command, Command::Record { success: false, failure: true, .. }));
    }
}
