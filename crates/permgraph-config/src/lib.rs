//! Multi-tier TOML configuration for permgraph.
//!
//! Reads configuration from multiple sources with precedence:
//! CLI flags > env vars > config file > defaults

pub mod policy;

pub use policy::{GrantEntry, InheritanceEntry, PolicyEngine, PolicyFile, PolicySummary};

use permgraph_core::{CyclePolicy, InheritablePermissions};
use permgraph_types::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the settings file inside the config directory.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Env var overriding the subject graph's cycle policy.
pub const SUBJECT_CYCLES_ENV: &str = "PERMGRAPH_SUBJECT_CYCLES";

/// Env var overriding the object graph's cycle policy.
pub const OBJECT_CYCLES_ENV: &str = "PERMGRAPH_OBJECT_CYCLES";

/// Resolved configuration.
#[derive(Debug, Clone)]
pub struct PermgraphConfig {
    pub subject_cycles: CyclePolicy,
    pub object_cycles: CyclePolicy,
    pub policy_path: Option<PathBuf>,
    pub config_dir: PathBuf,
}

/// Settings that can be read from a TOML config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsFile {
    #[serde(default)]
    pub graph: GraphSettings,
    #[serde(default)]
    pub policy: PolicySettings,
}

/// Inheritance graph section of the config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphSettings {
    pub subject_cycles: Option<CyclePolicy>,
    pub object_cycles: Option<CyclePolicy>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PolicySettings {
    /// Policy file to load. Relative paths resolve against the config directory.
    pub path: Option<PathBuf>,
}

/// CLI overrides that take highest precedence.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub subject_cycles: Option<CyclePolicy>,
    pub object_cycles: Option<CyclePolicy>,
    pub policy_path: Option<PathBuf>,
}

impl PermgraphConfig {
    /// Load configuration from all sources, applying precedence rules.
    ///
    /// Precedence (highest to lowest):
    /// 1. CLI flags
    /// 2. Environment variables
    /// 3. Config file (~/.permgraph/config.toml)
    /// 4. Defaults
    pub fn load(overrides: CliOverrides) -> Result<Self, ConfigError> {
        let config_dir = config_dir();
        let settings = load_settings_file(&config_dir.join(CONFIG_FILE_NAME));
        Self::resolve(config_dir, settings, overrides, |key| std::env::var(key).ok())
    }

    /// Apply precedence rules over already-read sources.
    pub fn resolve(
        config_dir: PathBuf,
        settings: SettingsFile,
        overrides: CliOverrides,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let subject_cycles = match overrides.subject_cycles {
            Some(policy) => policy,
            None => env_policy(&env, SUBJECT_CYCLES_ENV)?
                .or(settings.graph.subject_cycles)
                .unwrap_or_default(),
        };

        let object_cycles = match overrides.object_cycles {
            Some(policy) => policy,
            None => env_policy(&env, OBJECT_CYCLES_ENV)?
                .or(settings.graph.object_cycles)
                .unwrap_or_default(),
        };

        let policy_path = overrides.policy_path.or_else(|| {
            settings.policy.path.map(|path| {
                if path.is_relative() {
                    config_dir.join(path)
                } else {
                    path
                }
            })
        });

        Ok(PermgraphConfig {
            subject_cycles,
            object_cycles,
            policy_path,
            config_dir,
        })
    }

    /// An empty engine with the configured cycle policies.
    pub fn engine<S, O, R>(&self) -> InheritablePermissions<S, O, R> {
        InheritablePermissions::with_cycle_policy(self.subject_cycles, self.object_cycles)
    }
}

fn env_policy(
    env: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<CyclePolicy>, ConfigError> {
    env(key)
        .map(|value| {
            value.parse().map_err(|message| ConfigError::InvalidValue {
                key: key.to_string(),
                message,
            })
        })
        .transpose()
}

/// Get the permgraph config directory path (~/.permgraph/).
pub fn config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("PERMGRAPH_CONFIG_DIR") {
        return PathBuf::from(dir);
    }
    dirs_next::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".permgraph")
}

/// Load and parse a TOML settings file, returning defaults on any error.
pub fn load_settings_file(path: &Path) -> SettingsFile {
    match std::fs::read_to_string(path) {
        Ok(content) => toml::from_str(&content).unwrap_or_else(|e| {
            tracing::warn!("Failed to parse {}: {}", path.display(), e);
            SettingsFile::default()
        }),
        Err(_) => SettingsFile::default(),
    }
}
