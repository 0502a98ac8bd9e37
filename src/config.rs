//! Configuration loading and merging.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::command::{Arity, ArityTable};
use crate::process::{DEFAULT_TIMEOUT, SpawnOptions};

/// Name searched on `PATH` when no executable is configured.
const DEFAULT_EXECUTABLE: &str = "jq";

/// Project-level config file, looked up in the working directory.
const PROJECT_CONFIG: &str = ".jqline.toml";

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid arity {arity} for flag '{flag}' (expected 0, 1 or 2)")]
    Arity { flag: String, arity: i64 },

    #[error("executable not found: {0}")]
    ExecutableNotFound(String),
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Path to the jq executable. Searched on `PATH` when unset.
    pub executable: Option<String>,

    /// Per-invocation timeout in milliseconds.
    pub timeout_ms: Option<u64>,

    /// Working directory for the child process.
    pub cwd: Option<String>,

    /// Extra environment variables for the child process.
    pub env: BTreeMap<String, String>,

    /// Extra flag arities, added to the built-in table.
    pub flags: BTreeMap<String, i64>,
}

/// Validated configuration.
#[derive(Debug, Clone)]
pub struct CompiledConfig {
    /// The raw config.
    pub raw: Config,
    /// Built-in flags plus the configured ones.
    pub arity_table: ArityTable,
    /// Timeout resolved against the default.
    pub timeout: Duration,
}

impl Config {
    /// Load configuration, merging user and project configs.
    ///
    /// `explicit` replaces the user-level lookup when given.
    pub fn load(explicit: Option<&Path>, cwd: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = Config::default();

        let user_config = match explicit {
            Some(path) => Some(Self::load_file(path)?),
            None => Self::load_user_config()?,
        };
        if let Some(user_config) = user_config {
            config = user_config;
        }

        if let Some(cwd) = cwd {
            let path = cwd.join(PROJECT_CONFIG);
            if path.exists() {
                config.merge(Self::load_file(&path)?);
            }
        }

        Ok(config)
    }

    fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    fn load_user_config() -> Result<Option<Self>, ConfigError> {
        if let Some(path) = Self::user_config_path()
            && path.exists()
        {
            return Ok(Some(Self::load_file(&path)?));
        }
        Ok(None)
    }

    /// Get user config path.
    /// Respects JQLINE_CONFIG env var for testing.
    fn user_config_path() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("JQLINE_CONFIG") {
            return Some(PathBuf::from(path));
        }
        dirs::config_dir().map(|d| d.join("jqline/config.toml"))
    }

    /// Merge another config into this one (other takes precedence for scalars).
    fn merge(&mut self, other: Config) {
        self.env.extend(other.env);
        self.flags.extend(other.flags);

        if other.executable.is_some() {
            self.executable = other.executable;
        }
        if other.timeout_ms.is_some() {
            self.timeout_ms = other.timeout_ms;
        }
        if other.cwd.is_some() {
            self.cwd = other.cwd;
        }
    }

    /// Validate flag arities and resolve defaults.
    pub fn compile(self) -> Result<CompiledConfig, ConfigError> {
        let mut arity_table = ArityTable::jq();
        for (flag, count) in &self.flags {
            let arity = Arity::from_count(*count).ok_or_else(|| ConfigError::Arity {
                flag: flag.clone(),
                arity: *count,
            })?;
            arity_table = arity_table.with_flag(flag.clone(), arity);
        }

        let timeout = self
            .timeout_ms
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_TIMEOUT);

        Ok(CompiledConfig {
            raw: self,
            arity_table,
            timeout,
        })
    }
}

impl CompiledConfig {
    /// Spawn options for one invocation.
    pub fn spawn_options(&self) -> SpawnOptions {
        SpawnOptions {
            cwd: self.raw.cwd.as_ref().map(PathBuf::from),
            env: self.raw.env.clone(),
            timeout: self.timeout,
        }
    }

    /// Resolve the executable path.
    ///
    /// The configured value may be a path or a bare name looked up on
    /// `PATH`; unset means `jq` on `PATH`. The result must be executable.
    pub fn executable(&self) -> Result<PathBuf, ConfigError> {
        let name = self.raw.executable.as_deref().unwrap_or(DEFAULT_EXECUTABLE);
        which::which(name).map_err(|_| ConfigError::ExecutableNotFound(name.to_string()))
    }
}
