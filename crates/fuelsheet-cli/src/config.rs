//! Process configuration
//!
//! Settings come from a TOML defaults file, then environment variables
//! override individual keys:
//!
//! | Key | Environment | Default |
//! |-----|-------------|---------|
//! | `stage` | `FUELSHEET_STAGE` | `dev` |
//! | `source_dir` | `FUELSHEET_SOURCE_DIR` | `reports` |
//! | `output_dir` | `FUELSHEET_OUTPUT_DIR` | `out` |
//! | `file_prefix` | `FUELSHEET_FILE_PREFIX` | `tankfiles` |
//! | `categories` | | `["NL", "SNL", "DSL", "CDSL"]` |
//! | `reports` | | every report kind |
//!
//! Relative directories in a defaults file are resolved against the file's
//! own directory.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use fuelsheet_core::{CategorySet, ReportKind};
use serde::Deserialize;
use thiserror::Error;

/// Defaults file looked up in the working directory when none is given
pub const DEFAULTS_FILE: &str = "defaults.toml";

pub const ENV_STAGE: &str = "FUELSHEET_STAGE";
pub const ENV_SOURCE_DIR: &str = "FUELSHEET_SOURCE_DIR";
pub const ENV_OUTPUT_DIR: &str = "FUELSHEET_OUTPUT_DIR";
pub const ENV_FILE_PREFIX: &str = "FUELSHEET_FILE_PREFIX";

/// Deployment stage
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Stage {
    #[default]
    Dev,
    Stage,
    Test,
    Prod,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Dev => "dev",
            Stage::Stage => "stage",
            Stage::Test => "test",
            Stage::Prod => "prod",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "dev" | "development" => Ok(Stage::Dev),
            "stage" => Ok(Stage::Stage),
            "test" => Ok(Stage::Test),
            "prod" | "production" => Ok(Stage::Prod),
            other => Err(ConfigError::InvalidStage(other.to_string())),
        }
    }
}

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid stage value: {0:?} (expected dev, stage, test or prod)")]
    InvalidStage(String),
}

/// Defaults file contents; every key is optional
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    stage: Option<String>,
    source_dir: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    file_prefix: Option<String>,
    categories: Option<CategorySet>,
    reports: Option<Vec<ReportKind>>,
}

/// Resolved configuration
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub stage: Stage,
    /// Directory holding `<report-kind>.json` payloads
    pub source_dir: PathBuf,
    /// Directory receiving rendered workbooks
    pub output_dir: PathBuf,
    /// Key prefix for delivered workbooks
    pub file_prefix: String,
    pub categories: CategorySet,
    /// Reports fetched for every request
    pub reports: Vec<ReportKind>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            stage: Stage::default(),
            source_dir: PathBuf::from("reports"),
            output_dir: PathBuf::from("out"),
            file_prefix: "tankfiles".into(),
            categories: CategorySet::fuel_types(),
            reports: ReportKind::ALL.to_vec(),
        }
    }
}

impl Config {
    /// Load from `path` (or `defaults.toml` if present) and the process environment
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with(path, |key| std::env::var(key).ok())
    }

    /// Load with an explicit environment lookup
    pub fn load_with<F>(path: Option<&Path>, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULTS_FILE).is_file() => {
                Self::from_file(Path::new(DEFAULTS_FILE))?
            }
            None => Self::default(),
        };
        config.apply_env(env)?;
        tracing::debug!(
            stage = %config.stage,
            source = %config.source_dir.display(),
            "configuration loaded"
        );
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        Self::from_toml_str(&text, base)
    }

    /// Parse defaults text, resolving relative directories against `base`
    pub fn from_toml_str(text: &str, base: &Path) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(text)?;
        let defaults = Self::default();
        let resolve = |dir: PathBuf| {
            if dir.is_relative() {
                base.join(dir)
            } else {
                dir
            }
        };

        let stage = match file.stage.as_deref() {
            Some(stage) => Stage::from_str(stage)?,
            None => defaults.stage,
        };

        Ok(Self {
            stage,
            source_dir: file.source_dir.map(resolve).unwrap_or(defaults.source_dir),
            output_dir: file.output_dir.map(resolve).unwrap_or(defaults.output_dir),
            file_prefix: file.file_prefix.unwrap_or(defaults.file_prefix),
            categories: file.categories.unwrap_or(defaults.categories),
            reports: file.reports.unwrap_or(defaults.reports),
        })
    }

    fn apply_env<F>(&mut self, env: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let set = |key: &str| env(key).filter(|value| !value.trim().is_empty());

        if let Some(stage) = set(ENV_STAGE) {
            self.stage = stage.parse()?;
        }
        if let Some(dir) = set(ENV_SOURCE_DIR) {
            self.source_dir = PathBuf::from(dir);
        }
        if let Some(dir) = set(ENV_OUTPUT_DIR) {
            self.output_dir = PathBuf::from(dir);
        }
        if let Some(prefix) = set(ENV_FILE_PREFIX) {
            self.file_prefix = prefix;
        }
        Ok(())
    }
}
