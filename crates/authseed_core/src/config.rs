//! Seeding run configuration.
//!
//! # Invariants
//! - `RunMode::PerPhase` is the default: each phase commits on its own, so a
//!   failed run can leave earlier phases committed.
//! - `RunMode::Atomic` wraps the run in one transaction with a savepoint per
//!   phase; a failed run leaves the store untouched.

use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_ENGINE: &str = "sqlite";
pub const DEFAULT_FEATURE: &str = "auth";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    #[default]
    PerPhase,
    Atomic,
}

impl RunMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PerPhase => "per_phase",
            Self::Atomic => "atomic",
        }
    }
}

impl Display for RunMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RunMode {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "per_phase" => Ok(Self::PerPhase),
            "atomic" => Ok(Self::Atomic),
            other => Err(ConfigError::UnknownRunMode(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    BlankEngine,
    BlankFeature,
    /// Engine names become path segments; separators and whitespace are not allowed.
    InvalidEngine(String),
    /// Features are matched against file names verbatim; whitespace is not allowed.
    InvalidFeature(String),
    UnknownRunMode(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankEngine => write!(f, "engine must not be blank"),
            Self::BlankFeature => write!(f, "feature must not be blank"),
            Self::InvalidEngine(value) => write!(f, "invalid engine name `{value}`"),
            Self::InvalidFeature(value) => write!(f, "invalid feature name `{value}`"),
            Self::UnknownRunMode(value) => {
                write!(f, "unknown run mode `{value}`; expected per_phase|atomic")
            }
        }
    }
}

impl Error for ConfigError {}

/// Settings for one seeding run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SeedConfig {
    /// Storage engine; selects `seed/<engine>/` in the asset tree.
    pub engine: String,
    /// Seed grouping key, the `<feature>` part of seed file names.
    pub feature: String,
    pub run_mode: RunMode,
    /// Directory asset tree; `None` uses the seeds bundled in the binary.
    pub assets_dir: Option<PathBuf>,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            engine: DEFAULT_ENGINE.to_string(),
            feature: DEFAULT_FEATURE.to_string(),
            run_mode: RunMode::default(),
            assets_dir: None,
        }
    }
}

impl SeedConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let engine = self.engine.as_str();
        if engine.trim().is_empty() {
            return Err(ConfigError::BlankEngine);
        }
        if engine.contains(|c: char| c == '/' || c == '\\' || c.is_whitespace())
            || engine == "."
            || engine == ".."
        {
            return Err(ConfigError::InvalidEngine(self.engine.clone()));
        }
        if self.feature.trim().is_empty() {
            return Err(ConfigError::BlankFeature);
        }
        if self.feature.contains(char::is_whitespace) {
            return Err(ConfigError::InvalidFeature(self.feature.clone()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, RunMode, SeedConfig};

    #[test]
    fn defaults_target_auth_feature_per_phase() {
        let config = SeedConfig::default();
        assert_eq!(config.engine, "sqlite");
        assert_eq!(config.feature, "auth");
        assert_eq!(config.run_mode, RunMode::PerPhase);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn run_mode_parses_cli_spellings() {
        assert_eq!("atomic".parse::<RunMode>(), Ok(RunMode::Atomic));
        assert_eq!("Per-Phase".parse::<RunMode>(), Ok(RunMode::PerPhase));
        assert!(matches!(
            "all".parse::<RunMode>(),
            Err(ConfigError::UnknownRunMode(_))
        ));
    }

    #[test]
    fn engine_with_path_separator_is_rejected() {
        let config = SeedConfig {
            engine: "../sqlite".to_string(),
            ..SeedConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidEngine(_))
        ));
    }

    #[test]
    fn padded_engine_and_feature_are_rejected() {
        let engine = SeedConfig {
            engine: " sqlite".to_string(),
            ..SeedConfig::default()
        };
        assert_eq!(
            engine.validate(),
            Err(ConfigError::InvalidEngine(" sqlite".to_string()))
        );

        let feature = SeedConfig {
            feature: "auth ".to_string(),
            ..SeedConfig::default()
        };
        assert_eq!(
            feature.validate(),
            Err(ConfigError::InvalidFeature("auth ".to_string()))
        );
    }

    #[test]
    fn deserializes_partial_config() {
        let config: SeedConfig = serde_json::from_str(r#"{"run_mode": "atomic"}"#).unwrap();
        assert_eq!(config.run_mode, RunMode::Atomic);
        assert_eq!(config.feature, "auth");
    }
}
