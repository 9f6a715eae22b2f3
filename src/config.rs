//! Engine configuration
//!
//! Read once at startup, either from a JSON file or from defaults.

use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::observability::{Event, Logger, Severity};

const IDENTIFIER_PATTERN: &str = r"^[A-Za-z_][A-Za-z0-9_]{0,62}$";

/// Configuration failures
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Alias of the subquery a union result is wrapped in (default: "sq")
    #[serde(default = "default_union_subquery_alias")]
    pub union_subquery_alias: String,

    /// Minimum log severity: trace, info, warn or error (default: "info")
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Install the `length`/`octet_length` translators (default: true)
    #[serde(default = "default_register_default_translators")]
    pub register_default_translators: bool,
}

fn default_union_subquery_alias() -> String {
    "sq".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_register_default_translators() -> bool {
    true
}

/// Checks that a union subquery alias is a plain SQL identifier
pub fn validate_union_alias(alias: &str) -> Result<(), ConfigError> {
    let identifier = Regex::new(IDENTIFIER_PATTERN).map_err(|e| ConfigError::Invalid {
        field: "union_subquery_alias",
        reason: e.to_string(),
    })?;
    if !identifier.is_match(alias) {
        return Err(ConfigError::Invalid {
            field: "union_subquery_alias",
            reason: format!("'{}' is not a plain identifier", alias),
        });
    }
    Ok(())
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            union_subquery_alias: default_union_subquery_alias(),
            log_level: default_log_level(),
            register_default_translators: default_register_default_translators(),
        }
    }
}

impl EngineConfig {
    /// Reads and validates a JSON config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: EngineConfig =
            serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_union_alias(&self.union_subquery_alias)?;
        self.severity()?;
        Ok(())
    }

    /// Parsed `log_level`
    pub fn severity(&self) -> Result<Severity, ConfigError> {
        self.log_level
            .parse()
            .map_err(|e: crate::observability::UnknownSeverity| ConfigError::Invalid {
                field: "log_level",
                reason: e.to_string(),
            })
    }

    /// Validates, then sets the process-wide log level
    pub fn apply(&self) -> Result<(), ConfigError> {
        self.validate()?;
        Logger::set_min_severity(self.severity()?);

        let defaults = self.register_default_translators.to_string();
        Logger::info(
            Event::ConfigLoaded.as_str(),
            &[
                ("log_level", &self.log_level),
                ("register_default_translators", &defaults),
                ("union_subquery_alias", &self.union_subquery_alias),
            ],
        );
        Ok(())
    }
}
