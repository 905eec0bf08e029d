//! Runtime configuration loaded from TOML
//!
//! ```toml
//! [registry]
//! initial_capacity = 64
//! root_name = "object"
//!
//! [logging]
//! level = "debug"
//! json = false
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{Result, RuntimeError};
use crate::logging::{parse_level, LogConfig};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    #[serde(default)]
    pub registry: RegistryConfig,

    #[serde(default)]
    pub logging: LoggingSection,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Bucket count the registry container starts with
    #[serde(default = "default_registry_capacity")]
    pub initial_capacity: usize,

    /// Name of the root composite type every hierarchy ends at
    #[serde(default = "default_root_name")]
    pub root_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingSection {
    #[serde(default = "default_level")]
    pub level: String,

    #[serde(default)]
    pub json: bool,

    #[serde(default)]
    pub spans: bool,

    #[serde(default)]
    pub file: Option<String>,
}

fn default_registry_capacity() -> usize {
    64
}

fn default_root_name() -> String {
    "object".to_string()
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            initial_capacity: default_registry_capacity(),
            root_name: default_root_name(),
        }
    }
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_level(),
            json: false,
            spans: false,
            file: None,
        }
    }
}

impl RuntimeConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| RuntimeError::invalid_argument(format!("config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            RuntimeError::invalid_argument(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| RuntimeError::invalid_argument(format!("config: {}", e)))
    }

    fn validate(&self) -> Result<()> {
        if self.registry.root_name.is_empty() {
            return Err(RuntimeError::invalid_argument("registry.root_name is empty"));
        }
        if parse_level(&self.logging.level).is_none() {
            return Err(RuntimeError::invalid_argument(format!(
                "unknown log level '{}'",
                self.logging.level
            )));
        }
        Ok(())
    }

    pub fn to_log_config(&self) -> LogConfig {
        LogConfig {
            level: parse_level(&self.logging.level).unwrap_or(tracing::Level::INFO),
            log_path: self.logging.file.clone(),
            json_format: self.logging.json,
            show_spans: self.logging.spans,
        }
    }
}
