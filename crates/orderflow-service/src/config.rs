//! Service configuration, loaded from JSON.
//!
//! ```json
//! {
//!   "workflow": { "min_profit": "-1000", "idempotency_ttl_secs": 60 },
//!   "log": { "filter": "info,orderflow_service=debug", "format": "json" }
//! }
//! ```
//!
//! Every field is optional and falls back to its default.

use std::path::Path;

use orderflow_types::{OrderflowError, Result, WorkflowConfig};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `EnvFilter` directives. `RUST_LOG` overrides this when set.
    pub filter: String,
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub workflow: WorkflowConfig,
    pub log: LogConfig,
}

impl ServiceConfig {
    /// Parse and validate.
    ///
    /// # Errors
    /// `Serialization` for malformed JSON, `Configuration` for values the
    /// workflow cannot run with.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| OrderflowError::Serialization(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse, and validate a JSON file.
    ///
    /// # Errors
    /// `Io` if the file cannot be read, otherwise as [`Self::from_json_str`].
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        tracing::debug!(path = %path.display(), "Loaded service configuration");
        Self::from_json_str(&json)
    }

    /// # Errors
    /// Returns [`OrderflowError::Configuration`] on the first invalid value.
    pub fn validate(&self) -> Result<()> {
        self.workflow.validate()?;
        if self.log.filter.trim().is_empty() {
            return Err(OrderflowError::Configuration(
                "log.filter must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
