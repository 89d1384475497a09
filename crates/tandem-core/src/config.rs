//! Harness configuration.
//!
//! Per Iron Lotus Framework: Configuration is validated at load time (Poka-Yoke),
//! with sensible defaults and clear error messages.

use serde::{Deserialize, Serialize};

use crate::error::{HarnessError, Result};

/// Replica count used when a test asks for replication without a count.
pub const DEFAULT_REPLICAS: usize = 10;

/// Label used when none is configured.
pub const DEFAULT_LABEL: &str = "replica";

/// Environment variable overriding [`HarnessConfig::replicas`].
pub const ENV_REPLICAS: &str = "TANDEM_REPLICAS";

/// Environment variable overriding [`HarnessConfig::label`].
pub const ENV_LABEL: &str = "TANDEM_LABEL";

/// Configuration for one replicated run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarnessConfig {
    /// Prefix of replica thread names (`"<label>-thread-<index>"`).
    #[serde(default = "default_label")]
    pub label: String,

    /// Number of replicas (must be at least 1).
    #[serde(default = "default_replicas")]
    pub replicas: usize,
}

fn default_label() -> String {
    DEFAULT_LABEL.to_string()
}

const fn default_replicas() -> usize {
    DEFAULT_REPLICAS
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            label: default_label(),
            replicas: default_replicas(),
        }
    }
}

impl HarnessConfig {
    /// Creates a configuration with the given label and replica count.
    #[must_use]
    pub fn new(label: impl Into<String>, replicas: usize) -> Self {
        Self {
            label: label.into(),
            replicas,
        }
    }

    /// Validates the configuration.
    ///
    /// # Errors
    /// Returns [`HarnessError::InvalidArgument`] for a replica count of zero
    /// and [`HarnessError::Config`] for an empty label.
    pub fn validate(&self) -> Result<()> {
        if self.replicas < 1 {
            return Err(HarnessError::invalid_argument(format!(
                "replica count must be at least 1, got {}",
                self.replicas
            )));
        }
        if self.label.is_empty() {
            return Err(HarnessError::config("label cannot be empty"));
        }
        Ok(())
    }

    /// Parses and validates a TOML document.
    ///
    /// # Errors
    /// Returns an error if the document cannot be parsed or is invalid.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| HarnessError::config(format!("failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| HarnessError::config(format!("failed to read config: {e}")))?;
        Self::from_toml_str(&content)
    }

    /// Applies `TANDEM_REPLICAS` / `TANDEM_LABEL` from the process environment.
    ///
    /// # Errors
    /// Returns an error if an override is malformed.
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides(std::env::vars())
    }

    /// Applies overrides from `(key, value)` pairs; unknown keys are ignored.
    ///
    /// # Errors
    /// Returns an error if an override is malformed or the result is invalid.
    pub fn with_overrides<I, K, V>(mut self, vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (key, value) in vars {
            let value = value.as_ref();
            match key.as_ref() {
                ENV_REPLICAS => {
                    self.replicas = value.trim().parse().map_err(|e| {
                        HarnessError::config(format!("invalid {ENV_REPLICAS} {value:?}: {e}"))
                    })?;
                }
                ENV_LABEL => value.clone_into(&mut self.label),
                _ => {}
            }
        }
        self.validate()?;
        Ok(self)
    }
}
