//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/billform/billform.toml`
//! 3. Local config: file given with `--config`
//! 4. Environment variables: `BILLFORM__*` prefix

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::application::ApplicationError;

pub const ENV_PREFIX: &str = "BILLFORM";

/// Remote validation timing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ValidationConfig {
    /// Quiet period after the last edit before the remote call, in milliseconds
    pub quiet_period_ms: u64,
    /// Upper bound for a single remote call; unset means no limit
    pub remote_timeout_ms: Option<u64>,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            quiet_period_ms: 600,
            remote_timeout_ms: None,
        }
    }
}

/// Raw validation config for intermediate parsing (`None` means "not specified").
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawValidationConfig {
    pub quiet_period_ms: Option<u64>,
    pub remote_timeout_ms: Option<u64>,
}

/// Raw settings for intermediate parsing.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub validation: RawValidationConfig,
}

impl ValidationConfig {
    /// Scalars: overlay wins if specified, otherwise keep base.
    pub fn merge(&self, overlay: &RawValidationConfig) -> Self {
        Self {
            quiet_period_ms: overlay.quiet_period_ms.unwrap_or(self.quiet_period_ms),
            remote_timeout_ms: overlay.remote_timeout_ms.or(self.remote_timeout_ms),
        }
    }
}

/// Unified configuration for billform.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    pub validation: ValidationConfig,
}

/// Get the XDG config directory for billform.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "billform").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("billform.toml"))
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    pub fn quiet_period(&self) -> Duration {
        Duration::from_millis(self.validation.quiet_period_ms)
    }

    pub fn remote_timeout(&self) -> Option<Duration> {
        self.validation.remote_timeout_ms.map(Duration::from_millis)
    }

    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            validation: self.validation.merge(&overlay.validation),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `local` - Optional config file given on the command line; it must exist
    pub fn load(local: Option<&Path>) -> Result<Self, ApplicationError> {
        let global = global_config_path().filter(|p| p.exists());
        Self::load_from(global.as_deref(), local, env_source())
    }

    /// Layered load with explicit sources.
    ///
    /// A missing global file is skipped, a missing local file is an error.
    pub fn load_from(
        global: Option<&Path>,
        local: Option<&Path>,
        env: Environment,
    ) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(global_path) = global.filter(|p| p.exists()) {
            debug!(path = %global_path.display(), "loading global config");
            current = current.merge_with(&load_raw_settings(global_path)?);
        }

        if let Some(local_path) = local {
            debug!(path = %local_path.display(), "loading local config");
            current = current.merge_with(&load_raw_settings(local_path)?);
        }

        current = Self::apply_env_overrides(current, env)?;
        current.validate()?;
        Ok(current)
    }

    /// Apply `BILLFORM__*` environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self, env: Environment) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(env)
            .build()
            .map_err(config_err)?;

        match config.get::<u64>("validation.quiet_period_ms") {
            Ok(val) => settings.validation.quiet_period_ms = val,
            Err(ConfigError::NotFound(_)) => {}
            Err(e) => return Err(config_err(e)),
        }
        match config.get::<u64>("validation.remote_timeout_ms") {
            Ok(val) => settings.validation.remote_timeout_ms = Some(val),
            Err(ConfigError::NotFound(_)) => {}
            Err(e) => return Err(config_err(e)),
        }

        Ok(settings)
    }

    fn validate(&self) -> Result<(), ApplicationError> {
        if self.validation.remote_timeout_ms == Some(0) {
            return Err(ApplicationError::Config {
                message: "validation.remote_timeout_ms must be greater than 0".into(),
            });
        }
        Ok(())
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# billform configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/billform/billform.toml
#   Local:  file passed with --config
#   Env:    BILLFORM__* environment variables, e.g. BILLFORM__VALIDATION__QUIET_PERIOD_MS=300

[validation]
# Quiet period after the last edit before the form is sent for remote validation
# quiet_period_ms = 600

# Give up on a remote validation call after this many milliseconds (unset: wait forever)
# remote_timeout_ms = 5000
"#
        .to_string()
    }
}

/// Environment source reading the process environment.
pub fn env_source() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .separator("__")
        .try_parsing(true)
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
