//! Configuration settings for the Concierge agent.

use std::path::{Path, PathBuf};

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::availability::SchedulingParams;
use crate::error::{ConfigError, Result};

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub nlu: NluConfig,
    pub calendar: CalendarConfig,
    pub scheduling: SchedulingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::ReadFile)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from default locations or use defaults.
    pub fn load() -> Result<Self> {
        let config_paths = [
            PathBuf::from("config.toml"),
            PathBuf::from("concierge.toml"),
            dirs::config_dir()
                .map(|p| p.join("concierge/config.toml"))
                .unwrap_or_default(),
            dirs::home_dir()
                .map(|p| p.join(".concierge/config.toml"))
                .unwrap_or_default(),
        ];

        for path in &config_paths {
            if path.exists() {
                tracing::info!("Loading config from: {}", path.display());
                return Self::from_file(path);
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Config::default())
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<()> {
        if self.nlu.backend == NluBackend::Llm {
            if self.nlu.base_url.is_empty() {
                return Err(ConfigError::MissingField("nlu.base_url".to_string()).into());
            }
            if self.nlu.model.is_empty() {
                return Err(ConfigError::MissingField("nlu.model".to_string()).into());
            }
        }

        if self.calendar.backend == CalendarBackend::Rest && self.calendar.base_url.is_empty() {
            return Err(ConfigError::MissingField("calendar.base_url".to_string()).into());
        }

        if self.scheduling.business_hours_start >= self.scheduling.business_hours_end {
            return Err(ConfigError::Invalid(
                "scheduling.business_hours_start must precede business_hours_end".to_string(),
            )
            .into());
        }
        if self.scheduling.step_minutes == 0 {
            return Err(
                ConfigError::Invalid("scheduling.step_minutes must be > 0".to_string()).into(),
            );
        }
        if self.scheduling.suggestion_count == 0 {
            return Err(ConfigError::Invalid(
                "scheduling.suggestion_count must be > 0".to_string(),
            )
            .into());
        }
        if self.scheduling.horizon_days <= 0 {
            return Err(
                ConfigError::Invalid("scheduling.horizon_days must be > 0".to_string()).into(),
            );
        }

        Ok(())
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address.
    pub bind: String,
    /// HTTP port.
    pub http_port: u16,
    /// Enable permissive CORS.
    pub enable_cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            http_port: 8000,
            enable_cors: true,
        }
    }
}

/// NLU backend selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NluBackend {
    /// Offline keyword/regex provider.
    Pattern,
    /// Chat-completions endpoint.
    Llm,
}

/// NLU provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NluConfig {
    /// Which provider to use.
    pub backend: NluBackend,
    /// Base URL of the completions endpoint (llm backend).
    pub base_url: String,
    /// Model identifier (llm backend).
    pub model: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Per-call timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for NluConfig {
    fn default() -> Self {
        Self {
            backend: NluBackend::Pattern,
            base_url: String::new(),
            model: String::new(),
            api_key_env: "CONCIERGE_NLU_API_KEY".to_string(),
            timeout_secs: 30,
        }
    }
}

impl NluConfig {
    /// Read the API key from the configured environment variable.
    pub fn resolve_api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env).ok().filter(|k| !k.is_empty())
    }
}

/// Calendar backend selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalendarBackend {
    /// Embedded in-memory calendar.
    Memory,
    /// Remote REST calendar service.
    Rest,
}

/// Calendar provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarConfig {
    /// Which provider to use.
    pub backend: CalendarBackend,
    /// Base URL of the calendar service (rest backend).
    pub base_url: String,
    /// Per-call timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            backend: CalendarBackend::Memory,
            base_url: String::new(),
            timeout_secs: 30,
        }
    }
}

/// Slot search configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulingConfig {
    /// Business hours start.
    pub business_hours_start: NaiveTime,
    /// Business hours end.
    pub business_hours_end: NaiveTime,
    /// Search cursor step in minutes.
    pub step_minutes: u32,
    /// Exclude weekends from the search.
    pub exclude_weekends: bool,
    /// How many alternative slots to suggest.
    pub suggestion_count: usize,
    /// Search horizon in days.
    pub horizon_days: i64,
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            business_hours_start: NaiveTime::from_hms_opt(9, 0, 0).expect("valid time"),
            business_hours_end: NaiveTime::from_hms_opt(17, 0, 0).expect("valid time"),
            step_minutes: 30,
            exclude_weekends: true,
            suggestion_count: 3,
            horizon_days: 7,
        }
    }
}

impl SchedulingConfig {
    /// The resolver-facing slice of this configuration.
    pub fn params(&self) -> SchedulingParams {
        SchedulingParams {
            business_hours_start: self.business_hours_start,
            business_hours_end: self.business_hours_end,
            step_minutes: self.step_minutes,
            exclude_weekends: self.exclude_weekends,
        }
    }
}
