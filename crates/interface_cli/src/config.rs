//! CLI configuration
//!
//! Values are read, in increasing priority, from built-in defaults, an
//! optional `clinic-billing.toml` in the working directory, and `CLINIC_*`
//! environment variables (a `.env` file is loaded first by the binary).
//!
//! * `CLINIC_API_BASE_URL` - Billing API base URL
//! * `CLINIC_AUTH_TOKEN` - Bearer token
//! * `CLINIC_TIMEOUT_SECS` - Request timeout, 1..=300 (default: 30)
//! * `CLINIC_LOG_LEVEL` - trace, debug, info, warn, error (default: warn)
//! * `CLINIC_LOG_FORMAT` - pretty or json (default: pretty)
//! * `CLINIC_CONSULTATION_SCOPE` - any_entry or assigned_doctor
//! * `CLINIC_OPERATOR` - User id of the person at the desk

use serde::Deserialize;
use validator::{Validate, ValidationError};

use domain_billing::{BillingStatusClassifier, ConsultationScope};
use infra_http::HttpClientConfig;

use crate::error::CliError;

/// Config file name, without extension
pub const CONFIG_FILE: &str = "clinic-billing";

/// Environment variable prefix
pub const ENV_PREFIX: &str = "CLINIC";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// CLI configuration
#[derive(Clone, Deserialize, Validate)]
pub struct CliConfig {
    /// Billing API base URL
    #[validate(url)]
    pub api_base_url: String,
    /// Bearer token for the billing API
    #[serde(default)]
    pub auth_token: Option<String>,
    /// Request timeout in seconds
    #[validate(range(min = 1, max = 300))]
    pub timeout_secs: u64,
    /// Log level
    #[validate(custom(function = "validate_log_level"))]
    pub log_level: String,
    pub log_format: LogFormat,
    pub consultation_scope: ConsultationScope,
    /// User id recorded for the desk session
    #[validate(length(min = 1))]
    pub operator: String,
}

impl std::fmt::Debug for CliConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CliConfig")
            .field("api_base_url", &self.api_base_url)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "<redacted>"))
            .field("timeout_secs", &self.timeout_secs)
            .field("log_level", &self.log_level)
            .field("log_format", &self.log_format)
            .field("consultation_scope", &self.consultation_scope)
            .field("operator", &self.operator)
            .finish()
    }
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:5000/api".to_string(),
            auth_token: None,
            timeout_secs: 30,
            log_level: "warn".to_string(),
            log_format: LogFormat::Pretty,
            consultation_scope: ConsultationScope::AnyEntry,
            operator: "front-desk".to_string(),
        }
    }
}

impl CliConfig {
    /// Loads configuration from the config file and process environment
    pub fn load() -> Result<Self, CliError> {
        Self::load_from(None)
    }

    /// Loads configuration, reading variables from `env` instead of the
    /// process environment when given
    pub fn load_from(env: Option<config::Map<String, String>>) -> Result<Self, CliError> {
        let defaults = Self::default();

        let settings = config::Config::builder()
            .set_default("api_base_url", defaults.api_base_url)?
            .set_default("timeout_secs", defaults.timeout_secs)?
            .set_default("log_level", defaults.log_level)?
            .set_default("log_format", "pretty")?
            .set_default("consultation_scope", "any_entry")?
            .set_default("operator", defaults.operator)?
            .add_source(config::File::with_name(CONFIG_FILE).required(false))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).source(env))
            .build()?;

        let config: CliConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// HTTP adapter configuration
    pub fn http_config(&self) -> HttpClientConfig {
        let config = HttpClientConfig::new(self.api_base_url.clone())
            .with_timeout_secs(self.timeout_secs);
        match &self.auth_token {
            Some(token) if !token.trim().is_empty() => config.with_token(token.trim()),
            _ => config,
        }
    }

    pub fn classifier(&self) -> BillingStatusClassifier {
        BillingStatusClassifier::new(self.consultation_scope)
    }
}

fn validate_log_level(level: &str) -> Result<(), ValidationError> {
    if LOG_LEVELS.contains(&level.to_ascii_lowercase().as_str()) {
        Ok(())
    } else {
        Err(ValidationError::new("log_level"))
    }
}
