use crate::errors::{AppError, AppResult};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use url::Url;

/// Deployment the API calls are sent to. Environments differ only by host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Environment {
    #[default]
    Prod,
    Prod2,
    Eu,
    Sandbox1,
    Sandbox2,
    SandboxEu,
}

impl Environment {
    pub fn host(&self) -> &'static str {
        match self {
            Self::Prod => "api.unit21.com",
            Self::Prod2 => "api.prod2.unit21.com",
            Self::Eu => "api.eu.unit21.com",
            Self::Sandbox1 => "sandbox1-api.unit21.com",
            Self::Sandbox2 => "sandbox2-api.unit21.com",
            Self::SandboxEu => "sandbox1-api.eu.unit21.com",
        }
    }

    pub fn base_url(&self) -> String {
        format!("https://{}/v1", self.host())
    }
}

impl FromStr for Environment {
    type Err = AppError;

    fn from_str(value: &str) -> AppResult<Self> {
        match value.trim().to_lowercase().as_str() {
            "prod" | "production" => Ok(Self::Prod),
            "prod2" => Ok(Self::Prod2),
            "eu" => Ok(Self::Eu),
            "sandbox1" | "sandbox" => Ok(Self::Sandbox1),
            "sandbox2" => Ok(Self::Sandbox2),
            "sandbox-eu" => Ok(Self::SandboxEu),
            other => Err(AppError::InvalidInput(format!(
                "Unknown environment '{other}'. Expected one of: prod, prod2, eu, sandbox1, sandbox2, sandbox-eu"
            ))),
        }
    }
}

/// Resolved configuration with all values filled in (no Options except overrides).
///
/// Deserializable from TOML; every field has a default so a config file only needs to
/// list what it changes.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResolvedConfig {
    /// Target environment
    pub environment: Environment,
    /// Explicit API base URL. Takes precedence over `environment` when set.
    pub base_url: Option<String>,

    // Retries
    /// Maximum number of retries for 429/500/503 responses
    pub max_retries: u32,
    /// Base delay in seconds for exponential backoff
    pub retry_base_delay_secs: u64,
    /// Upper bound in seconds for any single retry wait
    pub retry_max_delay_secs: u64,

    // Polling
    /// Seconds between two status polls
    pub poll_interval_secs: u64,
    /// Seconds after which polling gives up
    pub poll_timeout_secs: u64,

    // Transport
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
    /// Permit plain HTTP endpoints. Only meant for local testing.
    pub allow_insecure_http: bool,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            environment: Environment::Prod,
            base_url: None,
            max_retries: 5,
            retry_base_delay_secs: 2,
            retry_max_delay_secs: 45,
            poll_interval_secs: 15,
            poll_timeout_secs: 30 * 60,
            request_timeout_secs: 120,
            allow_insecure_http: false,
        }
    }
}

impl ResolvedConfig {
    /// Effective API base URL, without trailing slash.
    pub fn base_url(&self) -> AppResult<String> {
        let raw = match &self.base_url {
            Some(url) => url.clone(),
            None => self.environment.base_url(),
        };
        let parsed = Url::parse(&raw)?;
        if parsed.scheme() != "https" && !self.allow_insecure_http {
            return Err(AppError::InvalidInput(format!(
                "Base URL must use https, got: {raw}"
            )));
        }
        Ok(raw.trim_end_matches('/').to_string())
    }

    /// Rejects values that would make polling or retrying meaningless.
    pub fn validate(&self) -> AppResult<()> {
        if self.poll_interval_secs == 0 {
            return Err(AppError::InvalidInput(
                "Poll interval must be greater than 0".into(),
            ));
        }
        if self.poll_timeout_secs == 0 {
            return Err(AppError::InvalidInput(
                "Poll timeout must be greater than 0".into(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(AppError::InvalidInput(
                "Request timeout must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}

/// Retry settings for the request executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay_secs: u64,
    pub max_delay_secs: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&ResolvedConfig::default())
    }
}

impl From<&ResolvedConfig> for RetryPolicy {
    fn from(config: &ResolvedConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay_secs: config.retry_base_delay_secs,
            max_delay_secs: config.retry_max_delay_secs,
        }
    }
}

/// Polling cadence and wall-clock bound for the job driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub timeout: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::from(&ResolvedConfig::default())
    }
}

impl From<&ResolvedConfig> for PollPolicy {
    fn from(config: &ResolvedConfig) -> Self {
        Self {
            interval: Duration::from_secs(config.poll_interval_secs),
            timeout: Duration::from_secs(config.poll_timeout_secs),
        }
    }
}

/// Export job description loaded from a TOML file.
///
/// Deserializes required fields (type, start, end) and optional pipeline configuration.
/// Unknown keys are rejected to catch typos.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResolvedConfigFile {
    /// Record type: `"alert"`, `"case"` or `"sar"` (plural forms accepted)
    #[serde(rename = "type")]
    pub record_type: String,
    /// First day of the export, `YYYY-MM-DD`
    pub start: String,
    /// Last day of the export, `YYYY-MM-DD`
    pub end: String,
    /// Where to save the archive. Defaults to a name derived from type and dates.
    #[serde(default)]
    pub output: Option<PathBuf>,
    /// Summary alert export instead of detailed
    #[serde(default)]
    pub summary: bool,
    /// Flattened resolved configuration with defaults
    #[serde(flatten)]
    pub resolved: ResolvedConfig,
}

impl ResolvedConfigFile {
    /// Loads and validates configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the TOML is malformed, required fields are missing,
    /// unknown keys are present, or the polling settings are zero.
    pub fn from_toml_file(path: &Path) -> AppResult<Self> {
        let contents = fs::read_to_string(path)?;
        let config: ResolvedConfigFile = toml::from_str(&contents)
            .map_err(|e| AppError::InvalidInput(format!("Failed to parse config: {e}")))?;

        config.resolved.validate()?;

        Ok(config)
    }
}
