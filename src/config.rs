use crate::error::{LoadError, LoadResult};
use crate::logging::log_debug;
use crate::retry::RetryPolicy;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Configuration of one test run, passed to every component explicitly
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadTestConfig {
    /// Target environment name (lower-cased)
    pub environment: String,
    /// Application owner org used for scoping
    pub app_owner: String,
    /// Application name used for scoping
    pub app_name: String,
    /// Log every recorded check
    pub show_results: bool,
    /// Directory receiving report documents
    pub reports_dir: PathBuf,
    pub retry_policy: RetryPolicy,
}

impl Default for LoadTestConfig {
    fn default() -> Self {
        Self {
            environment: "local".to_string(),
            app_owner: String::new(),
            app_name: String::new(),
            show_results: false,
            reports_dir: PathBuf::from("reports"),
            retry_policy: RetryPolicy::default(),
        }
    }
}

impl LoadTestConfig {
    /// `<org>/<app>` as the platform spells application ids
    pub fn app_id(&self) -> String {
        format!("{}/{}", self.app_owner, self.app_name)
    }

    /// Validate the configuration is complete
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::ConfigurationError`] if the environment or app
    /// scoping is missing, or the retry policy has no attempts.
    pub fn validate(&self) -> LoadResult<()> {
        if self.environment.trim().is_empty() {
            return Err(LoadError::configuration_error("Environment is required"));
        }
        if self.app_owner.trim().is_empty() || self.app_name.trim().is_empty() {
            return Err(LoadError::configuration_error(
                "App owner and app name are required",
            ));
        }
        if self.retry_policy.max_attempts == 0 {
            return Err(LoadError::configuration_error(
                "Retry policy needs at least one attempt",
            ));
        }
        Ok(())
    }

    /// Load configuration from environment variables
    /// This is the ONLY method that should access environment variables
    ///
    /// | Variable | Field |
    /// |----------|-------|
    /// | `LOADTEST_ENV` | `environment` |
    /// | `LOADTEST_ORG` | `app_owner` |
    /// | `LOADTEST_APP` | `app_name` |
    /// | `LOADTEST_SHOW_RESULTS` | `show_results` (`1` or `true`) |
    /// | `LOADTEST_REPORTS_DIR` | `reports_dir` |
    /// | `LOADTEST_MAX_ATTEMPTS` | `retry_policy.max_attempts` |
    /// | `LOADTEST_BACKOFF_SECS` | `retry_policy.backoff` |
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::ConfigurationError`] if a numeric variable does
    /// not parse or the resulting configuration fails [`validate`](Self::validate).
    pub fn from_env() -> LoadResult<Self> {
        let mut config = Self::default();

        if let Ok(environment) = std::env::var("LOADTEST_ENV") {
            config.environment = environment.to_lowercase();
        }
        if let Ok(org) = std::env::var("LOADTEST_ORG") {
            config.app_owner = org;
        }
        if let Ok(app) = std::env::var("LOADTEST_APP") {
            config.app_name = app;
        }
        if let Ok(show_results) = std::env::var("LOADTEST_SHOW_RESULTS") {
            config.show_results = matches!(show_results.trim(), "1" | "true" | "TRUE" | "True");
        }
        if let Ok(reports_dir) = std::env::var("LOADTEST_REPORTS_DIR") {
            config.reports_dir = PathBuf::from(reports_dir);
        }
        if let Ok(max_attempts) = std::env::var("LOADTEST_MAX_ATTEMPTS") {
            config.retry_policy.max_attempts =
                parse_number("LOADTEST_MAX_ATTEMPTS", &max_attempts)?;
        }
        if let Ok(backoff) = std::env::var("LOADTEST_BACKOFF_SECS") {
            config.retry_policy.backoff =
                Duration::from_secs(parse_number("LOADTEST_BACKOFF_SECS", &backoff)?);
        }

        config.validate()?;

        log_debug!(
            environment = %config.environment,
            app_id = %config.app_id(),
            show_results = config.show_results,
            reports_dir = %config.reports_dir.display(),
            max_attempts = config.retry_policy.max_attempts,
            backoff_seconds = config.retry_policy.backoff.as_secs(),
            "Load test configuration loaded and validated"
        );

        Ok(config)
    }
}

fn parse_number<N: std::str::FromStr>(variable: &str, raw: &str) -> LoadResult<N> {
    raw.trim().parse().map_err(|_| {
        LoadError::configuration_error(format!("{variable} must be a number, got '{raw}'"))
    })
}
