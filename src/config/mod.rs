use std::time::Duration;

use serde::Deserialize;

use crate::services::poller::PollPolicy;

/// Client configuration, read from `HEADSHOT_*` environment variables
/// (and a `.env` file when present).
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Base URL of the HeadShot service (e.g., "http://127.0.0.1:4173")
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Delay between job status queries, in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Consecutive failed status queries before polling gives up
    #[serde(default = "default_poll_max_consecutive_failures")]
    pub poll_max_consecutive_failures: u32,

    /// Backoff growth after each failed status query
    #[serde(default = "default_poll_backoff_multiplier")]
    pub poll_backoff_multiplier: f64,

    /// Longest wait between status queries while backing off, in milliseconds
    #[serde(default = "default_poll_max_delay_ms")]
    pub poll_max_delay_ms: u64,

    /// Randomize backoff delays
    #[serde(default)]
    pub poll_jitter: bool,

    /// Per-request timeout, in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Bearer token to start the session with
    #[serde(default)]
    pub token: Option<String>,

    /// Gate submissions, support tickets and dashboard refreshes on a login
    #[serde(default = "default_require_login")]
    pub require_login: bool,
}

fn default_api_base_url() -> String {
    "http://127.0.0.1:4173".to_string()
}

fn default_poll_interval_ms() -> u64 {
    1800
}

fn default_poll_max_consecutive_failures() -> u32 {
    3
}

fn default_poll_backoff_multiplier() -> f64 {
    2.0
}

fn default_poll_max_delay_ms() -> u64 {
    15_000
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_require_login() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            poll_interval_ms: default_poll_interval_ms(),
            poll_max_consecutive_failures: default_poll_max_consecutive_failures(),
            poll_backoff_multiplier: default_poll_backoff_multiplier(),
            poll_max_delay_ms: default_poll_max_delay_ms(),
            poll_jitter: false,
            request_timeout_secs: default_request_timeout_secs(),
            token: None,
            require_login: default_require_login(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::prefixed("HEADSHOT_").from_env()
    }

    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy {
            interval: Duration::from_millis(self.poll_interval_ms),
            max_consecutive_failures: self.poll_max_consecutive_failures.max(1),
            backoff_multiplier: self.poll_backoff_multiplier,
            max_delay: Duration::from_millis(self.poll_max_delay_ms),
            jitter: self.poll_jitter,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_environment() {
        let config: AppConfig = envy::prefixed("HEADSHOT_")
            .from_iter(Vec::<(String, String)>::new())
            .unwrap();
        assert_eq!(config.api_base_url, "http://127.0.0.1:4173");
        assert_eq!(config.poll_interval_ms, 1800);
        assert!(config.require_login);
        assert!(config.token.is_none());
    }

    #[test]
    fn test_overrides() {
        let config: AppConfig = envy::prefixed("HEADSHOT_")
            .from_iter(vec![
                ("HEADSHOT_API_BASE_URL".to_string(), "http://svc:8080".to_string()),
                ("HEADSHOT_POLL_INTERVAL_MS".to_string(), "500".to_string()),
                ("HEADSHOT_REQUIRE_LOGIN".to_string(), "false".to_string()),
                ("HEADSHOT_TOKEN".to_string(), "tok".to_string()),
            ])
            .unwrap();
        assert_eq!(config.api_base_url, "http://svc:8080");
        assert_eq!(config.poll_policy().interval, Duration::from_millis(500));
        assert!(!config.require_login);
        assert_eq!(config.token.as_deref(), Some("tok"));
    }

    #[test]
    fn test_poll_policy_tolerates_at_least_one_failure() {
        let config = AppConfig {
            poll_max_consecutive_failures: 0,
            ..AppConfig::default()
        };
        assert_eq!(config.poll_policy().max_consecutive_failures, 1);
    }
}
