//! # Controller Configuration
//!
//! Controller-level settings loaded from environment variables.

use std::time::Duration;

/// Controller-level configuration
///
/// All settings have sensible defaults and can be overridden via environment variables.
/// Environment variables are populated from a ConfigMap using `envFrom` in the deployment.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// API group whose kinds are reconciled
    pub api_group: String,
    /// API version whose kinds are reconciled
    pub api_version: String,
    /// Interval between forced re-observations of a managed resource (seconds)
    pub poll_interval_secs: u64,
    /// Global cap on reconciles started per second, shared by every kind
    pub max_reconcile_rate: u32,
    /// Maximum concurrent reconciliations per kind
    pub max_concurrent_reconciliations: u16,
    /// Fibonacci backoff floor (seconds)
    pub backoff_min_secs: u64,
    /// Fibonacci backoff ceiling (seconds)
    pub backoff_max_secs: u64,
    /// Log format (json, text)
    pub log_format: String,
    /// Raise the default log filter to debug
    pub debug: bool,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        use crate::constants::*;
        Self {
            api_group: API_GROUP.to_string(),
            api_version: API_VERSION.to_string(),
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            max_reconcile_rate: DEFAULT_MAX_RECONCILE_RATE,
            max_concurrent_reconciliations: DEFAULT_MAX_CONCURRENT_RECONCILIATIONS,
            backoff_min_secs: DEFAULT_BACKOFF_MIN_SECS,
            backoff_max_secs: DEFAULT_BACKOFF_MAX_SECS,
            log_format: "text".to_string(),
            debug: false,
        }
    }
}

impl ControllerConfig {
    /// Load configuration from environment variables with defaults
    #[must_use]
    pub fn from_env() -> Self {
        use crate::constants::*;
        Self {
            api_group: env_var_or_default_str("API_GROUP", API_GROUP),
            api_version: env_var_or_default_str("API_VERSION", API_VERSION),
            poll_interval_secs: env_var_or_default(
                "POLL_INTERVAL_SECS",
                DEFAULT_POLL_INTERVAL_SECS,
            ),
            max_reconcile_rate: env_var_or_default(
                "MAX_RECONCILE_RATE",
                DEFAULT_MAX_RECONCILE_RATE,
            ),
            max_concurrent_reconciliations: env_var_or_default(
                "MAX_CONCURRENT_RECONCILIATIONS",
                DEFAULT_MAX_CONCURRENT_RECONCILIATIONS,
            ),
            backoff_min_secs: env_var_or_default("BACKOFF_MIN_SECS", DEFAULT_BACKOFF_MIN_SECS),
            backoff_max_secs: env_var_or_default("BACKOFF_MAX_SECS", DEFAULT_BACKOFF_MAX_SECS),
            log_format: env_var_or_default_str("LOG_FORMAT", "text"),
            debug: env_var_or_default_bool("DEBUG", false),
        }
    }

    /// Get poll interval duration
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Whether logs should be emitted as JSON
    #[must_use]
    pub fn json_logs(&self) -> bool {
        self.log_format.eq_ignore_ascii_case("json")
    }
}

/// Read environment variable or return default value
pub(crate) fn env_var_or_default<T: std::str::FromStr>(key: &str, default: T) -> T
where
    <T as std::str::FromStr>::Err: std::fmt::Debug,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Read environment variable as boolean or return default
pub(crate) fn env_var_or_default_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|v| {
            let v_lower = v.to_lowercase();
            v_lower == "true" || v_lower == "1" || v_lower == "yes" || v_lower == "on"
        })
        .unwrap_or(default)
}

/// Read environment variable as string or return default
pub(crate) fn env_var_or_default_str(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_targets_magento_group() {
        let config = ControllerConfig::default();
        assert_eq!(config.api_group, "magento.web7.md");
        assert_eq!(config.api_version, "v1alpha1");
        assert_eq!(config.poll_interval(), Duration::from_secs(60));
        assert!(!config.json_logs());
    }

    #[test]
    fn test_env_var_or_default_falls_back_on_unparsable_value() {
        std::env::set_var("PROVIDER_MAGENTO_TEST_PORT", "not-a-number");
        assert_eq!(env_var_or_default("PROVIDER_MAGENTO_TEST_PORT", 8080_u16), 8080);
        std::env::set_var("PROVIDER_MAGENTO_TEST_PORT", "9090");
        assert_eq!(env_var_or_default("PROVIDER_MAGENTO_TEST_PORT", 8080_u16), 9090);
        std::env::remove_var("PROVIDER_MAGENTO_TEST_PORT");
    }

    #[test]
    fn test_env_var_or_default_bool_accepts_common_spellings() {
        for value in ["true", "1", "YES", "on"] {
            std::env::set_var("PROVIDER_MAGENTO_TEST_FLAG", value);
            assert!(env_var_or_default_bool("PROVIDER_MAGENTO_TEST_FLAG", false));
        }
        std::env::set_var("PROVIDER_MAGENTO_TEST_FLAG", "off");
        assert!(!env_var_or_default_bool("PROVIDER_MAGENTO_TEST_FLAG", true));
        std::env::remove_var("PROVIDER_MAGENTO_TEST_FLAG");
    }
}
