//! Configuration management for Importgate.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{ImportGateError, Result};

/// Limit settings for a single rate limit dimension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DimensionLimit {
    /// Maximum imports admitted per window
    pub max_count: u32,
    /// Length of the sliding window
    pub window: Duration,
    /// Store key prefix for this dimension, e.g. `ratelimit:import:user`
    pub key_prefix: String,
}

impl DimensionLimit {
    /// Window length in milliseconds, the unit window scores are kept in.
    pub fn window_ms(&self) -> i64 {
        self.window.as_millis() as i64
    }
}

/// Validated limits for all three dimensions.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Per-user limit
    pub user: DimensionLimit,
    /// Per-client-address limit
    pub ip: DimensionLimit,
    /// Per-wallet limit
    pub wallet: DimensionLimit,
}

impl RateLimitConfig {
    /// Create a validated configuration.
    ///
    /// Every dimension must admit at least one import over a non-zero
    /// window; anything else would deny all traffic or divide by zero
    /// downstream.
    pub fn new(user: DimensionLimit, ip: DimensionLimit, wallet: DimensionLimit) -> Result<Self> {
        for limit in [&user, &ip, &wallet] {
            if limit.max_count == 0 {
                return Err(ImportGateError::Config(format!(
                    "max count for '{}' must be greater than zero",
                    limit.key_prefix
                )));
            }
            if limit.window.is_zero() {
                return Err(ImportGateError::Config(format!(
                    "window for '{}' must be greater than zero",
                    limit.key_prefix
                )));
            }
        }

        Ok(Self { user, ip, wallet })
    }
}

/// Main configuration for the Importgate service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportGateConfig {
    /// Window store configuration
    #[serde(default)]
    pub store: StoreConfig,

    /// Import limit settings
    #[serde(default)]
    pub limits: ImportLimitSettings,
}

impl Default for ImportGateConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            limits: ImportLimitSettings::default(),
        }
    }
}

/// Window store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Store connection URL
    #[serde(default = "default_store_url")]
    pub url: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: default_store_url(),
        }
    }
}

fn default_store_url() -> String {
    "redis://127.0.0.1:6379".to_string()
}

/// Import limit settings as they appear in the configuration file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportLimitSettings {
    /// Maximum imports per user per window
    #[serde(default = "default_max_imports_per_user")]
    pub max_imports_per_user: u32,

    /// Per-user window length in seconds
    #[serde(default = "default_user_window_secs")]
    pub user_window_secs: u64,

    /// Store key prefix for per-user windows
    #[serde(default = "default_user_key_prefix")]
    pub user_key_prefix: String,

    /// Maximum imports per client address per window
    #[serde(default = "default_max_imports_per_ip")]
    pub max_imports_per_ip: u32,

    /// Per-client-address window length in seconds
    #[serde(default = "default_ip_window_secs")]
    pub ip_window_secs: u64,

    /// Store key prefix for per-client-address windows
    #[serde(default = "default_ip_key_prefix")]
    pub ip_key_prefix: String,

    /// Maximum imports per wallet per window
    #[serde(default = "default_max_imports_per_wallet")]
    pub max_imports_per_wallet: u32,

    /// Per-wallet window length in seconds
    #[serde(default = "default_wallet_window_secs")]
    pub wallet_window_secs: u64,

    /// Store key prefix for per-wallet windows
    #[serde(default = "default_wallet_key_prefix")]
    pub wallet_key_prefix: String,
}

impl Default for ImportLimitSettings {
    fn default() -> Self {
        Self {
            max_imports_per_user: default_max_imports_per_user(),
            user_window_secs: default_user_window_secs(),
            user_key_prefix: default_user_key_prefix(),
            max_imports_per_ip: default_max_imports_per_ip(),
            ip_window_secs: default_ip_window_secs(),
            ip_key_prefix: default_ip_key_prefix(),
            max_imports_per_wallet: default_max_imports_per_wallet(),
            wallet_window_secs: default_wallet_window_secs(),
            wallet_key_prefix: default_wallet_key_prefix(),
        }
    }
}

fn default_max_imports_per_user() -> u32 {
    10
}

fn default_user_window_secs() -> u64 {
    3600
}

fn default_user_key_prefix() -> String {
    "ratelimit:import:user".to_string()
}

fn default_max_imports_per_ip() -> u32 {
    20
}

fn default_ip_window_secs() -> u64 {
    3600
}

fn default_ip_key_prefix() -> String {
    "ratelimit:import:ip".to_string()
}

fn default_max_imports_per_wallet() -> u32 {
    5
}

fn default_wallet_window_secs() -> u64 {
    3600
}

fn default_wallet_key_prefix() -> String {
    "ratelimit:import:wallet".to_string()
}

impl ImportLimitSettings {
    /// Build the validated runtime limits from these settings.
    pub fn to_rate_limit_config(&self) -> Result<RateLimitConfig> {
        RateLimitConfig::new(
            DimensionLimit {
                max_count: self.max_imports_per_user,
                window: Duration::from_secs(self.user_window_secs),
                key_prefix: self.user_key_prefix.clone(),
            },
            DimensionLimit {
                max_count: self.max_imports_per_ip,
                window: Duration::from_secs(self.ip_window_secs),
                key_prefix: self.ip_key_prefix.clone(),
            },
            DimensionLimit {
                max_count: self.max_imports_per_wallet,
                window: Duration::from_secs(self.wallet_window_secs),
                key_prefix: self.wallet_key_prefix.clone(),
            },
        )
    }
}

impl ImportGateConfig {
    /// Load configuration from a file path.
    pub fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: ImportGateConfig = serde_yaml::from_str(&contents)
            .map_err(|e| ImportGateError::Config(e.to_string()))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: ImportGateConfig = serde_yaml::from_str("{}").unwrap();

        assert_eq!(config.store.url, "redis://127.0.0.1:6379");
        assert_eq!(config.limits.max_imports_per_user, 10);
        assert_eq!(config.limits.max_imports_per_ip, 20);
        assert_eq!(config.limits.max_imports_per_wallet, 5);
        assert_eq!(config.limits.wallet_window_secs, 3600);
        assert_eq!(config.limits.user_key_prefix, "ratelimit:import:user");
    }

    #[test]
    fn test_partial_config_keeps_other_defaults() {
        let yaml = r#"
store:
  url: redis://cache.internal:6380
limits:
  max_imports_per_wallet: 2
  wallet_window_secs: 600
"#;
        let config: ImportGateConfig = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.store.url, "redis://cache.internal:6380");
        assert_eq!(config.limits.max_imports_per_wallet, 2);
        assert_eq!(config.limits.wallet_window_secs, 600);
        assert_eq!(config.limits.max_imports_per_ip, 20);
        assert_eq!(config.limits.ip_window_secs, 3600);
    }

    #[test]
    fn test_default_settings_validate() {
        assert!(ImportLimitSettings::default().to_rate_limit_config().is_ok());
    }

    #[test]
    fn test_zero_max_count_rejected() {
        let settings = ImportLimitSettings {
            max_imports_per_user: 0,
            ..ImportLimitSettings::default()
        };

        let err = settings.to_rate_limit_config().unwrap_err();
        assert!(err.to_string().contains("max count"));
    }

    #[test]
    fn test_zero_window_rejected() {
        let settings = ImportLimitSettings {
            ip_window_secs: 0,
            ..ImportLimitSettings::default()
        };

        let err = settings.to_rate_limit_config().unwrap_err();
        assert!(err.to_string().contains("window"));
    }

    #[test]
    fn test_window_ms_conversion() {
        let limit = DimensionLimit {
            max_count: 1,
            window: Duration::from_secs(60),
            key_prefix: "ratelimit:import:user".to_string(),
        };

        assert_eq!(limit.window_ms(), 60_000);
    }
}
