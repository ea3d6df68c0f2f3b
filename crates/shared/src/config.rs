//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Reporting cache configuration.
    #[serde(default)]
    pub reporting: ReportingConfig,
    /// Period closing configuration.
    #[serde(default)]
    pub closing: ClosingConfig,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// Reporting cache configuration.
///
/// Controls how stale the balance snapshot may get and how long a caller
/// will wait for an in-flight refresh before giving up.
#[derive(Debug, Clone, Deserialize)]
pub struct ReportingConfig {
    /// Snapshot age beyond which reports are considered stale, in seconds.
    #[serde(default = "default_staleness_threshold")]
    pub staleness_threshold_secs: u64,
    /// Maximum time a caller blocks on an in-flight refresh, in seconds.
    #[serde(default = "default_refresh_wait_timeout")]
    pub refresh_wait_timeout_secs: u64,
}

fn default_staleness_threshold() -> u64 {
    3600 // 1 hour
}

fn default_refresh_wait_timeout() -> u64 {
    30
}

impl Default for ReportingConfig {
    fn default() -> Self {
        Self {
            staleness_threshold_secs: default_staleness_threshold(),
            refresh_wait_timeout_secs: default_refresh_wait_timeout(),
        }
    }
}

/// Period closing configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ClosingConfig {
    /// Account code of the retained earnings account.
    #[serde(default = "default_retained_earnings_code")]
    pub retained_earnings_code: String,
    /// Month the fiscal year starts in (1-12).
    #[serde(default = "default_fiscal_year_start_month")]
    pub fiscal_year_start_month: u32,
}

fn default_retained_earnings_code() -> String {
    "3201".to_string()
}

fn default_fiscal_year_start_month() -> u32 {
    1
}

impl Default for ClosingConfig {
    fn default() -> Self {
        Self {
            retained_earnings_code: default_retained_earnings_code(),
            fiscal_year_start_month: default_fiscal_year_start_month(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("TALLY").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_from_env() {
        temp_env::with_vars(
            [
                ("TALLY__DATABASE__URL", Some("postgres://localhost/tally")),
                ("TALLY__REPORTING__STALENESS_THRESHOLD_SECS", Some("600")),
                ("TALLY__CLOSING__RETAINED_EARNINGS_CODE", Some("3900")),
            ],
            || {
                let config = AppConfig::load().expect("config should load");
                assert_eq!(config.database.url, "postgres://localhost/tally");
                assert_eq!(config.database.max_connections, 10);
                assert_eq!(config.reporting.staleness_threshold_secs, 600);
                assert_eq!(config.reporting.refresh_wait_timeout_secs, 30);
                assert_eq!(config.closing.retained_earnings_code, "3900");
                assert_eq!(config.closing.fiscal_year_start_month, 1);
            },
        );
    }

    #[test]
    fn test_defaults() {
        let reporting = ReportingConfig::default();
        assert_eq!(reporting.staleness_threshold_secs, 3600);
        assert_eq!(reporting.refresh_wait_timeout_secs, 30);

        let closing = ClosingConfig::default();
        assert_eq!(closing.retained_earnings_code, "3201");
        assert_eq!(closing.fiscal_year_start_month, 1);
    }
}
