//! Runtime configuration.
//!
//! Values come from built-in defaults, then an optional TOML file, then
//! `INTRABAR_*` environment variables, later sources winning.
//!
//! ```toml
//! [api]
//! server = "https://api.schwabapi.com/marketdata/v1"
//! timeout_ms = 30000
//! rate_limit_delay_ms = 1000
//!
//! [market]
//! timezone = "America/New_York"
//! market_open = "09:30:00"
//! market_close = "16:00:00"
//! early_close = "13:00:00"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calendar::MarketCalendar;
use crate::domain::ExchangeZone;
use crate::ConfigError;

pub const ENV_API_SERVER: &str = "INTRABAR_API_SERVER";
pub const ENV_TIMEOUT_MS: &str = "INTRABAR_TIMEOUT_MS";
pub const ENV_RATE_LIMIT_DELAY_MS: &str = "INTRABAR_RATE_LIMIT_DELAY_MS";
pub const ENV_TIMEZONE: &str = "INTRABAR_TIMEZONE";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL; `/pricehistory` is appended.
    pub server: String,
    /// Per-request timeout.
    pub timeout_ms: u64,
    /// Minimum spacing between consecutive requests.
    pub rate_limit_delay_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            server: String::from("https://api.schwabapi.com/marketdata/v1"),
            timeout_ms: 30_000,
            rate_limit_delay_ms: 1_000,
        }
    }
}

impl ApiConfig {
    pub fn price_history_url(&self) -> String {
        format!("{}/pricehistory", self.server.trim_end_matches('/'))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketConfig {
    pub timezone: String,
    pub market_open: String,
    pub market_close: String,
    pub early_close: String,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            timezone: String::from(ExchangeZone::NEW_YORK.name()),
            market_open: String::from("09:30:00"),
            market_close: String::from("16:00:00"),
            early_close: String::from("13:00:00"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub market: MarketConfig,
}

impl AppConfig {
    /// Loads defaults, the optional file at `path`, then the process
    /// environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => {
                debug!(path = %path.display(), "loading config file");
                Self::from_toml(&std::fs::read_to_string(path)?)?
            }
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.calendar()?;
        Ok(config)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Overrides fields from `lookup`, which maps variable names to values.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(server) = lookup(ENV_API_SERVER) {
            self.api.server = server;
        }
        if let Some(value) = lookup(ENV_TIMEOUT_MS) {
            self.api.timeout_ms = parse_millis(ENV_TIMEOUT_MS, value)?;
        }
        if let Some(value) = lookup(ENV_RATE_LIMIT_DELAY_MS) {
            self.api.rate_limit_delay_ms = parse_millis(ENV_RATE_LIMIT_DELAY_MS, value)?;
        }
        if let Some(timezone) = lookup(ENV_TIMEZONE) {
            self.market.timezone = timezone;
        }
        Ok(())
    }

    pub fn calendar(&self) -> Result<MarketCalendar, ConfigError> {
        Ok(MarketCalendar::from_config(&self.market)?)
    }
}

fn parse_millis(key: &'static str, value: String) -> Result<u64, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidEnv { key, value })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn partial_file_keeps_remaining_defaults() {
        let config = AppConfig::from_toml(
            r#"
            [api]
            timeout_ms = 5000

            [market]
            early_close = "13:30:00"
            "#,
        )
        .expect("valid toml");

        assert_eq!(config.api.timeout_ms, 5_000);
        assert_eq!(config.api.rate_limit_delay_ms, 1_000);
        assert_eq!(config.market.early_close, "13:30:00");
        assert_eq!(config.market.timezone, "America/New_York");
    }

    #[test]
    fn environment_overrides_file_values() {
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_API_SERVER, "http://localhost:9000/v1/"),
            (ENV_RATE_LIMIT_DELAY_MS, "0"),
        ]);
        let mut config = AppConfig::default();
        config
            .apply_env(|key| env.get(key).map(|value| value.to_string()))
            .expect("valid overrides");

        assert_eq!(config.api.rate_limit_delay_ms, 0);
        assert_eq!(
            config.api.price_history_url(),
            "http://localhost:9000/v1/pricehistory"
        );
    }

    #[test]
    fn rejects_non_numeric_timeout() {
        let mut config = AppConfig::default();
        let err = config
            .apply_env(|key| (key == ENV_TIMEOUT_MS).then(|| String::from("soon")))
            .expect_err("must fail");
        assert!(matches!(
            err,
            ConfigError::InvalidEnv {
                key: ENV_TIMEOUT_MS,
                ..
            }
        ));
    }

    #[test]
    fn load_reads_file_and_validates_calendar() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("intrabar.toml");
        std::fs::write(&path, "[market]\ntimezone = \"Nowhere/Special\"\n").expect("write");

        let err = AppConfig::load(Some(&path)).expect_err("bad timezone");
        assert!(matches!(err, ConfigError::Validation(_)));
    }
}
