/*
 * Copyright 2025 Security Union LLC
 *
 * Licensed under either of
 *
 * * Apache License, Version 2.0
 *   (http://www.apache.org/licenses/LICENSE-2.0)
 * * MIT license
 *   (http://opensource.org/licenses/MIT)
 *
 * at your option.
 */

//! Client configuration, passed explicitly to [`BrokerClient::new`](crate::BrokerClient::new).

use std::env;
use std::time::Duration;

use bbb_broker_types::actions::DEFAULT_ATTEMPTS;
use bbb_broker_types::requests::AJAX_PATH;

use crate::error::ApiError;

/// Interval between meeting status polls when none is configured.
pub const DEFAULT_PING_INTERVAL: Duration = Duration::from_secs(10);

/// Unit of the linear verification backoff: the k-th retry waits `(k - 1)` units.
pub const DEFAULT_BACKOFF_UNIT: Duration = Duration::from_secs(1);

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Zero means "not configured".
pub fn ping_interval_or_default(interval: Duration) -> Duration {
    if interval.is_zero() {
        DEFAULT_PING_INTERVAL
    } else {
        interval
    }
}

/// Everything the hosting page used to inject at start-up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerConfig {
    /// Moodle root URL (e.g. "https://moodle.example.com").
    pub wwwroot: String,
    /// Moodle session key sent with every call.
    pub sesskey: String,
    /// Meeting status polling interval while waiting for a moderator.
    pub ping_interval: Duration,
    /// Verification attempts for actions that do not pin their own.
    pub default_attempts: u32,
    pub backoff_unit: Duration,
    pub request_timeout: Duration,
}

impl BrokerConfig {
    pub fn new(wwwroot: &str, sesskey: &str) -> Self {
        Self {
            wwwroot: wwwroot.trim().trim_end_matches('/').to_string(),
            sesskey: sesskey.trim().to_string(),
            ping_interval: DEFAULT_PING_INTERVAL,
            default_attempts: DEFAULT_ATTEMPTS,
            backoff_unit: DEFAULT_BACKOFF_UNIT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// A zero interval selects [`DEFAULT_PING_INTERVAL`].
    pub fn with_ping_interval(mut self, interval: Duration) -> Self {
        self.ping_interval = ping_interval_or_default(interval);
        self
    }

    /// The polling interval to use, with a zero field read as the default.
    pub fn effective_ping_interval(&self) -> Duration {
        ping_interval_or_default(self.ping_interval)
    }

    pub fn with_default_attempts(mut self, attempts: u32) -> Self {
        self.default_attempts = attempts.max(1);
        self
    }

    pub fn with_backoff_unit(mut self, unit: Duration) -> Self {
        self.backoff_unit = unit;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Full URL of the broker script.
    pub fn datasource(&self) -> String {
        format!("{}{}", self.wwwroot, AJAX_PATH)
    }

    /// Load configuration from environment variables.
    ///
    /// # Required
    /// - `BBB_WWWROOT`
    /// - `BBB_SESSKEY`
    ///
    /// # Optional
    /// - `BBB_PING_INTERVAL_MS` (default: `"10000"`, `0` selects the default)
    /// - `BBB_ACTION_ATTEMPTS` (default: `"5"`)
    /// - `BBB_BACKOFF_UNIT_MS` (default: `"1000"`)
    /// - `BBB_REQUEST_TIMEOUT_SECS` (default: `"30"`)
    pub fn from_env() -> Result<Self, ApiError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ApiError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| ApiError::Config(format!("{key} environment variable is required")))
        };
        let number = |key: &str, default: u64| -> Result<u64, ApiError> {
            match lookup(key).filter(|value| !value.trim().is_empty()) {
                Some(value) => value
                    .trim()
                    .parse::<u64>()
                    .map_err(|_| ApiError::Config(format!("{key} must be a valid integer"))),
                None => Ok(default),
            }
        };

        let wwwroot = required("BBB_WWWROOT")?;
        let sesskey = required("BBB_SESSKEY")?;
        let ping_ms = number("BBB_PING_INTERVAL_MS", 10_000)?;
        let attempts = number("BBB_ACTION_ATTEMPTS", u64::from(DEFAULT_ATTEMPTS))?;
        let backoff_ms = number("BBB_BACKOFF_UNIT_MS", 1_000)?;
        let timeout_secs = number("BBB_REQUEST_TIMEOUT_SECS", 30)?;

        let attempts = u32::try_from(attempts)
            .map_err(|_| ApiError::Config("BBB_ACTION_ATTEMPTS is out of range".to_string()))?;

        Ok(Self::new(&wwwroot, &sesskey)
            .with_ping_interval(Duration::from_millis(ping_ms))
            .with_default_attempts(attempts)
            .with_backoff_unit(Duration::from_millis(backoff_ms))
            .with_request_timeout(Duration::from_secs(timeout_secs)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn requires_wwwroot_and_sesskey() {
        let err = BrokerConfig::from_lookup(lookup(&[("BBB_SESSKEY", "abc")])).unwrap_err();
        assert!(err.to_string().contains("BBB_WWWROOT"));

        let err = BrokerConfig::from_lookup(lookup(&[("BBB_WWWROOT", "https://m")])).unwrap_err();
        assert!(err.to_string().contains("BBB_SESSKEY"));
    }

    #[test]
    fn applies_defaults() {
        let config = BrokerConfig::from_lookup(lookup(&[
            ("BBB_WWWROOT", "https://moodle.example.com/"),
            ("BBB_SESSKEY", "abc"),
        ]))
        .unwrap();
        assert_eq!(config.wwwroot, "https://moodle.example.com");
        assert_eq!(config.ping_interval, DEFAULT_PING_INTERVAL);
        assert_eq!(config.default_attempts, 5);
        assert_eq!(config.backoff_unit, DEFAULT_BACKOFF_UNIT);
        assert_eq!(
            config.datasource(),
            "https://moodle.example.com/mod/bigbluebuttonbn/bbb_ajax.php"
        );
    }

    #[test]
    fn zero_ping_interval_means_default() {
        let config = BrokerConfig::from_lookup(lookup(&[
            ("BBB_WWWROOT", "https://m"),
            ("BBB_SESSKEY", "abc"),
            ("BBB_PING_INTERVAL_MS", "0"),
            ("BBB_BACKOFF_UNIT_MS", "250"),
        ]))
        .unwrap();
        assert_eq!(config.ping_interval, DEFAULT_PING_INTERVAL);
        assert_eq!(config.backoff_unit, Duration::from_millis(250));
    }

    #[test]
    fn rejects_non_numeric_values() {
        let err = BrokerConfig::from_lookup(lookup(&[
            ("BBB_WWWROOT", "https://m"),
            ("BBB_SESSKEY", "abc"),
            ("BBB_ACTION_ATTEMPTS", "many"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ApiError::Config(_)));
    }
}
