// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::dispatcher::RetryStrategy;
use crate::error::ForwarderError;
use crate::FLUSH_RETRY_COUNT;
use std::env;
use std::time::Duration;

const DEFAULT_TIME_FIELD: &str = "time";
const DEFAULT_FLUSH_TIMEOUT_SECS: u64 = 10;
const DEFAULT_RETRY_BACKOFF_MS: u64 = 1000;

/// Configuration for forwarding CloudWatch Logs batches to Splunk HEC
#[derive(Debug, Clone)]
pub struct ForwarderConfig {
    /// Full HEC endpoint, e.g. https://splunk.example.com:8088/services/collector
    pub hec_url: String,
    /// HEC token sent as `Authorization: Splunk <token>`
    pub hec_token: String,
    /// Field of a structured message holding the event time
    pub time_field: String,
    /// Optional Splunk index for every record
    pub index: Option<String>,
    /// Region label used as the `source` prefix
    pub region: String,
    /// Timeout for each delivery attempt
    pub flush_timeout: Duration,
    /// Backoff applied between delivery attempts
    pub retry_strategy: RetryStrategy,
    /// HTTPS proxy URL
    pub https_proxy: Option<String>,
    /// Log level (e.g., trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for ForwarderConfig {
    fn default() -> Self {
        Self {
            hec_url: String::new(),
            hec_token: String::new(),
            time_field: DEFAULT_TIME_FIELD.to_string(),
            index: None,
            region: String::new(),
            flush_timeout: Duration::from_secs(DEFAULT_FLUSH_TIMEOUT_SECS),
            retry_strategy: RetryStrategy::LinearBackoff(
                FLUSH_RETRY_COUNT,
                DEFAULT_RETRY_BACKOFF_MS,
            ),
            https_proxy: None,
            log_level: "info".to_string(),
        }
    }
}

impl ForwarderConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self, ForwarderError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Create configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ForwarderError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|val| !val.trim().is_empty());

        let hec_url = lookup("SPLUNK_HEC_URL").unwrap_or_default();
        let hec_token = lookup("SPLUNK_HEC_TOKEN").unwrap_or_default();
        let time_field =
            non_empty("SPLUNK_TIME_FIELD").unwrap_or_else(|| DEFAULT_TIME_FIELD.to_string());
        let index = non_empty("SPLUNK_HEC_INDEX");
        let region = lookup("AWS_REGION").unwrap_or_default();
        let flush_timeout = match lookup("SPLUNK_HEC_TIMEOUT_SECS") {
            Some(val) => Duration::from_secs(val.trim().parse::<u64>().map_err(|_| {
                ForwarderError::InvalidConfig(format!(
                    "SPLUNK_HEC_TIMEOUT_SECS must be a whole number of seconds, got '{val}'"
                ))
            })?),
            None => Duration::from_secs(DEFAULT_FLUSH_TIMEOUT_SECS),
        };
        let backoff_ms = match lookup("SPLUNK_HEC_RETRY_BACKOFF_MS") {
            Some(val) => val.trim().parse::<u64>().map_err(|_| {
                ForwarderError::InvalidConfig(format!(
                    "SPLUNK_HEC_RETRY_BACKOFF_MS must be a whole number of milliseconds, got '{val}'"
                ))
            })?,
            None => DEFAULT_RETRY_BACKOFF_MS,
        };
        let retry_strategy = if backoff_ms == 0 {
            RetryStrategy::Immediate(FLUSH_RETRY_COUNT)
        } else {
            RetryStrategy::LinearBackoff(FLUSH_RETRY_COUNT, backoff_ms)
        };
        let https_proxy = non_empty("HTTPS_PROXY").or_else(|| non_empty("https_proxy"));
        let log_level = lookup("FORWARDER_LOG_LEVEL")
            .map(|val| val.to_lowercase())
            .unwrap_or_else(|| "info".to_string());

        let config = Self {
            hec_url,
            hec_token,
            time_field,
            index,
            region,
            flush_timeout,
            retry_strategy,
            https_proxy,
            log_level,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ForwarderError> {
        if self.hec_url.trim().is_empty() {
            return Err(ForwarderError::InvalidConfig(
                "SPLUNK_HEC_URL must be set".to_string(),
            ));
        }
        match reqwest::Url::parse(&self.hec_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(url) => {
                return Err(ForwarderError::InvalidConfig(format!(
                    "SPLUNK_HEC_URL must use http or https, got '{}'",
                    url.scheme()
                )))
            }
            Err(e) => {
                return Err(ForwarderError::InvalidConfig(format!(
                    "SPLUNK_HEC_URL '{}' is not a valid URL: {e}",
                    self.hec_url
                )))
            }
        }

        if self.hec_token.trim().is_empty() {
            return Err(ForwarderError::InvalidConfig(
                "SPLUNK_HEC_TOKEN must be set".to_string(),
            ));
        }

        if self.time_field.is_empty() {
            return Err(ForwarderError::InvalidConfig(
                "SPLUNK_TIME_FIELD cannot be empty".to_string(),
            ));
        }

        if self.flush_timeout.is_zero() {
            return Err(ForwarderError::InvalidConfig(
                "SPLUNK_HEC_TIMEOUT_SECS must be greater than 0".to_string(),
            ));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.log_level.as_str()) {
            return Err(ForwarderError::InvalidConfig(format!(
                "Invalid log level '{}'. Must be one of: trace, debug, info, warn, error",
                self.log_level
            )));
        }

        Ok(())
    }
}
