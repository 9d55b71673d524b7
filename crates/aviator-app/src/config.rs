//! Client configuration with environment overrides.

use std::time::Duration;

use aviator_core::ApiRoutes;
use aviator_poll::{
    DEFAULT_LIVENESS_INTERVAL_MS, DEFAULT_PROCESS_STATUS_INTERVAL_MS, PollIntervals,
};
use aviator_transport::{
    DEFAULT_PUSH_RECONNECT_DELAY_MS, DEFAULT_REQUEST_TIMEOUT_MS, ReconnectPolicy,
};

use crate::AppError;
use crate::controller::SessionSettings;

/// Origin used when nothing else is configured.
pub const DEFAULT_ORIGIN: &str = "http://127.0.0.1:8000";

/// Server origin override.
pub const ORIGIN_ENV: &str = "AVIATOR_ORIGIN";
/// Process-status poll period override in milliseconds.
pub const STATUS_POLL_ENV: &str = "AVIATOR_STATUS_POLL_MS";
/// Liveness poll period override in milliseconds.
pub const LIVENESS_POLL_ENV: &str = "AVIATOR_LIVENESS_POLL_MS";
/// Push reconnect delay override in milliseconds.
pub const PUSH_RETRY_ENV: &str = "AVIATOR_PUSH_RETRY_MS";
/// Per-request timeout override in milliseconds.
pub const REQUEST_TIMEOUT_ENV: &str = "AVIATOR_REQUEST_TIMEOUT_MS";

/// Runtime knobs of the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Server origin, e.g. `http://desk.local:8000`.
    pub origin: String,
    /// Process-status poll period.
    pub process_status_interval_ms: u64,
    /// Liveness poll period; also the offline probe period.
    pub liveness_interval_ms: u64,
    /// Delay before a dropped push connection is retried.
    pub push_reconnect_delay_ms: u64,
    /// Per-request timeout.
    pub request_timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            origin: DEFAULT_ORIGIN.to_string(),
            process_status_interval_ms: DEFAULT_PROCESS_STATUS_INTERVAL_MS,
            liveness_interval_ms: DEFAULT_LIVENESS_INTERVAL_MS,
            push_reconnect_delay_ms: DEFAULT_PUSH_RECONNECT_DELAY_MS,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
        }
    }
}

impl ClientConfig {
    /// Reads overrides from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads overrides through `lookup`.
    ///
    /// Semantics:
    /// - Unset or blank => default.
    /// - Millisecond values that are not positive integers => default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let origin = lookup(ORIGIN_ENV)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or(defaults.origin);

        Self {
            origin,
            process_status_interval_ms: millis_from(
                &lookup,
                STATUS_POLL_ENV,
                defaults.process_status_interval_ms,
            ),
            liveness_interval_ms: millis_from(
                &lookup,
                LIVENESS_POLL_ENV,
                defaults.liveness_interval_ms,
            ),
            push_reconnect_delay_ms: millis_from(
                &lookup,
                PUSH_RETRY_ENV,
                defaults.push_reconnect_delay_ms,
            ),
            request_timeout_ms: millis_from(
                &lookup,
                REQUEST_TIMEOUT_ENV,
                defaults.request_timeout_ms,
            ),
        }
    }

    /// Replaces the origin, as the `--origin` flag does.
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = origin.into();
        self
    }

    /// Per-request timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Resolves endpoint URLs for the configured origin.
    ///
    /// # Errors
    /// Returns [`AppError::Core`] when the origin is not an http(s) URL.
    pub fn routes(&self) -> Result<ApiRoutes, AppError> {
        Ok(ApiRoutes::new(&self.origin)?)
    }

    /// Builds controller settings.
    ///
    /// # Errors
    /// Returns [`AppError`] for an invalid origin or zero poll interval.
    pub fn session_settings(&self) -> Result<SessionSettings, AppError> {
        let routes = self.routes()?;
        Ok(SessionSettings {
            intervals: PollIntervals::from_millis(
                self.process_status_interval_ms,
                self.liveness_interval_ms,
            )?,
            reconnect: ReconnectPolicy {
                delay: Duration::from_millis(self.push_reconnect_delay_ms),
            },
            push_endpoint: routes.push().clone(),
        })
    }
}

fn millis_from(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: u64) -> u64 {
    lookup(key)
        .and_then(|value| value.trim().parse::<u64>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    //! Unit tests for env override parsing.

    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn unset_environment_yields_reference_timings() {
        let config = ClientConfig::from_lookup(|_| None);
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.process_status_interval_ms, 2_000);
        assert_eq!(config.liveness_interval_ms, 5_000);
        assert_eq!(config.push_reconnect_delay_ms, 3_000);
    }

    #[test]
    fn invalid_values_fall_back_to_defaults() {
        let config = ClientConfig::from_lookup(lookup_from(&[
            (STATUS_POLL_ENV, "0"),
            (LIVENESS_POLL_ENV, "soon"),
            (PUSH_RETRY_ENV, " 750 "),
            (ORIGIN_ENV, "   "),
        ]));
        assert_eq!(config.process_status_interval_ms, 2_000);
        assert_eq!(config.liveness_interval_ms, 5_000);
        assert_eq!(config.push_reconnect_delay_ms, 750);
        assert_eq!(config.origin, DEFAULT_ORIGIN);
    }
}
