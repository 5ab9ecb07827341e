//! Runtime configuration.
//!
//! Durations are written as integer milliseconds in serialized form:
//!
//! ```json
//! {
//!   "routes": { "login": "/signin", "home": "/app" },
//!   "check_cooldown_ms": 5000,
//!   "refresh_timeout_ms": 10000
//! }
//! ```
//!
//! Every field has a default, so an empty object is a valid config.

use std::time::Duration;

use keyward_session::DEFAULT_CREDENTIAL_KEY;
use keyward_tick::PollConfig;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::KeywardError;

/// The three routes navigation cares about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteConfig {
    pub login: String,
    pub home: String,
    /// Routes starting with this prefix are mid email-link activation and
    /// are never redirected away from.
    pub activation_prefix: String,
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            login: "/login".to_string(),
            home: "/".to_string(),
            activation_prefix: "/auth/email-link".to_string(),
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeywardConfig {
    pub routes: RouteConfig,

    /// Minimum gap between two startup checks.
    #[serde(rename = "check_cooldown_ms", with = "millis")]
    pub check_cooldown: Duration,

    /// Minimum gap between two checks triggered by landing on login.
    #[serde(rename = "location_cooldown_ms", with = "millis")]
    pub location_cooldown: Duration,

    /// Minimum gap between two redirects caused by the state watcher.
    #[serde(rename = "redirect_cooldown_ms", with = "millis")]
    pub redirect_cooldown: Duration,

    /// How long to wait after navigating before checking it took effect.
    #[serde(rename = "navigation_grace_ms", with = "millis")]
    pub navigation_grace: Duration,

    /// Interval of the post-submit poll.
    #[serde(rename = "poll_interval_ms", with = "millis")]
    pub poll_interval: Duration,

    /// Random delay (0..max) added before the first post-submit poll.
    #[serde(rename = "poll_jitter_ms", with = "millis")]
    pub poll_jitter: Duration,

    /// Give up the post-submit poll after this many unconfirmed checks.
    /// `None` polls until confirmed or stopped.
    pub poll_limit: Option<u64>,

    /// Upper bound on one refresh call. `None` waits indefinitely.
    #[serde(rename = "refresh_timeout_ms", with = "opt_millis")]
    pub refresh_timeout: Option<Duration>,

    /// Storage key of the access token.
    pub credential_key: String,
}

impl Default for KeywardConfig {
    fn default() -> Self {
        Self {
            routes: RouteConfig::default(),
            check_cooldown: Duration::from_secs(2),
            location_cooldown: Duration::from_secs(1),
            redirect_cooldown: Duration::from_millis(1500),
            navigation_grace: Duration::from_millis(300),
            poll_interval: Duration::from_secs(3),
            poll_jitter: Duration::ZERO,
            poll_limit: None,
            refresh_timeout: None,
            credential_key: DEFAULT_CREDENTIAL_KEY.to_string(),
        }
    }
}

impl KeywardConfig {
    /// Parses a JSON config and clamps it with [`validated`](Self::validated).
    pub fn from_json(json: &str) -> Result<Self, KeywardError> {
        let config: Self = serde_json::from_str(json)?;
        Ok(config.validated())
    }

    /// Clamp out-of-range values so the config is safe to use.
    ///
    /// A zero refresh timeout would fail every refresh, so it is treated
    /// as "no timeout", and a zero poll limit as "no limit". An empty
    /// credential key falls back to the default.
    pub fn validated(mut self) -> Self {
        if self.poll_limit == Some(0) {
            warn!("zero poll limit, disabling");
            self.poll_limit = None;
        }
        if self.refresh_timeout == Some(Duration::ZERO) {
            warn!("zero refresh timeout, disabling");
            self.refresh_timeout = None;
        }
        if self.credential_key.is_empty() {
            warn!("empty credential key, using default");
            self.credential_key = DEFAULT_CREDENTIAL_KEY.to_string();
        }
        if !self.poll_interval.is_zero() && self.poll_interval < PollConfig::MIN_INTERVAL {
            warn!(
                interval_ms = self.poll_interval.as_millis() as u64,
                "poll interval below minimum, clamping"
            );
            self.poll_interval = PollConfig::MIN_INTERVAL;
        }
        self
    }

    /// The post-submit poll settings.
    pub fn poll(&self) -> PollConfig {
        PollConfig {
            interval: self.poll_interval,
            initial_jitter: self.poll_jitter,
            max_polls: self.poll_limit,
        }
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

mod opt_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<Duration>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(duration) => serializer.serialize_some(&(duration.as_millis() as u64)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Duration>, D::Error> {
        Option::<u64>::deserialize(deserializer).map(|ms| ms.map(Duration::from_millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json_empty_object_is_default() {
        let config = KeywardConfig::from_json("{}").unwrap();
        assert_eq!(config, KeywardConfig::default());
    }

    #[test]
    fn test_from_json_partial_routes_keep_other_defaults() {
        let config = KeywardConfig::from_json(
            r#"{"routes":{"login":"/signin"},"check_cooldown_ms":5000}"#,
        )
        .unwrap();

        assert_eq!(config.routes.login, "/signin");
        assert_eq!(config.routes.home, "/");
        assert_eq!(config.check_cooldown, Duration::from_secs(5));
        assert_eq!(config.location_cooldown, Duration::from_secs(1));
    }

    #[test]
    fn test_from_json_refresh_timeout_parsed() {
        let config = KeywardConfig::from_json(r#"{"refresh_timeout_ms":10000}"#).unwrap();
        assert_eq!(config.refresh_timeout, Some(Duration::from_secs(10)));

        let config = KeywardConfig::from_json(r#"{"refresh_timeout_ms":null}"#).unwrap();
        assert_eq!(config.refresh_timeout, None);
    }

    #[test]
    fn test_from_json_malformed_is_error() {
        assert!(matches!(
            KeywardConfig::from_json("{not json"),
            Err(KeywardError::Config(_))
        ));
    }

    #[test]
    fn test_validated_clamps_degenerate_values() {
        let config = KeywardConfig {
            refresh_timeout: Some(Duration::ZERO),
            credential_key: String::new(),
            poll_interval: Duration::from_millis(1),
            ..Default::default()
        }
        .validated();

        assert_eq!(config.refresh_timeout, None);
        assert_eq!(config.credential_key, DEFAULT_CREDENTIAL_KEY);
        assert_eq!(config.poll_interval, PollConfig::MIN_INTERVAL);
    }

    #[test]
    fn test_poll_limit_flows_into_poll_config() {
        let config = KeywardConfig::from_json(r#"{"poll_limit":20}"#).unwrap();
        assert_eq!(config.poll().max_polls, Some(20));

        let config = KeywardConfig::from_json(r#"{"poll_limit":0}"#).unwrap();
        assert_eq!(config.poll().max_polls, None);
    }

    #[test]
    fn test_serialized_durations_are_millis() {
        let json = serde_json::to_value(KeywardConfig::default()).unwrap();
        assert_eq!(json["check_cooldown_ms"], 2000);
        assert_eq!(json["redirect_cooldown_ms"], 1500);
        assert!(json["refresh_timeout_ms"].is_null());
    }
}
