use std::env::var;
use std::time::Duration;

use dotenvy::dotenv;
use thiserror::Error;

use crate::ping::DEFAULT_PROTOCOL_VERSION;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    Missing(&'static str),
}

/// Application configuration with environment variable overrides
#[derive(Debug, Clone)]
pub struct Config {
    /// Discord API Token
    /// Env: DISCORD_TOKEN (required)
    pub discord_token: String,

    /// Prefix for text commands
    /// Env: COMMAND_PREFIX (default: "!")
    pub command_prefix: String,

    /// Protocol version sent in the Server List Ping handshake
    /// Env: PROTOCOL_VERSION (default: 756)
    pub protocol_version: i32,

    /// How long a single status probe may take
    /// Env: PROBE_TIMEOUT_MS (default: 10000)
    pub probe_timeout: Duration,

    /// Time between poll ticks
    /// Env: POLL_INTERVAL_MS (default: 2000)
    pub poll_interval: Duration,

    /// Status HTTP port
    /// Env: PORT (default: 3000)
    pub port: u16,

    /// Request timeout in seconds
    /// Env: REQUEST_TIMEOUT_SECS (default: 30)
    pub request_timeout: Duration,

    /// Rate limit for the /servers endpoints (requests per second, per IP)
    /// Env: RATE_LIMIT_PER_SEC (default: 10)
    pub rate_limit_per_sec: u64,

    /// Burst size for the /servers endpoints
    /// Env: RATE_LIMIT_BURST (default: 20)
    pub rate_limit_burst: u32,
}

impl Config {
    /// Load configuration from environment variables with defaults.
    /// Fails if DISCORD_TOKEN is missing.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenv(); //for debugging mostly
        Self::from_lookup(|key| var(key).ok())
    }

    /// Build the configuration from any key/value source.
    /// A blank DISCORD_TOKEN counts as missing.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let discord_token = lookup("DISCORD_TOKEN")
            .filter(|token| !token.trim().is_empty())
            .ok_or(ConfigError::Missing("DISCORD_TOKEN"))?;
        let defaults = Self::default();
        Ok(Self {
            discord_token,
            command_prefix: lookup("COMMAND_PREFIX").unwrap_or(defaults.command_prefix),
            protocol_version: parse_or_default(&lookup, "PROTOCOL_VERSION", defaults.protocol_version),
            probe_timeout: Duration::from_millis(parse_or_default(&lookup, "PROBE_TIMEOUT_MS", 10_000)),
            poll_interval: Duration::from_millis(parse_or_default(&lookup, "POLL_INTERVAL_MS", 2_000)),
            port: parse_or_default(&lookup, "PORT", defaults.port),
            request_timeout: Duration::from_secs(parse_or_default(&lookup, "REQUEST_TIMEOUT_SECS", 30)),
            rate_limit_per_sec: parse_or_default(&lookup, "RATE_LIMIT_PER_SEC", defaults.rate_limit_per_sec),
            rate_limit_burst: parse_or_default(&lookup, "RATE_LIMIT_BURST", defaults.rate_limit_burst),
        })
    }
}

impl Default for Config {
    /// All defaults, with an empty token.
    fn default() -> Self {
        Self {
            discord_token: String::new(),
            command_prefix: "!".to_string(),
            protocol_version: DEFAULT_PROTOCOL_VERSION,
            probe_timeout: Duration::from_millis(10_000),
            poll_interval: Duration::from_millis(2_000),
            port: 3000,
            request_timeout: Duration::from_secs(30),
            rate_limit_per_sec: 10,
            rate_limit_burst: 20,
        }
    }
}

/// Parse a configured value or return the default
fn parse_or_default<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> T {
    lookup(key)
        .and_then(|val| val.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.command_prefix, "!");
        assert_eq!(config.protocol_version, 756);
        assert_eq!(config.probe_timeout, Duration::from_millis(10_000));
        assert_eq!(config.poll_interval, Duration::from_millis(2_000));
        assert_eq!(config.port, 3000);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.rate_limit_per_sec, 10);
        assert_eq!(config.rate_limit_burst, 20);
    }

    fn lookup(pairs: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        move |key: &str| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn test_missing_token_is_an_error() {
        let result = Config::from_lookup(lookup(&[("PORT", "8080")]));
        assert_eq!(result.unwrap_err(), ConfigError::Missing("DISCORD_TOKEN"));
    }

    #[test]
    fn test_blank_token_is_an_error() {
        let result = Config::from_lookup(lookup(&[("DISCORD_TOKEN", "   ")]));
        assert_eq!(result.unwrap_err(), ConfigError::Missing("DISCORD_TOKEN"));
    }

    #[test]
    fn test_overrides_and_garbage_fall_back() {
        let config = Config::from_lookup(lookup(&[
            ("DISCORD_TOKEN", "secret"),
            ("COMMAND_PREFIX", "?"),
            ("POLL_INTERVAL_MS", "500"),
            ("PORT", "not-a-port"),
        ]))
        .unwrap();
        assert_eq!(config.discord_token, "secret");
        assert_eq!(config.command_prefix, "?");
        assert_eq!(config.poll_interval, Duration::from_millis(500));
        assert_eq!(config.port, 3000);
        assert_eq!(config.protocol_version, 756);
    }
}
