//! Process configuration read from environment variables.
//!
//! | Variable | Default | Format |
//! |---|---|---|
//! | `HOST` | `localhost` | host name or IP |
//! | `PORT` | `8080` | `u16` |
//! | `LOG_LEVEL` | `info` | `debug`, `info`, `warn`/`warning`, `error` |
//! | `READ_TIMEOUT` | `30s` | duration, e.g. `500ms`, `1m30s` |
//! | `WRITE_TIMEOUT` | `30s` | duration |
//! | `SHUTDOWN_TIMEOUT` | `15s` | duration |
//!
//! Variables are collected with the `config` crate's environment source.
//! Unset or empty variables keep their default. A value that is present but
//! unparsable is an error; the service refuses to start on a bad config.

use std::time::Duration;

use config::Environment;
use serde::Deserialize;
use tracing::Level;

/// Failure to interpret one configuration variable.
#[derive(Debug, thiserror::Error)]
#[error("invalid {key}: {reason}")]
pub struct ConfigError {
    pub key: &'static str,
    pub reason: String,
}

impl ConfigError {
    fn new(key: &'static str, reason: impl ToString) -> Self {
        Self { key, reason: reason.to_string() }
    }
}

/// Service configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: Level,
    pub read_timeout: Duration,
    pub write_timeout: Duration,
    pub shutdown_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "localhost".to_owned(),
            port: 8080,
            log_level: Level::INFO,
            read_timeout: Duration::from_secs(30),
            write_timeout: Duration::from_secs(30),
            shutdown_timeout: Duration::from_secs(15),
        }
    }
}

/// The variables as collected, before any parsing. The environment source
/// lowercases keys; the aliases accept them verbatim as well.
#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    #[serde(alias = "HOST")]
    host: Option<String>,
    #[serde(alias = "PORT")]
    port: Option<String>,
    #[serde(alias = "LOG_LEVEL")]
    log_level: Option<String>,
    #[serde(alias = "READ_TIMEOUT")]
    read_timeout: Option<String>,
    #[serde(alias = "WRITE_TIMEOUT")]
    write_timeout: Option<String>,
    #[serde(alias = "SHUTDOWN_TIMEOUT")]
    shutdown_timeout: Option<String>,
}

impl Config {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(Environment::default())
    }

    /// Reads the configuration from `source`, unprefixed.
    ///
    /// Tests pass an environment backed by a map (`Environment::source`),
    /// which keeps them away from the real process environment shared across
    /// test threads.
    pub fn load(source: Environment) -> Result<Self, ConfigError> {
        let raw: RawConfig = config::Config::builder()
            .add_source(source.ignore_empty(true))
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| ConfigError::new("environment", e))?;
        raw.resolve()
    }

    /// `host:port`, suitable for binding.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl RawConfig {
    fn resolve(self) -> Result<Config, ConfigError> {
        let mut cfg = Config::default();

        if let Some(host) = self.host {
            cfg.host = host;
        }
        if let Some(port) = self.port {
            cfg.port = port.parse().map_err(|e| ConfigError::new("PORT", e))?;
        }
        if let Some(level) = self.log_level {
            cfg.log_level = parse_level(&level).map_err(|e| ConfigError::new("LOG_LEVEL", e))?;
        }
        if let Some(timeout) = self.read_timeout {
            cfg.read_timeout =
                parse_duration(&timeout).map_err(|e| ConfigError::new("READ_TIMEOUT", e))?;
        }
        if let Some(timeout) = self.write_timeout {
            cfg.write_timeout =
                parse_duration(&timeout).map_err(|e| ConfigError::new("WRITE_TIMEOUT", e))?;
        }
        if let Some(timeout) = self.shutdown_timeout {
            cfg.shutdown_timeout =
                parse_duration(&timeout).map_err(|e| ConfigError::new("SHUTDOWN_TIMEOUT", e))?;
        }

        Ok(cfg)
    }
}

/// Parses a log level name. Accepts `warning` as an alias for `warn`.
pub fn parse_level(level: &str) -> Result<Level, String> {
    match level.to_ascii_lowercase().as_str() {
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" | "warning" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => Err(format!("unknown level: {level}")),
    }
}

/// Parses a duration written as a sequence of decimal numbers with unit
/// suffixes: `300ms`, `1.5s`, `2h45m`. Valid units are `ns`, `us` (or `µs`),
/// `ms`, `s`, `m`, `h`. A bare `0` is accepted.
pub fn parse_duration(input: &str) -> Result<Duration, String> {
    if input == "0" {
        return Ok(Duration::ZERO);
    }
    if input.is_empty() {
        return Err("empty duration".to_owned());
    }

    let mut rest = input;
    let mut total_nanos: f64 = 0.0;

    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        if number_len == 0 {
            return Err(format!("invalid duration {input:?}"));
        }
        let value: f64 = rest[..number_len]
            .parse()
            .map_err(|_| format!("invalid duration {input:?}"))?;
        rest = &rest[number_len..];

        let unit_len = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let scale = match &rest[..unit_len] {
            "ns" => 1.0,
            "us" | "µs" => 1e3,
            "ms" => 1e6,
            "s" => 1e9,
            "m" => 60e9,
            "h" => 3600e9,
            "" => return Err(format!("missing unit in duration {input:?}")),
            unit => return Err(format!("unknown unit {unit:?} in duration {input:?}")),
        };
        rest = &rest[unit_len..];

        total_nanos += value * scale;
    }

    if !total_nanos.is_finite() || total_nanos > u64::MAX as f64 {
        return Err(format!("invalid duration {input:?}"));
    }
    Ok(Duration::from_nanos(total_nanos.round() as u64))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let env: config::Map<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        Config::load(Environment::default().source(Some(env)))
    }

    #[test]
    fn defaults_when_unset() {
        let cfg = load(&[]).unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.address(), "localhost:8080");
        assert_eq!(cfg.shutdown_timeout, Duration::from_secs(15));
    }

    #[test]
    fn custom_values() {
        let cfg = load(&[
            ("HOST", "0.0.0.0"),
            ("PORT", "9090"),
            ("LOG_LEVEL", "DEBUG"),
            ("READ_TIMEOUT", "5s"),
            ("WRITE_TIMEOUT", "1m30s"),
            ("SHUTDOWN_TIMEOUT", "250ms"),
        ])
        .unwrap();

        assert_eq!(cfg.address(), "0.0.0.0:9090");
        assert_eq!(cfg.log_level, Level::DEBUG);
        assert_eq!(cfg.read_timeout, Duration::from_secs(5));
        assert_eq!(cfg.write_timeout, Duration::from_secs(90));
        assert_eq!(cfg.shutdown_timeout, Duration::from_millis(250));
    }

    #[test]
    fn empty_values_keep_defaults() {
        let cfg = load(&[("HOST", ""), ("PORT", "")]).unwrap();
        assert_eq!(cfg.host, "localhost");
        assert_eq!(cfg.port, 8080);
    }

    #[test]
    fn unrelated_variables_are_ignored() {
        let cfg = load(&[("PATH", "/usr/bin"), ("HOME", "/root"), ("PORT", "3000")]).unwrap();
        assert_eq!(cfg.port, 3000);
        assert_eq!(cfg.host, "localhost");
    }

    #[test]
    fn bad_values_name_the_variable() {
        for (key, value) in [
            ("PORT", "http"),
            ("PORT", "70000"),
            ("LOG_LEVEL", "verbose"),
            ("READ_TIMEOUT", "30"),
            ("WRITE_TIMEOUT", "abc"),
            ("SHUTDOWN_TIMEOUT", "5y"),
        ] {
            let err = load(&[(key, value)]).unwrap_err();
            assert_eq!(err.key, key);
            assert!(err.to_string().starts_with(&format!("invalid {key}: ")));
        }
    }

    #[test]
    fn level_aliases() {
        assert_eq!(parse_level("warning").unwrap(), Level::WARN);
        assert_eq!(parse_level("WARN").unwrap(), Level::WARN);
        assert_eq!(parse_level("error").unwrap(), Level::ERROR);
    }

    #[test]
    fn duration_forms() {
        assert_eq!(parse_duration("0").unwrap(), Duration::ZERO);
        assert_eq!(parse_duration("1.5s").unwrap(), Duration::from_millis(1500));
        assert_eq!(parse_duration("2h45m").unwrap(), Duration::from_secs(2 * 3600 + 45 * 60));
        assert_eq!(parse_duration("10us").unwrap(), Duration::from_micros(10));
        assert_eq!(parse_duration("10µs").unwrap(), Duration::from_micros(10));
        assert_eq!(parse_duration("7ns").unwrap(), Duration::from_nanos(7));
        assert!(parse_duration("").is_err());
        assert!(parse_duration("s").is_err());
        assert!(parse_duration("-1s").is_err());
    }
}
