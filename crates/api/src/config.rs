use std::path::PathBuf;
use std::str::FromStr;

use touchline_core::lifecycle::StartPolicy;
use touchline_core::payload::{DecodeOptions, DEFAULT_PREVIEW_BYTES};
use touchline_core::session::{DEFAULT_DETAIL_CADENCE, DEFAULT_PROGRESS_CADENCE};

/// Errors raised while reading configuration from the environment.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} has invalid value '{value}': {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("{0} must be set when SESSION_STORE=postgres")]
    Missing(&'static str),
}

/// Which Session Store backend the server persists completed sessions to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Memory,
    File,
    Postgres,
}

impl FromStr for StoreKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "file" => Ok(Self::File),
            "postgres" | "postgresql" => Ok(Self::Postgres),
            _ => Err("must be one of: file, memory, postgres".into()),
        }
    }
}

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for running next to a local producer.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `8080`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Request body limit in bytes (default: 64 MiB).
    pub max_body_bytes: usize,
    pub store: StoreKind,
    /// Directory used by the file store.
    pub data_dir: PathBuf,
    pub database_url: Option<String>,
    pub start_policy: StartPolicy,
    /// Frame numbers divisible by this emit a progress event.
    pub progress_cadence: i64,
    /// Frame numbers divisible by this emit a detail event; `0` disables.
    pub detail_cadence: i64,
    /// Upper bound on the raw-body preview in malformed-payload responses.
    pub preview_bytes: usize,
    /// Log every decoded frame as pretty JSON.
    pub debug_json: bool,
    pub repair_escapes: bool,
    /// Discard sessions idle for longer than this; `0` disables the sweep.
    pub idle_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8080,
            cors_origins: vec!["http://localhost:5173".into()],
            request_timeout_secs: 30,
            max_body_bytes: 64 * 1024 * 1024,
            store: StoreKind::File,
            data_dir: PathBuf::from("./api_data"),
            database_url: None,
            start_policy: StartPolicy::Replace,
            progress_cadence: DEFAULT_PROGRESS_CADENCE,
            detail_cadence: DEFAULT_DETAIL_CADENCE,
            preview_bytes: DEFAULT_PREVIEW_BYTES,
            debug_json: false,
            repair_escapes: false,
            idle_timeout_secs: 0,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `8080`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    /// | `MAX_BODY_BYTES`       | `67108864`                 |
    /// | `SESSION_STORE`        | `file`                     |
    /// | `DATA_DIR`             | `./api_data`               |
    /// | `DATABASE_URL`         | (required for `postgres`)  |
    /// | `START_POLICY`         | `replace`                  |
    /// | `PROGRESS_CADENCE`     | `30`                       |
    /// | `DETAIL_CADENCE`       | `100`                      |
    /// | `PREVIEW_BYTES`        | `500`                      |
    /// | `DEBUG_JSON`           | `false`                    |
    /// | `REPAIR_ESCAPES`       | `false`                    |
    /// | `IDLE_TIMEOUT_SECS`    | `0`                        |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let host = lookup("HOST").unwrap_or(defaults.host);

        let cors_origins = match lookup("CORS_ORIGINS") {
            Some(raw) => raw
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            None => defaults.cors_origins,
        };

        let store: StoreKind = parse(&lookup, "SESSION_STORE", defaults.store)?;
        let database_url = lookup("DATABASE_URL").filter(|s| !s.trim().is_empty());
        if store == StoreKind::Postgres && database_url.is_none() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }

        let start_policy = match lookup("START_POLICY") {
            Some(raw) => raw.parse().map_err(|e: touchline_core::error::CoreError| {
                ConfigError::Invalid {
                    var: "START_POLICY",
                    value: raw.clone(),
                    reason: e.to_string(),
                }
            })?,
            None => defaults.start_policy,
        };

        Ok(Self {
            host,
            port: parse(&lookup, "PORT", defaults.port)?,
            cors_origins,
            request_timeout_secs: parse(&lookup, "REQUEST_TIMEOUT_SECS", defaults.request_timeout_secs)?,
            max_body_bytes: parse(&lookup, "MAX_BODY_BYTES", defaults.max_body_bytes)?,
            store,
            data_dir: lookup("DATA_DIR").map(PathBuf::from).unwrap_or(defaults.data_dir),
            database_url,
            start_policy,
            progress_cadence: parse(&lookup, "PROGRESS_CADENCE", defaults.progress_cadence)?,
            detail_cadence: parse(&lookup, "DETAIL_CADENCE", defaults.detail_cadence)?,
            preview_bytes: parse(&lookup, "PREVIEW_BYTES", defaults.preview_bytes)?,
            debug_json: parse_flag(&lookup, "DEBUG_JSON", defaults.debug_json)?,
            repair_escapes: parse_flag(&lookup, "REPAIR_ESCAPES", defaults.repair_escapes)?,
            idle_timeout_secs: parse(&lookup, "IDLE_TIMEOUT_SECS", defaults.idle_timeout_secs)?,
        })
    }

    /// Decoder settings derived from this configuration.
    pub fn decode_options(&self) -> DecodeOptions {
        DecodeOptions {
            preview_bytes: self.preview_bytes,
            repair_escapes: self.repair_escapes,
        }
    }
}

fn parse<F, T>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(var) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            var,
            value: raw.clone(),
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

fn parse_flag<F>(lookup: &F, var: &'static str, default: bool) -> Result<bool, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" | "" => Ok(false),
            _ => Err(ConfigError::Invalid {
                var,
                value: raw,
                reason: "expected a boolean".into(),
            }),
        },
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use assert_matches::assert_matches;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_match_the_producer() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.store, StoreKind::File);
        assert_eq!(config.data_dir, PathBuf::from("./api_data"));
        assert_eq!(config.start_policy, StartPolicy::Replace);
        assert_eq!(config.progress_cadence, 30);
        assert_eq!(config.detail_cadence, 100);
        assert!(!config.repair_escapes);
        assert_eq!(config.idle_timeout_secs, 0);
    }

    #[test]
    fn overrides_are_applied() {
        let config = config_from(&[
            ("PORT", "9000"),
            ("CORS_ORIGINS", "http://a.test, http://b.test,"),
            ("SESSION_STORE", "memory"),
            ("START_POLICY", "reject"),
            ("DEBUG_JSON", "yes"),
            ("IDLE_TIMEOUT_SECS", "600"),
        ])
        .unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.cors_origins, vec!["http://a.test", "http://b.test"]);
        assert_eq!(config.store, StoreKind::Memory);
        assert_eq!(config.start_policy, StartPolicy::Reject);
        assert!(config.debug_json);
        assert_eq!(config.idle_timeout_secs, 600);
    }

    #[test]
    fn invalid_values_are_reported() {
        assert_matches!(
            config_from(&[("PORT", "eighty")]),
            Err(ConfigError::Invalid { var: "PORT", .. })
        );
        assert_matches!(
            config_from(&[("START_POLICY", "queue")]),
            Err(ConfigError::Invalid { var: "START_POLICY", .. })
        );
        assert_matches!(
            config_from(&[("REPAIR_ESCAPES", "maybe")]),
            Err(ConfigError::Invalid { var: "REPAIR_ESCAPES", .. })
        );
    }

    #[test]
    fn postgres_requires_database_url() {
        assert_matches!(
            config_from(&[("SESSION_STORE", "postgres")]),
            Err(ConfigError::Missing("DATABASE_URL"))
        );
        let config = config_from(&[
            ("SESSION_STORE", "postgres"),
            ("DATABASE_URL", "postgres://localhost/touchline"),
        ])
        .unwrap();
        assert_eq!(config.store, StoreKind::Postgres);
    }
}
