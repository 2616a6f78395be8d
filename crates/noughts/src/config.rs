//! Server configuration.

use std::str::FromStr;
use std::time::Duration;

use noughts_hub::HubConfig;
use noughts_session::RegistryConfig;

use crate::ConfigError;

/// Everything the server needs to start.
///
/// Build it with [`Default`] and the builder methods on
/// [`NoughtsServerBuilder`](crate::NoughtsServerBuilder), or read it from
/// the environment with [`ServerConfig::from_env`].
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on for HTTP and WebSocket traffic.
    pub bind_addr: String,

    /// Session TTL and capacity.
    pub registry: RegistryConfig,

    /// Group actor mailbox sizing.
    pub hub: HubConfig,

    /// How often the reaper scans for idle sessions.
    pub reap_interval: Duration,

    /// A connection that sends nothing for this long is closed.
    pub idle_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8000".to_string(),
            registry: RegistryConfig::default(),
            hub: HubConfig::default(),
            reap_interval: Duration::from_secs(60),
            idle_timeout: Duration::from_secs(300),
        }
    }
}

impl ServerConfig {
    /// Reads configuration from `NOUGHTS_*` environment variables,
    /// after loading a `.env` file if one exists. Unset variables keep
    /// their defaults.
    ///
    /// | variable                     | field                    |
    /// |------------------------------|--------------------------|
    /// | `NOUGHTS_BIND`               | `bind_addr`              |
    /// | `NOUGHTS_SESSION_TTL_SECS`   | `registry.session_ttl`   |
    /// | `NOUGHTS_MAX_SESSIONS`       | `registry.max_sessions`  |
    /// | `NOUGHTS_REAP_INTERVAL_SECS` | `reap_interval`          |
    /// | `NOUGHTS_IDLE_TIMEOUT_SECS`  | `idle_timeout`           |
    ///
    /// # Errors
    /// Returns [`ConfigError::Invalid`] if a variable is set but does
    /// not parse, or if the reap interval or idle timeout is zero.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(bind) = lookup("NOUGHTS_BIND") {
            config.bind_addr = bind;
        }
        if let Some(secs) = parse_var(&lookup, "NOUGHTS_SESSION_TTL_SECS")? {
            config.registry.session_ttl = Duration::from_secs(secs);
        }
        if let Some(max) = parse_var(&lookup, "NOUGHTS_MAX_SESSIONS")? {
            config.registry.max_sessions = max;
        }
        if let Some(every) = parse_nonzero_secs(&lookup, "NOUGHTS_REAP_INTERVAL_SECS")? {
            config.reap_interval = every;
        }
        if let Some(timeout) = parse_nonzero_secs(&lookup, "NOUGHTS_IDLE_TIMEOUT_SECS")? {
            config.idle_timeout = timeout;
        }

        Ok(config)
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<T>, ConfigError> {
    match lookup(var) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { var, value }),
    }
}

/// Reads a whole number of seconds that must be greater than zero.
fn parse_nonzero_secs(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<Duration>, ConfigError> {
    match parse_var::<u64>(lookup, var)? {
        Some(0) => Err(ConfigError::Invalid {
            var,
            value: "0".to_string(),
        }),
        secs => Ok(secs.map(Duration::from_secs)),
    }
}
