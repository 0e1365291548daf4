//! Server configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use sketchwire_room::RoomConfig;

use crate::SketchwireError;

/// Environment variable holding the listen address.
pub const ENV_ADDR: &str = "SKETCHWIRE_ADDR";
/// Environment variable holding the round length in seconds.
pub const ENV_ROUND_SECS: &str = "SKETCHWIRE_ROUND_SECS";
/// Environment variable holding the intermission in seconds; `0` turns
/// automatic advancing off.
pub const ENV_INTERMISSION_SECS: &str = "SKETCHWIRE_INTERMISSION_SECS";

/// Everything the server needs to run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the WebSocket listener binds to.
    pub bind_addr: String,
    /// Rules applied to every room.
    pub room: RoomConfig,
    /// A connection that sends nothing, not even a `Heartbeat`, for this
    /// long is dropped (and leaves its room).
    pub idle_timeout: Duration,
    /// Pause between a round ending and the next one starting by itself.
    /// `None` leaves starting rounds to the host.
    pub intermission: Option<Duration>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            room: RoomConfig::default(),
            idle_timeout: Duration::from_secs(120),
            intermission: Some(Duration::from_secs(5)),
        }
    }
}

impl ServerConfig {
    /// Defaults overridden by `SKETCHWIRE_*` environment variables.
    ///
    /// # Errors
    /// Returns [`SketchwireError::Config`] if a numeric variable does not
    /// parse.
    pub fn from_env() -> Result<Self, SketchwireError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env), reading variables through
    /// `lookup`.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, SketchwireError> {
        let mut config = Self::default();

        if let Some(addr) = lookup(ENV_ADDR) {
            config.bind_addr = addr;
        }
        if let Some(secs) = lookup(ENV_ROUND_SECS) {
            let secs = parse_secs(ENV_ROUND_SECS, &secs)?;
            if secs == 0 {
                return Err(SketchwireError::Config {
                    key: ENV_ROUND_SECS,
                    value: "0".into(),
                });
            }
            config.room.round_duration = Duration::from_secs(secs);
        }
        if let Some(secs) = lookup(ENV_INTERMISSION_SECS) {
            config.intermission = match parse_secs(ENV_INTERMISSION_SECS, &secs)? {
                0 => None,
                n => Some(Duration::from_secs(n)),
            };
        }
        Ok(config)
    }
}

fn parse_secs(key: &'static str, raw: &str) -> Result<u64, SketchwireError> {
    raw.trim().parse().map_err(|_| SketchwireError::Config {
        key,
        value: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.room.round_duration, Duration::from_secs(80));
        assert_eq!(config.idle_timeout, Duration::from_secs(120));
        assert_eq!(config.intermission, Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_no_variables_gives_defaults() {
        let config = ServerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.bind_addr, "127.0.0.1:8080");
    }

    #[test]
    fn test_variables_override() {
        let config = ServerConfig::from_lookup(lookup(&[
            (ENV_ADDR, "0.0.0.0:9000"),
            (ENV_ROUND_SECS, "60"),
            (ENV_INTERMISSION_SECS, "0"),
        ]))
        .unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:9000");
        assert_eq!(config.room.round_duration, Duration::from_secs(60));
        assert_eq!(config.intermission, None);
    }

    #[test]
    fn test_bad_number_is_reported() {
        let err = ServerConfig::from_lookup(lookup(&[(ENV_ROUND_SECS, "soon")])).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid value for SKETCHWIRE_ROUND_SECS: \"soon\""
        );
    }

    #[test]
    fn test_zero_round_rejected() {
        assert!(ServerConfig::from_lookup(lookup(&[(ENV_ROUND_SECS, "0")])).is_err());
    }
}
