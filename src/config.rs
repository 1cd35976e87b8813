//! Server configuration
//!
//! Values come from `ServerConfig::default()` and can be overridden through
//! environment variables:
//!
//! - `DIAGRAM_SYNC_BIND` - listen address (default `0.0.0.0:3001`)
//! - `DIAGRAM_SYNC_ROOM_CAPACITY` - relay messages buffered per room before a
//!   slow receiver is resynchronized with a snapshot (default 1024)
//! - `DIAGRAM_SYNC_MAX_USERNAME` - usernames longer than this many characters
//!   are truncated (default 64)

use std::env;
use std::net::SocketAddr;
use std::str::FromStr;

use crate::room::DEFAULT_ROOM_CAPACITY;

pub const ENV_BIND: &str = "DIAGRAM_SYNC_BIND";
pub const ENV_ROOM_CAPACITY: &str = "DIAGRAM_SYNC_ROOM_CAPACITY";
pub const ENV_MAX_USERNAME: &str = "DIAGRAM_SYNC_MAX_USERNAME";

/// Server configuration options
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to
    pub bind_addr: SocketAddr,

    /// Relay channel capacity per room
    pub room_channel_capacity: usize,

    /// Maximum username length in characters
    pub max_username_len: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3001)),
            room_channel_capacity: DEFAULT_ROOM_CAPACITY,
            max_username_len: 64,
        }
    }
}

impl ServerConfig {
    /// Defaults overridden by any `DIAGRAM_SYNC_*` environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup (environment, test maps, ...)
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            bind_addr: parse_or(&lookup, ENV_BIND, defaults.bind_addr),
            room_channel_capacity: parse_or(&lookup, ENV_ROOM_CAPACITY, defaults.room_channel_capacity)
                .max(1),
            max_username_len: parse_or(&lookup, ENV_MAX_USERNAME, defaults.max_username_len).max(1),
        }
    }

    pub fn with_bind_addr(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    pub fn with_room_channel_capacity(mut self, capacity: usize) -> Self {
        self.room_channel_capacity = capacity.max(1);
        self
    }

    pub fn with_max_username_len(mut self, len: usize) -> Self {
        self.max_username_len = len.max(1);
        self
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr + std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!(key, value = %raw, fallback = %default, "Invalid config value, using default");
                default
            }
        },
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::from_lookup(lookup(&[]));
        assert_eq!(config.bind_addr.port(), 3001);
        assert_eq!(config.room_channel_capacity, 1024);
        assert_eq!(config.max_username_len, 64);
    }

    #[test]
    fn test_overrides() {
        let config = ServerConfig::from_lookup(lookup(&[
            (ENV_BIND, "127.0.0.1:9000"),
            (ENV_ROOM_CAPACITY, "32"),
            (ENV_MAX_USERNAME, " 12 "),
        ]));
        assert_eq!(config.bind_addr, "127.0.0.1:9000".parse().unwrap());
        assert_eq!(config.room_channel_capacity, 32);
        assert_eq!(config.max_username_len, 12);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = ServerConfig::from_lookup(lookup(&[
            (ENV_BIND, "not an address"),
            (ENV_ROOM_CAPACITY, "-5"),
            (ENV_MAX_USERNAME, "0"),
        ]));
        assert_eq!(config.bind_addr.port(), 3001);
        assert_eq!(config.room_channel_capacity, 1024);
        // Zero parses but is clamped
        assert_eq!(config.max_username_len, 1);
    }
}
