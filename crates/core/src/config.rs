//! Station configuration loaded from environment variables.
//!
//! All fields have defaults suitable for a single-laptop setup. Override
//! them through the environment (or a `.env` file loaded by the binary).
//!
//! | Env Var                  | Default                                   |
//! |--------------------------|-------------------------------------------|
//! | `DATABASE_URL`           | built from the `DB_*` variables below     |
//! | `DB_HOST`                | `127.0.0.1`                               |
//! | `DB_PORT`                | `5432`                                    |
//! | `DB_NAME`                | `photon`                                  |
//! | `DB_USER`                | `student`                                 |
//! | `DB_PASSWORD`            | `student`                                 |
//! | `DB_MAX_CONNECTIONS`     | `5`                                       |
//! | `UDP_TARGET_IP`          | `127.0.0.1`                               |
//! | `UDP_SEND_PORT`          | `7500`                                    |
//! | `UDP_RECEIVE_PORT`       | `7501`                                    |
//! | `UDP_BIND_IP`            | `0.0.0.0`                                 |
//! | `INBOUND_QUEUE_CAPACITY` | `64`                                      |
//! | `SPLASH_MS`              | `3000`                                    |
//! | `PHOTON_OFFLINE`         | `false`                                   |

use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;
use std::time::Duration;

use crate::error::CoreError;

pub const DEFAULT_SEND_PORT: u16 = 7500;
pub const DEFAULT_RECEIVE_PORT: u16 = 7501;
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_QUEUE_CAPACITY: usize = 64;
const DEFAULT_SPLASH_MS: u64 = 3000;

/// PostgreSQL connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

/// UDP addressing. Only `target_ip` changes at runtime, and that happens on
/// the channel that was built from this value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UdpConfig {
    pub target_ip: IpAddr,
    pub send_port: u16,
    pub receive_port: u16,
    /// Interface the receive socket binds to.
    pub bind_ip: IpAddr,
}

impl Default for UdpConfig {
    fn default() -> Self {
        Self {
            target_ip: IpAddr::V4(Ipv4Addr::LOCALHOST),
            send_port: DEFAULT_SEND_PORT,
            receive_port: DEFAULT_RECEIVE_PORT,
            bind_ip: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StationConfig {
    pub database: DatabaseConfig,
    pub udp: UdpConfig,
    /// Bound on buffered inbound datagrams awaiting the console loop.
    pub inbound_queue_capacity: usize,
    pub splash: Duration,
    /// Use the in-memory player store instead of PostgreSQL.
    pub offline: bool,
}

impl StationConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CoreError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let url = match lookup("DATABASE_URL") {
            Some(url) => url,
            None => format!(
                "postgres://{}:{}@{}:{}/{}",
                get("DB_USER", "student"),
                get("DB_PASSWORD", "student"),
                get("DB_HOST", "127.0.0.1"),
                parse_var::<u16>("DB_PORT", &get("DB_PORT", "5432"))?,
                get("DB_NAME", "photon"),
            ),
        };

        let database = DatabaseConfig {
            url,
            max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)?,
        };

        let defaults = UdpConfig::default();
        let udp = UdpConfig {
            target_ip: parse_or(&lookup, "UDP_TARGET_IP", defaults.target_ip)?,
            send_port: parse_or(&lookup, "UDP_SEND_PORT", defaults.send_port)?,
            receive_port: parse_or(&lookup, "UDP_RECEIVE_PORT", defaults.receive_port)?,
            bind_ip: parse_or(&lookup, "UDP_BIND_IP", defaults.bind_ip)?,
        };

        let inbound_queue_capacity =
            parse_or(&lookup, "INBOUND_QUEUE_CAPACITY", DEFAULT_QUEUE_CAPACITY)?;
        if inbound_queue_capacity == 0 {
            return Err(CoreError::Config(
                "INBOUND_QUEUE_CAPACITY must be greater than zero".to_string(),
            ));
        }

        let splash = Duration::from_millis(parse_or(&lookup, "SPLASH_MS", DEFAULT_SPLASH_MS)?);

        let offline = match lookup("PHOTON_OFFLINE") {
            Some(v) => parse_flag(&v),
            None => false,
        };

        Ok(Self {
            database,
            udp,
            inbound_queue_capacity,
            splash,
            offline,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, CoreError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => parse_var(key, &raw),
        None => Ok(default),
    }
}

fn parse_var<T: FromStr>(key: &str, raw: &str) -> Result<T, CoreError> {
    raw.trim()
        .parse()
        .map_err(|_| CoreError::Config(format!("{key} has an invalid value: '{raw}'")))
}

fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
