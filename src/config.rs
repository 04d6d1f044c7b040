//! Server configuration from environment variables
//!
//! - `BUZZER_HOST`: bind address (default `127.0.0.1`)
//! - `BUZZER_PORT`: listen port (default `8080`, what the clients dial)
//! - `BUZZER_MAX_NAME_CHARS`: longest accepted player name (default `64`)

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_MAX_NAME_CHARS: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{var}={value:?} is not a valid {expected}")]
    Invalid {
        var: &'static str,
        value: String,
        expected: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub max_name_chars: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), DEFAULT_PORT),
            max_name_chars: DEFAULT_MAX_NAME_CHARS,
        }
    }
}

impl ServerConfig {
    /// Load config from the process environment.
    /// Invalid values are logged and replaced by their defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let host = read_var(&lookup, "BUZZER_HOST", "IP address", defaults.bind_addr.ip());
        let port = read_var(&lookup, "BUZZER_PORT", "port number", defaults.bind_addr.port());
        let max_name_chars = match read_var(
            &lookup,
            "BUZZER_MAX_NAME_CHARS",
            "character count",
            defaults.max_name_chars,
        ) {
            0 => {
                tracing::warn!("BUZZER_MAX_NAME_CHARS must be positive, using default");
                defaults.max_name_chars
            }
            n => n,
        };

        Self {
            bind_addr: SocketAddr::new(host, port),
            max_name_chars,
        }
    }
}

fn read_var<F, T>(lookup: &F, var: &'static str, expected: &'static str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match parse_var(lookup, var, expected) {
        Ok(Some(value)) => value,
        Ok(None) => default,
        Err(e) => {
            tracing::warn!("{}, using default", e);
            default
        }
    }
}

fn parse_var<F, T>(lookup: &F, var: &'static str, expected: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    let Some(raw) = lookup(var).map(|s| s.trim().to_string()).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    raw.parse::<T>().map(Some).map_err(|_| ConfigError::Invalid {
        var,
        value: raw,
        expected,
    })
}
