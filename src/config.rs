use log::warn;
use std::env;
use std::path::PathBuf;

use crate::fairness::DEFAULT_CHAIN_LENGTH;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 5000;

/// Runtime settings, read from the environment (and `.env` via dotenvy).
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub chain_length: usize,
    /// JSON-lines file mirroring crashed rounds; memory only when unset.
    pub history_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            chain_length: DEFAULT_CHAIN_LENGTH,
            history_file: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup. Bad values fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let host = lookup("HOST")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or(defaults.host);
        let port = parse_or("PORT", lookup("PORT"), defaults.port);
        let chain_length = parse_or("CHAIN_LENGTH", lookup("CHAIN_LENGTH"), defaults.chain_length);
        let chain_length = match chain_length {
            0 => {
                warn!("CHAIN_LENGTH must be at least 1, using {DEFAULT_CHAIN_LENGTH}");
                DEFAULT_CHAIN_LENGTH
            }
            n => n,
        };
        let history_file = lookup("HISTORY_FILE")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);

        Self {
            host,
            port,
            chain_length,
            history_file,
        }
    }
}

fn parse_or<T>(key: &str, raw: Option<String>, default: T) -> T
where
    T: std::str::FromStr + std::fmt::Display,
{
    match raw {
        None => default,
        Some(v) => v.trim().parse().unwrap_or_else(|_| {
            warn!("{key}={v:?} is not valid, using {default}");
            default
        }),
    }
}
