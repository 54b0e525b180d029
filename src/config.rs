//! Runtime configuration read from environment variables.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use chrono_tz::Tz;
use thiserror::Error;

use crate::store::DEFAULT_DB_PATH;

const DEV_SECRET: &str = "dev-secret-change-me";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} has an invalid value {value:?}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("{var} must be set in release builds")]
    Missing { var: &'static str },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub db_path: PathBuf,
    pub static_dir: PathBuf,
    pub jwt_secret: String,
    pub token_ttl_days: i64,
    pub remember_ttl_days: i64,
    /// Zone used for hour/weekday/date questions when a request names none
    pub timezone: Tz,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            host: IpAddr::from([127, 0, 0, 1]),
            port: 3000,
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            static_dir: PathBuf::from("static"),
            jwt_secret: DEV_SECRET.to_string(),
            token_ttl_days: 7,
            remember_ttl_days: 30,
            timezone: chrono_tz::UTC,
        }
    }
}

fn parse<T>(var: &'static str, value: String) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let parsed: Result<T, T::Err> = value.trim().parse();
    parsed.map_err(|e| ConfigError::Invalid {
        var,
        reason: e.to_string(),
        value,
    })
}

fn positive_days(var: &'static str, value: String) -> Result<i64, ConfigError> {
    let days: i64 = parse(var, value.clone())?;
    if days <= 0 {
        return Err(ConfigError::Invalid {
            var,
            value,
            reason: "must be at least one day".to_string(),
        });
    }
    Ok(days)
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key lookup; unset keys keep their defaults.
    ///
    /// Release builds refuse to fall back to the development JWT secret.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Self::from_lookup_with(lookup, !cfg!(debug_assertions))
    }

    fn from_lookup_with(
        lookup: impl Fn(&str) -> Option<String>,
        require_secret: bool,
    ) -> Result<Self, ConfigError> {
        let mut config = Config::default();

        if let Some(v) = lookup("HOST") {
            config.host = parse("HOST", v)?;
        }
        if let Some(v) = lookup("PORT") {
            config.port = parse("PORT", v)?;
        }
        if let Some(v) = lookup("DB_PATH") {
            config.db_path = PathBuf::from(v);
        }
        if let Some(v) = lookup("STATIC_DIR") {
            config.static_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("JWT_SECRET") {
            if v.is_empty() {
                return Err(ConfigError::Invalid {
                    var: "JWT_SECRET",
                    value: v,
                    reason: "must not be empty".to_string(),
                });
            }
            config.jwt_secret = v;
        } else if require_secret {
            return Err(ConfigError::Missing { var: "JWT_SECRET" });
        } else {
            tracing::warn!("JWT_SECRET is not set, using the development secret");
        }
        if let Some(v) = lookup("TOKEN_TTL_DAYS") {
            config.token_ttl_days = positive_days("TOKEN_TTL_DAYS", v)?;
        }
        if let Some(v) = lookup("REMEMBER_TTL_DAYS") {
            config.remember_ttl_days = positive_days("REMEMBER_TTL_DAYS", v)?;
        }
        if let Some(v) = lookup("TIMEZONE") {
            config.timezone = parse("TIMEZONE", v)?;
        }

        Ok(config)
    }

    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}
