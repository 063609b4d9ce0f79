use std::env;
use std::ops::RangeInclusive;

use log::warn;
use thiserror::Error;

pub const DEFAULT_SESSION_SECRET: &str = "dev_secret_change_me";

/// bcrypt rejects costs outside this range at hashing time.
pub const BCRYPT_COST_RANGE: RangeInclusive<u32> = 4..=31;
/// Ten years. Keeps the session lifetime well inside what `chrono::Duration` can hold.
pub const SESSION_TTL_HOURS_RANGE: RangeInclusive<i64> = 1..=24 * 365 * 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("URI (or MONGO_URI) must be set when STORE=mongo")]
    MissingUri,
    #[error("{name} has an invalid value: {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// Which backing store the server talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Mongo,
    Memory,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub store: StoreKind,
    pub mongo_uri: String,
    pub database_name: String,
    pub port: u16,
    pub session_secret: String,
    pub session_ttl_hours: i64,
    pub auth_enabled: bool,
    pub bcrypt_cost: u32,
    pub frontend_origin: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store: StoreKind::Memory,
            mongo_uri: String::new(),
            database_name: "tasker".to_string(),
            port: 3000,
            session_secret: DEFAULT_SESSION_SECRET.to_string(),
            session_ttl_hours: 24,
            auth_enabled: true,
            bcrypt_cost: 10,
            frontend_origin: "http://localhost:3000".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        let defaults = Self::default();

        let store = match env::var("STORE").as_deref() {
            Err(_) | Ok("mongo") => StoreKind::Mongo,
            Ok("memory") => StoreKind::Memory,
            Ok(other) => {
                return Err(ConfigError::Invalid {
                    name: "STORE",
                    value: other.to_string(),
                })
            }
        };

        let mongo_uri = env::var("URI")
            .or_else(|_| env::var("MONGO_URI"))
            .unwrap_or_default();
        if store == StoreKind::Mongo && mongo_uri.is_empty() {
            return Err(ConfigError::MissingUri);
        }

        let session_secret =
            env::var("SESSION_SECRET").unwrap_or_else(|_| DEFAULT_SESSION_SECRET.to_string());
        if session_secret == DEFAULT_SESSION_SECRET {
            warn!("SESSION_SECRET is not set, using the development default");
        }

        let config = Self {
            store,
            mongo_uri,
            database_name: env::var("DATABASE_NAME").unwrap_or(defaults.database_name),
            port: parse_var("PORT", defaults.port)?,
            session_secret,
            session_ttl_hours: parse_var("SESSION_TTL_HOURS", defaults.session_ttl_hours)?,
            auth_enabled: parse_var("AUTH_ENABLED", defaults.auth_enabled)?,
            bcrypt_cost: parse_var("BCRYPT_COST", defaults.bcrypt_cost)?,
            frontend_origin: env::var("FRONTEND_ORIGIN").unwrap_or(defaults.frontend_origin),
        };
        config.validate()?;
        Ok(config)
    }

    /// Rejects values that parse but would break the server once it is running.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !BCRYPT_COST_RANGE.contains(&self.bcrypt_cost) {
            return Err(ConfigError::Invalid {
                name: "BCRYPT_COST",
                value: self.bcrypt_cost.to_string(),
            });
        }
        if !SESSION_TTL_HOURS_RANGE.contains(&self.session_ttl_hours) {
            return Err(ConfigError::Invalid {
                name: "SESSION_TTL_HOURS",
                value: self.session_ttl_hours.to_string(),
            });
        }
        Ok(())
    }
}

fn parse_var<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        Err(_) => Ok(default),
    }
}
