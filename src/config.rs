//! Connection settings for the clients.
//!
//! Each config can be built directly from [`Default`] or read from
//! environment variables named `<PREFIX><FIELD>`, e.g. `REDIS_HOST`.

use std::str::FromStr;
use std::time::Duration;

use crate::error::{Result, WojakError};

/// Timeout used when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(1000);

/// Reads prefixed variables through a lookup function.
struct EnvReader<F> {
    prefix: &'static str,
    lookup: F,
}

impl<F> EnvReader<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn var_name(&self, field: &str) -> String {
        format!("{}{}", self.prefix, field.to_uppercase())
    }

    fn raw(&self, field: &str) -> Option<(String, String)> {
        let var = self.var_name(field);
        (self.lookup)(&var).map(|value| (var, value))
    }

    fn string(&self, field: &str, default: &str) -> String {
        self.raw(field)
            .map(|(_, value)| value)
            .unwrap_or_else(|| default.to_string())
    }

    /// The literal `None` reads as absent.
    fn optional_string(&self, field: &str) -> Option<String> {
        self.raw(field)
            .map(|(_, value)| value)
            .filter(|value| value != "None")
    }

    fn parse<T>(&self, field: &str, default: T) -> Result<T>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.raw(field) {
            None => Ok(default),
            Some((var, value)) => value.trim().parse().map_err(|e: T::Err| WojakError::Config {
                var,
                message: format!("{value:?}: {e}"),
            }),
        }
    }

    fn millis(&self, field: &str, default: Duration) -> Result<Duration> {
        let ms = self.parse(field, default.as_millis() as u64)?;
        Ok(Duration::from_millis(ms))
    }
}

/// Connection parameters for [`crate::RedisEngine`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedisConfig {
    pub host: String,
    pub port: u16,
    pub password: Option<String>,
    pub db: i64,
    /// Applied to connect, read and write.
    pub timeout: Duration,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 6379,
            password: None,
            db: 0,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl RedisConfig {
    /// Variable prefix, derived from the component name.
    pub const PREFIX: &'static str = "REDIS_";

    /// Read `REDIS_HOST`, `REDIS_PORT`, `REDIS_PASSWORD`, `REDIS_DB` and
    /// `REDIS_TIMEOUT_MS` from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Like [`RedisConfig::from_env`] with a custom variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let reader = EnvReader {
            prefix: Self::PREFIX,
            lookup,
        };
        let default = Self::default();
        Ok(Self {
            host: reader.string("host", &default.host),
            port: reader.parse("port", default.port)?,
            password: reader.optional_string("password"),
            db: reader.parse("db", default.db)?,
            timeout: reader.millis("timeout_ms", default.timeout)?,
        })
    }
}

/// Defaults for [`crate::RequestBuilder::from_config`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl HttpConfig {
    pub const PREFIX: &'static str = "HTTP_";

    /// Read `HTTP_BASE_URL` and `HTTP_TIMEOUT_MS` from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let reader = EnvReader {
            prefix: Self::PREFIX,
            lookup,
        };
        let default = Self::default();
        Ok(Self {
            base_url: reader.string("base_url", &default.base_url),
            timeout: reader.millis("timeout_ms", default.timeout)?,
        })
    }
}
