#![deny(missing_docs)]
//! A module for store engines.
//!
//! An engine performs the primitive store commands the
//! [`crate::KvClient`] is built from. Engines report faults as
//! [`crate::WojakError`]; turning them into status codes is the client's job.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, PoisonError};

use redis::{Commands, Connection};
use url::Url;

use crate::config::RedisConfig;
use crate::error::{Result, WojakError};

/// Fields of a structured record.
pub type Record = BTreeMap<String, String>;

/// A trait for key-value store engines.
pub trait StoreEngine: Clone + Send + 'static {
    /// Read `key` as a plain string (`GET`).
    fn get_scalar(&self, key: &str) -> Result<Option<String>>;

    /// Read `key` as a record (`HGETALL`). An absent key reads as empty.
    fn get_record(&self, key: &str) -> Result<Record>;

    /// Write a plain string, replacing whatever `key` held (`SET`).
    fn set_scalar(&self, key: &str, value: &str) -> Result<()>;

    /// Write fields into the record at `key` (`HSET`). Existing fields that are
    /// not named are kept, as the store does natively. Empty `fields` are
    /// rejected with [`WojakError::EmptyRecord`] and nothing is written.
    fn set_record(&self, key: &str, fields: &Record) -> Result<()>;

    /// Remove `key` and return how many entries were removed (`DEL`).
    fn delete(&self, key: &str) -> Result<u64>;
}

/// Engine talking to a Redis compatible server.
///
/// Every call opens its own connection and drops it afterwards.
#[derive(Clone)]
pub struct RedisEngine {
    client: redis::Client,
    config: RedisConfig,
}

impl RedisEngine {
    /// Create an engine for the server described by `config`.
    ///
    /// No connection is made until the first command.
    pub fn open(config: &RedisConfig) -> Result<Self> {
        let client = redis::Client::open(Self::connection_url(config)?.as_str())?;
        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    fn connection_url(config: &RedisConfig) -> Result<Url> {
        let mut url = Url::parse(&format!("redis://{}:{}", config.host, config.port))?;
        url.set_path(&config.db.to_string());
        if let Some(password) = &config.password {
            url.set_password(Some(password)).map_err(|_| WojakError::Config {
                var: "REDIS_PASSWORD".to_string(),
                message: "cannot be carried in a connection url".to_string(),
            })?;
        }
        Ok(url)
    }

    fn connection(&self) -> Result<Connection> {
        let timeout = self.config.timeout;
        let con = self.client.get_connection_with_timeout(timeout)?;
        con.set_read_timeout(Some(timeout))?;
        con.set_write_timeout(Some(timeout))?;
        Ok(con)
    }
}

impl StoreEngine for RedisEngine {
    fn get_scalar(&self, key: &str) -> Result<Option<String>> {
        Ok(self.connection()?.get(key)?)
    }

    fn get_record(&self, key: &str) -> Result<Record> {
        Ok(self.connection()?.hgetall(key)?)
    }

    fn set_scalar(&self, key: &str, value: &str) -> Result<()> {
        let _: () = self.connection()?.set(key, value)?;
        Ok(())
    }

    fn set_record(&self, key: &str, fields: &Record) -> Result<()> {
        if fields.is_empty() {
            return Err(WojakError::EmptyRecord(key.to_string()));
        }
        let items: Vec<(&str, &str)> = fields
            .iter()
            .map(|(field, value)| (field.as_str(), value.as_str()))
            .collect();
        let _: () = self.connection()?.hset_multiple(key, items.as_slice())?;
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<u64> {
        Ok(self.connection()?.del(key)?)
    }
}

#[derive(Debug, Clone)]
enum Entry {
    Scalar(String),
    Record(Record),
}

/// In-process engine with the same type rules as Redis.
///
/// Clones share the same data.
#[derive(Clone, Default)]
pub struct MemoryEngine {
    inner: Arc<Mutex<HashMap<String, Entry>>>,
}

impl MemoryEngine {
    /// Create an empty memory engine.
    pub fn new() -> Self {
        Self::default()
    }

    fn with_entries<R>(&self, f: impl FnOnce(&mut HashMap<String, Entry>) -> R) -> R {
        let mut entries = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut entries)
    }
}

impl StoreEngine for MemoryEngine {
    fn get_scalar(&self, key: &str) -> Result<Option<String>> {
        self.with_entries(|entries| match entries.get(key) {
            None => Ok(None),
            Some(Entry::Scalar(value)) => Ok(Some(value.clone())),
            Some(Entry::Record(_)) => Err(WojakError::WrongType(key.to_string())),
        })
    }

    fn get_record(&self, key: &str) -> Result<Record> {
        self.with_entries(|entries| match entries.get(key) {
            None => Ok(Record::new()),
            Some(Entry::Record(fields)) => Ok(fields.clone()),
            Some(Entry::Scalar(_)) => Err(WojakError::WrongType(key.to_string())),
        })
    }

    fn set_scalar(&self, key: &str, value: &str) -> Result<()> {
        self.with_entries(|entries| {
            entries.insert(key.to_string(), Entry::Scalar(value.to_string()));
            Ok(())
        })
    }

    fn set_record(&self, key: &str, fields: &Record) -> Result<()> {
        if fields.is_empty() {
            return Err(WojakError::EmptyRecord(key.to_string()));
        }
        self.with_entries(|entries| {
            match entries
                .entry(key.to_string())
                .or_insert_with(|| Entry::Record(Record::new()))
            {
                Entry::Record(existing) => {
                    existing.extend(fields.iter().map(|(k, v)| (k.clone(), v.clone())));
                    Ok(())
                }
                Entry::Scalar(_) => Err(WojakError::WrongType(key.to_string())),
            }
        })
    }

    fn delete(&self, key: &str) -> Result<u64> {
        self.with_entries(|entries| Ok(u64::from(entries.remove(key).is_some())))
    }
}
