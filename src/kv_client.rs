//! Key-value client with whole-value replacement semantics.
//!
//! Values are stored either as a plain string or as a flat record of string
//! fields. Unlike the store's native hash update, writing a record always
//! replaces the previous value: the key is deleted first and the full record
//! written afterwards. The two steps are not atomic, so a concurrent reader may
//! briefly see the key missing.
//!
//! ```no_run
//! use wojak::{KvClient, RedisConfig, StoredValue};
//!
//! let client = KvClient::connect(&RedisConfig::default()).unwrap();
//! client.set("foo", StoredValue::scalar("bar"));
//! assert_eq!(client.get("foo").into_content(), Some(StoredValue::scalar("bar")));
//! ```

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::config::RedisConfig;
use crate::engine::{Record, RedisEngine, StoreEngine};
use crate::error::{Result, WojakError};
use crate::response::Response;
use crate::status::StatusCode;

/// A value as the key-value client stores it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoredValue {
    /// Plain string entry.
    Scalar(String),
    /// Flat mapping of field names to values.
    Record(Record),
}

impl StoredValue {
    pub fn scalar(value: impl Into<String>) -> Self {
        StoredValue::Scalar(value.into())
    }

    /// Build a record from `(field, value)` pairs.
    pub fn record<K, V>(fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        StoredValue::Record(
            fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Reduce a serializable struct or map to a flat record.
    ///
    /// String fields are kept as they are, numbers and booleans are written in
    /// their JSON form. Nested, list or null fields are rejected.
    pub fn record_from<T: Serialize>(value: &T) -> Result<Self> {
        let object = match serde_json::to_value(value)? {
            serde_json::Value::Object(object) => object,
            other => {
                return Err(WojakError::UnsupportedField(format!(
                    "<root> ({})",
                    json_kind(&other)
                )));
            }
        };
        let mut record = Record::new();
        for (field, value) in object {
            let value = match value {
                serde_json::Value::String(s) => s,
                serde_json::Value::Number(n) => n.to_string(),
                serde_json::Value::Bool(b) => b.to_string(),
                other => {
                    return Err(WojakError::UnsupportedField(format!(
                        "{field} ({})",
                        json_kind(&other)
                    )));
                }
            };
            record.insert(field, value);
        }
        Ok(StoredValue::Record(record))
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

impl From<String> for StoredValue {
    fn from(value: String) -> Self {
        StoredValue::Scalar(value)
    }
}

impl From<&str> for StoredValue {
    fn from(value: &str) -> Self {
        StoredValue::Scalar(value.to_string())
    }
}

impl From<Record> for StoredValue {
    fn from(fields: Record) -> Self {
        StoredValue::Record(fields)
    }
}

fn store_fault<T>(error: WojakError) -> Response<T> {
    Response::failure(
        format!("Unexpected store error. Ex = {error}"),
        StatusCode::StoreError,
    )
}

/// Key-value client over a [`StoreEngine`].
#[derive(Clone)]
pub struct KvClient<E: StoreEngine> {
    engine: E,
}

impl KvClient<RedisEngine> {
    /// Client for the Redis server described by `config`.
    pub fn connect(config: &RedisConfig) -> Result<Self> {
        Ok(Self::new(RedisEngine::open(config)?))
    }
}

impl<E: StoreEngine> KvClient<E> {
    pub fn new(engine: E) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Store `value` under `key`, replacing whatever was there.
    ///
    /// A record is never merged with a previous record under the same key.
    /// An empty record cannot be stored: the previous value is still removed
    /// and the call fails with [`StatusCode::StoreError`].
    pub fn set(&self, key: &str, value: impl Into<StoredValue>) -> Response<StoredValue> {
        let value = value.into();
        let written = match &value {
            StoredValue::Scalar(scalar) => self.engine.set_scalar(key, scalar),
            StoredValue::Record(fields) => self.replace_record(key, fields),
        };
        match written {
            Ok(()) => {
                debug!("Stored key {key}");
                Response::ok(value)
            }
            Err(e) => {
                warn!("Error setting key {key}: {e}");
                store_fault(e)
            }
        }
    }

    fn replace_record(&self, key: &str, fields: &Record) -> Result<()> {
        self.engine.delete(key)?;
        if fields.is_empty() {
            return Err(WojakError::EmptyRecord(key.to_string()));
        }
        self.engine.set_record(key, fields)
    }

    /// Read `key` in whichever representation it was stored.
    ///
    /// Store faults while probing are logged and read as absence, so a failing
    /// store shows up as [`StatusCode::ItemNotFound`].
    pub fn get(&self, key: &str) -> Response<StoredValue> {
        match self.engine.get_scalar(key) {
            Ok(Some(scalar)) if !scalar.is_empty() => {
                return Response::ok(StoredValue::Scalar(scalar));
            }
            Ok(_) => {}
            Err(e) => warn!("Error probing key {key} as string: {e}"),
        }
        match self.engine.get_record(key) {
            Ok(fields) if !fields.is_empty() => {
                return Response::ok(StoredValue::Record(fields));
            }
            Ok(_) => {}
            Err(e) => warn!("Error probing key {key} as record: {e}"),
        }
        Response::failure(
            format!("Item for key {key} was not found."),
            StatusCode::ItemNotFound,
        )
    }

    /// Remove `key`. Returns the key on success.
    pub fn delete(&self, key: &str) -> Response<String> {
        match self.engine.delete(key) {
            Ok(0) => Response::failure(
                format!("Could not delete item for key {key}. Item not found."),
                StatusCode::ItemNotFound,
            ),
            Ok(_) => Response::ok(key.to_string()),
            Err(e) => {
                warn!("Error removing key {key}: {e}");
                store_fault(e)
            }
        }
    }
}
