//! Error
//!
//! This module provides the errors raised underneath the [`crate::Response`]
//! boundary with [`thiserror`]. Store engines and configuration loaders return
//! them; the clients turn them into status codes before a caller sees them.
//!
use thiserror::Error;

/// Result use the [`WojakError`] as error.
pub type Result<T> = std::result::Result<T, WojakError>;

/// WojakError is the specific error for engines, configs and value conversion.
#[derive(Error, Debug)]
pub enum WojakError {
    #[error("serde error {0}")]
    /// Serialized or Deserialized errors
    SerdeError(#[from] serde_json::Error),

    #[error("redis error {0}")]
    /// Errors reported by the redis driver
    RedisError(#[from] redis::RedisError),

    #[error("url error {0}")]
    /// Connection url could not be assembled
    UrlError(#[from] url::ParseError),

    /// Operation against a key holding the wrong kind of value
    #[error("WRONGTYPE operation against key {0} holding the wrong kind of value")]
    WrongType(String),

    /// Record write without any fields; the store cannot hold an empty record
    #[error("record for key {0} has no fields")]
    EmptyRecord(String),

    /// A field that cannot live in a flat record
    #[error("field {0} is not a string, number or bool and cannot be stored in a record")]
    UnsupportedField(String),

    /// Bad configuration value
    #[error("invalid value for {var}: {message}")]
    Config {
        /// Environment variable the value came from.
        var: String,
        /// What went wrong while parsing it.
        message: String,
    },
}
