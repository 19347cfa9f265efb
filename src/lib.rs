//! # wojak
//!
//! Thin clients for an HTTP endpoint and a Redis compatible store that report
//! every outcome through one [`Response`] type instead of raw errors.

pub mod config;

pub mod engine;

pub mod error;

pub mod http_client;

pub mod kv_client;

pub mod multi_map;

pub mod response;

pub mod status;

pub use crate::config::{HttpConfig, RedisConfig};
pub use crate::engine::{MemoryEngine, Record, RedisEngine, StoreEngine};
pub use crate::error::{Result, WojakError};
pub use crate::http_client::{HttpResponse, RequestBuilder};
pub use crate::kv_client::{KvClient, StoredValue};
pub use crate::multi_map::{MultiMap, MultiValue};
pub use crate::response::{Failure, Response};
pub use crate::status::StatusCode;
