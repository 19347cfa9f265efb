//! Builder-style HTTP client that never returns a raw transport error.
//!
//! Every outcome of a dispatch, including timeouts, refused connections and
//! non-2xx replies, comes back as a [`Response`] holding the raw body on
//! success.
//!
//! ```no_run
//! use wojak::RequestBuilder;
//!
//! let response = RequestBuilder::new()
//!     .with_base("https://httpbin.org/")
//!     .append_path("/post")
//!     .with_header("X-Trace", "1")
//!     .with_json_body(&serde_json::json!({"a": "b"}))
//!     .unwrap()
//!     .execute_post()
//!     .as_json();
//! assert!(response.is_ok());
//! ```

use std::error::Error as _;
use std::io;
use std::time::Duration;

use log::{debug, warn};
use reqwest::Method;
use reqwest::blocking::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::config::{DEFAULT_TIMEOUT, HttpConfig};
use crate::multi_map::MultiMap;
use crate::response::Response;
use crate::status::StatusCode;

/// Result of a dispatched request: the raw body on success.
pub type HttpResponse = Response<Vec<u8>>;

/// Accumulates a request and dispatches it once.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    url: String,
    timeout: Duration,
    headers: MultiMap,
    params: MultiMap,
    body: Option<String>,
    json_body: bool,
    client: Option<Client>,
}

impl Default for RequestBuilder {
    fn default() -> Self {
        Self {
            url: String::new(),
            timeout: DEFAULT_TIMEOUT,
            headers: MultiMap::new(),
            params: MultiMap::new(),
            body: None,
            json_body: false,
            client: None,
        }
    }
}

impl RequestBuilder {
    /// Empty request with the default one second timeout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request using the base url and timeout from `config`.
    pub fn from_config(config: &HttpConfig) -> Self {
        Self::new()
            .with_base(config.base_url.clone())
            .with_timeout(config.timeout)
    }

    /// Set the request target, e.g. `http://127.0.0.1:8011/api/v1`.
    pub fn with_base(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Append `segment` to the target. A `/` on both sides of the join is
    /// collapsed into one.
    pub fn append_path(mut self, segment: &str) -> Self {
        let segment = match segment.strip_prefix('/') {
            Some(rest) if self.url.ends_with('/') => rest,
            _ => segment,
        };
        self.url.push_str(segment);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Add a header. Repeating a key sends every value.
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key, value);
        self
    }

    /// Add a query parameter. Repeating a key sends every value.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key, value);
        self
    }

    /// Use `body` as the raw request body.
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self.json_body = false;
        self
    }

    /// Use the JSON text of `value` as the request body.
    ///
    /// Serialization errors are returned to the caller as they are; they are
    /// not turned into a [`Response`].
    pub fn with_json_body<T: Serialize + ?Sized>(
        mut self,
        value: &T,
    ) -> Result<Self, serde_json::Error> {
        self.body = Some(serde_json::to_string(value)?);
        self.json_body = true;
        Ok(self)
    }

    /// Dispatch through `client` instead of a freshly built one.
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn headers(&self) -> &MultiMap {
        &self.headers
    }

    pub fn params(&self) -> &MultiMap {
        &self.params
    }

    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    pub fn execute_get(self) -> HttpResponse {
        self.execute(Method::GET)
    }

    pub fn execute_post(self) -> HttpResponse {
        self.execute(Method::POST)
    }

    fn execute(self, method: Method) -> HttpResponse {
        debug!("{method} {}", self.url);
        match self.send(method) {
            Ok(response) => response,
            Err(e) => self.wrap_transport_error(e),
        }
    }

    fn send(&self, method: Method) -> reqwest::Result<HttpResponse> {
        let client = match &self.client {
            Some(client) => client.clone(),
            None => Client::builder().build()?,
        };

        let mut request = client.request(method, &self.url).timeout(self.timeout);
        for (key, value) in self.headers.pairs() {
            request = request.header(key, value);
        }
        if self.json_body && !self.headers.contains_key_ignore_case("content-type") {
            request = request.header(reqwest::header::CONTENT_TYPE, "application/json");
        }
        if !self.params.is_empty() {
            let params: Vec<(&str, &str)> = self.params.pairs().collect();
            request = request.query(&params);
        }
        if let Some(body) = &self.body {
            request = request.body(body.clone());
        }

        let response = request.send()?;
        let status = response.status();
        if !status.is_success() {
            return Ok(Response::failure(
                format!(
                    "Unexpected status code {}. Reason = {}",
                    status.as_u16(),
                    status.canonical_reason().unwrap_or("Unknown")
                ),
                StatusCode::Http(status.as_u16()),
            ));
        }
        Ok(Response::ok(response.bytes()?.to_vec()))
    }

    fn wrap_transport_error(&self, error: reqwest::Error) -> HttpResponse {
        warn!("Request to {} failed: {error}", self.url);
        if error.is_timeout() {
            Response::failure(
                format!(
                    "Request timed out. Wait time = {}ms",
                    self.timeout.as_millis()
                ),
                StatusCode::Timeout,
            )
        } else if error.is_connect() || is_connection_dropped(&error) {
            Response::failure("Connection error.", StatusCode::InternalServiceError)
        } else {
            Response::failure(
                format!("Unexpected transport error. Ex = {error}"),
                StatusCode::InternalServiceError,
            )
        }
    }
}

/// Whether the peer went away mid-request: a reset, an abort or a close
/// before the reply was complete.
fn is_connection_dropped(error: &reqwest::Error) -> bool {
    let mut source = error.source();
    while let Some(cause) = source {
        if let Some(io) = cause.downcast_ref::<io::Error>() {
            if matches!(
                io.kind(),
                io::ErrorKind::ConnectionReset
                    | io::ErrorKind::ConnectionAborted
                    | io::ErrorKind::BrokenPipe
                    | io::ErrorKind::UnexpectedEof
            ) {
                return true;
            }
        }
        if let Some(hyper_error) = cause.downcast_ref::<hyper::Error>() {
            if hyper_error.is_incomplete_message() {
                return true;
            }
        }
        source = cause.source();
    }
    false
}

fn json_field(body: &[u8]) -> Result<serde_json::Value, String> {
    let mut envelope: serde_json::Value = serde_json::from_slice(body).map_err(|e| e.to_string())?;
    envelope
        .get_mut("json")
        .map(serde_json::Value::take)
        .ok_or_else(|| "missing top-level field `json`".to_string())
}

impl HttpResponse {
    /// Decode the body as a JSON envelope and keep its top-level `json` field.
    ///
    /// A failed response is returned unchanged.
    pub fn as_json(self) -> Response<serde_json::Value> {
        self.and_then(|body| match json_field(&body) {
            Ok(value) => Response::ok(value),
            Err(e) => Response::failure(
                format!("Failed to convert output to json. Ex = {e}"),
                StatusCode::JsonConversionError,
            ),
        })
    }

    /// Like [`HttpResponse::as_json`], then deserialize the field into `T`.
    pub fn json_as<T: DeserializeOwned>(self) -> Response<T> {
        self.as_json()
            .and_then(|value| match serde_json::from_value(value) {
                Ok(typed) => Response::ok(typed),
                Err(e) => Response::failure(
                    format!("Failed to convert output to json. Ex = {e}"),
                    StatusCode::JsonConversionError,
                ),
            })
    }
}
