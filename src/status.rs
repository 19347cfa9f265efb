//! Status codes carried by every [`crate::Response`].

use std::fmt;

use serde::{Serialize, Serializer};

/// Offset added to a non-2xx HTTP status so it never collides with local codes.
pub const HTTP_ERROR_BASE: u32 = 10000;

/// The closed set of outcomes an operation can report.
///
/// Local codes live below 1000; remote HTTP failures are passed through as
/// `10000 + status`, so the original status is always recoverable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCode {
    /// 200
    Ok,
    /// 408
    Timeout,
    /// 500, transport level failures such as a refused connection.
    InternalServiceError,
    /// 601
    ItemNotFound,
    /// 602, any store fault other than a missing key.
    StoreError,
    /// 603, the payload could not be decoded.
    JsonConversionError,
    /// `10000 + status` for a non-2xx reply from the remote server.
    Http(u16),
}

impl StatusCode {
    /// Numeric form of the code.
    pub fn code(self) -> u32 {
        match self {
            StatusCode::Ok => 200,
            StatusCode::Timeout => 408,
            StatusCode::InternalServiceError => 500,
            StatusCode::ItemNotFound => 601,
            StatusCode::StoreError => 602,
            StatusCode::JsonConversionError => 603,
            StatusCode::Http(status) => HTTP_ERROR_BASE + u32::from(status),
        }
    }

    /// Inverse of [`StatusCode::code`]. Returns `None` outside the taxonomy.
    pub fn from_code(code: u32) -> Option<StatusCode> {
        match code {
            200 => Some(StatusCode::Ok),
            408 => Some(StatusCode::Timeout),
            500 => Some(StatusCode::InternalServiceError),
            601 => Some(StatusCode::ItemNotFound),
            602 => Some(StatusCode::StoreError),
            603 => Some(StatusCode::JsonConversionError),
            _ => {
                let status = code.checked_sub(HTTP_ERROR_BASE)?;
                match u16::try_from(status) {
                    Ok(status) if (100..1000).contains(&status) => Some(StatusCode::Http(status)),
                    _ => None,
                }
            }
        }
    }

    /// The remote HTTP status behind an [`StatusCode::Http`] code.
    pub fn http_status(self) -> Option<u16> {
        match self {
            StatusCode::Http(status) => Some(status),
            _ => None,
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl Serialize for StatusCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.code())
    }
}
