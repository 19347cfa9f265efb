//! The result contract shared by every client in this crate.
//!
//! A [`Response`] is either a success carrying content, or a failure carrying
//! a [`StatusCode`] and a human readable comment. The two never mix: an OK
//! response has content and no comment, and a failed one has a comment and
//! no content.

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use thiserror::Error;

use crate::status::StatusCode;

/// Status and comment of a failed operation.
///
/// Only obtainable from a failed [`Response`], so the status is never
/// [`StatusCode::Ok`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{comment} (status {status})")]
pub struct Failure {
    status: StatusCode,
    comment: String,
}

impl Failure {
    /// Why it failed, for programmatic branching.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Why it failed, for humans.
    pub fn comment(&self) -> &str {
        &self.comment
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Outcome<T> {
    Content(T),
    Failed(Failure),
}

/// Outcome of a store or HTTP operation.
#[derive(Debug, Clone, PartialEq)]
pub struct Response<T> {
    outcome: Outcome<T>,
}

impl<T> Response<T> {
    /// Successful response holding `content`.
    pub fn ok(content: T) -> Self {
        Self {
            outcome: Outcome::Content(content),
        }
    }

    /// Failed response.
    ///
    /// # Panics
    ///
    /// Panics if `status` is [`StatusCode::Ok`]; a failure must carry a
    /// failing status.
    pub fn failure(comment: impl Into<String>, status: StatusCode) -> Self {
        assert_ne!(
            status,
            StatusCode::Ok,
            "a failed response cannot carry status OK"
        );
        Self {
            outcome: Outcome::Failed(Failure {
                status,
                comment: comment.into(),
            }),
        }
    }

    /// `true` when the operation succeeded.
    pub fn is_ok(&self) -> bool {
        matches!(self.outcome, Outcome::Content(_))
    }

    pub fn status(&self) -> StatusCode {
        match &self.outcome {
            Outcome::Content(_) => StatusCode::Ok,
            Outcome::Failed(failure) => failure.status,
        }
    }

    pub fn comment(&self) -> Option<&str> {
        match &self.outcome {
            Outcome::Content(_) => None,
            Outcome::Failed(failure) => Some(&failure.comment),
        }
    }

    pub fn content(&self) -> Option<&T> {
        match &self.outcome {
            Outcome::Content(content) => Some(content),
            Outcome::Failed(_) => None,
        }
    }

    pub fn into_content(self) -> Option<T> {
        match self.outcome {
            Outcome::Content(content) => Some(content),
            Outcome::Failed(_) => None,
        }
    }

    /// Leave the response world, e.g. to use `?` in caller code.
    pub fn into_result(self) -> Result<T, Failure> {
        match self.outcome {
            Outcome::Content(content) => Ok(content),
            Outcome::Failed(failure) => Err(failure),
        }
    }

    /// Transform the content of an OK response. Failures pass through unchanged.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Response<U> {
        match self.outcome {
            Outcome::Content(content) => Response::ok(f(content)),
            Outcome::Failed(failure) => failure.into(),
        }
    }

    /// Refine the content of an OK response into a new response. Failures pass
    /// through unchanged and `f` is never called for them.
    pub fn and_then<U>(self, f: impl FnOnce(T) -> Response<U>) -> Response<U> {
        match self.outcome {
            Outcome::Content(content) => f(content),
            Outcome::Failed(failure) => failure.into(),
        }
    }
}

impl<T> From<Failure> for Response<T> {
    fn from(failure: Failure) -> Self {
        Self {
            outcome: Outcome::Failed(failure),
        }
    }
}

impl<T: Serialize> Serialize for Response<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Response", 3)?;
        state.serialize_field("status", &self.status())?;
        state.serialize_field("comment", &self.comment())?;
        state.serialize_field("content", &self.content())?;
        state.end()
    }
}
