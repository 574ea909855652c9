//! Error envelope and the mapping from handler failures onto it.

use serde::{Deserialize, Serialize};
use tracing::error;

use crate::codec::{self, DecodeError, DecodeValidError, Problems};
use crate::response::{IntoResponse, Response};
use crate::router::method_not_allowed;
use crate::status::Status;
use crate::store::StoreError;

/// JSON body of every error response: `{"error": …, "problems": {…}}`, with
/// `problems` omitted when empty.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Problems::is_empty")]
    pub problems: Problems,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self { error: error.into(), problems: Problems::new() }
    }

    pub fn with_problems(error: impl Into<String>, problems: Problems) -> Self {
        Self { error: error.into(), problems }
    }

    /// Renders the envelope as a JSON response with `status`.
    pub fn respond(&self, status: Status) -> Response {
        codec::encode(status, self).unwrap_or_else(|e| {
            error!(error = %e, "failed to encode error response");
            Response::builder()
                .status(Status::InternalServerError)
                .json(br#"{"error":"Internal server error"}"#.to_vec())
        })
    }
}

/// Everything a blog handler can fail with. Each variant has a fixed status
/// and message; internal details are logged, never sent.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("method not allowed")]
    MethodNotAllowed,

    #[error("invalid blog id")]
    InvalidId,

    #[error("blog not found")]
    NotFound,

    #[error(transparent)]
    InvalidBody(#[from] DecodeError),

    #[error("validation failed: {} problems", .0.len())]
    Validation(Problems),

    /// A store failure other than a missing blog; `message` is what the
    /// client sees.
    #[error("{message}: {source}")]
    Store {
        message: &'static str,
        #[source]
        source: StoreError,
    },
}

impl ApiError {
    /// Maps a store failure: a missing blog is a 404, anything else a 500
    /// reported to the client as `message`.
    pub fn store(message: &'static str) -> impl FnOnce(StoreError) -> Self {
        move |source| match source {
            StoreError::NotFound => Self::NotFound,
            source => Self::Store { message, source },
        }
    }
}

impl From<DecodeValidError> for ApiError {
    fn from(err: DecodeValidError) -> Self {
        match err {
            DecodeValidError::Decode(e) => Self::InvalidBody(e),
            DecodeValidError::Invalid { problems, .. } => Self::Validation(problems),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::MethodNotAllowed => method_not_allowed(),
            Self::InvalidId => ErrorResponse::new("Invalid blog ID").respond(Status::BadRequest),
            Self::NotFound => ErrorResponse::new("Blog not found").respond(Status::NotFound),
            Self::InvalidBody(e) => {
                error!(error = %e, "failed to decode request");
                ErrorResponse::new("Invalid request body").respond(Status::BadRequest)
            }
            Self::Validation(problems) => {
                ErrorResponse::with_problems("Validation failed", problems)
                    .respond(Status::BadRequest)
            }
            Self::Store { message, source } => {
                error!(error = %source, "{message}");
                ErrorResponse::new(message).respond(Status::InternalServerError)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn json(res: &Response) -> serde_json::Value {
        serde_json::from_slice(res.body()).unwrap()
    }

    #[test]
    fn problems_omitted_when_empty() {
        let res = ErrorResponse::new("Blog not found").respond(Status::NotFound);
        assert_eq!(res.status_code(), 404);
        assert_eq!(res.body(), br#"{"error":"Blog not found"}"#);
    }

    #[test]
    fn validation_carries_problems() {
        let problems = Problems::from([("title".to_owned(), "title is required".to_owned())]);
        let res = ApiError::Validation(problems).into_response();
        assert_eq!(res.status_code(), 400);
        assert_eq!(
            json(&res),
            serde_json::json!({"error": "Validation failed", "problems": {"title": "title is required"}})
        );
    }

    #[test]
    fn store_errors_map_by_kind() {
        let not_found = ApiError::store("Failed to delete blog")(StoreError::NotFound);
        assert!(matches!(not_found, ApiError::NotFound));

        let res = ApiError::store("Failed to delete blog")(StoreError::Poisoned).into_response();
        assert_eq!(res.status_code(), 500);
        assert_eq!(json(&res)["error"], "Failed to delete blog");
    }

    #[test]
    fn method_not_allowed_is_plain_text() {
        let res = ApiError::MethodNotAllowed.into_response();
        assert_eq!(res.status_code(), 405);
        assert_eq!(res.header("content-type"), Some("text/plain; charset=utf-8"));
    }
}
