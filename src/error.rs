//! The error taxonomy surfaced to HTTP clients.
//!
//! Every request-handling failure that should reach the client goes through
//! one variant of [`ApiError`]. Anything else (an I/O error while reading
//! the catalog file that isn't "missing", a `serde_json` parse failure) gets
//! wrapped into [`ApiError::Corruption`] or propagated as `anyhow::Error`
//! and turned into a generic 500 at the edge.

use hyper::StatusCode;

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("not enough replicas available")]
    Insufficient,

    #[error("chunks not registered: {0:?}")]
    Unregistered(Vec<String>),

    #[error("catalog corrupt: {0}")]
    Corruption(String),
}

impl ApiError {
    /// The HTTP status this error maps to.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::Unregistered(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Insufficient => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Corruption(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The `detail` string carried in the JSON error body.
    pub fn detail(&self) -> String {
        match self {
            ApiError::Unregistered(missing) => {
                format!("chunks not registered: {:?}", missing)
            }
            other => other.to_string(),
        }
    }
}
