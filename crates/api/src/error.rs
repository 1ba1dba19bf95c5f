//! Error responses.
//!
//! Handlers return [`ApiError`]. Its response carries an [`ErrorReport`]
//! extension with an empty body; the envelope middleware logs it and writes
//! the JSON body once the request method and path are known.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use ccnode_shared::CcError;
use serde_json::{Map, Value, json};
use tracing::error;

/// A ledger error on its way to the caller.
#[derive(Debug)]
pub struct ApiError(pub CcError);

impl From<CcError> for ApiError {
    fn from(err: CcError) -> Self {
        Self(err)
    }
}

/// Result type for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

/// Error details awaiting the envelope middleware.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    /// Wire class name.
    pub class: String,
    /// Body fields so far.
    pub body: Map<String, Value>,
    /// Passed through from a neighbor, which already stamped its envelope.
    pub relayed: bool,
}

impl ErrorReport {
    /// Builds the report for an error; internal details never leave the node.
    #[must_use]
    pub fn from_error(err: &CcError) -> Self {
        if let CcError::Remote { body, .. } = err {
            let body = match body {
                Value::Object(map) => map.clone(),
                other => Map::from_iter([("message".to_string(), other.clone())]),
            };
            return Self {
                class: err.class().to_string(),
                body,
                relayed: true,
            };
        }

        let message = if err.is_internal() {
            error!(error = %err, "Internal failure");
            "An internal error occurred".to_string()
        } else {
            err.to_string()
        };
        let mut body = err.details();
        body.insert("message".into(), json!(message));
        body.insert("class".into(), json!(err.class()));
        Self {
            class: err.class().to_string(),
            body,
            relayed: false,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let mut response = status.into_response();
        response.extensions_mut().insert(ErrorReport::from_error(&self.0));
        response
    }
}
