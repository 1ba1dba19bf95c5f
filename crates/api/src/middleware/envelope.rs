//! Error envelope.
//!
//! Stamps every error body with the node name, request method and path, and
//! logs it before it leaves the node.

use axum::{
    Json,
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use tracing::warn;

use crate::{AppState, error::ErrorReport};

/// Error envelope middleware.
pub async fn error_envelope(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let mut response = next.run(request).await;
    let Some(report) = response.extensions_mut().remove::<ErrorReport>() else {
        return response;
    };

    let mut body = report.body;
    if !report.relayed {
        body.insert("node".into(), json!(state.node.config.name));
        body.insert("method".into(), json!(method.as_str()));
        body.insert("path".into(), json!(path));
    }
    let status = response.status();
    warn!(
        %method,
        %path,
        status = status.as_u16(),
        class = %report.class,
        "Request failed"
    );
    (status, Json(Value::Object(body))).into_response()
}
