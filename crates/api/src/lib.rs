//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - The node's REST routes
//! - `cc-user`/`cc-auth` authentication and the error envelope
//! - Request extractors
//! - reqwest clients for neighbors, the account directory and the fee service

pub mod clients;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod routes;

#[cfg(test)]
pub(crate) mod test_support;

use std::sync::Arc;
use std::time::Duration;

use axum::{Router, http::HeaderName, middleware as axum_middleware};
use ccnode_core::Node;
use moka::future::Cache;
use tower_http::cors::{Any, CorsLayer};
use tower_http::sensitive_headers::SetSensitiveRequestHeadersLayer;
use tower_http::trace::TraceLayer;

/// Header naming the calling account.
pub const CC_USER: &str = "cc-user";
/// Header carrying a member's secret or a neighbor's chain head.
pub const CC_AUTH: &str = "cc-auth";

/// How long the absolute path from the root is reused.
const PATH_TTL: Duration = Duration::from_secs(300);

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// The ledger node.
    pub node: Arc<Node>,
    /// The node's absolute path, which costs a trunkward round trip.
    pub absolute_path: Cache<(), Vec<String>>,
}

impl AppState {
    /// Creates the state for a node.
    #[must_use]
    pub fn new(node: Arc<Node>) -> Self {
        Self {
            node,
            absolute_path: Cache::builder().max_capacity(1).time_to_live(PATH_TTL).build(),
        }
    }
}

/// CORS for browser clients.
///
/// `CorsLayer` answers every `OPTIONS` request itself, so it never wraps
/// `OPTIONS /`, which lists the caller's permitted operations.
fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(routes::api_routes())
        .layer(cors())
        .route("/", routes::node::root(cors()))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::error_envelope,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(SetSensitiveRequestHeadersLayer::new([HeaderName::from_static(CC_AUTH)]))
        .with_state(state)
}
