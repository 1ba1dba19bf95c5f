//! Node-level endpoints: permitted operations, absolute path, workflows and
//! the neighbor handshake.

use std::collections::BTreeMap;
use std::convert::Infallible;

use axum::{
    Json, Router,
    extract::State,
    routing::{MethodRouter, get},
};
use ccnode_core::Workflow;
use tower_http::cors::CorsLayer;
use tracing::debug;

use crate::{AppState, error::ApiResult, middleware::Ctx};

const ANONYMOUS_OPERATIONS: &[(&str, &str)] = &[
    ("permitted", "OPTIONS /"),
    ("absolutepath", "GET /"),
    ("workflows", "GET /workflows"),
];

const MEMBER_OPERATIONS: &[(&str, &str)] = &[
    ("handshake", "GET /handshake"),
    ("accountnames", "GET /accounts/{fragment}"),
    ("accountsummary", "GET /account/summary/{path}"),
    ("accounthistory", "GET /account/history/{path}"),
    ("accountlimits", "GET /account/limits/{path}"),
    ("filtertransactions", "GET /transaction/filter"),
    ("gettransaction", "GET /transaction/{uuid}/full"),
    ("newtransaction", "POST /transaction/new"),
    ("statechange", "PATCH /transaction/{uuid}/{target}"),
    ("deletetransaction", "DELETE /transaction/{uuid}"),
];

const NEIGHBOR_OPERATIONS: &[(&str, &str)] = &[("relaytransaction", "POST /transaction/relay")];

/// Creates node routes other than `/`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/workflows", get(workflows))
        .route("/handshake", get(handshake))
}

/// The `/` route. `cors` wraps `GET` only, so `OPTIONS` reaches [`permitted`].
pub fn root(cors: CorsLayer) -> MethodRouter<AppState> {
    get(absolute_path)
        .layer::<_, Infallible>(cors)
        .options(permitted)
}

/// OPTIONS `/` - Operations available to the caller.
async fn permitted(Ctx(ctx): Ctx) -> Json<BTreeMap<&'static str, &'static str>> {
    let mut ops: BTreeMap<_, _> = ANONYMOUS_OPERATIONS.iter().copied().collect();
    if let Some(caller) = &ctx.caller {
        ops.extend(MEMBER_OPERATIONS.iter().copied());
        if caller.is_remote() {
            ops.extend(NEIGHBOR_OPERATIONS.iter().copied());
        }
    }
    Json(ops)
}

/// GET `/` - Names from the root of the tree down to this node.
async fn absolute_path(State(state): State<AppState>) -> ApiResult<Json<Vec<String>>> {
    if let Some(path) = state.absolute_path.get(&()).await {
        return Ok(Json(path));
    }
    let path = state.node.absolute_path().await?;
    debug!(path = %path.join("/"), "Resolved absolute path");
    state.absolute_path.insert((), path.clone()).await;
    Ok(Json(path))
}

/// GET `/workflows` - Local and trunkward workflow definitions.
async fn workflows(State(state): State<AppState>) -> Json<Vec<Workflow>> {
    Json(state.node.workflows.all().into_iter().cloned().collect())
}

/// GET `/handshake` - Neighbor health.
///
/// A neighbor calling in has already proven its chain head by getting here.
/// Anyone else gets every neighbor pinged.
async fn handshake(Ctx(ctx): Ctx) -> ApiResult<Json<BTreeMap<String, Vec<String>>>> {
    let caller = ctx.require_caller()?;
    if caller.is_remote() {
        return Ok(Json(BTreeMap::new()));
    }
    Ok(Json(ctx.node.handshake_neighbors().await?))
}
