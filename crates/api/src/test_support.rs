//! A single in-memory node behind the full router.

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use ccnode_core::account::{AccountRecord, MemoryDirectory};
use ccnode_core::blogic::NoFees;
use ccnode_core::relay::NoNeighbors;
use ccnode_core::storage::MemoryStore;
use ccnode_core::{Node, WorkflowRegistry};
use ccnode_shared::NodeConfig;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use crate::{AppState, CC_AUTH, CC_USER, create_router};

const WORKFLOWS: &str = r#"[
  {"id": "bill", "label": "Request payment", "direction": "bill",
   "creation": {"state": "pending", "confirm": true},
   "states": {
     "pending": {"completed": {"signatories": ["payer", "admin"]},
                 "erased": {"signatories": ["payee", "payer", "admin"]}},
     "completed": {"erased": {"signatories": ["admin"]}},
     "erased": {}}},
  {"id": "3rdparty", "label": "Admin entry", "direction": "3rdparty",
   "creation": {"state": "completed", "confirm": false},
   "states": {
     "completed": {"erased": {"signatories": ["admin"]}},
     "erased": {}}}
]"#;

fn record(id: &str, admin: bool) -> AccountRecord {
    AccountRecord {
        id: id.into(),
        status: true,
        min: -10_000,
        max: 10_000,
        admin,
        url: None,
    }
}

pub(crate) fn app() -> Router {
    let directory = MemoryDirectory::new()
        .with(record("alice", false), Some("a"))
        .with(record("bob", false), Some("b"))
        .with(record("admin", true), Some("x"));
    let node = Arc::new(Node {
        config: NodeConfig::named("alpha", None),
        directory: Arc::new(directory),
        store: Arc::new(MemoryStore::new()),
        blogic: Arc::new(NoFees),
        relay: Arc::new(NoNeighbors),
        workflows: WorkflowRegistry::from_json(WORKFLOWS).unwrap(),
    });
    create_router(AppState::new(node))
}

/// Sends one request as `user` (secret `auth`) and returns status and JSON body.
pub(crate) async fn call(
    app: &Router,
    method: &str,
    uri: &str,
    user: Option<(&str, &str)>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some((user, auth)) = user {
        request = request.header(CC_USER, user).header(CC_AUTH, auth);
    }
    let body = match body {
        Some(json) => {
            request = request.header("Content-Type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    let response = app
        .clone()
        .oneshot(request.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}
