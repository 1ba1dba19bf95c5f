//! Transaction routes.

use axum::{
    Json, Router,
    http::StatusCode,
    routing::{delete, get, patch, post},
};
use ccnode_core::relay::WireTransaction;
use ccnode_core::transaction::{self, FilterQuery, InsertOutcome, NewTransaction, TransactionView};
use uuid::Uuid;

use crate::{
    AppState,
    error::ApiResult,
    extractors::{AppJson, AppPath, AppQuery},
    middleware::Ctx,
};

/// Creates the transaction routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/transaction/filter", get(filter_transactions))
        .route("/transaction/new", post(new_transaction))
        .route("/transaction/relay", post(relay_transaction))
        .route("/transaction/{uuid}", delete(delete_transaction))
        .route("/transaction/{uuid}/full", get(get_transaction))
        .route("/transaction/{uuid}/{target}", patch(change_state))
}

/// GET `/transaction/filter` - Live transactions visible to the caller.
async fn filter_transactions(
    Ctx(ctx): Ctx,
    AppQuery(query): AppQuery<FilterQuery>,
) -> ApiResult<Json<Vec<TransactionView>>> {
    let found = transaction::filter(&ctx, query).await?;
    Ok(Json(found.iter().map(|tx| tx.view(&ctx)).collect()))
}

/// GET `/transaction/{uuid}/full` - The live version with its entries.
async fn get_transaction(
    Ctx(ctx): Ctx,
    AppPath(uuid): AppPath<Uuid>,
) -> ApiResult<Json<TransactionView>> {
    ctx.require_caller()?;
    let tx = transaction::load(&ctx, uuid).await?;
    Ok(Json(tx.view(&ctx)))
}

/// POST `/transaction/new` - Create a transaction.
///
/// 201 when the workflow writes it confirmed, 200 when it waits for the
/// author to confirm.
async fn new_transaction(
    Ctx(ctx): Ctx,
    AppJson(request): AppJson<NewTransaction>,
) -> ApiResult<(StatusCode, Json<TransactionView>)> {
    let (tx, outcome) = transaction::create(&ctx, request).await?;
    let status = match outcome {
        InsertOutcome::Confirmed => StatusCode::CREATED,
        InsertOutcome::AwaitingConfirmation => StatusCode::OK,
    };
    Ok((status, Json(tx.view(&ctx))))
}

/// POST `/transaction/relay` - A transaction from a neighbor.
///
/// Answers with the entries this node and its downstream added.
async fn relay_transaction(
    Ctx(ctx): Ctx,
    AppJson(wire): AppJson<WireTransaction>,
) -> ApiResult<(StatusCode, Json<WireTransaction>)> {
    let answer = transaction::receive_relay(&ctx, wire).await?;
    Ok((StatusCode::CREATED, Json(answer)))
}

/// PATCH `/transaction/{uuid}/{target}` - Move a transaction to another state.
async fn change_state(
    Ctx(ctx): Ctx,
    AppPath((uuid, target)): AppPath<(Uuid, String)>,
) -> ApiResult<(StatusCode, Json<TransactionView>)> {
    let tx = transaction::change_state(&ctx, uuid, &target).await?;
    Ok((StatusCode::CREATED, Json(tx.view(&ctx))))
}

/// DELETE `/transaction/{uuid}` - Discard an unconfirmed transaction.
async fn delete_transaction(Ctx(ctx): Ctx, AppPath(uuid): AppPath<Uuid>) -> ApiResult<StatusCode> {
    ctx.require_caller()?;
    transaction::delete(&ctx, uuid).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::{Value, json};

    use crate::test_support::{app, call};

    const ALICE: Option<(&str, &str)> = Some(("alice", "a"));
    const BOB: Option<(&str, &str)> = Some(("bob", "b"));
    const ADMIN: Option<(&str, &str)> = Some(("admin", "x"));

    fn payment(workflow: &str) -> Value {
        json!({"payee": "alice", "payer": "bob", "quantity": 1, "type": workflow, "description": "bread"})
    }

    #[tokio::test]
    async fn test_auto_confirmed_creation_is_201() {
        let app = app();
        let (status, body) = call(&app, "POST", "/transaction/new", ADMIN, Some(payment("3rdparty"))).await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["state"], "completed");
        assert_eq!(body["version"], 1);
        assert_eq!(body["type"], "3rdparty");
    }

    #[tokio::test]
    async fn test_bill_confirmation_flow() {
        let app = app();
        let (status, body) = call(&app, "POST", "/transaction/new", ALICE, Some(payment("bill"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["state"], "validated");
        assert_eq!(body["version"], 0);
        let uuid = body["uuid"].as_str().unwrap().to_string();

        let (status, body) = call(&app, "GET", &format!("/transaction/{uuid}/full"), BOB, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["class"], "DoesNotExistViolation");

        let (status, body) = call(&app, "PATCH", &format!("/transaction/{uuid}/pending"), ALICE, None).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["version"], 1);

        let (status, body) = call(&app, "PATCH", &format!("/transaction/{uuid}/completed"), ALICE, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["class"], "WorkflowViolation");

        let (status, body) = call(&app, "PATCH", &format!("/transaction/{uuid}/completed"), ADMIN, None).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["state"], "completed");
        assert_eq!(body["version"], 2);
    }

    #[tokio::test]
    async fn test_error_envelope_names_request() {
        let app = app();
        let (status, body) = call(&app, "POST", "/transaction/new", None, Some(payment("bill"))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["class"], "PermissionViolation");
        assert_eq!(body["node"], "alpha");
        assert_eq!(body["method"], "POST");
        assert_eq!(body["path"], "/transaction/new");
        assert!(body["message"].is_string());
    }

    #[tokio::test]
    async fn test_wrong_secret_is_auth_violation() {
        let app = app();
        let (status, body) = call(&app, "GET", "/transaction/filter", Some(("alice", "nope")), None).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["class"], "AuthViolation");
        assert_eq!(body["acc"], "alice");
    }

    #[tokio::test]
    async fn test_malformed_input_is_invalid_fields() {
        let app = app();
        let (status, body) = call(&app, "GET", "/transaction/not-a-uuid/full", ALICE, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["class"], "InvalidFieldsViolation");

        let (status, body) = call(&app, "POST", "/transaction/new", ALICE, Some(json!({"payee": "alice"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["class"], "InvalidFieldsViolation");
    }

    #[tokio::test]
    async fn test_filter_and_delete() {
        let app = app();
        call(&app, "POST", "/transaction/new", ADMIN, Some(payment("3rdparty"))).await;
        let (_, draft) = call(&app, "POST", "/transaction/new", ALICE, Some(payment("bill"))).await;
        let uuid = draft["uuid"].as_str().unwrap().to_string();

        let (status, body) = call(&app, "GET", "/transaction/filter?states=completed", BOB, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);

        let (_, body) = call(&app, "GET", "/transaction/filter", ALICE, None).await;
        assert_eq!(body.as_array().unwrap().len(), 2);

        let (status, _) = call(&app, "DELETE", &format!("/transaction/{uuid}"), ALICE, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = call(&app, "GET", &format!("/transaction/{uuid}/full"), ALICE, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_relay_is_for_neighbors_only() {
        let app = app();
        let wire = json!({"uuid": "0192b2c4-0000-7000-8000-000000000000", "type": "bill", "entries": []});
        let (status, body) = call(&app, "POST", "/transaction/relay", ALICE, Some(wire)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["class"], "PermissionViolation");
    }
}
