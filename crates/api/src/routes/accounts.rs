//! Account name lookup and account reports.

use std::collections::BTreeMap;

use axum::{Json, Router, routing::get};
use ccnode_core::address;
use ccnode_core::transaction::reports::{self, HistoryPoint, LimitsView, Report, Summary};

use crate::{AppState, error::ApiResult, extractors::AppPath, middleware::Ctx};

/// Creates the account routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/accounts", get(account_names_all))
        .route("/accounts/{*fragment}", get(account_names))
        .route("/account/summary/{*path}", get(summary))
        .route("/account/history/{*path}", get(history))
        .route("/account/limits", get(all_limits))
        .route("/account/limits/{*path}", get(limits))
}

/// GET `/accounts` - Every active account name.
async fn account_names_all(Ctx(ctx): Ctx) -> ApiResult<Json<Vec<String>>> {
    ctx.require_caller()?;
    Ok(Json(address::autocomplete(&ctx, "").await?))
}

/// GET `/accounts/{fragment}` - Account names matching a fragment.
async fn account_names(Ctx(ctx): Ctx, AppPath(fragment): AppPath<String>) -> ApiResult<Json<Vec<String>>> {
    ctx.require_caller()?;
    Ok(Json(address::autocomplete(&ctx, &fragment).await?))
}

/// GET `/account/summary/{path}` - Trading statistics.
async fn summary(Ctx(ctx): Ctx, AppPath(path): AppPath<String>) -> ApiResult<Json<Report<Summary>>> {
    Ok(Json(reports::summary(&ctx, &path).await?))
}

/// GET `/account/history/{path}` - Running balance.
async fn history(
    Ctx(ctx): Ctx,
    AppPath(path): AppPath<String>,
) -> ApiResult<Json<Report<Vec<HistoryPoint>>>> {
    Ok(Json(reports::history(&ctx, &path).await?))
}

/// GET `/account/limits` - Limits of every local account.
async fn all_limits(Ctx(ctx): Ctx) -> ApiResult<Json<Report<BTreeMap<String, LimitsView>>>> {
    Ok(Json(reports::limits(&ctx, None).await?))
}

/// GET `/account/limits/{path}` - Limits of one account.
async fn limits(
    Ctx(ctx): Ctx,
    AppPath(path): AppPath<String>,
) -> ApiResult<Json<Report<BTreeMap<String, LimitsView>>>> {
    Ok(Json(reports::limits(&ctx, Some(&path)).await?))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::test_support::{app, call};

    #[tokio::test]
    async fn test_account_names() {
        let app = app();
        let (status, body) = call(&app, "GET", "/accounts/al", Some(("bob", "b")), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!(["alice"]));

        let (_, body) = call(&app, "GET", "/accounts", Some(("bob", "b")), None).await;
        assert_eq!(body, json!(["admin", "alice"]));
    }

    #[tokio::test]
    async fn test_reports() {
        let app = app();
        let payment = json!({"payee": "alice", "payer": "bob", "quantity": 5, "type": "3rdparty"});
        call(&app, "POST", "/transaction/new", Some(("admin", "x")), Some(payment)).await;

        let (status, body) = call(&app, "GET", "/account/summary/alice", Some(("alice", "a")), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["completed"]["trades"], 1);
        assert_eq!(body["completed"]["partners"], 1);

        let (status, body) = call(&app, "GET", "/account/history/alice", Some(("alice", "a")), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);

        let (status, body) = call(&app, "GET", "/account/limits/alice", Some(("alice", "a")), None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.get("alice").is_some());

        let (_, body) = call(&app, "GET", "/account/limits", Some(("alice", "a")), None).await;
        assert_eq!(body.as_object().unwrap().len(), 3);

        let (status, body) = call(&app, "GET", "/account/summary/zed", Some(("alice", "a")), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["class"], "DoesNotExistViolation");
    }
}
