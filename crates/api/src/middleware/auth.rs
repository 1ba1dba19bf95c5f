//! Caller identification from the `cc-user` and `cc-auth` headers.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, request::Parts},
    middleware::Next,
    response::Response,
};
use ccnode_core::{Account, RequestContext};

use crate::{AppState, CC_AUTH, CC_USER, error::ApiError};

/// The authenticated caller, stored in request extensions.
#[derive(Debug, Clone)]
pub struct Caller(pub Option<Account>);

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|h| h.to_str().ok())
        .map(str::to_string)
}

/// Authentication middleware.
///
/// A request without `cc-user` proceeds anonymously; handlers that need a
/// caller reject it. Wrong credentials fail here.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = header(request.headers(), CC_USER);
    let auth = header(request.headers(), CC_AUTH);

    let caller = state
        .node
        .authenticate(user.as_deref(), auth.as_deref())
        .await?;
    request.extensions_mut().insert(Caller(caller));
    Ok(next.run(request).await)
}

/// Extractor for the request-scoped ledger context.
///
/// ```ignore
/// async fn handler(Ctx(ctx): Ctx) -> ApiResult<Json<Vec<String>>> {
///     let caller = ctx.require_caller()?;
///     // ...
/// }
/// ```
#[derive(Debug)]
pub struct Ctx(pub RequestContext);

impl FromRequestParts<AppState> for Ctx {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let caller = parts.extensions.get::<Caller>().and_then(|c| c.0.clone());
        Ok(Self(RequestContext::new(state.node.clone(), caller)))
    }
}
