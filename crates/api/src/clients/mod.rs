//! reqwest clients for neighbor nodes and the external services.
//!
//! Transport failures become `UnavailableNodeFailure`; an error answer is
//! passed on verbatim as [`CcError::Remote`]. Nothing is retried.

mod blogic;
mod directory;
mod relay;

pub use blogic::HttpBlogic;
pub use directory::HttpDirectory;
pub use relay::HttpRelay;

use std::time::Duration;

use ccnode_shared::{CcError, CcResult};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

/// Builds the shared HTTP client.
pub fn http_client(timeout: Duration) -> CcResult<Client> {
    Client::builder()
        .timeout(timeout)
        .gzip(true)
        .build()
        .map_err(|e| CcError::Failure(format!("cannot build http client: {e}")))
}

fn unavailable(target: &str, err: &reqwest::Error) -> CcError {
    CcError::UnavailableNode {
        node: target.to_string(),
        reason: err.to_string(),
    }
}

/// Sends a request, turning transport errors and error statuses into ledger errors.
async fn send(target: &str, request: reqwest::RequestBuilder) -> CcResult<Response> {
    let response = request.send().await.map_err(|e| unavailable(target, &e))?;
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.json::<Value>().await.unwrap_or_else(|_| {
        json!({
            "class": "CCFailure",
            "message": format!("'{target}' answered {status}"),
        })
    });
    Err(CcError::Remote {
        status: status.as_u16(),
        body,
    })
}

/// Reads a JSON answer.
async fn read_json<T: DeserializeOwned>(target: &str, response: Response) -> CcResult<T> {
    response
        .json::<T>()
        .await
        .map_err(|e| CcError::Failure(format!("unreadable answer from '{target}': {e}")))
}
