//! The neighbor protocol over HTTP.

use async_trait::async_trait;
use ccnode_core::Workflow;
use ccnode_core::relay::{Peer, Relay, WireTransaction};
use ccnode_shared::CcResult;
use reqwest::{Client, Method, RequestBuilder};
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use super::{read_json, send};
use crate::{CC_AUTH, CC_USER};

/// Calls neighbors with `cc-user` set to this node and `cc-auth` to the
/// chain head of the link.
#[derive(Debug, Clone)]
pub struct HttpRelay {
    client: Client,
}

impl HttpRelay {
    /// Creates a relay over a shared client.
    #[must_use]
    pub const fn new(client: Client) -> Self {
        Self { client }
    }

    fn request(&self, method: Method, peer: &Peer, path: &str) -> RequestBuilder {
        let url = format!("{}/{}", peer.url.trim_end_matches('/'), path.trim_start_matches('/'));
        debug!(%method, %url, neighbor = %peer.account_id, "Relaying");
        self.client
            .request(method, url)
            .header(CC_USER, &peer.node_name)
            .header(CC_AUTH, peer.hash.as_deref().unwrap_or_default())
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, peer: &Peer, path: &str) -> CcResult<T> {
        let response = send(&peer.account_id, self.request(Method::GET, peer, path)).await?;
        read_json(&peer.account_id, response).await
    }
}

#[async_trait]
impl Relay for HttpRelay {
    async fn new_transaction(&self, peer: &Peer, tx: &WireTransaction) -> CcResult<WireTransaction> {
        let request = self
            .request(Method::POST, peer, "transaction/relay")
            .json(tx);
        let response = send(&peer.account_id, request).await?;
        read_json(&peer.account_id, response).await
    }

    async fn change_state(&self, peer: &Peer, uuid: Uuid, target: &str) -> CcResult<()> {
        let request = self.request(Method::PATCH, peer, &format!("transaction/{uuid}/{target}"));
        send(&peer.account_id, request).await.map(|_| ())
    }

    async fn handshake(&self, peer: &Peer) -> CcResult<()> {
        send(&peer.account_id, self.request(Method::GET, peer, "handshake"))
            .await
            .map(|_| ())
    }

    async fn absolute_path(&self, peer: &Peer) -> CcResult<Vec<String>> {
        self.get_json(peer, "").await
    }

    async fn workflows(&self, peer: &Peer) -> CcResult<Vec<Workflow>> {
        self.get_json(peer, "workflows").await
    }

    async fn autocomplete(&self, peer: &Peer, fragment: &str) -> CcResult<Vec<String>> {
        if fragment.is_empty() {
            self.get_json(peer, "accounts").await
        } else {
            self.get_json(peer, &format!("accounts/{fragment}")).await
        }
    }

    async fn account_summary(&self, peer: &Peer, path: &str) -> CcResult<Value> {
        self.get_json(peer, &format!("account/summary/{path}")).await
    }

    async fn account_limits(&self, peer: &Peer, path: &str) -> CcResult<Value> {
        self.get_json(peer, &format!("account/limits/{path}")).await
    }

    async fn account_history(&self, peer: &Peer, path: &str) -> CcResult<Value> {
        self.get_json(peer, &format!("account/history/{path}")).await
    }
}
