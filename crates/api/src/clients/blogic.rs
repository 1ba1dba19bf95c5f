//! Fee service client.

use async_trait::async_trait;
use ccnode_core::WireEntry;
use ccnode_core::blogic::Blogic;
use ccnode_shared::CcResult;
use reqwest::Client;

use super::{read_json, send};

const SERVICE: &str = "blogic";

/// [`Blogic`] backed by an HTTP service.
///
/// `POST {url}/{workflow}` with the primary entry; the answer is a list of
/// entries to append.
#[derive(Debug, Clone)]
pub struct HttpBlogic {
    client: Client,
    base_url: String,
}

impl HttpBlogic {
    /// Creates a client for the service at `base_url`.
    #[must_use]
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl Blogic for HttpBlogic {
    async fn add_rows(&self, workflow: &str, primary: &WireEntry) -> CcResult<Vec<WireEntry>> {
        let request = self
            .client
            .post(format!("{}/{workflow}", self.base_url))
            .json(primary);
        read_json(SERVICE, send(SERVICE, request).await?).await
    }
}
