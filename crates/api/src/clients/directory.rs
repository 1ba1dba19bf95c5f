//! Account directory service client.
//!
//! The service speaks display units; records are converted to ledger units
//! on the way in.

use std::collections::BTreeMap;

use async_trait::async_trait;
use ccnode_core::account::{AccountDirectory, AccountFilter, AccountRecord, DirectoryEntry, Limits};
use ccnode_shared::{CcError, CcResult, FixedPoint};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;

use super::{read_json, send};

const SERVICE: &str = "directory";

#[derive(Debug, Deserialize)]
struct LimitsDto {
    min: Decimal,
    max: Decimal,
}

/// [`AccountDirectory`] backed by an HTTP service.
#[derive(Debug, Clone)]
pub struct HttpDirectory {
    client: Client,
    base_url: String,
    units: FixedPoint,
}

impl HttpDirectory {
    /// Creates a client for the service at `base_url`.
    #[must_use]
    pub fn new(client: Client, base_url: &str, units: FixedPoint) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            units,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }
}

fn is_not_found(err: &CcError) -> bool {
    matches!(err, CcError::Remote { status: 404, .. })
}

#[async_trait]
impl AccountDirectory for HttpDirectory {
    async fn fetch(&self, id: &str) -> CcResult<AccountRecord> {
        let request = self.client.get(self.url(&format!("accounts/{id}")));
        let response = match send(SERVICE, request).await {
            Ok(response) => response,
            Err(e) if is_not_found(&e) => return Err(CcError::no_account(id)),
            Err(e) => return Err(e),
        };
        let entry: DirectoryEntry = read_json(SERVICE, response).await?;
        entry.into_record(self.units)
    }

    async fn filter(&self, filter: &AccountFilter) -> CcResult<Vec<String>> {
        let request = self.client.get(self.url("accounts")).query(filter);
        read_json(SERVICE, send(SERVICE, request).await?).await
    }

    async fn has(&self, id: &str) -> CcResult<bool> {
        match self.fetch(id).await {
            Ok(_) => Ok(true),
            Err(CcError::DoesNotExist { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn check_credentials(&self, id: &str, secret: &str) -> CcResult<bool> {
        let request = self
            .client
            .post(self.url(&format!("accounts/{id}/auth")))
            .json(&json!({ "secret": secret }));
        match send(SERVICE, request).await {
            Ok(_) => Ok(true),
            Err(CcError::Remote { status: 401 | 403, .. }) => Ok(false),
            Err(e) if is_not_found(&e) => Err(CcError::no_account(id)),
            Err(e) => Err(e),
        }
    }

    async fn all_limits(&self) -> CcResult<BTreeMap<String, Limits>> {
        let request = self.client.get(self.url("limits"));
        let limits: BTreeMap<String, LimitsDto> = read_json(SERVICE, send(SERVICE, request).await?).await?;
        limits
            .into_iter()
            .map(|(id, l)| {
                Ok((
                    id,
                    Limits {
                        min: self.units.to_units(l.min)?,
                        max: self.units.to_units(l.max)?,
                    },
                ))
            })
            .collect()
    }
}
