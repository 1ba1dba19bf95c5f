//! Account directory capability.

use std::collections::BTreeMap;

use async_trait::async_trait;
use ccnode_shared::{CcError, CcResult, FixedPoint};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::AccountRecord;

/// Criteria for listing account ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AccountFilter {
    /// Substring of the id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fragment: Option<String>,
    /// `Some(true)` for local accounts only, `Some(false)` for neighbors only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local: Option<bool>,
    /// Admins only, or non-admins only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin: Option<bool>,
    /// Active only, or blocked only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<bool>,
}

/// Balance limits in ledger units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Lowest balance allowed.
    pub min: i64,
    /// Highest balance allowed.
    pub max: i64,
}

/// The account directory, owned by another service.
#[async_trait]
pub trait AccountDirectory: Send + Sync {
    /// Loads one account; unknown ids fail with `DoesNotExist`.
    async fn fetch(&self, id: &str) -> CcResult<AccountRecord>;

    /// Lists the ids matching the filter, sorted.
    async fn filter(&self, filter: &AccountFilter) -> CcResult<Vec<String>>;

    /// Whether the id exists.
    async fn has(&self, id: &str) -> CcResult<bool>;

    /// Whether the secret belongs to the account.
    async fn check_credentials(&self, id: &str, secret: &str) -> CcResult<bool>;

    /// Limits of every account.
    async fn all_limits(&self) -> CcResult<BTreeMap<String, Limits>>;
}

/// One account in a directory document, in display units.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DirectoryEntry {
    /// Account id.
    pub id: String,
    /// Whether the account may trade.
    #[serde(default = "default_status")]
    pub status: bool,
    /// Lowest balance allowed.
    #[serde(default)]
    pub min: Decimal,
    /// Highest balance allowed.
    #[serde(default)]
    pub max: Decimal,
    /// Admin flag.
    #[serde(default)]
    pub admin: bool,
    /// Neighbor url for remote accounts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Login secret; accounts without one cannot authenticate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
}

fn default_status() -> bool {
    true
}

impl DirectoryEntry {
    /// Converts to a record in ledger units, checking `min <= 0 <= max`.
    pub fn into_record(self, units: FixedPoint) -> CcResult<AccountRecord> {
        let min = units.to_units(self.min)?;
        let max = units.to_units(self.max)?;
        if min > 0 || max < 0 {
            return Err(CcError::invalid(
                "limits",
                format!("account '{}' needs min <= 0 <= max", self.id),
            ));
        }
        Ok(AccountRecord {
            id: self.id,
            status: self.status,
            min,
            max,
            admin: self.admin,
            url: self.url,
        })
    }
}

/// A directory held in memory, loaded from a JSON document.
#[derive(Debug, Clone, Default)]
pub struct MemoryDirectory {
    accounts: BTreeMap<String, (AccountRecord, Option<String>)>,
}

impl MemoryDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a JSON list of [`DirectoryEntry`].
    pub fn from_json(json: &str, units: FixedPoint) -> CcResult<Self> {
        let entries: Vec<DirectoryEntry> =
            serde_json::from_str(json).map_err(|e| CcError::invalid("accounts", e.to_string()))?;
        let mut directory = Self::new();
        for entry in entries {
            let secret = entry.secret.clone();
            directory.insert(entry.into_record(units)?, secret);
        }
        Ok(directory)
    }

    /// Adds or replaces an account.
    pub fn insert(&mut self, record: AccountRecord, secret: Option<String>) {
        self.accounts.insert(record.id.clone(), (record, secret));
    }

    /// Builder form of [`MemoryDirectory::insert`].
    #[must_use]
    pub fn with(mut self, record: AccountRecord, secret: Option<&str>) -> Self {
        self.insert(record, secret.map(str::to_string));
        self
    }
}

#[async_trait]
impl AccountDirectory for MemoryDirectory {
    async fn fetch(&self, id: &str) -> CcResult<AccountRecord> {
        self.accounts
            .get(id)
            .map(|(record, _)| record.clone())
            .ok_or_else(|| CcError::no_account(id))
    }

    async fn filter(&self, filter: &AccountFilter) -> CcResult<Vec<String>> {
        Ok(self
            .accounts
            .values()
            .map(|(record, _)| record)
            .filter(|r| {
                filter
                    .fragment
                    .as_deref()
                    .is_none_or(|fragment| r.id.contains(fragment))
            })
            .filter(|r| filter.local.is_none_or(|local| local == r.url.is_none()))
            .filter(|r| filter.admin.is_none_or(|admin| admin == r.admin))
            .filter(|r| filter.status.is_none_or(|status| status == r.status))
            .map(|r| r.id.clone())
            .collect())
    }

    async fn has(&self, id: &str) -> CcResult<bool> {
        Ok(self.accounts.contains_key(id))
    }

    async fn check_credentials(&self, id: &str, secret: &str) -> CcResult<bool> {
        let (_, stored) = self
            .accounts
            .get(id)
            .ok_or_else(|| CcError::no_account(id))?;
        Ok(stored.as_deref().is_some_and(|stored| stored == secret))
    }

    async fn all_limits(&self) -> CcResult<BTreeMap<String, Limits>> {
        Ok(self
            .accounts
            .values()
            .map(|(r, _)| {
                (
                    r.id.clone(),
                    Limits {
                        min: r.min,
                        max: r.max,
                    },
                )
            })
            .collect())
    }
}
