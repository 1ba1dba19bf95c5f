//! Account variants.
//!
//! The variant of an account is computed once, when its record is loaded, from
//! three facts: whether it has a url, whether its id is the configured
//! trunkward account, and its admin flag. Everything downstream (who may
//! relay, who converts currency, who shows up in listings) reads the variant.

mod directory;

pub use directory::{AccountDirectory, AccountFilter, DirectoryEntry, Limits, MemoryDirectory};

use serde::{Deserialize, Serialize};

/// An account as the directory stores it, quantities in ledger units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRecord {
    /// Unique id on this node.
    pub id: String,
    /// Whether the account may trade.
    pub status: bool,
    /// Lowest balance allowed (never positive).
    pub min: i64,
    /// Highest balance allowed (never negative).
    pub max: i64,
    /// Admin flag; ignored for remote accounts.
    pub admin: bool,
    /// Base url of the neighbor node this account stands for.
    pub url: Option<String>,
}

/// What an account is, relative to this node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountKind {
    /// A local member.
    User,
    /// A local member with admin rights.
    Admin,
    /// A leafward neighbor node.
    Branch {
        /// The neighbor's base url.
        url: String,
    },
    /// The rootward neighbor node (balance of trade account).
    Trunkward {
        /// The neighbor's base url.
        url: String,
    },
}

impl AccountKind {
    /// Selects the variant. The order of the checks matters.
    #[must_use]
    pub fn classify(url: Option<&str>, is_trunkward_id: bool, is_admin: bool) -> Self {
        match url {
            Some(url) if is_trunkward_id => Self::Trunkward {
                url: url.to_string(),
            },
            Some(url) => Self::Branch {
                url: url.to_string(),
            },
            None if is_admin => Self::Admin,
            None => Self::User,
        }
    }
}

/// An account resolved for the duration of one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    /// Id on this node.
    pub id: String,
    /// Whether the account may trade.
    pub status: bool,
    /// Lowest balance allowed, in ledger units.
    pub min: i64,
    /// Highest balance allowed, in ledger units.
    pub max: i64,
    /// Variant.
    pub kind: AccountKind,
    /// Path beyond this account, meaningful to the neighbor it stands for.
    pub rel_path: String,
    /// The path the account was resolved from.
    pub given_path: String,
}

impl Account {
    /// Builds an account from its directory record.
    #[must_use]
    pub fn from_record(record: AccountRecord, trunkward_id: Option<&str>) -> Self {
        let is_trunkward = trunkward_id == Some(record.id.as_str());
        let kind = AccountKind::classify(record.url.as_deref(), is_trunkward, record.admin);
        Self {
            given_path: record.id.clone(),
            id: record.id,
            status: record.status,
            min: record.min,
            max: record.max,
            kind,
            rel_path: String::new(),
        }
    }

    /// Same account, addressing `rel_path` beyond it.
    #[must_use]
    pub fn with_rel(mut self, rel_path: impl Into<String>) -> Self {
        self.rel_path = rel_path.into();
        self
    }

    /// Records the path this account was resolved from.
    #[must_use]
    pub fn with_given(mut self, given_path: impl Into<String>) -> Self {
        self.given_path = given_path.into();
        self
    }

    /// True for accounts standing for a neighbor node.
    #[must_use]
    pub fn is_remote(&self) -> bool {
        matches!(
            self.kind,
            AccountKind::Branch { .. } | AccountKind::Trunkward { .. }
        )
    }

    /// True for the rootward neighbor.
    #[must_use]
    pub fn is_trunkward(&self) -> bool {
        matches!(self.kind, AccountKind::Trunkward { .. })
    }

    /// True for leafward neighbors.
    #[must_use]
    pub fn is_branch(&self) -> bool {
        matches!(self.kind, AccountKind::Branch { .. })
    }

    /// True for local admins.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        matches!(self.kind, AccountKind::Admin)
    }

    /// The neighbor's base url, for remote accounts.
    #[must_use]
    pub fn url(&self) -> Option<&str> {
        match &self.kind {
            AccountKind::Branch { url } | AccountKind::Trunkward { url } => Some(url),
            AccountKind::User | AccountKind::Admin => None,
        }
    }

    /// The path of the addressed account as seen from this node.
    ///
    /// A trunkward remainder is already expressed from the trunk's point of
    /// view, so it is not prefixed with the trunk's id.
    #[must_use]
    pub fn relative_path(&self) -> String {
        match self.kind {
            AccountKind::User | AccountKind::Admin => self.id.clone(),
            AccountKind::Branch { .. } if self.rel_path.is_empty() => self.id.clone(),
            AccountKind::Branch { .. } => format!("{}/{}", self.id, self.rel_path),
            AccountKind::Trunkward { .. } => self.rel_path.clone(),
        }
    }
}
