//! Fee injection capability.
//!
//! The business-logic service sees the primary entry from this node's point
//! of view (paths relative to this node, local display units) and answers
//! with extra entries in the same form.

use async_trait::async_trait;
use ccnode_shared::CcResult;

use crate::entry::WireEntry;

/// Pluggable business logic.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Blogic: Send + Sync {
    /// Extra entries to append to a new transaction of type `workflow`.
    async fn add_rows(&self, workflow: &str, primary: &WireEntry) -> CcResult<Vec<WireEntry>>;
}

/// Business logic that never adds anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFees;

#[async_trait]
impl Blogic for NoFees {
    async fn add_rows(&self, _workflow: &str, _primary: &WireEntry) -> CcResult<Vec<WireEntry>> {
        Ok(Vec::new())
    }
}
