//! Tree-relative address resolution.
//!
//! A path like `root/beta/bob` is ambiguous on its own: a node name, an
//! account name and a trunkward hop can all be the same token. Resolution
//! therefore follows a fixed precedence:
//!
//! 1. the last segment names an account here
//! 2. this node's name appears; what follows it is local or leafward
//! 3. the first segment is a leafward neighbor; the rest is relative to it
//! 4. a trunk is configured; the whole path is relative to the trunk
//! 5. `DoesNotExistViolation`

use ccnode_shared::{CcError, CcResult};
use tracing::warn;

use crate::account::{Account, AccountFilter};
use crate::context::RequestContext;

fn split(path: &str) -> CcResult<Vec<&str>> {
    let trimmed = path.trim().trim_matches('/');
    if trimmed.is_empty() {
        return Err(CcError::invalid("path", "must not be empty"));
    }
    Ok(trimmed.split('/').collect())
}

/// Resolves a path to an account on this node plus the remainder beyond it.
///
/// With `known_to_exist` the path is known to lie in this node's subtree, so
/// the trunkward fallback is skipped.
pub async fn resolve_to_local_account(
    ctx: &RequestContext,
    path: &str,
    known_to_exist: bool,
) -> CcResult<Account> {
    let parts = split(path)?;
    let node = &ctx.node;

    if let Some(last) = parts.last()
        && ctx.has_account(last).await?
    {
        return Ok(ctx.account(last).await?.with_given(path));
    }

    if let Some(pos) = parts.iter().position(|p| *p == node.config.name) {
        let rest = &parts[pos + 1..];
        let Some(first) = rest.first() else {
            return Err(CcError::no_account(path));
        };
        if !ctx.has_account(first).await? {
            return Err(CcError::no_account(path));
        }
        let account = ctx.account(first).await?;
        return match rest.len() {
            1 => Ok(account.with_given(path)),
            _ if account.is_branch() => Ok(account.with_rel(rest[1..].join("/")).with_given(path)),
            _ => Err(CcError::no_account(path)),
        };
    }

    if parts.len() > 1 && ctx.has_account(parts[0]).await? {
        let account = ctx.account(parts[0]).await?;
        if account.is_branch() {
            return Ok(account.with_rel(parts[1..].join("/")).with_given(path));
        }
    }

    if !known_to_exist && let Some(trunk) = node.config.trunkward_account.as_deref() {
        let account = ctx.account(trunk).await?;
        return Ok(account.with_rel(parts.join("/")).with_given(path));
    }

    Err(CcError::no_account(path))
}

/// Resolves a path received from the adjacent neighbor `from`.
///
/// The neighbor prefixes parties on its own side with its name, which is the
/// id of its account here.
pub async fn resolve_from_neighbor(
    ctx: &RequestContext,
    path: &str,
    from: &Account,
) -> CcResult<Account> {
    let parts = split(path)?;
    if parts[0] == from.id {
        return Ok(from.clone().with_rel(parts[1..].join("/")).with_given(path));
    }
    resolve_to_local_account(ctx, path, from.is_trunkward()).await
}

/// Account names matching a fragment, local ones first, then trunkward ones.
///
/// Never suggests the caller itself or this node's own account at the trunk.
pub async fn autocomplete(ctx: &RequestContext, fragment: &str) -> CcResult<Vec<String>> {
    let node = &ctx.node;
    let fragment = fragment.trim().trim_matches('/');
    let parts: Vec<&str> = fragment.split('/').collect();

    if parts.len() > 1 {
        let (head, rest) = (parts[0], parts[1..].join("/"));
        if head == node.config.name {
            return Box::pin(autocomplete(ctx, &rest)).await;
        }
        if ctx.has_account(head).await? {
            let account = ctx.account(head).await?;
            if account.is_remote() {
                let peer = node.peer(&account).await?;
                let names = node.relay.autocomplete(&peer, &rest).await?;
                return Ok(names.into_iter().map(|n| format!("{head}/{n}")).collect());
            }
        }
        return Ok(Vec::new());
    }

    let caller = ctx.caller_id();
    let trunk_id = node.config.trunkward_account.as_deref();
    let mut names: Vec<String> = node
        .directory
        .filter(&AccountFilter {
            fragment: (!fragment.is_empty()).then(|| fragment.to_string()),
            status: Some(true),
            ..AccountFilter::default()
        })
        .await?
        .into_iter()
        .filter(|id| Some(id.as_str()) != caller && Some(id.as_str()) != trunk_id)
        .collect();

    let caller_is_trunk = caller.is_some() && caller == trunk_id;
    if let Some(trunk) = node.trunkward().await?
        && !caller_is_trunk
    {
        let own = format!("{}/{}", trunk.id, node.config.name);
        match node.peer(&trunk).await {
            Ok(peer) => match node.relay.autocomplete(&peer, fragment).await {
                Ok(remote) => names.extend(
                    remote
                        .into_iter()
                        .map(|n| format!("{}/{n}", trunk.id))
                        .filter(|n| *n != own && !n.starts_with(&format!("{own}/"))),
                ),
                Err(e) => warn!(error = %e, "Trunkward autocomplete failed"),
            },
            Err(e) => warn!(error = %e, "Trunkward autocomplete failed"),
        }
    }
    Ok(names)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use ccnode_shared::NodeConfig;
    use rstest::rstest;

    use super::*;
    use crate::account::{AccountRecord, MemoryDirectory};
    use crate::blogic::NoFees;
    use crate::context::Node;
    use crate::relay::NoNeighbors;
    use crate::storage::MemoryStore;
    use crate::workflow::WorkflowRegistry;

    fn record(id: &str, url: Option<&str>) -> AccountRecord {
        AccountRecord {
            id: id.into(),
            status: true,
            min: -1000,
            max: 1000,
            admin: false,
            url: url.map(str::to_string),
        }
    }

    fn ctx(trunk: bool) -> RequestContext {
        let mut directory = MemoryDirectory::new()
            .with(record("alice", None), Some("a"))
            .with(record("bob", None), Some("b"))
            .with(record("gamma", Some("http://gamma")), None);
        if trunk {
            directory.insert(record("root", Some("http://root")), None);
        }
        let node = Node {
            config: NodeConfig::named("alpha", trunk.then_some("root")),
            directory: Arc::new(directory),
            store: Arc::new(MemoryStore::new()),
            blogic: Arc::new(NoFees),
            relay: Arc::new(NoNeighbors),
            workflows: WorkflowRegistry::default(),
        };
        RequestContext::new(Arc::new(node), None)
    }

    #[rstest]
    #[case("alice", "alice", "")]
    #[case("alpha/alice", "alice", "")]
    #[case("root/alpha/alice", "alice", "")]
    #[case("/alpha/alice/", "alice", "")]
    #[case("gamma/carol", "gamma", "carol")]
    #[case("alpha/gamma/carol", "gamma", "carol")]
    #[case("root/alpha/gamma/carol/x", "gamma", "carol/x")]
    #[case("beta/dave", "root", "beta/dave")]
    #[case("root/beta/dave", "root", "root/beta/dave")]
    #[tokio::test]
    async fn test_resolve_with_trunk(#[case] path: &str, #[case] id: &str, #[case] rel: &str) {
        let account = resolve_to_local_account(&ctx(true), path, false).await.unwrap();
        assert_eq!(account.id, id);
        assert_eq!(account.rel_path, rel);
        assert_eq!(account.given_path, path);
    }

    #[rstest]
    #[case("beta/dave")]
    #[case("alpha")]
    #[case("alpha/nobody")]
    #[case("alpha/alice/extra")]
    #[tokio::test]
    async fn test_unresolvable_without_trunk(#[case] path: &str) {
        let err = resolve_to_local_account(&ctx(false), path, false).await.unwrap_err();
        assert_eq!(err.class(), "DoesNotExistViolation");
    }

    #[tokio::test]
    async fn test_known_to_exist_skips_trunk() {
        let err = resolve_to_local_account(&ctx(true), "beta/dave", true).await.unwrap_err();
        assert_eq!(err.class(), "DoesNotExistViolation");
    }

    #[tokio::test]
    async fn test_empty_path_is_invalid() {
        let err = resolve_to_local_account(&ctx(true), "//", false).await.unwrap_err();
        assert_eq!(err.class(), "InvalidFieldsViolation");
    }

    #[tokio::test]
    async fn test_resolve_from_neighbor() {
        let ctx = ctx(true);
        let gamma = ctx.account("gamma").await.unwrap();
        let root = ctx.account("root").await.unwrap();

        let far = resolve_from_neighbor(&ctx, "gamma/carol", &gamma).await.unwrap();
        assert_eq!((far.id.as_str(), far.rel_path.as_str()), ("gamma", "carol"));

        let near = resolve_from_neighbor(&ctx, "alice", &gamma).await.unwrap();
        assert_eq!(near.id, "alice");

        let other = resolve_from_neighbor(&ctx, "root/beta/dave", &root).await.unwrap();
        assert_eq!((other.id.as_str(), other.rel_path.as_str()), ("root", "beta/dave"));

        let err = resolve_from_neighbor(&ctx, "beta/dave", &root).await.unwrap_err();
        assert_eq!(err.class(), "DoesNotExistViolation");
    }

    #[tokio::test]
    async fn test_autocomplete_local_names() {
        let ctx = ctx(false);
        let names = autocomplete(&ctx, "").await.unwrap();
        assert_eq!(names, vec!["alice", "bob", "gamma"]);
        let names = autocomplete(&ctx, "li").await.unwrap();
        assert_eq!(names, vec!["alice"]);
    }

    #[tokio::test]
    async fn test_autocomplete_survives_unreachable_trunk() {
        let names = autocomplete(&ctx(true), "b").await.unwrap();
        assert_eq!(names, vec!["bob"]);
    }
}
