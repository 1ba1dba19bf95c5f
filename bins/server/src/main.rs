//! Credit Commons node server.
//!
//! Main entry point: wires configuration, the database, the account directory
//! and neighbor clients into a node and serves its HTTP API.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ccnode_api::clients::{HttpBlogic, HttpDirectory, HttpRelay, http_client};
use ccnode_api::{AppState, create_router};
use ccnode_core::account::{AccountDirectory, MemoryDirectory};
use ccnode_core::blogic::{Blogic, NoFees};
use ccnode_core::{Node, WorkflowRegistry};
use ccnode_db::{SeaLedgerStore, connect};
use ccnode_shared::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ccnode=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = AppConfig::load().context("Failed to load configuration")?;
    config.node.validate()?;

    // Connect to database
    let db = connect(&config.database).await?;
    info!("Connected to database");

    let client = http_client(Duration::from_secs(config.node.relay_timeout_secs))?;
    let units = config.node.local_units();

    let directory: Arc<dyn AccountDirectory> = match config.services.directory_url.as_deref() {
        Some(url) => {
            info!(%url, "Using directory service");
            Arc::new(HttpDirectory::new(client.clone(), url, units))
        }
        None => {
            let json = std::fs::read_to_string(&config.services.accounts_file)
                .with_context(|| format!("Failed to read {}", config.services.accounts_file))?;
            info!(file = %config.services.accounts_file, "Using accounts file");
            Arc::new(MemoryDirectory::from_json(&json, units)?)
        }
    };

    let blogic: Arc<dyn Blogic> = match config.services.blogic_url.as_deref() {
        Some(url) => Arc::new(HttpBlogic::new(client.clone(), url)),
        None => Arc::new(NoFees),
    };

    let workflows_json = std::fs::read_to_string(&config.node.workflows_file)
        .with_context(|| format!("Failed to read {}", config.node.workflows_file))?;

    let mut node = Node {
        config: config.node.clone(),
        directory,
        store: Arc::new(SeaLedgerStore::new(db)),
        blogic,
        relay: Arc::new(HttpRelay::new(client)),
        workflows: WorkflowRegistry::from_json(&workflows_json)?,
    };

    // Trunkward workflows are optional at startup; a trunk that is down
    // leaves the node with its local definitions.
    match node.trunkward_workflows().await {
        Ok(trunkward) => {
            let added = node.workflows.merge_trunkward(trunkward);
            info!(added, "Merged trunkward workflows");
        }
        Err(e) => warn!(error = %e, "Could not fetch trunkward workflows"),
    }

    info!(
        name = %node.config.name,
        trunk = ?node.config.trunkward_account,
        workflows = node.workflows.all().len(),
        "Node configured"
    );

    // Create router
    let app = create_router(AppState::new(Arc::new(node)));

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
