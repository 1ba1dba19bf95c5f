//! Application configuration management.

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::error::{CcError, CcResult};
use crate::types::FixedPoint;
use crate::types::quantity::MAX_DECIMAL_PLACES;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// This node's place in the tree and its ledger settings.
    pub node: NodeConfig,
    /// External collaborators.
    #[serde(default)]
    pub services: ServicesConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// Node configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct NodeConfig {
    /// This node's name; neighbors know it by an account with this id.
    pub name: String,
    /// Account id of the trunkward neighbor, if any.
    #[serde(default)]
    pub trunkward_account: Option<String>,
    /// Decimal places of the local currency.
    #[serde(default = "default_decimal_places")]
    pub decimal_places: u32,
    /// Decimal places of the trunk's currency.
    #[serde(default = "default_decimal_places")]
    pub trunk_decimal_places: u32,
    /// Trunk units per local unit.
    #[serde(default = "default_conversion_rate")]
    pub conversion_rate: Decimal,
    /// Whether primary entries may carry a zero quantity.
    #[serde(default)]
    pub zero_payments: bool,
    /// Whether entry metadata is sent to neighbors at all.
    #[serde(default = "default_true")]
    pub relay_metadata: bool,
    /// Timeout for each outbound relay call.
    #[serde(default = "default_relay_timeout")]
    pub relay_timeout_secs: u64,
    /// Location of the workflow document.
    #[serde(default = "default_workflows_file")]
    pub workflows_file: String,
}

fn default_decimal_places() -> u32 {
    2
}

fn default_conversion_rate() -> Decimal {
    Decimal::ONE
}

fn default_true() -> bool {
    true
}

fn default_relay_timeout() -> u64 {
    5
}

fn default_workflows_file() -> String {
    "config/workflows.json".to_string()
}

impl NodeConfig {
    /// A node with default ledger settings, mostly for tests and tooling.
    #[must_use]
    pub fn named(name: &str, trunkward_account: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            trunkward_account: trunkward_account.map(str::to_string),
            decimal_places: default_decimal_places(),
            trunk_decimal_places: default_decimal_places(),
            conversion_rate: default_conversion_rate(),
            zero_payments: false,
            relay_metadata: true,
            relay_timeout_secs: default_relay_timeout(),
            workflows_file: default_workflows_file(),
        }
    }

    /// Checks settings that would otherwise fail deep inside a request.
    pub fn validate(&self) -> CcResult<()> {
        if self.name.trim().is_empty() || self.name.contains('/') {
            return Err(CcError::invalid("node.name", "must be a single path segment"));
        }
        if self.conversion_rate <= Decimal::ZERO {
            return Err(CcError::invalid("node.conversion_rate", "must be positive"));
        }
        if self.decimal_places > MAX_DECIMAL_PLACES || self.trunk_decimal_places > MAX_DECIMAL_PLACES {
            return Err(CcError::invalid(
                "node.decimal_places",
                format!("at most {MAX_DECIMAL_PLACES}"),
            ));
        }
        Ok(())
    }

    /// Fixed-point format of the local currency.
    #[must_use]
    pub const fn local_units(&self) -> FixedPoint {
        FixedPoint::new(self.decimal_places)
    }

    /// Fixed-point format of the trunk's currency.
    #[must_use]
    pub const fn trunk_units(&self) -> FixedPoint {
        FixedPoint::new(self.trunk_decimal_places)
    }
}

/// External collaborator endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct ServicesConfig {
    /// Base URL of the account directory service.
    #[serde(default)]
    pub directory_url: Option<String>,
    /// Accounts file used when no directory service is configured.
    #[serde(default = "default_accounts_file")]
    pub accounts_file: String,
    /// Base URL of the business-logic fee service.
    #[serde(default)]
    pub blogic_url: Option<String>,
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            directory_url: None,
            accounts_file: default_accounts_file(),
            blogic_url: None,
        }
    }
}

fn default_accounts_file() -> String {
    "config/accounts.json".to_string()
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("CCNODE").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_load_from_environment() {
        temp_env::with_vars(
            [
                ("RUN_MODE", Some("test-no-such-file")),
                ("CCNODE__DATABASE__URL", Some("postgres://localhost/ccnode")),
                ("CCNODE__NODE__NAME", Some("alpha")),
                ("CCNODE__NODE__TRUNKWARD_ACCOUNT", Some("root")),
            ],
            || {
                let config = AppConfig::load().unwrap();
                assert_eq!(config.node.name, "alpha");
                assert_eq!(config.node.trunkward_account.as_deref(), Some("root"));
                assert_eq!(config.node.decimal_places, 2);
                assert_eq!(config.node.conversion_rate, Decimal::ONE);
                assert!(config.node.relay_metadata);
                assert_eq!(config.server.port, 8080);
                assert_eq!(config.services.accounts_file, "config/accounts.json");
            },
        );
    }

    #[test]
    fn test_validate_rejects_bad_rate() {
        let mut node = NodeConfig::named("alpha", None);
        node.conversion_rate = dec!(0);
        assert!(node.validate().is_err());
        node.conversion_rate = dec!(2.5);
        assert!(node.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_path_like_name() {
        assert!(NodeConfig::named("a/b", None).validate().is_err());
        assert!(NodeConfig::named(" ", None).validate().is_err());
    }
}
