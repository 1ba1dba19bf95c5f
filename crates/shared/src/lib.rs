//! Shared types, errors, and configuration for a Credit Commons node.
//!
//! This crate provides common types used across all other crates:
//! - Fixed-point quantities and their display form
//! - The node-wide error taxonomy
//! - Configuration management

pub mod config;
pub mod error;
pub mod types;

pub use config::{AppConfig, NodeConfig};
pub use error::{CcError, CcResult};
pub use types::FixedPoint;
