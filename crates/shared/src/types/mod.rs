//! Common types used across the application.

pub mod quantity;

pub use quantity::FixedPoint;
