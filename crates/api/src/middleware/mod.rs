//! Request middleware.

pub mod auth;
pub mod envelope;

pub use auth::{Caller, Ctx, auth_middleware};
pub use envelope::error_envelope;
