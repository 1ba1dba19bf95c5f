//! Hash chain between adjacent nodes.
//!
//! Both ends of a link record the same sequence of confirmed writes, so both
//! arrive at the same chain head. A neighbor proves it is in sync by sending
//! its head with every request.

use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Next chain head after a confirmed write.
#[must_use]
pub fn chain_hash(prev: Option<&str>, uuid: Uuid, version: i32, state: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(prev.unwrap_or("").as_bytes());
    hasher.update(b"|");
    hasher.update(uuid.to_string().as_bytes());
    hasher.update(b"|");
    hasher.update(version.to_string().as_bytes());
    hasher.update(b"|");
    hasher.update(state.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Whether the neighbor's head matches ours. An empty head matches an empty history.
#[must_use]
pub fn verify(recorded: Option<&str>, supplied: &str) -> bool {
    recorded.unwrap_or("") == supplied
}
