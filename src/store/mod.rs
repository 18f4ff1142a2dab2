// ABOUTME: Key-value store seam used by template lookups
// ABOUTME: Exports the KeyValueStore trait with Redis and in-memory implementations

pub mod error;
pub mod memory;
pub mod redis_store;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use redis_store::RedisStore;

use error::Result;

/// Synchronous key lookup available to template bodies.
///
/// `get` returns `Ok(None)` when the key is absent; errors are reserved for
/// the store itself failing.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Verify the store is reachable before any template is rendered
    fn check(&self) -> Result<()> {
        Ok(())
    }
}

/// Accept either `host:port` or a full `redis://` URL
pub fn normalize_address(address: &str) -> String {
    if address.contains("://") {
        address.to_string()
    } else {
        format!("redis://{}", address)
    }
}
