// ABOUTME: Redis-backed key lookups for template rendering
// ABOUTME: Opens a short-lived connection per lookup, mirroring a dial-per-call pool

use redis::{Client, Commands};
use tracing::debug;

use super::error::Result;
use super::{normalize_address, KeyValueStore};

pub struct RedisStore {
    client: Client,
}

impl RedisStore {
    /// Build a store for `address` (`host:port` or `redis://...`). No
    /// connection is made until the first lookup or [`KeyValueStore::check`].
    pub fn open(address: &str) -> Result<Self> {
        let client = Client::open(normalize_address(address))?;
        Ok(Self { client })
    }
}

impl KeyValueStore for RedisStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let mut connection = self.client.get_connection()?;
        let value: Option<String> = connection.get(key)?;
        debug!(key = %key, found = value.is_some(), "redis lookup");
        Ok(value)
    }

    fn check(&self) -> Result<()> {
        let mut connection = self.client.get_connection()?;
        let _: String = redis::cmd("PING").query(&mut connection)?;
        Ok(())
    }
}
