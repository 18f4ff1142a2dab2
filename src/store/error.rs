// ABOUTME: Error types for key-value store lookups
// ABOUTME: Wraps Redis client and connection failures

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),
}

pub type Result<T> = std::result::Result<T, StoreError>;
