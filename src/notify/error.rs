// ABOUTME: Error types for the publish/subscribe notification bus
// ABOUTME: Distinguishes connection failures from terminal subscription errors

use thiserror::Error;

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Failed to start subscriber thread: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("Subscriber disconnected: {reason}")]
    Disconnected { reason: String },

    #[error("Notification stream closed")]
    Closed,
}

pub type Result<T> = std::result::Result<T, NotifyError>;
