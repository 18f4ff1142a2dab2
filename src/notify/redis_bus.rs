// ABOUTME: Redis pub/sub notification source
// ABOUTME: Runs the blocking receive loop on a dedicated thread feeding the subscription queue

use redis::{Client, Commands, Connection};
use std::sync::mpsc as std_mpsc;
use std::thread;
use tracing::{debug, info};

use super::error::{NotifyError, Result};
use super::{
    Notification, NotificationSource, Publisher, Subscription, SubscriptionSender,
    DEFAULT_CAPACITY,
};
use crate::store::normalize_address;

pub struct RedisBus {
    client: Client,
    capacity: usize,
}

impl RedisBus {
    pub fn open(address: &str) -> Result<Self> {
        let client = Client::open(normalize_address(address))?;
        Ok(Self {
            client,
            capacity: DEFAULT_CAPACITY,
        })
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }
}

impl NotificationSource for RedisBus {
    /// Connect and SUBSCRIBE before returning, so connection problems surface
    /// here rather than as a terminal error on the subscription.
    fn subscribe(&self, channel: &str) -> Result<Subscription> {
        // A subscribed connection can only issue channel commands, so it is
        // never shared with lookups.
        let connection = self.client.get_connection()?;
        let (sender, subscription) = Subscription::channel(self.capacity);
        let (ready_tx, ready_rx) = std_mpsc::sync_channel(1);
        let channel_name = channel.to_string();

        thread::Builder::new()
            .name("redis-subscriber".to_string())
            .spawn(move || receive_loop(connection, &channel_name, sender, ready_tx))?;

        match ready_rx.recv() {
            Ok(Ok(())) => {
                info!(channel = %channel, "subscribed to redis channel");
                Ok(subscription)
            }
            Ok(Err(e)) => Err(NotifyError::Redis(e)),
            Err(_) => Err(NotifyError::Closed),
        }
    }
}

fn receive_loop(
    mut connection: Connection,
    channel: &str,
    sender: SubscriptionSender,
    ready: std_mpsc::SyncSender<redis::RedisResult<()>>,
) {
    let mut pubsub = connection.as_pubsub();

    if let Err(e) = pubsub.subscribe(channel) {
        let _ = ready.send(Err(e));
        return;
    }
    if ready.send(Ok(())).is_err() {
        return;
    }

    loop {
        match pubsub.get_message() {
            Ok(message) => {
                let notification = Notification::new(message.get_channel_name());
                debug!(channel = %notification.channel, "message received from redis");

                if !sender.blocking_notify(notification) {
                    debug!(channel = %channel, "subscription consumer gone; stopping receive loop");
                    return;
                }
            }
            Err(e) => {
                sender.fail(NotifyError::Redis(e));
                return;
            }
        }
    }
}

impl Publisher for RedisBus {
    fn publish(&self, channel: &str, payload: &str) -> Result<usize> {
        let mut connection = self.client.get_connection()?;
        let receivers: usize = connection.publish(channel, payload)?;
        Ok(receivers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_normalizes_address() {
        assert!(RedisBus::open("localhost:6379").is_ok());
        assert!(RedisBus::open("ftp://localhost").is_err());
    }

    #[test]
    fn test_subscribe_unreachable_is_connection_error() {
        // Port 1 on loopback refuses connections
        let bus = RedisBus::open("127.0.0.1:1").unwrap();
        let err = bus.subscribe("redis-template-channel").unwrap_err();
        assert!(matches!(err, NotifyError::Redis(_)));
    }
}
