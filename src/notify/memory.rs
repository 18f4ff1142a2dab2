// ABOUTME: In-process publish/subscribe bus for tests and local runs
// ABOUTME: Fans notifications out to every subscription on a channel without blocking

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use tracing::{debug, warn};

use super::error::{NotifyError, Result};
use super::{
    Delivery, Notification, NotificationSource, Publisher, Subscription, SubscriptionSender,
    DEFAULT_CAPACITY,
};

#[derive(Debug)]
pub struct MemoryBus {
    subscribers: Mutex<HashMap<String, Vec<SubscriptionSender>>>,
    capacity: usize,
}

impl Default for MemoryBus {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            subscribers: Mutex::new(HashMap::new()),
            capacity,
        }
    }

    /// Live subscriptions on `channel`
    pub fn subscriber_count(&self, channel: &str) -> usize {
        let mut subscribers = self.subscribers.lock().unwrap_or_else(PoisonError::into_inner);
        match subscribers.get_mut(channel) {
            Some(senders) => {
                senders.retain(|s| !s.is_closed());
                senders.len()
            }
            None => 0,
        }
    }

    /// End every subscription on `channel` with a terminal error
    pub fn disconnect(&self, channel: &str, reason: &str) -> usize {
        let senders = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(channel)
            .unwrap_or_default();

        let count = senders.len();
        for sender in senders {
            sender.fail(NotifyError::Disconnected {
                reason: reason.to_string(),
            });
        }

        debug!(channel = %channel, subscribers = count, "disconnected channel");
        count
    }
}

impl NotificationSource for MemoryBus {
    fn subscribe(&self, channel: &str) -> Result<Subscription> {
        let (sender, subscription) = Subscription::channel(self.capacity);
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(channel.to_string())
            .or_default()
            .push(sender);

        debug!(channel = %channel, "subscribed to in-memory channel");
        Ok(subscription)
    }
}

impl Publisher for MemoryBus {
    fn publish(&self, channel: &str, payload: &str) -> Result<usize> {
        let mut subscribers = self.subscribers.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(senders) = subscribers.get_mut(channel) else {
            return Ok(0);
        };

        let mut receivers = 0;
        senders.retain(|sender| match sender.try_notify(Notification::new(channel)) {
            Delivery::Queued => {
                receivers += 1;
                true
            }
            Delivery::Dropped => {
                warn!(channel = %channel, "notification queue full; recompute already pending");
                receivers += 1;
                true
            }
            Delivery::Closed => false,
        });

        debug!(channel = %channel, payload = %payload, receivers, "published notification");
        Ok(receivers)
    }
}
