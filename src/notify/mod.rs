// ABOUTME: Notification source module feeding change events to the controller
// ABOUTME: Defines the subscription signal paths and the NotificationSource seam

pub mod error;
pub mod memory;
pub mod redis_bus;

use tokio::sync::{mpsc, oneshot};

pub use error::NotifyError;
pub use memory::MemoryBus;
pub use redis_bus::RedisBus;

use error::Result;

/// Default channel the engine listens on
pub const DEFAULT_CHANNEL: &str = "redis-template-channel";

/// Default number of notifications buffered between producer and controller
pub const DEFAULT_CAPACITY: usize = 64;

/// An opaque "recompute now" event. The channel is kept for logging only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub channel: String,
}

impl Notification {
    pub fn new(channel: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
        }
    }
}

/// Consumer side of a subscription: a bounded stream of notifications and a
/// single terminal error.
#[derive(Debug)]
pub struct Subscription {
    pub notifications: mpsc::Receiver<Notification>,
    pub terminal: oneshot::Receiver<NotifyError>,
}

/// Producer side of a subscription. `fail` consumes the sender, so at most one
/// terminal error is ever delivered and nothing follows it.
#[derive(Debug)]
pub struct SubscriptionSender {
    notifications: mpsc::Sender<Notification>,
    terminal: oneshot::Sender<NotifyError>,
}

impl Subscription {
    pub fn channel(capacity: usize) -> (SubscriptionSender, Subscription) {
        let (notify_tx, notify_rx) = mpsc::channel(capacity.max(1));
        let (terminal_tx, terminal_rx) = oneshot::channel();

        (
            SubscriptionSender {
                notifications: notify_tx,
                terminal: terminal_tx,
            },
            Subscription {
                notifications: notify_rx,
                terminal: terminal_rx,
            },
        )
    }
}

/// Outcome of handing a notification to the controller without waiting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Queued,
    Dropped,
    Closed,
}

impl SubscriptionSender {
    /// Block the current (non-async) thread until the notification is queued.
    /// Returns false once the consumer has gone away.
    pub fn blocking_notify(&self, notification: Notification) -> bool {
        self.notifications.blocking_send(notification).is_ok()
    }

    /// Queue without waiting; a full queue drops the notification since a
    /// queued one already triggers a recompute.
    pub fn try_notify(&self, notification: Notification) -> Delivery {
        match self.notifications.try_send(notification) {
            Ok(()) => Delivery::Queued,
            Err(mpsc::error::TrySendError::Full(_)) => Delivery::Dropped,
            Err(mpsc::error::TrySendError::Closed(_)) => Delivery::Closed,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.notifications.is_closed()
    }

    /// Deliver the terminal error and end the subscription
    pub fn fail(self, error: NotifyError) {
        // The consumer may already be gone; nothing else to tell it.
        let _ = self.terminal.send(error);
    }
}

/// Long-lived subscription to a named channel
pub trait NotificationSource: Send + Sync {
    fn subscribe(&self, channel: &str) -> Result<Subscription>;
}

/// Publishing side of the bus, used by external actors and tests
pub trait Publisher: Send + Sync {
    /// Publish `payload` to `channel`, returning the number of receivers
    fn publish(&self, channel: &str, payload: &str) -> Result<usize>;
}
