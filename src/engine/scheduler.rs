// ABOUTME: Splay scheduling that jitters each reactive batch
// ABOUTME: Desynchronizes engine instances reacting to the same notification

use rand::Rng;
use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;

#[derive(Debug, Clone, Copy, Default)]
pub struct SplayScheduler {
    max: Duration,
}

impl SplayScheduler {
    pub fn new(max: Duration) -> Self {
        Self { max }
    }

    /// Delay drawn uniformly from `[0, max)`; zero when `max` is zero
    pub fn next_delay(&self) -> Duration {
        if self.max.is_zero() {
            return Duration::ZERO;
        }
        rand::thread_rng().gen_range(Duration::ZERO..self.max)
    }

    /// Suspend for a freshly drawn delay, returning what was waited
    pub async fn wait(&self) -> Duration {
        let delay = self.next_delay();
        if !delay.is_zero() {
            debug!(delay = ?delay, "splay sleeping");
            sleep(delay).await;
        }
        delay
    }
}
