//! Rate limiter for outgoing Telegram messages.
//!
//! Telegram throttles bots that post to the same chat too quickly, so sends
//! are spaced by a minimum interval per chat.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Rate limiter that enforces minimum intervals between sends to one chat.
#[derive(Debug)]
pub struct RateLimiter {
    /// Minimum duration between sends to the same chat.
    min_interval: Duration,

    /// When each chat was last allowed through.
    last_sent: Mutex<HashMap<String, Instant>>,
}

impl RateLimiter {
    /// Creates a new rate limiter with the specified minimum interval.
    #[must_use]
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_sent: Mutex::new(HashMap::new()),
        }
    }

    /// Creates a rate limiter from milliseconds.
    #[must_use]
    pub fn from_millis(millis: u64) -> Self {
        Self::new(Duration::from_millis(millis))
    }

    /// Waits until a send to `chat` is allowed, then marks it as performed.
    ///
    /// Returns the duration waited (0 if no wait was needed).
    pub async fn wait_and_acquire(&self, chat: &str) -> Duration {
        let wait_duration = self.time_until_allowed(chat).await;

        if !wait_duration.is_zero() {
            debug!(
                "Rate limiter: waiting {:?} before sending to {}",
                wait_duration, chat
            );
            tokio::time::sleep(wait_duration).await;
        }

        self.mark_used(chat).await;
        wait_duration
    }

    /// Checks if a send to `chat` is currently allowed without blocking.
    pub async fn is_allowed(&self, chat: &str) -> bool {
        self.time_until_allowed(chat).await.is_zero()
    }

    /// Marks a send to `chat` as just performed.
    pub async fn mark_used(&self, chat: &str) {
        let mut last = self.last_sent.lock().await;
        last.insert(chat.to_owned(), Instant::now());
    }

    /// Returns the time remaining until the next send to `chat` is allowed.
    pub async fn time_until_allowed(&self, chat: &str) -> Duration {
        let last = self.last_sent.lock().await;
        last.get(chat)
            .map_or(Duration::ZERO, |last_time| {
                self.min_interval.saturating_sub(last_time.elapsed())
            })
    }

    /// Handles a flood wait error from Telegram by sleeping it out.
    pub async fn handle_flood_wait(&self, chat: &str, wait_seconds: u32) {
        warn!(
            "Received flood wait from Telegram for {}: {} seconds",
            chat, wait_seconds
        );
        tokio::time::sleep(Duration::from_secs(u64::from(wait_seconds))).await;
        self.mark_used(chat).await;
    }

    /// Forgets all chats, allowing immediate sends.
    pub async fn reset(&self) {
        self.last_sent.lock().await.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_rate_limiter_first_send() {
        let limiter = RateLimiter::from_millis(1000);
        assert!(limiter.is_allowed("1").await);

        let waited = limiter.wait_and_acquire("1").await;
        assert_eq!(waited, Duration::ZERO);
    }

    #[tokio::test]
    async fn test_rate_limiter_subsequent_send() {
        let limiter = RateLimiter::new(Duration::from_secs(60));

        limiter.wait_and_acquire("1").await;

        assert!(!limiter.is_allowed("1").await);
        assert!(limiter.time_until_allowed("1").await > Duration::ZERO);
    }

    #[tokio::test]
    async fn test_rate_limiter_chats_are_independent() {
        let limiter = RateLimiter::new(Duration::from_secs(60));

        limiter.wait_and_acquire("1").await;

        assert!(limiter.is_allowed("2").await);
    }

    #[tokio::test]
    async fn test_rate_limiter_reset() {
        let limiter = RateLimiter::new(Duration::from_secs(60));

        limiter.wait_and_acquire("1").await;
        assert!(!limiter.is_allowed("1").await);

        limiter.reset().await;
        assert!(limiter.is_allowed("1").await);
    }
}
