//! Per-session message rate limiting.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::warn;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::RateLimitConfig;

/// Sliding-window limiter keyed by session id.
///
/// Each session keeps the timestamps of its accepted messages. A message is
/// accepted when fewer than `max_requests` of them fall inside the trailing
/// `window`, so no window of that length ever holds more than `max_requests`
/// accepted messages.
#[derive(Clone)]
pub struct SessionRateLimiter {
    /// Accepted message timestamps per session, oldest first
    sessions: Arc<Mutex<HashMap<Uuid, VecDeque<Instant>>>>,
    max_requests: usize,
    window: Duration,
}

impl SessionRateLimiter {
    /// Allow `max_requests` messages per session in any `window`.
    pub fn new(max_requests: u32, window: Duration) -> DomainResult<Self> {
        if max_requests == 0 {
            return Err(DomainError::InvalidConfiguration(
                "Rate limit max_requests must be at least 1".to_string(),
            ));
        }
        if window.is_zero() {
            return Err(DomainError::InvalidConfiguration(
                "Rate limit window must be non-zero".to_string(),
            ));
        }

        Ok(Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            max_requests: max_requests as usize,
            window,
        })
    }

    pub fn from_config(config: &RateLimitConfig) -> DomainResult<Self> {
        Self::new(config.max_requests, Duration::from_secs(config.window_seconds))
    }

    /// Record one message for `session_id`.
    ///
    /// Returns how long to wait when the session is over its limit.
    pub async fn check(&self, session_id: Uuid) -> Result<(), Duration> {
        self.check_at(session_id, Instant::now()).await
    }

    async fn check_at(&self, session_id: Uuid, now: Instant) -> Result<(), Duration> {
        let mut sessions = self.sessions.lock().await;
        let timestamps = sessions.entry(session_id).or_default();

        while timestamps
            .front()
            .is_some_and(|oldest| now.saturating_duration_since(*oldest) >= self.window)
        {
            timestamps.pop_front();
        }

        if timestamps.len() < self.max_requests {
            timestamps.push_back(now);
            return Ok(());
        }

        // Rejected messages are not recorded.
        let wait = timestamps
            .front()
            .map_or(self.window, |oldest| {
                self.window.saturating_sub(now.saturating_duration_since(*oldest))
            });
        warn!(session_id = %session_id, wait_ms = wait.as_millis() as u64, "session rate limited");
        Err(wait)
    }

    /// Drop sessions with no message inside the current window.
    pub async fn prune(&self) {
        self.prune_at(Instant::now()).await;
    }

    async fn prune_at(&self, now: Instant) {
        let mut sessions = self.sessions.lock().await;
        sessions.retain(|_, timestamps| {
            timestamps
                .back()
                .is_some_and(|newest| now.saturating_duration_since(*newest) < self.window)
        });
    }

    #[cfg(test)]
    async fn tracked_sessions(&self) -> usize {
        self.sessions.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_limit_holds_for_whole_window() {
        let limiter = SessionRateLimiter::new(3, Duration::from_secs(3)).unwrap();
        let session = Uuid::new_v4();
        let start = Instant::now();

        for _ in 0..3 {
            assert!(limiter.check_at(session, start).await.is_ok());
        }

        let later = start + Duration::from_millis(1100);
        let wait = limiter.check_at(session, later).await.unwrap_err();
        assert_eq!(wait, Duration::from_millis(1900));

        let later = start + Duration::from_millis(2200);
        assert!(limiter.check_at(session, later).await.is_err());
    }

    #[tokio::test]
    async fn test_slots_free_as_messages_leave_window() {
        let limiter = SessionRateLimiter::new(2, Duration::from_secs(10)).unwrap();
        let session = Uuid::new_v4();
        let start = Instant::now();

        assert!(limiter.check_at(session, start).await.is_ok());
        assert!(limiter.check_at(session, start + Duration::from_secs(4)).await.is_ok());
        assert!(limiter.check_at(session, start + Duration::from_secs(9)).await.is_err());

        // First message has aged out; the second still counts.
        assert!(limiter.check_at(session, start + Duration::from_secs(10)).await.is_ok());
        assert!(limiter.check_at(session, start + Duration::from_secs(11)).await.is_err());
        assert!(limiter.check_at(session, start + Duration::from_secs(14)).await.is_ok());
    }

    #[tokio::test]
    async fn test_live_clock_rejects_after_burst() {
        let limiter = SessionRateLimiter::new(3, Duration::from_secs(60)).unwrap();
        let session = Uuid::new_v4();

        for _ in 0..3 {
            assert!(limiter.check(session).await.is_ok());
        }
        tokio::time::sleep(Duration::from_millis(20)).await;

        let wait = limiter.check(session).await.unwrap_err();
        assert!(wait > Duration::from_secs(59));
        assert!(wait <= Duration::from_secs(60));
    }

    #[tokio::test]
    async fn test_sessions_are_independent() {
        let limiter = SessionRateLimiter::new(1, Duration::from_secs(60)).unwrap();
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();

        assert!(limiter.check(first).await.is_ok());
        assert!(limiter.check(first).await.is_err());
        assert!(limiter.check(second).await.is_ok());
    }

    #[tokio::test]
    async fn test_prune_drops_idle_sessions() {
        let limiter = SessionRateLimiter::new(5, Duration::from_secs(60)).unwrap();
        let start = Instant::now();
        let idle = Uuid::new_v4();
        let active = Uuid::new_v4();

        limiter.check_at(idle, start).await.unwrap();
        limiter.check_at(active, start + Duration::from_secs(30)).await.unwrap();

        limiter.prune_at(start + Duration::from_secs(61)).await;
        assert_eq!(limiter.tracked_sessions().await, 1);
    }

    #[test]
    fn test_zero_limits_rejected() {
        assert!(SessionRateLimiter::new(0, Duration::from_secs(60)).is_err());
        assert!(SessionRateLimiter::new(5, Duration::ZERO).is_err());
    }
}
