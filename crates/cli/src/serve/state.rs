//! Shared server state and per-IP rate limiting.

use std::collections::HashMap;
use std::net::IpAddr;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

use crate::Db;

/// Requests seen from one client: (count, window start).
type IpTracker = HashMap<IpAddr, (u64, Instant)>;

/// Fixed-window request counter keyed by client IP.
pub(crate) struct RateLimiter {
    tracker: Mutex<IpTracker>,
    /// Requests allowed per window. Zero disables limiting.
    pub(crate) max_requests: u64,
    window: Duration,
}

impl RateLimiter {
    pub(crate) fn new(max_requests: u64, window: Duration) -> Self {
        Self {
            tracker: Mutex::new(HashMap::new()),
            max_requests,
            window,
        }
    }

    /// `Err(retry_after_secs)` once `ip` has used up its window.
    pub(crate) async fn check(&self, ip: IpAddr) -> Result<(), u64> {
        if self.max_requests == 0 {
            return Ok(());
        }
        let mut tracker = self.tracker.lock().await;
        let now = Instant::now();
        tracker.retain(|_, (_, start)| now.duration_since(*start) < self.window);
        let entry = tracker.entry(ip).or_insert((0, now));

        entry.0 += 1;
        if entry.0 > self.max_requests {
            let remaining = self.window.saturating_sub(now.duration_since(entry.1));
            Err(remaining.as_secs().max(1))
        } else {
            Ok(())
        }
    }

    #[cfg(test)]
    async fn tracked(&self) -> usize {
        self.tracker.lock().await.len()
    }
}

pub(crate) struct AppState {
    pub(crate) dashboard: Db,
    pub(crate) rate_limiter: RateLimiter,
    /// `None` leaves every route open.
    pub(crate) api_key: Option<String>,
    /// Owner recorded for actions without an `X-Acting-User` header.
    pub(crate) acting_user: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    const CLIENT: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);
    const OTHER: IpAddr = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 7));

    #[tokio::test]
    async fn limits_each_client_separately() {
        let limiter = RateLimiter::new(2, Duration::from_secs(60));
        assert!(limiter.check(CLIENT).await.is_ok());
        assert!(limiter.check(CLIENT).await.is_ok());
        let retry_after = limiter.check(CLIENT).await.unwrap_err();
        assert!((1..=60).contains(&retry_after));
        assert!(limiter.check(OTHER).await.is_ok());
    }

    #[tokio::test]
    async fn window_expiry_resets_count() {
        let limiter = RateLimiter::new(1, Duration::from_millis(20));
        assert!(limiter.check(CLIENT).await.is_ok());
        assert!(limiter.check(CLIENT).await.is_err());
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(limiter.check(CLIENT).await.is_ok());
    }

    #[tokio::test]
    async fn expired_clients_are_forgotten() {
        let limiter = RateLimiter::new(5, Duration::from_millis(20));
        assert!(limiter.check(CLIENT).await.is_ok());
        assert!(limiter.check(OTHER).await.is_ok());
        assert_eq!(limiter.tracked().await, 2);
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(limiter.check(CLIENT).await.is_ok());
        assert_eq!(limiter.tracked().await, 1);
    }

    #[tokio::test]
    async fn zero_disables_limiting() {
        let limiter = RateLimiter::new(0, Duration::from_secs(60));
        for _ in 0..100 {
            assert!(limiter.check(CLIENT).await.is_ok());
        }
    }
}
