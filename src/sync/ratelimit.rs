//! Per-domain request rate limiting.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

/// Enforces a minimum interval between requests to the same domain.
///
/// The map tracks the most recently granted permit per domain. A slot is
/// reserved under the lock and the wait happens outside it, so concurrent
/// callers to one domain line up back to back while requests to other
/// domains proceed immediately. The first request for an unseen domain is
/// granted without waiting.
pub struct DomainRateLimiter {
    interval: Duration,
    last_grant: Mutex<HashMap<String, Instant>>,
}

impl DomainRateLimiter {
    /// Create a limiter with the given minimum inter-request interval.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_grant: Mutex::new(HashMap::new()),
        }
    }

    /// Wait until a request to `domain` is allowed.
    ///
    /// The domain's clock advances at grant time, before the request is
    /// dispatched, so it moves regardless of the request's outcome.
    pub async fn acquire(&self, domain: &str) {
        let now = Instant::now();
        let grant_at = {
            let mut last_grant = self.last_grant.lock().await;
            let grant_at = match last_grant.get(domain) {
                Some(&previous) => now.max(previous + self.interval),
                None => now,
            };
            last_grant.insert(domain.to_string(), grant_at);
            grant_at
        };

        if grant_at > now {
            debug!(
                domain,
                wait_ms = (grant_at - now).as_millis() as u64,
                "Waiting to respect domain rate limit"
            );
            tokio::time::sleep_until(grant_at).await;
        }
    }
}
