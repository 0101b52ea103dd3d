use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{Instant, sleep};

use crate::sync::config::RateLimits;
use crate::sync::types::Provider;

#[derive(Debug)]
struct Window {
    count: u32,
    started: Instant,
}

/// Fixed-window request limiter.
///
/// One instance is shared by every sync run in the process, so concurrent
/// runs draw from the same per-provider budget. State is in-memory only; a
/// restart resets all windows.
pub struct RateLimiter {
    limits: RateLimits,
    windows: Mutex<HashMap<Provider, Window>>,
}

impl RateLimiter {
    #[must_use]
    pub fn new(limits: RateLimits) -> Self {
        Self {
            limits,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Consume one request slot for the provider, sleeping out the rest of
    /// the window first when the budget is exhausted.
    ///
    /// The lock is held across the sleep so concurrent callers queue behind
    /// the window instead of racing past the budget.
    pub async fn check(&self, provider: Provider) {
        let limit = self.limits.for_provider(provider);
        let window_len = Duration::from_millis(limit.window_ms);

        let mut windows = self.windows.lock().await;
        let now = Instant::now();
        let window = windows.entry(provider).or_insert(Window {
            count: 0,
            started: now,
        });

        // Reset the counter once the window has passed
        if now.duration_since(window.started) >= window_len {
            window.count = 0;
            window.started = now;
        }

        if window.count >= limit.requests {
            let wait = window_len.saturating_sub(now.duration_since(window.started));
            if !wait.is_zero() {
                sleep(wait).await;
            }
            window.count = 0;
            window.started = Instant::now();
        }

        window.count += 1;
    }
}
