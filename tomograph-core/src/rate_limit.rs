// Per-client admission control for crawl sessions

use crate::error::RateLimitError;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tracing::debug;

pub const DEFAULT_REQUESTS_PER_WINDOW: usize = 5;
pub const DEFAULT_MAX_ACTIVE_SCANS: usize = 10;
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);
pub const DEFAULT_CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug)]
struct LimiterState {
    requests: HashMap<String, Vec<Instant>>,
    active_scans: usize,
    last_cleanup: Instant,
}

/// Sliding-window request limit per client plus a global cap on running scans.
#[derive(Debug)]
pub struct RateLimiter {
    requests_per_window: usize,
    max_active_scans: usize,
    window: Duration,
    cleanup_interval: Duration,
    state: Mutex<LimiterState>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_REQUESTS_PER_WINDOW, DEFAULT_MAX_ACTIVE_SCANS)
    }
}

impl RateLimiter {
    pub fn new(requests_per_window: usize, max_active_scans: usize) -> Self {
        Self {
            requests_per_window,
            max_active_scans,
            window: DEFAULT_WINDOW,
            cleanup_interval: DEFAULT_CLEANUP_INTERVAL,
            state: Mutex::new(LimiterState {
                requests: HashMap::new(),
                active_scans: 0,
                last_cleanup: Instant::now(),
            }),
        }
    }

    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    pub fn with_cleanup_interval(mut self, interval: Duration) -> Self {
        self.cleanup_interval = interval;
        self
    }

    fn lock(&self) -> MutexGuard<'_, LimiterState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Admit a scan for `client`. The returned permit frees the slot on drop.
    pub fn acquire(self: &Arc<Self>, client: &str) -> Result<ScanPermit, RateLimitError> {
        let now = Instant::now();
        let mut state = self.lock();

        if now.duration_since(state.last_cleanup) > self.cleanup_interval {
            self.purge_expired(&mut state, now);
            state.last_cleanup = now;
        }

        if state.active_scans >= self.max_active_scans {
            debug!("Rejecting {}: {} scans already running", client, state.active_scans);
            return Err(RateLimitError::Busy);
        }

        let window = self.window;
        let history = state.requests.entry(client.to_string()).or_default();
        history.retain(|t| now.duration_since(*t) < window);

        if history.len() >= self.requests_per_window {
            let oldest = history.first().copied().unwrap_or(now);
            let remaining = window.saturating_sub(now.duration_since(oldest));
            return Err(RateLimitError::TooManyRequests {
                retry_after_secs: remaining.as_secs().max(1),
            });
        }

        history.push(now);
        state.active_scans += 1;

        Ok(ScanPermit {
            limiter: Arc::clone(self),
            client: client.to_string(),
        })
    }

    pub fn active_scans(&self) -> usize {
        self.lock().active_scans
    }

    /// Number of clients that currently have request history.
    pub fn tracked_clients(&self) -> usize {
        self.lock().requests.len()
    }

    fn purge_expired(&self, state: &mut LimiterState, now: Instant) {
        let window = self.window;
        state.requests.retain(|_, times| {
            times.retain(|t| now.duration_since(*t) < window);
            !times.is_empty()
        });
    }

    fn release(&self) {
        let mut state = self.lock();
        state.active_scans = state.active_scans.saturating_sub(1);
    }
}

/// Holds one of the limiter's scan slots until dropped.
#[derive(Debug)]
pub struct ScanPermit {
    limiter: Arc<RateLimiter>,
    client: String,
}

impl ScanPermit {
    pub fn client(&self) -> &str {
        &self.client
    }
}

impl Drop for ScanPermit {
    fn drop(&mut self) {
        self.limiter.release();
    }
}
