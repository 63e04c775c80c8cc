//! Fixed-window request counter.
//!
//! A window opens on the first request from an identifier and lasts for the
//! configured duration. Windows are anchored at that request, not at clock
//! boundaries, so a burst straddling two windows can admit up to `2N - 1`
//! requests within a `2W` span.
//!
//! The table is bounded: expired records are swept periodically, and when a
//! new identifier arrives at capacity the oldest window is evicted.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::RateLimiter;
use crate::config::RateLimitPolicy;

/// Admission state for one identifier.
#[derive(Debug, Clone, Copy)]
struct RateRecord {
    /// Admitted requests in the current window, always >= 1
    count: u32,
    /// When the current window opened
    window_start: Instant,
}

impl RateRecord {
    fn open(now: Instant) -> Self {
        Self {
            count: 1,
            window_start: now,
        }
    }

    fn is_expired(&self, now: Instant, window: Duration) -> bool {
        now.saturating_duration_since(self.window_start) > window
    }
}

/// In-memory fixed-window limiter for a single endpoint.
pub struct FixedWindowLimiter {
    name: &'static str,
    policy: RateLimitPolicy,
    max_clients: usize,
    records: Mutex<HashMap<String, RateRecord>>,
}

impl FixedWindowLimiter {
    /// Create a limiter tracking at most `max_clients` identifiers.
    pub fn new(name: &'static str, policy: RateLimitPolicy, max_clients: usize) -> Self {
        Self {
            name,
            policy,
            max_clients: max_clients.max(1),
            records: Mutex::new(HashMap::new()),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn policy(&self) -> RateLimitPolicy {
        self.policy
    }

    /// Number of identifiers currently tracked.
    pub fn tracked_clients(&self) -> usize {
        self.lock().len()
    }

    /// Admission check against an explicit clock reading.
    ///
    /// The lookup and the update happen under one lock, so concurrent
    /// requests from the same identifier never exceed the quota.
    pub fn is_limited_at(&self, identifier: &str, now: Instant) -> bool {
        let mut records = self.lock();

        if let Some(record) = records.get_mut(identifier) {
            if record.is_expired(now, self.policy.window) {
                *record = RateRecord::open(now);
                return false;
            }

            if record.count >= self.policy.max_requests {
                return true;
            }

            record.count += 1;
            return false;
        }

        if records.len() >= self.max_clients {
            self.make_room(&mut records, now);
        }

        records.insert(identifier.to_string(), RateRecord::open(now));
        false
    }

    /// Remove every record whose window has expired. Returns how many went.
    pub fn sweep(&self) -> usize {
        self.sweep_at(Instant::now())
    }

    pub fn sweep_at(&self, now: Instant) -> usize {
        let mut records = self.lock();
        let before = records.len();
        let window = self.policy.window;
        records.retain(|_, record| !record.is_expired(now, window));
        before - records.len()
    }

    /// Free one slot for a new identifier.
    fn make_room(&self, records: &mut HashMap<String, RateRecord>, now: Instant) {
        let window = self.policy.window;
        records.retain(|_, record| !record.is_expired(now, window));

        if records.len() < self.max_clients {
            return;
        }

        let oldest = records
            .iter()
            .min_by_key(|(_, record)| record.window_start)
            .map(|(key, _)| key.clone());

        if let Some(key) = oldest {
            records.remove(&key);
            warn!(
                limiter = self.name,
                max_clients = self.max_clients,
                "rate_limiter_capacity_eviction"
            );
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, RateRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl RateLimiter for FixedWindowLimiter {
    fn is_limited(&self, identifier: &str) -> bool {
        self.is_limited_at(identifier, Instant::now())
    }
}

/// Spawn a background task that sweeps expired records every `period`.
///
/// The task runs until the returned handle is aborted.
pub fn spawn_sweeper(limiter: Arc<FixedWindowLimiter>, period: Duration) -> JoinHandle<()> {
    let period = period.max(Duration::from_secs(1));

    info!(
        limiter = limiter.name(),
        period_seconds = period.as_secs(),
        "rate_limiter_sweeper_started"
    );

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        // First tick completes immediately.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let removed = limiter.sweep();
            debug!(
                limiter = limiter.name(),
                removed = removed,
                remaining = limiter.tracked_clients(),
                "rate_limiter_swept"
            );
        }
    })
}
