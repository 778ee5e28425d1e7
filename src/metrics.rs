// ═══════════════════════════════════════════════════════════════
// METRICS — counting lookups, failures and everything in between
// ═══════════════════════════════════════════════════════════════
//
// Plain atomic counters shared between the dispatcher and its fetch tasks.
// The CLI dumps a snapshot to stderr with --stats. There is no metrics
// server: the process lives for exactly one lookup.

use portable_atomic::{AtomicU64, Ordering};
use serde::Serialize;
use std::time::Instant;

/// What gets serialized for `--stats`.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct MetricsSnapshot {
    pub resolutions: u64,
    pub unresolved: u64,
    pub provider_fetches: u64,
    pub provider_failures: u64,
    pub provider_timeouts: u64,
    pub delegations: u64,
    pub events_merged: u64,
    pub uptime_ms: u64,
}

/// Thread-safe resolver counters.
pub struct ResolverMetrics {
    resolutions: AtomicU64,
    unresolved: AtomicU64,
    provider_fetches: AtomicU64,
    provider_failures: AtomicU64,
    provider_timeouts: AtomicU64,
    delegations: AtomicU64,
    events_merged: AtomicU64,
    start_time: Instant,
}

impl Default for ResolverMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ResolverMetrics {
    pub fn new() -> Self {
        Self {
            resolutions: AtomicU64::new(0),
            unresolved: AtomicU64::new(0),
            provider_fetches: AtomicU64::new(0),
            provider_failures: AtomicU64::new(0),
            provider_timeouts: AtomicU64::new(0),
            delegations: AtomicU64::new(0),
            events_merged: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn increment_resolutions(&self) {
        self.resolutions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_unresolved(&self) {
        self.unresolved.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_provider_fetches(&self) {
        self.provider_fetches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_provider_failures(&self) {
        self.provider_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_provider_timeouts(&self) {
        self.provider_timeouts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_delegations(&self) {
        self.delegations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_events_merged(&self, count: usize) {
        self.events_merged.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            resolutions: self.resolutions.load(Ordering::Relaxed),
            unresolved: self.unresolved.load(Ordering::Relaxed),
            provider_fetches: self.provider_fetches.load(Ordering::Relaxed),
            provider_failures: self.provider_failures.load(Ordering::Relaxed),
            provider_timeouts: self.provider_timeouts.load(Ordering::Relaxed),
            delegations: self.delegations.load(Ordering::Relaxed),
            events_merged: self.events_merged.load(Ordering::Relaxed),
            uptime_ms: self.start_time.elapsed().as_millis() as u64,
        }
    }
}
