//! Rewrite metrics
//!
//! Counters only, monotonic, relaxed atomics.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Counters shared by clones of a rewriter and the providers wrapping it
#[derive(Debug, Default)]
pub struct RewriteMetrics {
    expansions: AtomicU64,
    expansions_rejected: AtomicU64,
    markers_expanded: AtomicU64,
    queries_executed: AtomicU64,
    queries_rejected: AtomicU64,
}

impl RewriteMetrics {
    /// Create a registry with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a successful expansion and the markers it replaced
    pub fn record_expansion(&self, markers: usize) {
        self.expansions.fetch_add(1, Ordering::Relaxed);
        self.markers_expanded
            .fetch_add(markers as u64, Ordering::Relaxed);
    }

    /// Count a rejected expansion
    pub fn record_rejection(&self) {
        self.expansions_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_queries_executed(&self) {
        self.queries_executed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_queries_rejected(&self) {
        self.queries_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time copy of every counter
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            expansions: self.expansions.load(Ordering::Relaxed),
            expansions_rejected: self.expansions_rejected.load(Ordering::Relaxed),
            markers_expanded: self.markers_expanded.load(Ordering::Relaxed),
            queries_executed: self.queries_executed.load(Ordering::Relaxed),
            queries_rejected: self.queries_rejected.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time snapshot of [`RewriteMetrics`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct MetricsSnapshot {
    pub expansions: u64,
    pub expansions_rejected: u64,
    pub markers_expanded: u64,
    pub queries_executed: u64,
    pub queries_rejected: u64,
}
