//! Peer-table counters.
//!
//! Monotonic counters for the lifetime of the table, incremented with
//! relaxed atomics on the relevant code paths and read by snapshotting.
//! Diagnostic only — nothing in the transport keys off these values.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Live counters owned by a [`crate::PeerTable`].
#[derive(Debug, Default)]
pub struct TransportMetrics {
    /// Non-matching chain links traversed during lookups. Each increment
    /// is one hash collision walked past; a climbing rate means the
    /// bucket table is undersized for the peer population.
    pub hash_links: AtomicU64,

    /// Peer entries created.
    pub new_entries: AtomicU64,

    /// Peer entry allocations that failed.
    pub alloc_errors: AtomicU64,

    /// Route resolutions that failed.
    pub route_errors: AtomicU64,
}

impl TransportMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Point-in-time copy for status reporting.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            hash_links: self.hash_links.load(Ordering::Relaxed),
            new_entries: self.new_entries.load(Ordering::Relaxed),
            alloc_errors: self.alloc_errors.load(Ordering::Relaxed),
            route_errors: self.route_errors.load(Ordering::Relaxed),
        }
    }
}

/// Serializable snapshot of [`TransportMetrics`], in the shape the
/// daemon's status endpoint reports.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct MetricsSnapshot {
    pub hash_links: u64,
    pub new_entries: u64,
    pub alloc_errors: u64,
    pub route_errors: u64,
}
