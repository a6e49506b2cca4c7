//! Forwarder metrics for observability
//!
//! Counters for each outcome of a fire call, so operators can see how many
//! entries reached the transport and why the rest did not.

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics for forwarder observability
///
/// # Example
///
/// ```
/// use log_forwarder::ForwarderMetrics;
///
/// let metrics = ForwarderMetrics::new();
///
/// metrics.record_forwarded();
/// metrics.record_publish_failure();
///
/// assert_eq!(metrics.forwarded(), 1);
/// assert_eq!(metrics.dropped_count(), 1);
/// ```
#[derive(Debug)]
pub struct ForwarderMetrics {
    /// Entries accepted by the transport
    forwarded: AtomicU64,

    /// Fire calls rejected because the transport reported closed
    transport_unavailable: AtomicU64,

    /// Entries that could not be serialized
    serialization_failures: AtomicU64,

    /// Publishes the transport rejected
    publish_failures: AtomicU64,
}

impl ForwarderMetrics {
    pub const fn new() -> Self {
        Self {
            forwarded: AtomicU64::new(0),
            transport_unavailable: AtomicU64::new(0),
            serialization_failures: AtomicU64::new(0),
            publish_failures: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn forwarded(&self) -> u64 {
        self.forwarded.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn transport_unavailable(&self) -> u64 {
        self.transport_unavailable.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn serialization_failures(&self) -> u64 {
        self.serialization_failures.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn publish_failures(&self) -> u64 {
        self.publish_failures.load(Ordering::Relaxed)
    }

    /// Total entries that were not forwarded, whatever the reason
    pub fn dropped_count(&self) -> u64 {
        self.transport_unavailable() + self.serialization_failures() + self.publish_failures()
    }

    #[inline]
    pub fn record_forwarded(&self) -> u64 {
        self.forwarded.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_transport_unavailable(&self) -> u64 {
        self.transport_unavailable.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_serialization_failure(&self) -> u64 {
        self.serialization_failures.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_publish_failure(&self) -> u64 {
        self.publish_failures.fetch_add(1, Ordering::Relaxed)
    }

    /// Get drop rate as a percentage (0.0 - 100.0)
    ///
    /// Returns 0.0 if nothing has been fired yet.
    pub fn drop_rate(&self) -> f64 {
        let dropped = self.dropped_count() as f64;
        let total = self.forwarded() as f64 + dropped;
        if total == 0.0 {
            0.0
        } else {
            (dropped / total) * 100.0
        }
    }

    pub fn reset(&self) {
        self.forwarded.store(0, Ordering::Relaxed);
        self.transport_unavailable.store(0, Ordering::Relaxed);
        self.serialization_failures.store(0, Ordering::Relaxed);
        self.publish_failures.store(0, Ordering::Relaxed);
    }
}

impl Default for ForwarderMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for ForwarderMetrics {
    /// Create a snapshot of the current metrics values
    fn clone(&self) -> Self {
        Self {
            forwarded: AtomicU64::new(self.forwarded()),
            transport_unavailable: AtomicU64::new(self.transport_unavailable()),
            serialization_failures: AtomicU64::new(self.serialization_failures()),
            publish_failures: AtomicU64::new(self.publish_failures()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_new() {
        let metrics = ForwarderMetrics::new();
        assert_eq!(metrics.forwarded(), 0);
        assert_eq!(metrics.dropped_count(), 0);
    }

    #[test]
    fn test_dropped_count_sums_failures() {
        let metrics = ForwarderMetrics::new();
        assert_eq!(metrics.record_transport_unavailable(), 0); // Returns previous value
        metrics.record_serialization_failure();
        metrics.record_publish_failure();
        metrics.record_publish_failure();

        assert_eq!(metrics.publish_failures(), 2);
        assert_eq!(metrics.dropped_count(), 4);
    }

    #[test]
    fn test_metrics_drop_rate() {
        let metrics = ForwarderMetrics::new();
        assert_eq!(metrics.drop_rate(), 0.0);

        for _ in 0..90 {
            metrics.record_forwarded();
        }
        for _ in 0..10 {
            metrics.record_publish_failure();
        }
        let rate = metrics.drop_rate();
        assert!((rate - 10.0).abs() < 1e-9, "Drop rate was {}", rate);
    }

    #[test]
    fn test_metrics_snapshot_and_reset() {
        let metrics = ForwarderMetrics::new();
        metrics.record_forwarded();
        metrics.record_publish_failure();

        let snapshot = metrics.clone();
        metrics.reset();

        assert_eq!(metrics.forwarded(), 0);
        assert_eq!(snapshot.forwarded(), 1);
        assert_eq!(snapshot.publish_failures(), 1);
    }
}
