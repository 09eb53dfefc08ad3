//! Process-wide counters for the agent core.
//!
//! Counters are bumped at the call site without logging anything. Call
//! [`Metrics::flush`] to emit them as a single `tracing::info!` event, for
//! instance when the CLI exits.

use std::sync::atomic::{AtomicU64, Ordering};

/// Global metrics singleton.
pub static METRICS: Metrics = Metrics::new();

/// Atomic counters, no locking.
pub struct Metrics {
    refreshes: AtomicU64,
    reconciliations: AtomicU64,
    backend_failures: AtomicU64,
    fallbacks_applied: AtomicU64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            refreshes: AtomicU64::new(0),
            reconciliations: AtomicU64::new(0),
            backend_failures: AtomicU64::new(0),
            fallbacks_applied: AtomicU64::new(0),
        }
    }

    /// A directory refresh replaced the collection.
    pub fn inc_refreshes(&self) {
        self.refreshes.fetch_add(1, Ordering::Relaxed);
    }

    /// A reconciliation pass ran over the collection.
    pub fn inc_reconciliations(&self) {
        self.reconciliations.fetch_add(1, Ordering::Relaxed);
    }

    /// A backend call failed (whether or not a fallback followed).
    pub fn inc_backend_failures(&self) {
        self.backend_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// An optimistic local patch stood in for a failed backend call.
    pub fn inc_fallbacks(&self) {
        self.fallbacks_applied.fetch_add(1, Ordering::Relaxed);
    }

    /// Emit all current counter values as one `info!` event.
    pub fn flush(&self) {
        tracing::info!(
            metric = "flush",
            refreshes = self.refreshes(),
            reconciliations = self.reconciliations(),
            backend_failures = self.backend_failures(),
            fallbacks_applied = self.fallbacks_applied(),
        );
    }

    pub fn refreshes(&self) -> u64 {
        self.refreshes.load(Ordering::Relaxed)
    }

    pub fn reconciliations(&self) -> u64 {
        self.reconciliations.load(Ordering::Relaxed)
    }

    pub fn backend_failures(&self) -> u64 {
        self.backend_failures.load(Ordering::Relaxed)
    }

    pub fn fallbacks_applied(&self) -> u64 {
        self.fallbacks_applied.load(Ordering::Relaxed)
    }

    /// Reset all counters to zero (useful in tests).
    pub fn reset(&self) {
        self.refreshes.store(0, Ordering::Relaxed);
        self.reconciliations.store(0, Ordering::Relaxed);
        self.backend_failures.store(0, Ordering::Relaxed);
        self.fallbacks_applied.store(0, Ordering::Relaxed);
    }
}
