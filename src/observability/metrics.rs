//! Engine counters
//!
//! - Counters only, monotonic
//! - Reset only on process start
//! - Atomic increments, no locks

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Registry of engine counters, shared through the query context
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    /// Executions that returned a result
    queries_executed: AtomicU64,
    /// Executions that returned an error
    queries_failed: AtomicU64,
    /// Row mappings produced by row loading
    rows_loaded: AtomicU64,
    /// Member accesses handled by the translation registry
    translations_matched: AtomicU64,
    /// Member accesses left to default handling
    translations_missed: AtomicU64,
    /// Models wrapped in a union subquery
    union_rewrites: AtomicU64,
    /// Row lists trimmed to their final row
    last_trims: AtomicU64,
}

impl MetricsRegistry {
    /// Create a new metrics registry with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_queries_executed(&self) {
        self.queries_executed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_queries_failed(&self) {
        self.queries_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_rows_loaded(&self, rows: u64) {
        self.rows_loaded.fetch_add(rows, Ordering::Relaxed);
    }

    pub fn increment_translations_matched(&self) {
        self.translations_matched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_translations_missed(&self) {
        self.translations_missed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_union_rewrites(&self) {
        self.union_rewrites.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_last_trims(&self) {
        self.last_trims.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time copy of every counter
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            queries_executed: self.queries_executed.load(Ordering::Relaxed),
            queries_failed: self.queries_failed.load(Ordering::Relaxed),
            rows_loaded: self.rows_loaded.load(Ordering::Relaxed),
            translations_matched: self.translations_matched.load(Ordering::Relaxed),
            translations_missed: self.translations_missed.load(Ordering::Relaxed),
            union_rewrites: self.union_rewrites.load(Ordering::Relaxed),
            last_trims: self.last_trims.load(Ordering::Relaxed),
        }
    }

    /// Current counters as a JSON object
    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.snapshot()).unwrap_or_else(|_| "{}".to_string())
    }
}

/// A point-in-time snapshot of all counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub queries_executed: u64,
    pub queries_failed: u64,
    pub rows_loaded: u64,
    pub translations_matched: u64,
    pub translations_missed: u64,
    pub union_rewrites: u64,
    pub last_trims: u64,
}
