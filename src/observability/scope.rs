//! Per-execution observation scope
//!
//! - Logs QUERY_BEGIN with a fresh query id on creation
//! - Logs QUERY_COMPLETE or QUERY_FAILED when an outcome is recorded
//! - Logs QUERY_INCOMPLETE on drop without an outcome

use std::cell::Cell;
use std::time::Instant;

use uuid::Uuid;

use super::events::Event;
use super::logger::Logger;
use super::metrics::MetricsRegistry;

/// Tracks one executor call from entry to outcome
pub struct ObservationScope<'m> {
    query_id: String,
    entry: &'static str,
    started: Instant,
    finished: Cell<bool>,
    metrics: &'m MetricsRegistry,
}

impl<'m> ObservationScope<'m> {
    /// Opens a scope for the named entry point
    pub fn begin(entry: &'static str, metrics: &'m MetricsRegistry) -> Self {
        let query_id = Uuid::new_v4().to_string();
        Logger::info(
            Event::QueryBegin.as_str(),
            &[("entry", entry), ("query_id", &query_id)],
        );

        Self {
            query_id,
            entry,
            started: Instant::now(),
            finished: Cell::new(false),
            metrics,
        }
    }

    pub fn query_id(&self) -> &str {
        &self.query_id
    }

    pub fn metrics(&self) -> &MetricsRegistry {
        self.metrics
    }

    /// Logs an intermediate event tagged with this scope's query id
    pub fn trace(&self, event: Event, fields: &[(&str, &str)]) {
        let mut all: Vec<(&str, &str)> = vec![("query_id", &self.query_id)];
        all.extend_from_slice(fields);
        Logger::trace(event.as_str(), &all);
    }

    /// Like [`trace`](Self::trace) at INFO level
    pub fn info(&self, event: Event, fields: &[(&str, &str)]) {
        let mut all: Vec<(&str, &str)> = vec![("query_id", &self.query_id)];
        all.extend_from_slice(fields);
        Logger::info(event.as_str(), &all);
    }

    /// Records success
    pub fn complete(self) {
        self.finished.set(true);
        self.metrics.increment_queries_executed();
        let elapsed = self.elapsed_ms();
        Logger::info(
            Event::QueryComplete.as_str(),
            &[
                ("elapsed_ms", &elapsed),
                ("entry", self.entry),
                ("query_id", &self.query_id),
            ],
        );
    }

    /// Records failure with the error's rendering
    pub fn fail(self, reason: &str) {
        self.finished.set(true);
        self.metrics.increment_queries_failed();
        Logger::error(
            Event::QueryFailed.as_str(),
            &[
                ("entry", self.entry),
                ("query_id", &self.query_id),
                ("reason", reason),
            ],
        );
    }

    pub fn is_finished(&self) -> bool {
        self.finished.get()
    }

    fn elapsed_ms(&self) -> String {
        self.started.elapsed().as_millis().to_string()
    }
}

impl Drop for ObservationScope<'_> {
    fn drop(&mut self) {
        if !self.finished.get() {
            Logger::warn(
                Event::QueryIncomplete.as_str(),
                &[("entry", self.entry), ("query_id", &self.query_id)],
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_ids_are_unique() {
        let metrics = MetricsRegistry::new();
        let a = ObservationScope::begin("scalar", &metrics);
        let b = ObservationScope::begin("scalar", &metrics);
        assert_ne!(a.query_id(), b.query_id());
        assert!(Uuid::parse_str(a.query_id()).is_ok());
        a.complete();
        b.complete();
    }

    #[test]
    fn test_complete_counts_execution() {
        let metrics = MetricsRegistry::new();
        let scope = ObservationScope::begin("collection", &metrics);
        assert!(!scope.is_finished());
        scope.complete();
        assert_eq!(metrics.snapshot().queries_executed, 1);
    }

    #[test]
    fn test_fail_counts_failure() {
        let metrics = MetricsRegistry::new();
        ObservationScope::begin("single", &metrics).fail("cardinality");
        assert_eq!(metrics.snapshot().queries_failed, 1);
        assert_eq!(metrics.snapshot().queries_executed, 0);
    }

    #[test]
    fn test_drop_without_outcome_counts_nothing() {
        let metrics = MetricsRegistry::new();
        drop(ObservationScope::begin("scalar", &metrics));
        assert_eq!(metrics.snapshot(), Default::default());
    }
}
