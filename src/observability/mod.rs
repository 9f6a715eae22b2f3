//! Observability subsystem
//!
//! - Structured logging (JSON lines)
//! - Atomic counters
//! - Per-execution scopes
//!
//! Observability is read-only: nothing here changes a query's result.
//!
//! ```ignore
//! use relquery::observability::{Logger, Event, MetricsRegistry, ObservationScope};
//!
//! Logger::info(Event::ConfigLoaded.as_str(), &[("log_level", "info")]);
//!
//! let metrics = MetricsRegistry::new();
//! let scope = ObservationScope::begin("scalar", &metrics);
//! // ... run the query ...
//! scope.complete();
//! ```

mod events;
mod logger;
mod metrics;
mod scope;

pub use events::Event;
pub use logger::{Logger, Severity, UnknownSeverity};
pub use metrics::{MetricsRegistry, MetricsSnapshot};
pub use scope::ObservationScope;
