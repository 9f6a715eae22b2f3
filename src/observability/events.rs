//! Observable events emitted by the engine
//!
//! Events are explicit and typed. Every log line names exactly one event.

use std::fmt;

/// Observable events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Configuration
    /// Engine configuration loaded and validated
    ConfigLoaded,

    // Member translation registry
    /// One translator added to the registry builder
    TranslatorRegistered,
    /// A translator plugin finished registering its entries
    TranslatorPluginInstalled,
    /// Registry built; no further registration possible
    TranslationRegistrySealed,

    // Generation
    /// SQL command produced for a query model
    SqlGenerated,

    // Execution
    /// Executor entry point called
    QueryBegin,
    /// Result operator classified into an execution strategy
    QueryStrategySelected,
    /// Union result operator moved into a subquery wrapper
    QueryUnionRewritten,
    /// All rows for one command delivered by the database
    QueryRowsLoaded,
    /// Loaded rows trimmed to the final row
    QueryLastTrimmed,
    /// Execution produced its result
    QueryComplete,
    /// Execution failed; the error is returned to the caller
    QueryFailed,
    /// Execution scope dropped without a recorded outcome
    QueryIncomplete,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",

            Event::TranslatorRegistered => "TRANSLATOR_REGISTERED",
            Event::TranslatorPluginInstalled => "TRANSLATOR_PLUGIN_INSTALLED",
            Event::TranslationRegistrySealed => "TRANSLATION_REGISTRY_SEALED",

            Event::SqlGenerated => "SQL_GENERATED",

            Event::QueryBegin => "QUERY_BEGIN",
            Event::QueryStrategySelected => "QUERY_STRATEGY_SELECTED",
            Event::QueryUnionRewritten => "QUERY_UNION_REWRITTEN",
            Event::QueryRowsLoaded => "QUERY_ROWS_LOADED",
            Event::QueryLastTrimmed => "QUERY_LAST_TRIMMED",
            Event::QueryComplete => "QUERY_COMPLETE",
            Event::QueryFailed => "QUERY_FAILED",
            Event::QueryIncomplete => "QUERY_INCOMPLETE",
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
