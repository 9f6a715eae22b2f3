//! Engine Configuration Tests
//!
//! Tests for configuration loading:
//! - JSON files with partial fields
//! - Validation failures
//! - Building a query context from configuration

use std::io::Write;

use relquery::config::{ConfigError, EngineConfig};
use relquery::generator::QueryContext;
use serde_json::json;
use tempfile::NamedTempFile;

// =============================================================================
// Helper Functions
// =============================================================================

fn write_config(value: serde_json::Value) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", value).unwrap();
    file
}

// =============================================================================
// Loading Tests
// =============================================================================

/// Missing fields take their defaults.
#[test]
fn test_load_partial_file() {
    let file = write_config(json!({ "union_subquery_alias": "merged" }));
    let config = EngineConfig::load(file.path()).unwrap();

    assert_eq!(config.union_subquery_alias, "merged");
    assert_eq!(config.log_level, "info");
    assert!(config.register_default_translators);
}

/// The configured alias reaches the query context.
#[test]
fn test_context_from_loaded_config() {
    let file = write_config(json!({
        "union_subquery_alias": "u_all",
        "register_default_translators": false
    }));
    let config = EngineConfig::load(file.path()).unwrap();
    let context = QueryContext::from_config(&config, &[]).unwrap();

    assert_eq!(context.union_alias(), "u_all");
    assert!(context.translators().is_empty());
}

/// Missing files report the path.
#[test]
fn test_load_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.json");

    match EngineConfig::load(&path) {
        Err(ConfigError::Io { path: reported, .. }) => assert_eq!(reported, path),
        other => panic!("expected io error, got {:?}", other),
    }
}

/// Malformed JSON is a parse error.
#[test]
fn test_load_malformed_file() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{{ not json").unwrap();

    assert!(matches!(
        EngineConfig::load(file.path()),
        Err(ConfigError::Parse { .. })
    ));
}

// =============================================================================
// Validation Tests
// =============================================================================

/// Aliases must be plain identifiers.
#[test]
fn test_invalid_alias_rejected_on_load() {
    let file = write_config(json!({ "union_subquery_alias": "1; DROP TABLE users" }));
    assert!(matches!(
        EngineConfig::load(file.path()),
        Err(ConfigError::Invalid {
            field: "union_subquery_alias",
            ..
        })
    ));
}

/// Unknown log levels are rejected.
#[test]
fn test_invalid_log_level_rejected_on_load() {
    let file = write_config(json!({ "log_level": "chatty" }));
    assert!(matches!(
        EngineConfig::load(file.path()),
        Err(ConfigError::Invalid { field: "log_level", .. })
    ));
}
