//! Member Translation Tests
//!
//! Tests for member-access translation through generation:
//! - Built-in length translations
//! - Host plugins registered at startup
//! - Unmatched members fall back to field access
//! - Translator failures propagate unchanged

use std::sync::Arc;
use std::thread;

use relquery::config::EngineConfig;
use relquery::database::InMemoryDatabase;
use relquery::executor::{ExecutorErrorCode, QueryExecutor};
use relquery::generator::{
    BasicSqlGenerator, GeneratorError, QueryContext, QueryExtension, SqlGenerator,
};
use relquery::model::{Expr, QueryModel, Value, ValueKind};
use relquery::translation::{
    MemberTranslatorRegistry, RegistryBuilder, SqlBuffer, TranslationError, TranslationResult,
    TranslatorPlugin,
};

// =============================================================================
// Helper Functions
// =============================================================================

struct DatePartPlugin;

impl TranslatorPlugin for DatePartPlugin {
    fn name(&self) -> &str {
        "date_part"
    }

    fn register(&self, builder: &mut RegistryBuilder) -> TranslationResult<()> {
        builder.register_fn(
            "timestamp",
            "Year",
            |access, out, recurse| {
                out.push_sql("date_part('year', ");
                recurse(&access.target, &mut *out)?;
                out.push_sql(")");
                Ok(())
            },
        )?;
        builder.register_fn(
            "timestamp",
            "Quarter",
            |access, _out, _recurse| {
                Err(TranslationError::Rejected {
                    declaring_type: access.declaring_type.clone(),
                    member: access.member.clone(),
                    reason: "not supported by this backend".into(),
                })
            },
        )?;
        Ok(())
    }
}

struct TenantFilter;

impl QueryExtension for TenantFilter {
    fn name(&self) -> &str {
        "tenant"
    }

    fn table_predicate(&self, _table: &str, alias: &str) -> Option<Expr> {
        Some(Expr::eq(
            Expr::column(alias, "tenant_id", ValueKind::Int),
            Expr::constant(7),
        ))
    }
}

fn name() -> Expr {
    Expr::column("u", "name", ValueKind::Text)
}

fn created() -> Expr {
    Expr::column("u", "created_at", ValueKind::Timestamp)
}

fn sql(model: &QueryModel, context: &QueryContext) -> String {
    BasicSqlGenerator
        .generate(model, context)
        .unwrap()
        .create_query()
        .sql
}

// =============================================================================
// Built-in Translation Tests
// =============================================================================

/// String length becomes length(...) around the translated column.
#[test]
fn test_string_length_in_filter() {
    let model = QueryModel::from_table("users", "u")
        .filter(Expr::gt(Expr::length(name()), Expr::constant(3)))
        .select(name());

    assert_eq!(
        sql(&model, &QueryContext::standard().unwrap()),
        "SELECT \"u\".\"name\" AS \"name\" FROM \"users\" \"u\" WHERE (length(\"u\".\"name\") > $1)"
    );
}

/// Byte length becomes octet_length(...).
#[test]
fn test_bytes_length_in_projection() {
    let model = QueryModel::from_table("files", "f")
        .select(Expr::length(Expr::column("f", "content", ValueKind::Bytes)));

    assert_eq!(
        sql(&model, &QueryContext::standard().unwrap()),
        "SELECT octet_length(\"f\".\"content\") AS \"value\" FROM \"files\" \"f\""
    );
}

/// Nested member accesses compose through recursion.
#[test]
fn test_nested_member_access() {
    let registry = MemberTranslatorRegistry::with_defaults().unwrap();
    let inner = Expr::member(
        Expr::column("u", "profile", ValueKind::Record),
        "Profile",
        "Bio",
        ValueKind::Text,
    );
    let model = QueryModel::from_table("users", "u").select(Expr::length(inner));
    let context = QueryContext::new(Arc::new(registry));

    assert_eq!(
        sql(&model, &context),
        "SELECT length((\"u\".\"profile\").\"Bio\") AS \"value\" FROM \"users\" \"u\""
    );
    let snapshot = context.metrics().snapshot();
    assert_eq!(snapshot.translations_matched, 1);
    assert_eq!(snapshot.translations_missed, 1);
}

/// Length values come back as ints.
#[test]
fn test_length_executes() {
    let db = InMemoryDatabase::with_values([Value::Long(3), Value::Long(5)]);
    let context = QueryContext::standard().unwrap();
    let executor = QueryExecutor::basic(&db, &context);
    let model = QueryModel::from_table("users", "u").select(Expr::length(name()));

    let lengths = executor.execute_collection::<i32>(&model).into_vec().unwrap();
    assert_eq!(lengths, vec![3, 5]);
}

// =============================================================================
// Plugin Tests
// =============================================================================

/// Plugin translators are used alongside the built-ins.
#[test]
fn test_plugin_translator() {
    let context = QueryContext::from_config(&EngineConfig::default(), &[&DatePartPlugin]).unwrap();
    let year = Expr::member(created(), "timestamp", "Year", ValueKind::Int);
    let model = QueryModel::from_table("users", "u")
        .filter(Expr::gt(Expr::length(name()), Expr::constant(0)))
        .select(year);

    assert_eq!(
        sql(&model, &context),
        "SELECT date_part('year', \"u\".\"created_at\") AS \"value\" FROM \"users\" \"u\" \
         WHERE (length(\"u\".\"name\") > $1)"
    );
}

/// A plugin claiming a built-in key fails context construction.
#[test]
fn test_plugin_colliding_with_builtin_is_reported() {
    struct ShadowLength;

    impl TranslatorPlugin for ShadowLength {
        fn name(&self) -> &str {
            "shadow_length"
        }

        fn register(&self, builder: &mut RegistryBuilder) -> TranslationResult<()> {
            builder.register_fn("string", "Length", |_access, out, _recurse| {
                out.push_sql("char_length(NULL)");
                Ok(())
            })?;
            Ok(())
        }
    }

    let result = QueryContext::from_config(&EngineConfig::default(), &[&ShadowLength]);
    assert!(matches!(
        result,
        Err(TranslationError::DuplicateTranslator { ref member, .. }) if member == "Length"
    ));
}

/// A rejecting translator fails generation with its own error.
#[test]
fn test_translator_rejection_propagates() {
    let context = QueryContext::from_config(&EngineConfig::default(), &[&DatePartPlugin]).unwrap();
    let quarter = Expr::member(created(), "timestamp", "Quarter", ValueKind::Int);
    let model = QueryModel::from_table("users", "u").select(quarter);

    let db = InMemoryDatabase::empty();
    let executor = QueryExecutor::basic(&db, &context);
    let err = executor.execute_collection::<i32>(&model).into_vec().unwrap_err();

    assert_eq!(err.code(), ExecutorErrorCode::GenerationFailed);
    assert!(matches!(
        err.generator_error(),
        Some(GeneratorError::Translation(TranslationError::Rejected { .. }))
    ));
    assert!(db.executed().is_empty());
}

/// Without the defaults, length falls back to field access.
#[test]
fn test_defaults_disabled() {
    let config = EngineConfig {
        register_default_translators: false,
        ..EngineConfig::default()
    };
    let context = QueryContext::from_config(&config, &[]).unwrap();
    let model = QueryModel::from_table("users", "u").select(Expr::length(name()));

    assert_eq!(
        sql(&model, &context),
        "SELECT (\"u\".\"name\").\"Length\" AS \"value\" FROM \"users\" \"u\""
    );
}

// =============================================================================
// Extension Hook Tests
// =============================================================================

/// Extension predicates are ANDed after the model's own filters.
#[test]
fn test_extension_predicate() {
    let context = QueryContext::standard().unwrap().with_extension(Arc::new(TenantFilter));
    let model = QueryModel::from_table("users", "u")
        .filter(Expr::gt(Expr::length(name()), Expr::constant(3)))
        .select(name());

    let query = BasicSqlGenerator.generate(&model, &context).unwrap().create_query();
    assert_eq!(
        query.sql,
        "SELECT \"u\".\"name\" AS \"name\" FROM \"users\" \"u\" \
         WHERE (length(\"u\".\"name\") > $1) AND (\"u\".\"tenant_id\" = $2)"
    );
    assert_eq!(query.params, vec![Value::Int(3), Value::Int(7)]);
}

// =============================================================================
// Concurrency Tests
// =============================================================================

/// A sealed registry serves lookups from many threads at once.
#[test]
fn test_concurrent_lookups() {
    let registry = Arc::new(MemberTranslatorRegistry::with_defaults().unwrap());

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                let column = Expr::column("t", format!("c{}", i), ValueKind::Text);
                let access = match Expr::length(column) {
                    Expr::Member(access) => access,
                    other => panic!("expected member access, got {:?}", other),
                };
                let mut out = SqlBuffer::new();
                let mut recurse = |e: &Expr, buf: &mut SqlBuffer| -> TranslationResult<()> {
                    if let Expr::Column(c) = e {
                        buf.push_qualified(&c.source, &c.name);
                    }
                    Ok(())
                };
                assert!(registry.try_translate(&access, &mut out, &mut recurse).unwrap());
                out.as_str().to_string()
            })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        assert_eq!(handle.join().unwrap(), format!("length(\"t\".\"c{}\")", i));
    }
}
