//! Generation context
//!
//! Process-scoped services handed to the SQL generator: the member
//! translation registry, type-conversion hooks, extension hooks and the
//! counters. Built once at startup and shared by reference.

use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::config::{validate_union_alias, ConfigError, EngineConfig};
use crate::model::{Expr, Value, ValueKind};
use crate::observability::MetricsRegistry;
use crate::row::ConversionError;
use crate::translation::{
    BuiltinTranslators, MemberTranslatorRegistry, RegistryBuilder, TranslationResult,
    TranslatorPlugin,
};

/// Coerces one driver-decoded column value to a declared kind
pub type ColumnConverter = Arc<dyn Fn(Value) -> Result<Value, ConversionError> + Send + Sync>;

/// Type-conversion hooks used while building row mappings
pub trait ConverterFactory: Send + Sync {
    fn converter_for(&self, kind: ValueKind) -> ColumnConverter;
}

/// Host-supplied hook adding a predicate to every scan of a table
pub trait QueryExtension: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &str;

    /// Predicate ANDed into the WHERE clause of a scan of `table` under `alias`
    fn table_predicate(&self, table: &str, alias: &str) -> Option<Expr>;
}

/// Default conversions between driver values and declared kinds
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardConverters;

impl ConverterFactory for StandardConverters {
    fn converter_for(&self, kind: ValueKind) -> ColumnConverter {
        Arc::new(move |value| coerce(value, kind))
    }
}

/// Coerces `value` to `kind`; null always stays null
pub fn coerce(value: Value, kind: ValueKind) -> Result<Value, ConversionError> {
    let target = kind.as_str();
    let parse_err = |text: &str| ConversionError::Mismatch {
        found: format!("string '{}'", text),
        target,
    };

    match (kind, value) {
        (_, Value::Null) => Ok(Value::Null),
        (ValueKind::Any | ValueKind::Record, v) => Ok(v),

        (ValueKind::Bool, Value::Bool(b)) => Ok(Value::Bool(b)),
        (ValueKind::Bool, Value::Text(s)) => match s.as_str() {
            "t" | "true" => Ok(Value::Bool(true)),
            "f" | "false" => Ok(Value::Bool(false)),
            _ => Err(parse_err(&s)),
        },

        (ValueKind::Int, Value::Int(i)) => Ok(Value::Int(i)),
        (ValueKind::Int, Value::Long(l)) => i32::try_from(l)
            .map(Value::Int)
            .map_err(|_| ConversionError::out_of_range(l, target)),
        (ValueKind::Int, Value::Text(s)) => s.parse().map(Value::Int).map_err(|_| parse_err(&s)),

        (ValueKind::Long, Value::Long(l)) => Ok(Value::Long(l)),
        (ValueKind::Long, Value::Int(i)) => Ok(Value::Long(i64::from(i))),
        (ValueKind::Long, Value::Text(s)) => s.parse().map(Value::Long).map_err(|_| parse_err(&s)),

        (ValueKind::Float, Value::Float(f)) => Ok(Value::Float(f)),
        (ValueKind::Float, Value::Double(d)) => Ok(Value::Float(d as f32)),
        (ValueKind::Float, Value::Int(i)) => Ok(Value::Float(i as f32)),
        (ValueKind::Float, Value::Long(l)) => Ok(Value::Float(l as f32)),
        (ValueKind::Float, Value::Text(s)) => {
            s.parse().map(Value::Float).map_err(|_| parse_err(&s))
        }

        (ValueKind::Double, Value::Double(d)) => Ok(Value::Double(d)),
        (ValueKind::Double, Value::Float(f)) => Ok(Value::Double(f64::from(f))),
        (ValueKind::Double, Value::Int(i)) => Ok(Value::Double(f64::from(i))),
        (ValueKind::Double, Value::Long(l)) => Ok(Value::Double(l as f64)),
        (ValueKind::Double, Value::Decimal(d)) => d
            .to_f64()
            .map(Value::Double)
            .ok_or_else(|| ConversionError::out_of_range(d, target)),
        (ValueKind::Double, Value::Text(s)) => {
            s.parse().map(Value::Double).map_err(|_| parse_err(&s))
        }

        (ValueKind::Decimal, Value::Decimal(d)) => Ok(Value::Decimal(d)),
        (ValueKind::Decimal, Value::Int(i)) => Ok(Value::Decimal(Decimal::from(i))),
        (ValueKind::Decimal, Value::Long(l)) => Ok(Value::Decimal(Decimal::from(l))),
        (ValueKind::Decimal, Value::Double(d)) => Decimal::from_f64(d)
            .map(Value::Decimal)
            .ok_or_else(|| ConversionError::out_of_range(d, target)),
        (ValueKind::Decimal, Value::Text(s)) => Decimal::from_str(&s)
            .map(Value::Decimal)
            .map_err(|_| parse_err(&s)),

        (ValueKind::Text, Value::Text(s)) => Ok(Value::Text(s)),
        (ValueKind::Bytes, Value::Bytes(b)) => Ok(Value::Bytes(b)),

        (ValueKind::Timestamp, Value::Timestamp(t)) => Ok(Value::Timestamp(t)),
        (ValueKind::Timestamp, Value::Text(s)) => DateTime::parse_from_rfc3339(&s)
            .map(|t| Value::Timestamp(t.with_timezone(&Utc)))
            .map_err(|_| parse_err(&s)),

        (ValueKind::Uuid, Value::Uuid(u)) => Ok(Value::Uuid(u)),
        (ValueKind::Uuid, Value::Text(s)) => {
            Uuid::parse_str(&s).map(Value::Uuid).map_err(|_| parse_err(&s))
        }

        (_, other) => Err(ConversionError::mismatch(&other, target)),
    }
}

/// Services shared by every generation and execution
#[derive(Clone)]
pub struct QueryContext {
    translators: Arc<MemberTranslatorRegistry>,
    converters: Arc<dyn ConverterFactory>,
    extensions: Vec<Arc<dyn QueryExtension>>,
    metrics: Arc<MetricsRegistry>,
    union_alias: String,
}

impl QueryContext {
    /// Creates a context around a sealed registry with standard converters
    pub fn new(translators: Arc<MemberTranslatorRegistry>) -> Self {
        Self {
            translators,
            converters: Arc::new(StandardConverters),
            extensions: Vec::new(),
            metrics: Arc::new(MetricsRegistry::new()),
            union_alias: EngineConfig::default().union_subquery_alias,
        }
    }

    /// Builds the registry from configuration plus discovered plugins.
    ///
    /// Must run during startup; the returned context never changes its
    /// translators afterwards.
    pub fn from_config(
        config: &EngineConfig,
        plugins: &[&dyn TranslatorPlugin],
    ) -> TranslationResult<Self> {
        let mut builder = RegistryBuilder::new();
        if config.register_default_translators {
            builder.install(&BuiltinTranslators)?;
        }
        for plugin in plugins {
            builder.install(*plugin)?;
        }

        let mut context = Self::new(Arc::new(builder.build()));
        context.union_alias = config.union_subquery_alias.clone();
        Ok(context)
    }

    /// Context for the default configuration and no plugins
    pub fn standard() -> TranslationResult<Self> {
        Self::from_config(&EngineConfig::default(), &[])
    }

    pub fn with_converters(mut self, converters: Arc<dyn ConverterFactory>) -> Self {
        self.converters = converters;
        self
    }

    pub fn with_extension(mut self, extension: Arc<dyn QueryExtension>) -> Self {
        self.extensions.push(extension);
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsRegistry>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Sets the union wrapper alias, under the same rule as configuration
    pub fn with_union_alias(mut self, alias: impl Into<String>) -> Result<Self, ConfigError> {
        let alias = alias.into();
        validate_union_alias(&alias)?;
        self.union_alias = alias;
        Ok(self)
    }

    pub fn translators(&self) -> &MemberTranslatorRegistry {
        &self.translators
    }

    pub fn converters(&self) -> &dyn ConverterFactory {
        self.converters.as_ref()
    }

    pub fn extensions(&self) -> &[Arc<dyn QueryExtension>] {
        &self.extensions
    }

    pub fn metrics(&self) -> &MetricsRegistry {
        &self.metrics
    }

    /// Alias given to the subquery a union is wrapped in
    pub fn union_alias(&self) -> &str {
        &self.union_alias
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coerce_numeric() {
        assert_eq!(coerce(Value::Int(3), ValueKind::Long).unwrap(), Value::Long(3));
        assert_eq!(
            coerce(Value::from("12.50"), ValueKind::Decimal).unwrap(),
            Value::Decimal(Decimal::new(1250, 2))
        );
        assert!(coerce(Value::Long(i64::MAX), ValueKind::Int).is_err());
    }

    #[test]
    fn test_coerce_null_and_any() {
        assert_eq!(coerce(Value::Null, ValueKind::Int).unwrap(), Value::Null);
        assert_eq!(
            coerce(Value::from("x"), ValueKind::Any).unwrap(),
            Value::from("x")
        );
    }

    #[test]
    fn test_coerce_rejects_mismatch() {
        let err = coerce(Value::Bytes(vec![1]), ValueKind::Int).unwrap_err();
        assert_eq!(err.to_string(), "cannot convert bytes into int");
        assert!(coerce(Value::from("abc"), ValueKind::Long).is_err());
    }

    #[test]
    fn test_from_config_without_defaults() {
        let config = EngineConfig {
            register_default_translators: false,
            ..EngineConfig::default()
        };
        let context = QueryContext::from_config(&config, &[]).unwrap();
        assert!(context.translators().is_empty());
    }

    #[test]
    fn test_from_config_duplicate_plugin_fails() {
        let config = EngineConfig::default();
        assert!(QueryContext::from_config(&config, &[&BuiltinTranslators]).is_err());
    }

    #[test]
    fn test_union_alias_validated() {
        let context = QueryContext::standard()
            .unwrap()
            .with_union_alias("merged")
            .unwrap();
        assert_eq!(context.union_alias(), "merged");

        let err = QueryContext::standard()
            .unwrap()
            .with_union_alias("sq\" UNION SELECT 1 --")
            .err()
            .unwrap();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "union_subquery_alias",
                ..
            }
        ));
    }

    #[test]
    fn test_standard_context() {
        let context = QueryContext::standard().unwrap();
        assert!(context.translators().contains("string", "Length"));
        assert_eq!(context.union_alias(), "sq");
    }
}
