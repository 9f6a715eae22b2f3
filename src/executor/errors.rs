//! Executor error types
//!
//! Error codes:
//! - QUERY_UNSUPPORTED_AGGREGATE_TYPE
//! - QUERY_EMPTY_AGGREGATE
//! - QUERY_CARDINALITY
//! - QUERY_NUMERIC_OVERFLOW
//! - QUERY_TYPE_MISMATCH
//! - QUERY_AGGREGATE_FAILED
//! - QUERY_PROJECTION_FAILED
//! - QUERY_GENERATION_FAILED
//! - QUERY_DATABASE_FAILED
//!
//! All are ERROR severity and none is retried.

use std::error::Error as StdError;
use std::fmt;

use crate::database::DatabaseError;
use crate::generator::GeneratorError;
use crate::model::{CombineError, ValueKind};
use crate::observability::Severity;
use crate::row::ConversionError;

/// Executor error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutorErrorCode {
    /// Sum/average over a non-numeric element kind
    UnsupportedAggregateType,
    /// General aggregate over zero rows
    EmptyAggregate,
    /// Single-row result with zero (no default) or several rows
    Cardinality,
    /// Sum outside the element type's range
    NumericOverflow,
    /// Projected value does not fit the requested type
    TypeMismatch,
    /// Caller-supplied combinator or result selector failed
    AggregateFailed,
    /// Projector could not build a value from a row
    ProjectionFailed,
    /// SQL generation collaborator failed
    GenerationFailed,
    /// Database collaborator failed
    DatabaseFailed,
}

impl ExecutorErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            ExecutorErrorCode::UnsupportedAggregateType => "QUERY_UNSUPPORTED_AGGREGATE_TYPE",
            ExecutorErrorCode::EmptyAggregate => "QUERY_EMPTY_AGGREGATE",
            ExecutorErrorCode::Cardinality => "QUERY_CARDINALITY",
            ExecutorErrorCode::NumericOverflow => "QUERY_NUMERIC_OVERFLOW",
            ExecutorErrorCode::TypeMismatch => "QUERY_TYPE_MISMATCH",
            ExecutorErrorCode::AggregateFailed => "QUERY_AGGREGATE_FAILED",
            ExecutorErrorCode::ProjectionFailed => "QUERY_PROJECTION_FAILED",
            ExecutorErrorCode::GenerationFailed => "QUERY_GENERATION_FAILED",
            ExecutorErrorCode::DatabaseFailed => "QUERY_DATABASE_FAILED",
        }
    }

    pub fn severity(&self) -> Severity {
        Severity::Error
    }
}

impl fmt::Display for ExecutorErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Executor error with code, message and optional cause
#[derive(Debug)]
pub struct ExecutorError {
    code: ExecutorErrorCode,
    message: String,
    source: Option<Box<dyn StdError + Send + Sync + 'static>>,
}

impl ExecutorError {
    fn new(code: ExecutorErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    fn with_source(
        code: ExecutorErrorCode,
        message: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn unsupported_aggregate_type(operator: &str, kind: ValueKind) -> Self {
        Self::new(
            ExecutorErrorCode::UnsupportedAggregateType,
            format!(
                "{} is not supported for element type {}; expected decimal, long, int, double or float",
                operator,
                kind.as_str()
            ),
        )
    }

    pub fn empty_aggregate() -> Self {
        Self::new(
            ExecutorErrorCode::EmptyAggregate,
            "aggregate without a seed requires at least one row",
        )
    }

    pub fn cardinality(rows: usize) -> Self {
        let message = if rows == 0 {
            "sequence contains no elements".to_string()
        } else {
            format!("sequence contains more than one element ({} loaded)", rows)
        };
        Self::new(ExecutorErrorCode::Cardinality, message)
    }

    pub fn numeric_overflow(kind: ValueKind) -> Self {
        Self::new(
            ExecutorErrorCode::NumericOverflow,
            format!("sum exceeds the range of {}", kind.as_str()),
        )
    }

    pub fn type_mismatch(source: ConversionError) -> Self {
        Self::with_source(
            ExecutorErrorCode::TypeMismatch,
            source.to_string(),
            source,
        )
    }

    pub fn aggregate_failed(function: &str, source: CombineError) -> Self {
        Self::with_source(
            ExecutorErrorCode::AggregateFailed,
            format!("{} failed: {}", function, source),
            source,
        )
    }

    pub fn projection_failed(reason: impl Into<String>) -> Self {
        Self::new(ExecutorErrorCode::ProjectionFailed, reason)
    }

    pub fn generation_failed(source: GeneratorError) -> Self {
        Self::with_source(
            ExecutorErrorCode::GenerationFailed,
            source.to_string(),
            source,
        )
    }

    pub fn database_failed(source: DatabaseError) -> Self {
        Self::with_source(ExecutorErrorCode::DatabaseFailed, source.to_string(), source)
    }

    pub fn code(&self) -> ExecutorErrorCode {
        self.code
    }

    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// The generator error this wraps, unchanged
    pub fn generator_error(&self) -> Option<&GeneratorError> {
        self.source.as_ref()?.downcast_ref()
    }

    /// The database error this wraps, unchanged
    pub fn database_error(&self) -> Option<&DatabaseError> {
        self.source.as_ref()?.downcast_ref()
    }
}

impl fmt::Display for ExecutorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity(), self.code.code(), self.message)
    }
}

impl StdError for ExecutorError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

impl From<GeneratorError> for ExecutorError {
    fn from(err: GeneratorError) -> Self {
        Self::generation_failed(err)
    }
}

impl From<DatabaseError> for ExecutorError {
    fn from(err: DatabaseError) -> Self {
        Self::database_failed(err)
    }
}

impl From<ConversionError> for ExecutorError {
    fn from(err: ConversionError) -> Self {
        Self::type_mismatch(err)
    }
}

/// Result type for executor operations
pub type ExecutorResult<T> = Result<T, ExecutorError>;
