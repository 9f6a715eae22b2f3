//! # Generator Errors

use thiserror::Error;

use crate::row::ConversionError;
use crate::translation::TranslationError;

/// Result type for SQL generation and row extraction
pub type GeneratorResult<T> = Result<T, GeneratorError>;

/// SQL generation errors
#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("Invalid query model: {0}")]
    InvalidModel(String),

    #[error("Unsupported expression: {0}")]
    UnsupportedExpression(String),

    #[error("Member translation failed: {0}")]
    Translation(#[from] TranslationError),

    #[error("Column '{column}' conversion failed: {source}")]
    Conversion {
        column: String,
        #[source]
        source: ConversionError,
    },

    #[error("Row has {found} columns, expected {expected}")]
    ColumnCount { expected: usize, found: usize },
}

impl GeneratorError {
    /// Unwraps generator failures that travelled through a member
    /// translator's recursion, so they surface unchanged.
    pub fn from_translation(err: TranslationError) -> Self {
        match err {
            TranslationError::Subexpression(inner) => *inner,
            other => GeneratorError::Translation(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subexpression_unwrapped() {
        let nested = TranslationError::subexpression(GeneratorError::UnsupportedExpression(
            "window".into(),
        ));
        let err = GeneratorError::from_translation(nested);
        assert!(matches!(err, GeneratorError::UnsupportedExpression(_)));
    }

    #[test]
    fn test_other_translation_errors_wrapped() {
        let err = GeneratorError::from_translation(TranslationError::DuplicateTranslator {
            declaring_type: "string".into(),
            member: "Length".into(),
        });
        assert!(matches!(err, GeneratorError::Translation(_)));
    }
}
