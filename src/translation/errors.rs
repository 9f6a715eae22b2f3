//! # Translation Errors

use thiserror::Error;

use crate::generator::GeneratorError;

/// Result type for member translation
pub type TranslationResult<T> = Result<T, TranslationError>;

/// Member translation errors
///
/// An unmatched member is not an error; lookups report it as `Ok(false)`.
#[derive(Debug, Error)]
pub enum TranslationError {
    #[error("Translator already registered for {declaring_type}.{member}")]
    DuplicateTranslator {
        declaring_type: String,
        member: String,
    },

    #[error("Translator for {declaring_type}.{member} rejected the node: {reason}")]
    Rejected {
        declaring_type: String,
        member: String,
        reason: String,
    },

    #[error("Sub-expression translation failed: {0}")]
    Subexpression(#[source] Box<GeneratorError>),
}

impl TranslationError {
    /// Wraps a generator failure raised while translating a sub-expression
    pub fn subexpression(err: GeneratorError) -> Self {
        TranslationError::Subexpression(Box::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_message() {
        let err = TranslationError::DuplicateTranslator {
            declaring_type: "string".into(),
            member: "Length".into(),
        };
        assert_eq!(
            err.to_string(),
            "Translator already registered for string.Length"
        );
    }
}
