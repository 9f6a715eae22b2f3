//! Built-in member translations
//!
//! - `string.Length` -> `length(<expr>)`
//! - `bytes.Length`  -> `octet_length(<expr>)`

use crate::model::{MemberAccess, BYTES_TYPE, STRING_TYPE};

use super::buffer::SqlBuffer;
use super::errors::TranslationResult;
use super::registry::{MemberTranslator, Recurse, RegistryBuilder, TranslatorPlugin};

/// Wraps the translated target in a single-argument SQL function call
#[derive(Debug, Clone, Copy)]
pub struct FunctionCallTranslator {
    function: &'static str,
}

impl FunctionCallTranslator {
    pub const fn new(function: &'static str) -> Self {
        Self { function }
    }

    pub fn function(&self) -> &'static str {
        self.function
    }
}

impl MemberTranslator for FunctionCallTranslator {
    fn translate(
        &self,
        access: &MemberAccess,
        out: &mut SqlBuffer,
        recurse: &mut Recurse<'_>,
    ) -> TranslationResult<()> {
        out.push_sql(self.function);
        out.push_sql("(");
        recurse(&access.target, &mut *out)?;
        out.push_sql(")");
        Ok(())
    }
}

/// Plugin installing the built-in translations
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinTranslators;

impl TranslatorPlugin for BuiltinTranslators {
    fn name(&self) -> &str {
        "builtin"
    }

    fn register(&self, builder: &mut RegistryBuilder) -> TranslationResult<()> {
        builder.register(STRING_TYPE, "Length", FunctionCallTranslator::new("length"))?;
        builder.register(
            BYTES_TYPE,
            "Length",
            FunctionCallTranslator::new("octet_length"),
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Expr, ValueKind};
    use crate::translation::MemberTranslatorRegistry;

    fn translate(expr: &Expr) -> (bool, String) {
        let registry = MemberTranslatorRegistry::with_defaults().unwrap();
        let Expr::Member(access) = expr else {
            panic!("expected member access");
        };
        let mut out = SqlBuffer::new();
        let mut recurse = |e: &Expr, buf: &mut SqlBuffer| -> TranslationResult<()> {
            if let Expr::Column(c) = e {
                buf.push_qualified(&c.source, &c.name);
            }
            Ok(())
        };
        let matched = registry.try_translate(access, &mut out, &mut recurse).unwrap();
        (matched, out.as_str().to_string())
    }

    #[test]
    fn test_string_length() {
        let expr = Expr::length(Expr::column("it", "name", ValueKind::Text));
        assert_eq!(translate(&expr), (true, "length(\"it\".\"name\")".to_string()));
    }

    #[test]
    fn test_bytes_length() {
        let expr = Expr::length(Expr::column("it", "payload", ValueKind::Bytes));
        assert_eq!(
            translate(&expr),
            (true, "octet_length(\"it\".\"payload\")".to_string())
        );
    }

    #[test]
    fn test_unknown_member_not_matched() {
        let expr = Expr::member(
            Expr::column("it", "name", ValueKind::Text),
            STRING_TYPE,
            "Trim",
            ValueKind::Text,
        );
        assert_eq!(translate(&expr), (false, String::new()));
    }

    #[test]
    fn test_plugin_installs_twice_fails() {
        let mut builder = RegistryBuilder::new();
        builder.install(&BuiltinTranslators).unwrap();
        assert!(builder.install(&BuiltinTranslators).is_err());
    }
}
