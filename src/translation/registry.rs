//! Member Translation Registry
//!
//! Maps `(declaring type, member name)` to a translator that emits the
//! equivalent SQL fragment. Registration happens on a builder during
//! startup; `build()` seals it into an immutable registry that is shared
//! by reference and read concurrently without locking.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::model::{Expr, MemberAccess};
use crate::observability::{Event, Logger};

use super::buffer::SqlBuffer;
use super::errors::{TranslationError, TranslationResult};

/// Callback translating a sub-expression into the given buffer
pub type Recurse<'a> = dyn FnMut(&Expr, &mut SqlBuffer) -> TranslationResult<()> + 'a;

/// Emits SQL for one member access.
///
/// Implementations write a complete, self-contained fragment and delegate
/// the node's own sub-expression back through `recurse`.
pub trait MemberTranslator: Send + Sync {
    fn translate(
        &self,
        access: &MemberAccess,
        out: &mut SqlBuffer,
        recurse: &mut Recurse<'_>,
    ) -> TranslationResult<()>;
}

/// Adapter for closure translators
struct FnTranslator<F>(F);

impl<F> MemberTranslator for FnTranslator<F>
where
    F: Fn(&MemberAccess, &mut SqlBuffer, &mut Recurse<'_>) -> TranslationResult<()> + Send + Sync,
{
    fn translate(
        &self,
        access: &MemberAccess,
        out: &mut SqlBuffer,
        recurse: &mut Recurse<'_>,
    ) -> TranslationResult<()> {
        (self.0)(access, out, recurse)
    }
}

/// A batch of translators contributed during startup discovery
pub trait TranslatorPlugin {
    /// Name used in logs
    fn name(&self) -> &str;

    /// Registers this plugin's translators
    fn register(&self, builder: &mut RegistryBuilder) -> TranslationResult<()>;
}

type TranslatorTable = HashMap<String, HashMap<String, Arc<dyn MemberTranslator>>>;

/// Startup-time registry under construction
#[derive(Default)]
pub struct RegistryBuilder {
    translators: TranslatorTable,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a translator; each `(declaring_type, member)` pair may be
    /// registered once.
    pub fn register<T>(
        &mut self,
        declaring_type: &str,
        member: &str,
        translator: T,
    ) -> TranslationResult<&mut Self>
    where
        T: MemberTranslator + 'static,
    {
        let members = self
            .translators
            .entry(declaring_type.to_string())
            .or_default();
        if members.contains_key(member) {
            return Err(TranslationError::DuplicateTranslator {
                declaring_type: declaring_type.to_string(),
                member: member.to_string(),
            });
        }
        members.insert(member.to_string(), Arc::new(translator));

        Logger::trace(
            Event::TranslatorRegistered.as_str(),
            &[("declaring_type", declaring_type), ("member", member)],
        );
        Ok(self)
    }

    /// Registers a closure translator
    pub fn register_fn<F>(
        &mut self,
        declaring_type: &str,
        member: &str,
        translator: F,
    ) -> TranslationResult<&mut Self>
    where
        F: Fn(&MemberAccess, &mut SqlBuffer, &mut Recurse<'_>) -> TranslationResult<()>
            + Send
            + Sync
            + 'static,
    {
        self.register(declaring_type, member, FnTranslator(translator))
    }

    /// Lets a plugin register its translators
    pub fn install(&mut self, plugin: &dyn TranslatorPlugin) -> TranslationResult<&mut Self> {
        plugin.register(self)?;
        Logger::trace(
            Event::TranslatorPluginInstalled.as_str(),
            &[("plugin", plugin.name())],
        );
        Ok(self)
    }

    /// Seals the builder
    pub fn build(self) -> MemberTranslatorRegistry {
        let registry = MemberTranslatorRegistry {
            translators: self.translators,
        };
        let count = registry.len().to_string();
        Logger::trace(
            Event::TranslationRegistrySealed.as_str(),
            &[("translators", &count)],
        );
        registry
    }
}

/// Immutable member translation table
pub struct MemberTranslatorRegistry {
    translators: TranslatorTable,
}

impl MemberTranslatorRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// A registry without any translator
    pub fn empty() -> Self {
        RegistryBuilder::new().build()
    }

    /// A registry holding only the built-in translators
    pub fn with_defaults() -> TranslationResult<Self> {
        let mut builder = RegistryBuilder::new();
        builder.install(&super::defaults::BuiltinTranslators)?;
        Ok(builder.build())
    }

    /// Translates `access` into `out` if a translator is registered for it.
    ///
    /// Returns `Ok(false)` and leaves `out` untouched when nothing matches.
    /// On a match the fragment is built aside and appended only once the
    /// translator succeeds, so a failing sub-expression leaves no partial
    /// text behind either.
    pub fn try_translate(
        &self,
        access: &MemberAccess,
        out: &mut SqlBuffer,
        recurse: &mut Recurse<'_>,
    ) -> TranslationResult<bool> {
        let Some(translator) = self.lookup(&access.declaring_type, &access.member) else {
            return Ok(false);
        };

        let mut fragment = out.fork();
        translator.translate(access, &mut fragment, recurse)?;
        out.append(fragment);
        Ok(true)
    }

    /// Returns true if a translator exists for the pair
    pub fn contains(&self, declaring_type: &str, member: &str) -> bool {
        self.lookup(declaring_type, member).is_some()
    }

    pub fn len(&self) -> usize {
        self.translators.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lookup(&self, declaring_type: &str, member: &str) -> Option<&Arc<dyn MemberTranslator>> {
        self.translators.get(declaring_type)?.get(member)
    }
}

impl fmt::Debug for MemberTranslatorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<String> = self
            .translators
            .iter()
            .flat_map(|(ty, members)| members.keys().map(move |m| format!("{}.{}", ty, m)))
            .collect();
        keys.sort();
        f.debug_struct("MemberTranslatorRegistry")
            .field("translators", &keys)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ValueKind, STRING_TYPE};

    fn column_writer() -> impl FnMut(&Expr, &mut SqlBuffer) -> TranslationResult<()> {
        |expr: &Expr, out: &mut SqlBuffer| {
            if let Expr::Column(c) = expr {
                out.push_qualified(&c.source, &c.name);
            }
            Ok(())
        }
    }

    fn upper_access() -> MemberAccess {
        MemberAccess::new(
            Expr::column("it", "name", ValueKind::Text),
            STRING_TYPE,
            "Upper",
            ValueKind::Text,
        )
    }

    #[test]
    fn test_register_and_translate() {
        let mut builder = MemberTranslatorRegistry::builder();
        builder
            .register_fn(STRING_TYPE, "Upper", |access, out, recurse| {
                out.push_sql("upper(");
                recurse(&access.target, &mut *out)?;
                out.push_sql(")");
                Ok(())
            })
            .unwrap();
        let registry = builder.build();

        let mut out = SqlBuffer::new();
        let matched = registry
            .try_translate(&upper_access(), &mut out, &mut column_writer())
            .unwrap();

        assert!(matched);
        assert_eq!(out.as_str(), "upper(\"it\".\"name\")");
    }

    #[test]
    fn test_unmatched_leaves_buffer_untouched() {
        let registry = MemberTranslatorRegistry::empty();
        let mut out = SqlBuffer::new();
        out.push_sql("SELECT ");

        let matched = registry
            .try_translate(&upper_access(), &mut out, &mut column_writer())
            .unwrap();

        assert!(!matched);
        assert_eq!(out.as_str(), "SELECT ");
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut builder = MemberTranslatorRegistry::builder();
        builder
            .register_fn(STRING_TYPE, "Upper", |_, _, _| Ok(()))
            .unwrap();
        let err = builder
            .register_fn(STRING_TYPE, "Upper", |_, _, _| Ok(()))
            .err()
            .unwrap();
        assert!(matches!(err, TranslationError::DuplicateTranslator { .. }));
    }

    #[test]
    fn test_failed_translation_writes_nothing() {
        let mut builder = MemberTranslatorRegistry::builder();
        builder
            .register_fn(STRING_TYPE, "Upper", |access, out, recurse| {
                out.push_sql("upper(");
                recurse(&access.target, &mut *out)?;
                out.push_sql(")");
                Ok(())
            })
            .unwrap();
        let registry = builder.build();

        let mut out = SqlBuffer::new();
        let mut failing = |_: &Expr, _: &mut SqlBuffer| -> TranslationResult<()> {
            Err(TranslationError::Rejected {
                declaring_type: "x".into(),
                member: "y".into(),
                reason: "boom".into(),
            })
        };
        assert!(registry
            .try_translate(&upper_access(), &mut out, &mut failing)
            .is_err());
        assert!(out.is_empty());
    }

    #[test]
    fn test_registry_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<MemberTranslatorRegistry>();
    }

    #[test]
    fn test_with_defaults_installs_builtins() {
        let registry = MemberTranslatorRegistry::with_defaults().unwrap();
        assert_eq!(registry.len(), 2);
        assert!(registry.contains("string", "Length"));
        assert!(registry.contains("bytes", "Length"));
    }

    #[test]
    fn test_debug_lists_keys() {
        let registry = MemberTranslatorRegistry::with_defaults().unwrap();
        let debug = format!("{:?}", registry);
        assert!(debug.contains("bytes.Length"));
        assert!(debug.contains("string.Length"));
    }
}
