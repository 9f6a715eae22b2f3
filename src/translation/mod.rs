//! Member Translation subsystem
//!
//! Translates member-access nodes (e.g. "length of a string") into SQL
//! fragments for the SQL generator.
//!
//! # Lifecycle
//!
//! 1. Build a [`RegistryBuilder`] at startup and install translators
//! 2. Seal it with `build()`
//! 3. Share the immutable [`MemberTranslatorRegistry`] by reference
//!
//! A member without a translator is not an error: `try_translate` returns
//! `Ok(false)` and the generator falls back to its own handling.

mod buffer;
mod defaults;
mod errors;
mod registry;

pub use buffer::SqlBuffer;
pub use defaults::{BuiltinTranslators, FunctionCallTranslator};
pub use errors::{TranslationError, TranslationResult};
pub use registry::{
    MemberTranslator, MemberTranslatorRegistry, Recurse, RegistryBuilder, TranslatorPlugin,
};
