//! SQL Generation subsystem
//!
//! The executor depends on a generator through [`SqlGenerator`]: given a
//! query model and the shared [`QueryContext`], it returns a
//! [`GeneratedQuery`] exposing the command to run and the per-row
//! extraction that yields a [`RowMapping`].
//!
//! [`BasicSqlGenerator`] is a PostgreSQL-dialect implementation covering
//! the common expression and result-operator forms.

mod basic;
mod command;
mod context;
mod errors;

pub use basic::BasicSqlGenerator;
pub use command::SqlCommand;
pub use context::{
    coerce, ColumnConverter, ConverterFactory, QueryContext, QueryExtension, StandardConverters,
};
pub use errors::{GeneratorError, GeneratorResult};

use crate::model::QueryModel;
use crate::row::{RawRow, RowMapping};

/// Output of one generation: what to run and how to read each row
pub trait GeneratedQuery: Send + Sync {
    /// The command to execute
    fn create_query(&self) -> SqlCommand;

    /// Extracts one returned row
    fn process_row(&self, raw: RawRow) -> GeneratorResult<RowMapping>;
}

/// Turns a query model into a runnable query
pub trait SqlGenerator {
    fn generate(
        &self,
        model: &QueryModel,
        context: &QueryContext,
    ) -> GeneratorResult<Box<dyn GeneratedQuery>>;
}
