//! Query Model subsystem
//!
//! The model is a language-neutral, immutable description of one logical
//! query: a source, body clauses, a projection and an ordered list of
//! result operators. The engine never mutates a caller's model; rewrites
//! produce new models.

mod expr;
mod operators;
mod query;
mod rewrite;
mod value;

pub use expr::{BinaryOp, ColumnRef, Expr, MemberAccess, BYTES_TYPE, STRING_TYPE};
pub use operators::{AggregateFn, CombineError, ResultOperator, ResultSelector, SeededAggregate};
pub use query::{BodyClause, Ordering, QueryModel, QuerySource, SortDirection};
pub use rewrite::{subquery_depth, wrap_union_subquery};
pub use value::{Value, ValueKind};
