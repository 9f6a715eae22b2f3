//! Query Executor subsystem
//!
//! Orchestrates one logical query: picks a strategy from the model's
//! result operators, drives row loading through the generator and the
//! database, then applies the strategy's post-load semantics.
//!
//! # Entry points
//!
//! - [`QueryExecutor::execute_scalar`]: seeded aggregate, aggregate, sum,
//!   average, or a single SQL-computed value
//! - [`QueryExecutor::execute_single`]: exactly one row, optional default
//! - [`QueryExecutor::execute_collection`]: lazy sequence of elements

mod errors;
mod executor;
mod numeric;
mod results;
mod strategy;

pub use errors::{ExecutorError, ExecutorErrorCode, ExecutorResult};
pub use executor::QueryExecutor;
pub use numeric::NumericKind;
pub use results::QueryResults;
pub use strategy::ScalarStrategy;
