//! relquery - query translation and execution over relational backends
//!
//! A caller builds a [`model::QueryModel`]; the [`executor::QueryExecutor`]
//! picks a strategy from its result operators, has a
//! [`generator::SqlGenerator`] turn it into one SQL command, runs it through
//! a [`database::DatabaseQuery`], and maps the rows back into typed results.
//! Member accesses inside expressions are translated through the
//! [`translation::MemberTranslatorRegistry`], sealed once at startup.

pub mod config;
pub mod database;
pub mod executor;
pub mod generator;
pub mod model;
pub mod observability;
pub mod projector;
pub mod row;
pub mod translation;
