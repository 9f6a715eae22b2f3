//! Union subquery rewrite
//!
//! A union cannot follow arbitrary clauses in the generated statement, so a
//! model carrying one is wrapped: everything up to the first union becomes a
//! named subquery, and the union (with any operator after it) applies to
//! the wrapper.

use super::expr::Expr;
use super::query::{QueryModel, QuerySource};

/// Wraps `model` in a subquery named `alias` if it carries a union.
///
/// Returns `None` when there is no union operator.
pub fn wrap_union_subquery(model: &QueryModel, alias: &str) -> Option<QueryModel> {
    let split = model.result_operators.iter().position(|op| op.is_union())?;

    let inner = QueryModel {
        source: model.source.clone(),
        body: model.body.clone(),
        selector: model.selector.clone(),
        result_operators: model.result_operators[..split].to_vec(),
    };

    Some(QueryModel {
        source: QuerySource::Subquery {
            model: Box::new(inner),
            alias: alias.to_string(),
        },
        body: Vec::new(),
        selector: Expr::Source(alias.to_string()),
        result_operators: model.result_operators[split..].to_vec(),
    })
}

/// Counts subquery sources along the main-source chain
pub fn subquery_depth(model: &QueryModel) -> usize {
    match &model.source {
        QuerySource::Table { .. } => 0,
        QuerySource::Subquery { model, .. } => 1 + subquery_depth(model),
    }
}
