//! Scalar strategy classification
//!
//! Result operators are scanned from the end; the first recognized one
//! decides. A model with none of them runs as a single-row query that
//! fails when empty.

use crate::model::{AggregateFn, QueryModel, ResultOperator, SeededAggregate};

/// How `execute_scalar` evaluates a model
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScalarStrategy<'m> {
    /// Fold from the caller's seed
    SeededAggregate(&'m SeededAggregate),
    /// Fold with the first element as the initial accumulator
    Aggregate(&'m AggregateFn),
    Sum,
    Average,
    /// Exactly one row, no default when empty
    Single,
}

impl<'m> ScalarStrategy<'m> {
    pub fn classify(model: &'m QueryModel) -> Self {
        model
            .result_operators
            .iter()
            .rev()
            .find_map(|op| match op {
                ResultOperator::AggregateFromSeed(seeded) => {
                    Some(ScalarStrategy::SeededAggregate(seeded))
                }
                ResultOperator::Aggregate(func) => Some(ScalarStrategy::Aggregate(func)),
                ResultOperator::Sum => Some(ScalarStrategy::Sum),
                ResultOperator::Average => Some(ScalarStrategy::Average),
                _ => None,
            })
            .unwrap_or(ScalarStrategy::Single)
    }

    pub fn name(&self) -> &'static str {
        match self {
            ScalarStrategy::SeededAggregate(_) => "seeded_aggregate",
            ScalarStrategy::Aggregate(_) => "aggregate",
            ScalarStrategy::Sum => "sum",
            ScalarStrategy::Average => "average",
            ScalarStrategy::Single => "single",
        }
    }
}
