//! Projector Builder
//!
//! Turns a query model's projection into functions over row mappings. The
//! executor treats every function built here as pure: the same row always
//! yields the same value, and nothing is shared between applications.

use std::sync::Arc;

use crate::executor::{ExecutorError, ExecutorResult};
use crate::model::{AggregateFn, Expr, QueryModel, Value};
use crate::row::RowMapping;

/// Row mapping to projected element
pub type Projector = Arc<dyn Fn(&RowMapping) -> ExecutorResult<Value> + Send + Sync>;

/// One fold step bound to a row's element: accumulator in, accumulator out
pub type Combinator = Box<dyn FnOnce(Value) -> ExecutorResult<Value>>;

/// Row mapping to the fold step it contributes
pub type Accumulator = Arc<dyn Fn(&RowMapping) -> ExecutorResult<Combinator> + Send + Sync>;

/// Builds projectors for a query model's final projection
pub trait ProjectorBuilder {
    /// Standard projector producing one element per row
    fn build_projector(&self, model: &QueryModel) -> ExecutorResult<Projector>;

    /// Projector producing a combinator that folds the row's element into
    /// the accumulator with `func`
    fn build_accumulator(&self, model: &QueryModel, func: &AggregateFn)
        -> ExecutorResult<Accumulator>;
}

/// Reads elements straight from the row mapping.
///
/// Whole-row and record projections become a [`Value::Record`] of every
/// named column; any other projection is the single selected column.
#[derive(Debug, Clone, Copy, Default)]
pub struct ColumnProjectorBuilder;

impl ColumnProjectorBuilder {
    pub fn new() -> Self {
        Self
    }
}

fn first_column(row: &RowMapping) -> ExecutorResult<Value> {
    row.get(0)
        .cloned()
        .ok_or_else(|| ExecutorError::projection_failed("row has no columns"))
}

fn whole_row(row: &RowMapping) -> ExecutorResult<Value> {
    Ok(row.to_record())
}

impl ProjectorBuilder for ColumnProjectorBuilder {
    fn build_projector(&self, model: &QueryModel) -> ExecutorResult<Projector> {
        if model.sql_scalar_operator().is_some() {
            return Ok(Arc::new(first_column));
        }
        match model.effective_selector() {
            Expr::Record(_) | Expr::Source(_) => Ok(Arc::new(whole_row)),
            _ => Ok(Arc::new(first_column)),
        }
    }

    fn build_accumulator(
        &self,
        model: &QueryModel,
        func: &AggregateFn,
    ) -> ExecutorResult<Accumulator> {
        let project = self.build_projector(model)?;
        let func = func.clone();
        Ok(Arc::new(move |row: &RowMapping| {
            let element = project(row)?;
            let func = func.clone();
            let step: Combinator = Box::new(move |acc| {
                func.apply(acc, element)
                    .map_err(|e| ExecutorError::aggregate_failed(func.name(), e))
            });
            Ok(step)
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ResultOperator, ValueKind};

    fn row(names: &[&str], values: Vec<Value>) -> RowMapping {
        let names: Vec<String> = names.iter().map(|n| n.to_string()).collect();
        RowMapping::new(names.into(), values)
    }

    #[test]
    fn test_scalar_projection_reads_first_column() {
        let model = QueryModel::from_table("users", "u")
            .select(Expr::column("u", "age", ValueKind::Int));
        let project = ColumnProjectorBuilder.build_projector(&model).unwrap();
        assert_eq!(project(&row(&["age"], vec![Value::Int(30)])).unwrap(), Value::Int(30));
        assert!(project(&row(&[], vec![])).is_err());
    }

    #[test]
    fn test_whole_row_projection_builds_record() {
        let model = QueryModel::from_table("users", "u");
        let project = ColumnProjectorBuilder.build_projector(&model).unwrap();
        let value = project(&row(&["id", "name"], vec![Value::Int(1), Value::from("Ada")])).unwrap();
        assert_eq!(value.field("name"), Some(&Value::from("Ada")));
    }

    #[test]
    fn test_sql_scalar_reads_first_column() {
        let model = QueryModel::from_table("users", "u").with_operator(ResultOperator::Count);
        let project = ColumnProjectorBuilder.build_projector(&model).unwrap();
        assert_eq!(project(&row(&["count"], vec![Value::Int(4)])).unwrap(), Value::Int(4));
    }

    #[test]
    fn test_accumulator_folds_element() {
        let model = QueryModel::from_table("t", "t").select(Expr::column("t", "n", ValueKind::Int));
        let accumulate = ColumnProjectorBuilder
            .build_accumulator(&model, &AggregateFn::add())
            .unwrap();

        let step = accumulate(&row(&["n"], vec![Value::Int(5)])).unwrap();
        assert_eq!(step(Value::Int(10)).unwrap(), Value::Int(15));
    }

    #[test]
    fn test_accumulator_reports_combine_failure() {
        let model = QueryModel::from_table("t", "t").select(Expr::column("t", "n", ValueKind::Text));
        let accumulate = ColumnProjectorBuilder
            .build_accumulator(&model, &AggregateFn::add())
            .unwrap();

        let step = accumulate(&row(&["n"], vec![Value::from("x")])).unwrap();
        let err = step(Value::Int(1)).unwrap_err();
        assert_eq!(err.code(), crate::executor::ExecutorErrorCode::AggregateFailed);
    }
}
