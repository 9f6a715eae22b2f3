//! Query executor
//!
//! Execution flow:
//! 1. Classify the model's result operators into a strategy
//! 2. Rewrite a union into a subquery wrapper
//! 3. Generate the command and load every row through the database
//! 4. Trim to the final row when "last" was requested (collection path)
//! 5. Project rows and combine them as the strategy requires
//!
//! Row loading is eager: the full result set is materialized before any
//! projection runs. Folds run strictly left to right.

use std::ops::ControlFlow;

use crate::database::DatabaseQuery;
use crate::generator::{BasicSqlGenerator, GeneratorError, QueryContext, SqlGenerator};
use crate::model::{
    wrap_union_subquery, AggregateFn, QueryModel, QuerySource, ResultOperator, SeededAggregate,
    Value,
};
use crate::observability::{Event, ObservationScope};
use crate::projector::{ColumnProjectorBuilder, ProjectorBuilder};
use crate::row::{FromValue, RowMapping};

use super::errors::{ExecutorError, ExecutorResult};
use super::numeric::NumericKind;
use super::results::{Loaded, QueryResults};
use super::strategy::ScalarStrategy;

/// Stateless, re-entrant executor over its collaborators
pub struct QueryExecutor<'a, D: DatabaseQuery, G: SqlGenerator, P: ProjectorBuilder> {
    database: &'a D,
    generator: &'a G,
    projectors: &'a P,
    context: &'a QueryContext,
}

impl<'a, D: DatabaseQuery> QueryExecutor<'a, D, BasicSqlGenerator, ColumnProjectorBuilder> {
    /// Executor using the basic generator and column projectors
    pub fn basic(database: &'a D, context: &'a QueryContext) -> Self {
        Self::new(database, &BasicSqlGenerator, &ColumnProjectorBuilder, context)
    }
}

impl<'a, D: DatabaseQuery, G: SqlGenerator, P: ProjectorBuilder> QueryExecutor<'a, D, G, P> {
    pub fn new(
        database: &'a D,
        generator: &'a G,
        projectors: &'a P,
        context: &'a QueryContext,
    ) -> Self {
        Self {
            database,
            generator,
            projectors,
            context,
        }
    }

    /// Evaluates a model to one value.
    ///
    /// Seeded aggregate, aggregate, sum and average are computed here; any
    /// other model must produce exactly one row.
    pub fn execute_scalar<T: FromValue>(&self, model: &QueryModel) -> ExecutorResult<T> {
        self.observe("scalar", |scope| {
            let strategy = ScalarStrategy::classify(model);
            scope.trace(Event::QueryStrategySelected, &[("strategy", strategy.name())]);

            let value = match strategy {
                ScalarStrategy::SeededAggregate(seeded) => {
                    self.seeded_aggregate(model, seeded, scope)?
                }
                ScalarStrategy::Aggregate(func) => self.aggregate(model, func, scope)?,
                ScalarStrategy::Sum => {
                    let kind = NumericKind::require("sum", model.element_kind())?;
                    kind.sum(self.project_all(model, scope)?)?
                }
                ScalarStrategy::Average => {
                    let kind = NumericKind::require("average", model.element_kind())?;
                    kind.average(self.project_all(model, scope)?)?
                }
                ScalarStrategy::Single => match self.single(model, false, scope)? {
                    Some(value) => value,
                    None => return Err(ExecutorError::cardinality(0)),
                },
            };
            Ok(T::from_value(value)?)
        })
    }

    /// Evaluates a model that must produce exactly one row.
    ///
    /// Zero rows give `T::default()` when `return_default_when_empty` is
    /// set and fail otherwise; more than one row always fails.
    pub fn execute_single<T: FromValue + Default>(
        &self,
        model: &QueryModel,
        return_default_when_empty: bool,
    ) -> ExecutorResult<T> {
        self.observe("single", |scope| {
            scope.trace(Event::QueryStrategySelected, &[("strategy", "single")]);
            match self.single(model, return_default_when_empty, scope)? {
                Some(value) => Ok(T::from_value(value)?),
                None => Ok(T::default()),
            }
        })
    }

    /// Evaluates a model to a sequence of elements.
    ///
    /// The sequence is lazy: the first call to `next` loads every row.
    pub fn execute_collection<T: FromValue>(&self, model: &QueryModel) -> QueryResults<'_, T> {
        let model = model.clone();
        QueryResults::new(move || {
            self.observe("collection", |scope| {
                scope.trace(Event::QueryStrategySelected, &[("strategy", "collection")]);
                let (model, rows) = self.load_collection(&model, scope)?;
                let projector = self.projectors.build_projector(&model)?;
                Ok(Loaded { rows, projector })
            })
        })
    }

    fn observe<R>(
        &self,
        entry: &'static str,
        run: impl FnOnce(&ObservationScope<'_>) -> ExecutorResult<R>,
    ) -> ExecutorResult<R> {
        let scope = ObservationScope::begin(entry, self.context.metrics());
        match run(&scope) {
            Ok(result) => {
                scope.complete();
                Ok(result)
            }
            Err(err) => {
                scope.fail(&err.to_string());
                Err(err)
            }
        }
    }

    fn seeded_aggregate(
        &self,
        model: &QueryModel,
        seeded: &SeededAggregate,
        scope: &ObservationScope<'_>,
    ) -> ExecutorResult<Value> {
        let model = self.rewrite_union(model, scope);
        let accumulate = self.projectors.build_accumulator(&model, &seeded.func)?;
        let rows = self.load(&model, scope)?;

        let mut acc = seeded.seed.clone();
        for row in &rows {
            acc = accumulate(row)?(acc)?;
        }

        match &seeded.result {
            Some(select) => select
                .apply(acc)
                .map_err(|e| ExecutorError::aggregate_failed(select.name(), e)),
            None => Ok(acc),
        }
    }

    fn aggregate(
        &self,
        model: &QueryModel,
        func: &AggregateFn,
        scope: &ObservationScope<'_>,
    ) -> ExecutorResult<Value> {
        let model = self.rewrite_union(model, scope);
        let project = self.projectors.build_projector(&model)?;
        let accumulate = self.projectors.build_accumulator(&model, func)?;
        let rows = self.load(&model, scope)?;

        let (first, rest) = rows.split_first().ok_or_else(ExecutorError::empty_aggregate)?;
        let mut acc = project(first)?;
        for row in rest {
            acc = accumulate(row)?(acc)?;
        }
        Ok(acc)
    }

    /// Projects every loaded row, in order
    fn project_all(
        &self,
        model: &QueryModel,
        scope: &ObservationScope<'_>,
    ) -> ExecutorResult<Vec<ExecutorResult<Value>>> {
        let model = self.rewrite_union(model, scope);
        let project = self.projectors.build_projector(&model)?;
        let rows = self.load(&model, scope)?;
        Ok(rows.iter().map(|row| project(row)).collect())
    }

    /// `None` only for an empty result with the default requested
    fn single(
        &self,
        model: &QueryModel,
        default_when_empty: bool,
        scope: &ObservationScope<'_>,
    ) -> ExecutorResult<Option<Value>> {
        let (model, rows) = self.load_collection(model, scope)?;
        match rows.as_slice() {
            [] if default_when_empty => Ok(None),
            [row] => {
                let project = self.projectors.build_projector(&model)?;
                project(row).map(Some)
            }
            rows => Err(ExecutorError::cardinality(rows.len())),
        }
    }

    /// Loads rows for the collection shape.
    ///
    /// Returns the model actually generated (the union wrapper when one
    /// was needed) with the rows, trimmed to the last row when requested.
    fn load_collection(
        &self,
        model: &QueryModel,
        scope: &ObservationScope<'_>,
    ) -> ExecutorResult<(QueryModel, Vec<RowMapping>)> {
        let model = self.rewrite_union(model, scope);
        let mut rows = self.load(&model, scope)?;

        let wants_last = model.has_operator(|op| matches!(op, ResultOperator::Last))
            || inner_has_last(&model);
        if wants_last && rows.len() > 1 {
            let loaded = rows.len().to_string();
            let last = rows.len() - 1;
            rows.drain(..last);
            self.context.metrics().increment_last_trims();
            scope.trace(Event::QueryLastTrimmed, &[("loaded", &loaded)]);
        }

        Ok((model, rows))
    }

    /// The model every strategy generates from: wrapped in a subquery when
    /// it carries a union, otherwise unchanged.
    fn rewrite_union(&self, model: &QueryModel, scope: &ObservationScope<'_>) -> QueryModel {
        let alias = self.context.union_alias();
        match wrap_union_subquery(model, alias) {
            Some(wrapped) => {
                self.context.metrics().increment_union_rewrites();
                scope.trace(Event::QueryUnionRewritten, &[("alias", alias)]);
                wrapped
            }
            None => model.clone(),
        }
    }

    /// Generates, executes and extracts every row of `model`.
    ///
    /// `model` must already have been through [`rewrite_union`](Self::rewrite_union).
    ///
    /// If extraction fails part-way, the rows extracted so far are dropped
    /// and only the error is returned.
    fn load(&self, model: &QueryModel, scope: &ObservationScope<'_>) -> ExecutorResult<Vec<RowMapping>> {
        let query = self.generator.generate(model, self.context)?;
        let command = query.create_query();

        let mut rows = Vec::new();
        let mut failure: Option<GeneratorError> = None;
        self.database.execute(&command, &mut |raw| match query.process_row(raw) {
            Ok(row) => {
                rows.push(row);
                ControlFlow::Continue(())
            }
            Err(err) => {
                failure = Some(err);
                ControlFlow::Break(())
            }
        })?;

        if let Some(err) = failure {
            return Err(err.into());
        }

        self.context.metrics().add_rows_loaded(rows.len() as u64);
        let count = rows.len().to_string();
        scope.trace(Event::QueryRowsLoaded, &[("rows", &count)]);
        Ok(rows)
    }
}

/// A "last" placed before a union ends up inside the wrapper. It still
/// trims the final output, since it belongs to the model's operator set.
fn inner_has_last(model: &QueryModel) -> bool {
    match &model.source {
        QuerySource::Subquery { model: inner, .. } => {
            inner.has_operator(|op| matches!(op, ResultOperator::Last))
        }
        QuerySource::Table { .. } => false,
    }
}
