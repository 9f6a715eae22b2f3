//! Basic PostgreSQL-dialect SQL generator
//!
//! Statement layout:
//!
//! ```text
//! SELECT [DISTINCT] <projection> FROM <source>
//!   [WHERE <predicates AND extension predicates>]
//!   [GROUP BY <keys>]
//!   [UNION (<other>) ...]
//!   [ORDER BY <orderings>] [LIMIT n] [OFFSET m]
//! ```
//!
//! Scalars computed in SQL (count, min, max, any, all, contains) wrap the
//! row statement as a subquery. Sum, average and the aggregate folds are
//! left to the executor, so their statements select plain rows.

use std::sync::Arc;

use crate::model::{
    BodyClause, Expr, QueryModel, QuerySource, ResultOperator, Value, ValueKind,
};
use crate::observability::{Event, Logger};
use crate::row::{RawRow, RowMapping};
use crate::translation::{SqlBuffer, TranslationError};

use super::command::SqlCommand;
use super::context::{ColumnConverter, QueryContext};
use super::errors::{GeneratorError, GeneratorResult};
use super::{GeneratedQuery, SqlGenerator};

/// Alias of the subquery wrapped by SQL-computed scalars
const AGGREGATE_ALIAS: &str = "agg";

/// Stateless generator; all services come from the [`QueryContext`]
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicSqlGenerator;

impl BasicSqlGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl SqlGenerator for BasicSqlGenerator {
    fn generate(
        &self,
        model: &QueryModel,
        context: &QueryContext,
    ) -> GeneratorResult<Box<dyn GeneratedQuery>> {
        let writer = StatementWriter { context };
        let mut out = SqlBuffer::new();
        let shape = writer.write_statement(model, &mut out)?;
        let command = SqlCommand::from(out);

        let param_count = command.params.len().to_string();
        Logger::trace(
            Event::SqlGenerated.as_str(),
            &[("params", &param_count), ("sql", &command.sql)],
        );

        let (names, converters) = match &shape {
            Shape::Declared(columns) => (
                Some(columns.iter().map(|c| c.name.clone()).collect::<Arc<[String]>>()),
                columns
                    .iter()
                    .map(|c| context.converters().converter_for(c.kind))
                    .collect(),
            ),
            Shape::Wildcard => (None, Vec::new()),
        };

        Ok(Box::new(BasicQuery {
            command,
            shape,
            names,
            converters,
        }))
    }
}

/// Column of the select list
#[derive(Debug, Clone, PartialEq)]
struct OutputColumn {
    name: String,
    kind: ValueKind,
}

impl OutputColumn {
    fn new(name: impl Into<String>, kind: ValueKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// What a statement returns per row
#[derive(Debug, Clone, PartialEq)]
enum Shape {
    Declared(Vec<OutputColumn>),
    /// `alias.*` over a table; columns come from the driver
    Wildcard,
}

struct BasicQuery {
    command: SqlCommand,
    shape: Shape,
    names: Option<Arc<[String]>>,
    converters: Vec<ColumnConverter>,
}

impl GeneratedQuery for BasicQuery {
    fn create_query(&self) -> SqlCommand {
        self.command.clone()
    }

    fn process_row(&self, raw: RawRow) -> GeneratorResult<RowMapping> {
        match (&self.shape, &self.names) {
            (Shape::Declared(columns), Some(names)) => {
                if raw.len() != columns.len() {
                    return Err(GeneratorError::ColumnCount {
                        expected: columns.len(),
                        found: raw.len(),
                    });
                }
                let values = raw
                    .values
                    .into_iter()
                    .zip(&self.converters)
                    .zip(columns)
                    .map(|((value, convert), column)| {
                        convert(value).map_err(|source| GeneratorError::Conversion {
                            column: column.name.clone(),
                            source,
                        })
                    })
                    .collect::<GeneratorResult<Vec<_>>>()?;
                Ok(RowMapping::new(names.clone(), values))
            }
            _ => {
                let names: Vec<String> = if raw.names.len() == raw.values.len() {
                    raw.names
                } else {
                    (0..raw.values.len()).map(|i| format!("c{}", i)).collect()
                };
                Ok(RowMapping::new(names.into(), raw.values))
            }
        }
    }
}

struct StatementWriter<'c> {
    context: &'c QueryContext,
}

impl StatementWriter<'_> {
    /// Writes the full statement for `model` and returns its row shape
    fn write_statement(&self, model: &QueryModel, out: &mut SqlBuffer) -> GeneratorResult<Shape> {
        let Some(terminal) = model.sql_scalar_operator() else {
            return self.write_rows(model, None, out);
        };

        match terminal {
            ResultOperator::Count | ResultOperator::LongCount => {
                out.push_sql("SELECT COUNT(*) AS ");
                out.push_identifier("count");
                out.push_sql(" FROM (");
                self.write_rows(model, None, out)?;
                out.push_sql(") ");
                out.push_identifier(AGGREGATE_ALIAS);
            }
            ResultOperator::Min | ResultOperator::Max => {
                let function = if matches!(terminal, ResultOperator::Min) {
                    "MIN"
                } else {
                    "MAX"
                };
                let column = single_column(model)?;
                out.push_sql("SELECT ");
                out.push_sql(function);
                out.push_sql("(");
                out.push_qualified(AGGREGATE_ALIAS, &column.name);
                out.push_sql(") AS ");
                out.push_identifier(&column.name);
                out.push_sql(" FROM (");
                self.write_rows(model, None, out)?;
                out.push_sql(") ");
                out.push_identifier(AGGREGATE_ALIAS);
            }
            ResultOperator::Any => {
                out.push_sql("SELECT EXISTS(");
                self.write_rows(model, None, out)?;
                out.push_sql(") AS ");
                out.push_identifier("any");
            }
            ResultOperator::All(predicate) => {
                let violation = Expr::not(predicate.clone());
                out.push_sql("SELECT NOT EXISTS(");
                self.write_rows(model, Some(&violation), out)?;
                out.push_sql(") AS ");
                out.push_identifier("all");
            }
            ResultOperator::Contains(value) => {
                let column = single_column(model)?;
                out.push_sql("SELECT EXISTS(SELECT 1 FROM (");
                self.write_rows(model, None, out)?;
                out.push_sql(") ");
                out.push_identifier(AGGREGATE_ALIAS);
                out.push_sql(" WHERE ");
                out.push_qualified(AGGREGATE_ALIAS, &column.name);
                out.push_sql(" = ");
                self.write_constant(value, out)?;
                out.push_sql(") AS ");
                out.push_identifier("contains");
            }
            _ => return self.write_rows(model, None, out),
        }

        shape_of(model)
    }

    /// Writes the row-producing statement, optionally with one extra predicate
    fn write_rows(
        &self,
        model: &QueryModel,
        extra: Option<&Expr>,
        out: &mut SqlBuffer,
    ) -> GeneratorResult<Shape> {
        out.push_sql("SELECT ");
        if model.has_operator(|op| matches!(op, ResultOperator::Distinct)) {
            out.push_sql("DISTINCT ");
        }
        self.write_select_list(model, out)?;

        out.push_sql(" FROM ");
        self.write_source(&model.source, out)?;

        let mut predicates: Vec<Expr> = model.predicates().cloned().collect();
        if let QuerySource::Table { name, alias } = &model.source {
            predicates.extend(
                self.context
                    .extensions()
                    .iter()
                    .filter_map(|ext| ext.table_predicate(name, alias)),
            );
        }
        predicates.extend(extra.cloned());
        if !predicates.is_empty() {
            out.push_sql(" WHERE ");
            self.write_list(&predicates, " AND ", out)?;
        }

        let group_keys: Vec<Expr> = model
            .body
            .iter()
            .filter_map(|clause| match clause {
                BodyClause::GroupBy(keys) => Some(keys.iter().cloned()),
                _ => None,
            })
            .flatten()
            .collect();
        if !group_keys.is_empty() {
            out.push_sql(" GROUP BY ");
            self.write_list(&group_keys, ", ", out)?;
        }

        for op in &model.result_operators {
            if let ResultOperator::Union(other) = op {
                out.push_sql(" UNION (");
                self.write_statement(other, out)?;
                out.push_sql(")");
            }
        }

        // Later order-by clauses take precedence over earlier ones
        let orderings: Vec<_> = model
            .body
            .iter()
            .rev()
            .filter_map(|clause| match clause {
                BodyClause::OrderBy(orderings) => Some(orderings.iter()),
                _ => None,
            })
            .flatten()
            .collect();
        if !orderings.is_empty() {
            out.push_sql(" ORDER BY ");
            for (i, ordering) in orderings.iter().enumerate() {
                if i > 0 {
                    out.push_sql(", ");
                }
                self.write_expr(&ordering.expr, out)?;
                out.push_sql(" ");
                out.push_sql(ordering.direction.as_str());
            }
        }

        let (limit, offset) = paging(model);
        if let Some(limit) = limit {
            out.push_sql(" LIMIT ");
            out.push_sql(&limit.to_string());
        }
        if offset > 0 {
            out.push_sql(" OFFSET ");
            out.push_sql(&offset.to_string());
        }

        rows_shape(model)
    }

    fn write_select_list(&self, model: &QueryModel, out: &mut SqlBuffer) -> GeneratorResult<()> {
        match &model.selector {
            Expr::Source(alias) => {
                if alias != model.source.alias() {
                    return Err(GeneratorError::InvalidModel(format!(
                        "projection references unknown source '{}'",
                        alias
                    )));
                }
                out.push_identifier(alias);
                out.push_sql(".*");
            }
            Expr::Record(fields) => {
                for (i, (name, expr)) in fields.iter().enumerate() {
                    if i > 0 {
                        out.push_sql(", ");
                    }
                    self.write_expr(expr, out)?;
                    out.push_sql(" AS ");
                    out.push_identifier(name);
                }
            }
            scalar => {
                self.write_expr(scalar, out)?;
                out.push_sql(" AS ");
                out.push_identifier(&scalar_name(scalar));
            }
        }
        Ok(())
    }

    fn write_source(&self, source: &QuerySource, out: &mut SqlBuffer) -> GeneratorResult<()> {
        match source {
            QuerySource::Table { name, alias } => {
                out.push_identifier(name);
                out.push_sql(" ");
                out.push_identifier(alias);
            }
            QuerySource::Subquery { model, alias } => {
                out.push_sql("(");
                self.write_statement(model, out)?;
                out.push_sql(") ");
                out.push_identifier(alias);
            }
        }
        Ok(())
    }

    fn write_list(&self, exprs: &[Expr], separator: &str, out: &mut SqlBuffer) -> GeneratorResult<()> {
        for (i, expr) in exprs.iter().enumerate() {
            if i > 0 {
                out.push_sql(separator);
            }
            self.write_expr(expr, out)?;
        }
        Ok(())
    }

    fn write_expr(&self, expr: &Expr, out: &mut SqlBuffer) -> GeneratorResult<()> {
        match expr {
            Expr::Column(column) => out.push_qualified(&column.source, &column.name),
            Expr::Constant(value) => self.write_constant(value, out)?,
            Expr::Member(access) => {
                let mut recurse = |e: &Expr, buf: &mut SqlBuffer| {
                    self.write_expr(e, buf).map_err(TranslationError::subexpression)
                };
                let matched = self
                    .context
                    .translators()
                    .try_translate(access, out, &mut recurse)
                    .map_err(GeneratorError::from_translation)?;

                if matched {
                    self.context.metrics().increment_translations_matched();
                } else {
                    // Composite field access
                    self.context.metrics().increment_translations_missed();
                    out.push_sql("(");
                    self.write_expr(&access.target, out)?;
                    out.push_sql(").");
                    out.push_identifier(&access.member);
                }
            }
            Expr::Binary { op, left, right } => {
                out.push_sql("(");
                self.write_expr(left, out)?;
                out.push_sql(" ");
                out.push_sql(op.sql());
                out.push_sql(" ");
                self.write_expr(right, out)?;
                out.push_sql(")");
            }
            Expr::Not(inner) => {
                out.push_sql("NOT (");
                self.write_expr(inner, out)?;
                out.push_sql(")");
            }
            Expr::IsNull(inner) => {
                out.push_sql("(");
                self.write_expr(inner, out)?;
                out.push_sql(") IS NULL");
            }
            Expr::Record(fields) => {
                out.push_sql("ROW(");
                for (i, (_, field)) in fields.iter().enumerate() {
                    if i > 0 {
                        out.push_sql(", ");
                    }
                    self.write_expr(field, out)?;
                }
                out.push_sql(")");
            }
            Expr::Source(alias) => out.push_identifier(alias),
        }
        Ok(())
    }

    fn write_constant(&self, value: &Value, out: &mut SqlBuffer) -> GeneratorResult<()> {
        match value {
            Value::Null => out.push_sql("NULL"),
            Value::Record(_) => {
                return Err(GeneratorError::UnsupportedExpression(
                    "record constant".to_string(),
                ))
            }
            other => out.push_param(other.clone()),
        }
        Ok(())
    }
}

/// Shape of the full statement
fn shape_of(model: &QueryModel) -> GeneratorResult<Shape> {
    let scalar = |name: &str, kind| Ok(Shape::Declared(vec![OutputColumn::new(name, kind)]));
    match model.sql_scalar_operator() {
        Some(ResultOperator::Count) => scalar("count", ValueKind::Int),
        Some(ResultOperator::LongCount) => scalar("count", ValueKind::Long),
        Some(ResultOperator::Min | ResultOperator::Max) => {
            Ok(Shape::Declared(vec![single_column(model)?]))
        }
        Some(ResultOperator::Any) => scalar("any", ValueKind::Bool),
        Some(ResultOperator::All(_)) => scalar("all", ValueKind::Bool),
        Some(ResultOperator::Contains(_)) => scalar("contains", ValueKind::Bool),
        _ => rows_shape(model),
    }
}

/// Shape of the row-producing statement
fn rows_shape(model: &QueryModel) -> GeneratorResult<Shape> {
    match &model.selector {
        Expr::Source(alias) => match &model.source {
            QuerySource::Subquery { model: inner, alias: source_alias } if source_alias == alias => {
                shape_of(inner)
            }
            _ => Ok(Shape::Wildcard),
        },
        Expr::Record(fields) => Ok(Shape::Declared(
            fields
                .iter()
                .map(|(name, expr)| OutputColumn::new(name.clone(), expr.kind()))
                .collect(),
        )),
        scalar => Ok(Shape::Declared(vec![OutputColumn::new(
            scalar_name(scalar),
            scalar.kind(),
        )])),
    }
}

fn single_column(model: &QueryModel) -> GeneratorResult<OutputColumn> {
    match rows_shape(model)? {
        Shape::Declared(mut columns) if columns.len() == 1 => Ok(columns.remove(0)),
        _ => Err(GeneratorError::InvalidModel(
            "scalar operator requires a single-column projection".to_string(),
        )),
    }
}

fn scalar_name(expr: &Expr) -> String {
    match expr {
        Expr::Column(column) => column.name.clone(),
        _ => "value".to_string(),
    }
}

/// Limit and offset implied by take/skip/first/single, in declaration order
fn paging(model: &QueryModel) -> (Option<u64>, u64) {
    let mut limit: Option<u64> = None;
    let mut offset = 0u64;
    for op in &model.result_operators {
        let take = match op {
            ResultOperator::Take(n) => *n,
            ResultOperator::First => 1,
            // Two rows are enough to detect a cardinality violation
            ResultOperator::Single => 2,
            ResultOperator::Skip(n) => {
                offset += n;
                limit = limit.map(|l| l.saturating_sub(*n));
                continue;
            }
            _ => continue,
        };
        limit = Some(limit.map_or(take, |l| l.min(take)));
    }
    (limit, offset)
}
