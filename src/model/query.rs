//! Query model: one logical query, built by the caller and only read by
//! the engine.

use super::expr::Expr;
use super::operators::{AggregateFn, ResultOperator, SeededAggregate};
use super::value::{Value, ValueKind};

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// A single ordering key
#[derive(Debug, Clone, PartialEq)]
pub struct Ordering {
    pub expr: Expr,
    pub direction: SortDirection,
}

impl Ordering {
    pub fn asc(expr: Expr) -> Self {
        Self {
            expr,
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(expr: Expr) -> Self {
        Self {
            expr,
            direction: SortDirection::Desc,
        }
    }
}

/// Where rows come from
#[derive(Debug, Clone, PartialEq)]
pub enum QuerySource {
    /// A table (or view) under an alias
    Table { name: String, alias: String },
    /// A nested query under an alias
    Subquery {
        model: Box<QueryModel>,
        alias: String,
    },
}

impl QuerySource {
    pub fn alias(&self) -> &str {
        match self {
            QuerySource::Table { alias, .. } | QuerySource::Subquery { alias, .. } => alias,
        }
    }
}

/// Filtering, grouping and ordering steps
#[derive(Debug, Clone, PartialEq)]
pub enum BodyClause {
    Where(Expr),
    GroupBy(Vec<Expr>),
    OrderBy(Vec<Ordering>),
}

/// Immutable description of one logical query
#[derive(Debug, Clone, PartialEq)]
pub struct QueryModel {
    /// Main source
    pub source: QuerySource,
    /// Body clauses in declaration order
    pub body: Vec<BodyClause>,
    /// Projection
    pub selector: Expr,
    /// Result operators in declaration order
    pub result_operators: Vec<ResultOperator>,
}

impl QueryModel {
    /// Starts a query over a table; the default projection is the whole row
    pub fn from_table(name: impl Into<String>, alias: impl Into<String>) -> Self {
        let alias = alias.into();
        Self {
            source: QuerySource::Table {
                name: name.into(),
                alias: alias.clone(),
            },
            body: Vec::new(),
            selector: Expr::Source(alias),
            result_operators: Vec::new(),
        }
    }

    /// Adds a where clause
    pub fn filter(mut self, predicate: Expr) -> Self {
        self.body.push(BodyClause::Where(predicate));
        self
    }

    /// Adds a group by clause
    pub fn group_by(mut self, keys: Vec<Expr>) -> Self {
        self.body.push(BodyClause::GroupBy(keys));
        self
    }

    /// Adds an order by clause
    pub fn order_by(mut self, orderings: Vec<Ordering>) -> Self {
        self.body.push(BodyClause::OrderBy(orderings));
        self
    }

    /// Sets the projection
    pub fn select(mut self, selector: Expr) -> Self {
        self.selector = selector;
        self
    }

    /// Appends a result operator
    pub fn with_operator(mut self, operator: ResultOperator) -> Self {
        self.result_operators.push(operator);
        self
    }

    pub fn aggregate(self, func: AggregateFn) -> Self {
        self.with_operator(ResultOperator::Aggregate(func))
    }

    pub fn aggregate_from_seed(self, seed: impl Into<Value>, func: AggregateFn) -> Self {
        self.with_operator(ResultOperator::AggregateFromSeed(SeededAggregate {
            seed: seed.into(),
            func,
            result: None,
        }))
    }

    pub fn union(self, other: QueryModel) -> Self {
        self.with_operator(ResultOperator::Union(Box::new(other)))
    }

    /// Returns true if any result operator matches
    pub fn has_operator(&self, predicate: impl Fn(&ResultOperator) -> bool) -> bool {
        self.result_operators.iter().any(predicate)
    }

    /// Where predicates in declaration order
    pub fn predicates(&self) -> impl Iterator<Item = &Expr> {
        self.body.iter().filter_map(|clause| match clause {
            BodyClause::Where(expr) => Some(expr),
            _ => None,
        })
    }

    /// Last result operator that the database computes as a single scalar
    /// (count, long count, min, max, any, all, contains)
    pub fn sql_scalar_operator(&self) -> Option<&ResultOperator> {
        self.result_operators.iter().rev().find(|op| {
            matches!(
                op,
                ResultOperator::Count
                    | ResultOperator::LongCount
                    | ResultOperator::Min
                    | ResultOperator::Max
                    | ResultOperator::Any
                    | ResultOperator::All(_)
                    | ResultOperator::Contains(_)
            )
        })
    }

    /// Returns the projection that actually shapes rows.
    ///
    /// A projection of a whole subquery row resolves to the subquery's own
    /// projection, recursively.
    pub fn effective_selector(&self) -> &Expr {
        if let (Expr::Source(selected), QuerySource::Subquery { model, alias }) =
            (&self.selector, &self.source)
        {
            if selected == alias {
                return model.effective_selector();
            }
        }
        &self.selector
    }

    /// Kind of the projected element
    pub fn element_kind(&self) -> ValueKind {
        self.effective_selector().kind()
    }
}
