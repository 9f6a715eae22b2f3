//! Result operators and aggregate descriptors
//!
//! Result operators are the terminal instructions of a query model. The
//! executor picks its strategy from them; the SQL generator shapes the
//! statement from them.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use super::expr::Expr;
use super::query::QueryModel;
use super::value::Value;

/// Failure raised by an aggregate combinator
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{0}")]
pub struct CombineError(pub String);

type CombineFn = dyn Fn(Value, Value) -> Result<Value, CombineError> + Send + Sync;
type SelectFn = dyn Fn(Value) -> Result<Value, CombineError> + Send + Sync;

/// Combinator of shape `(accumulator, element) -> accumulator`
#[derive(Clone)]
pub struct AggregateFn {
    name: String,
    func: Arc<CombineFn>,
}

impl AggregateFn {
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(Value, Value) -> Result<Value, CombineError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Arc::new(func),
        }
    }

    /// Numeric addition over matching kinds (int and long widen to long)
    pub fn add() -> Self {
        Self::new("add", add_values)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Applies the combinator once
    pub fn apply(&self, accumulator: Value, element: Value) -> Result<Value, CombineError> {
        (self.func)(accumulator, element)
    }
}

impl fmt::Debug for AggregateFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AggregateFn").field("name", &self.name).finish()
    }
}

impl PartialEq for AggregateFn {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && Arc::ptr_eq(&self.func, &other.func)
    }
}

/// Final transformation applied to a seeded aggregate's accumulator
#[derive(Clone)]
pub struct ResultSelector {
    name: String,
    func: Arc<SelectFn>,
}

impl ResultSelector {
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(Value) -> Result<Value, CombineError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Arc::new(func),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn apply(&self, accumulator: Value) -> Result<Value, CombineError> {
        (self.func)(accumulator)
    }
}

impl fmt::Debug for ResultSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultSelector").field("name", &self.name).finish()
    }
}

impl PartialEq for ResultSelector {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && Arc::ptr_eq(&self.func, &other.func)
    }
}

/// Aggregate folded from a caller supplied seed
#[derive(Debug, Clone, PartialEq)]
pub struct SeededAggregate {
    pub seed: Value,
    pub func: AggregateFn,
    pub result: Option<ResultSelector>,
}

/// Terminal query instruction
#[derive(Debug, Clone, PartialEq)]
pub enum ResultOperator {
    Count,
    LongCount,
    Sum,
    Average,
    Min,
    Max,
    Any,
    /// True when every element satisfies the predicate
    All(Expr),
    /// True when the projection contains the value
    Contains(Value),
    Distinct,
    Take(u64),
    Skip(u64),
    First,
    Last,
    Single,
    Union(Box<QueryModel>),
    Aggregate(AggregateFn),
    AggregateFromSeed(SeededAggregate),
}

impl ResultOperator {
    /// Returns the operator name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            ResultOperator::Count => "count",
            ResultOperator::LongCount => "long_count",
            ResultOperator::Sum => "sum",
            ResultOperator::Average => "average",
            ResultOperator::Min => "min",
            ResultOperator::Max => "max",
            ResultOperator::Any => "any",
            ResultOperator::All(_) => "all",
            ResultOperator::Contains(_) => "contains",
            ResultOperator::Distinct => "distinct",
            ResultOperator::Take(_) => "take",
            ResultOperator::Skip(_) => "skip",
            ResultOperator::First => "first",
            ResultOperator::Last => "last",
            ResultOperator::Single => "single",
            ResultOperator::Union(_) => "union",
            ResultOperator::Aggregate(_) => "aggregate",
            ResultOperator::AggregateFromSeed(_) => "aggregate_from_seed",
        }
    }

    pub fn is_union(&self) -> bool {
        matches!(self, ResultOperator::Union(_))
    }
}

fn add_values(accumulator: Value, element: Value) -> Result<Value, CombineError> {
    let overflow = || CombineError("addition overflowed".to_string());
    match (accumulator, element) {
        (Value::Int(a), Value::Int(b)) => a.checked_add(b).map(Value::Int).ok_or_else(overflow),
        (Value::Long(a), Value::Long(b)) => {
            a.checked_add(b).map(Value::Long).ok_or_else(overflow)
        }
        (Value::Int(a), Value::Long(b)) | (Value::Long(b), Value::Int(a)) => i64::from(a)
            .checked_add(b)
            .map(Value::Long)
            .ok_or_else(overflow),
        (Value::Float(a), Value::Float(b)) => Ok(Value::Float(a + b)),
        (Value::Double(a), Value::Double(b)) => Ok(Value::Double(a + b)),
        (Value::Decimal(a), Value::Decimal(b)) => {
            a.checked_add(b).map(Value::Decimal).ok_or_else(overflow)
        }
        (a, b) => Err(CombineError(format!(
            "cannot add {} and {}",
            kind_name(&a),
            kind_name(&b)
        ))),
    }
}

fn kind_name(value: &Value) -> &'static str {
    value.kind().map(|k| k.as_str()).unwrap_or("null")
}
