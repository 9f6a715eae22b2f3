//! Numeric sum and average over projected elements
//!
//! Dispatch is closed over the five supported element kinds. Null
//! elements never contribute; a set with no contributing element sums and
//! averages to null.

use rust_decimal::Decimal;

use crate::generator::coerce;
use crate::model::{Value, ValueKind};
use crate::row::ConversionError;

use super::errors::{ExecutorError, ExecutorResult};

/// Element kinds accepted by sum and average
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericKind {
    Decimal,
    Long,
    Int,
    Double,
    Float,
}

impl NumericKind {
    /// Resolves the kind, or `None` when sum/average do not support it
    pub fn from_kind(kind: ValueKind) -> Option<Self> {
        match kind {
            ValueKind::Decimal => Some(NumericKind::Decimal),
            ValueKind::Long => Some(NumericKind::Long),
            ValueKind::Int => Some(NumericKind::Int),
            ValueKind::Double => Some(NumericKind::Double),
            ValueKind::Float => Some(NumericKind::Float),
            _ => None,
        }
    }

    /// Like [`from_kind`](Self::from_kind), failing with the operator name
    pub fn require(operator: &str, kind: ValueKind) -> ExecutorResult<Self> {
        Self::from_kind(kind).ok_or_else(|| ExecutorError::unsupported_aggregate_type(operator, kind))
    }

    pub fn value_kind(&self) -> ValueKind {
        match self {
            NumericKind::Decimal => ValueKind::Decimal,
            NumericKind::Long => ValueKind::Long,
            NumericKind::Int => ValueKind::Int,
            NumericKind::Double => ValueKind::Double,
            NumericKind::Float => ValueKind::Float,
        }
    }

    /// Sums the non-null elements
    pub fn sum<I>(&self, elements: I) -> ExecutorResult<Value>
    where
        I: IntoIterator<Item = ExecutorResult<Value>>,
    {
        let mut acc = Accumulator::new(*self);
        for element in elements {
            acc.push(element?)?;
        }
        acc.total()
    }

    /// Arithmetic mean of the non-null elements
    pub fn average<I>(&self, elements: I) -> ExecutorResult<Value>
    where
        I: IntoIterator<Item = ExecutorResult<Value>>,
    {
        let mut acc = Accumulator::new(*self);
        for element in elements {
            acc.push(element?)?;
        }
        acc.mean()
    }
}

/// Running total in a type wide enough not to overflow before narrowing
#[derive(Debug, Clone, Copy)]
enum Total {
    Integer(i128),
    Real(f64),
    Decimal(Decimal),
}

#[derive(Debug)]
struct Accumulator {
    kind: NumericKind,
    total: Total,
    count: u64,
}

impl Accumulator {
    fn new(kind: NumericKind) -> Self {
        let total = match kind {
            NumericKind::Int | NumericKind::Long => Total::Integer(0),
            NumericKind::Double | NumericKind::Float => Total::Real(0.0),
            NumericKind::Decimal => Total::Decimal(Decimal::ZERO),
        };
        Self {
            kind,
            total,
            count: 0,
        }
    }

    fn push(&mut self, element: Value) -> ExecutorResult<()> {
        let element = coerce(element, self.kind.value_kind())?;
        let overflow = || ExecutorError::numeric_overflow(self.kind.value_kind());

        self.total = match (self.total, element) {
            (_, Value::Null) => return Ok(()),
            (Total::Integer(t), Value::Int(v)) => Total::Integer(t + i128::from(v)),
            (Total::Integer(t), Value::Long(v)) => Total::Integer(t + i128::from(v)),
            (Total::Real(t), Value::Float(v)) => Total::Real(t + f64::from(v)),
            (Total::Real(t), Value::Double(v)) => Total::Real(t + v),
            (Total::Decimal(t), Value::Decimal(v)) => {
                Total::Decimal(t.checked_add(v).ok_or_else(overflow)?)
            }
            (_, other) => {
                return Err(ConversionError::mismatch(&other, self.kind.value_kind().as_str()).into())
            }
        };
        self.count += 1;
        Ok(())
    }

    fn total(&self) -> ExecutorResult<Value> {
        if self.count == 0 {
            return Ok(Value::Null);
        }
        let overflow = || ExecutorError::numeric_overflow(self.kind.value_kind());
        match (self.kind, self.total) {
            (NumericKind::Int, Total::Integer(t)) => {
                i32::try_from(t).map(Value::Int).map_err(|_| overflow())
            }
            (NumericKind::Long, Total::Integer(t)) => {
                i64::try_from(t).map(Value::Long).map_err(|_| overflow())
            }
            (NumericKind::Float, Total::Real(t)) => Ok(Value::Float(t as f32)),
            (NumericKind::Double, Total::Real(t)) => Ok(Value::Double(t)),
            (_, Total::Decimal(t)) => Ok(Value::Decimal(t)),
            _ => Err(overflow()),
        }
    }

    /// Int and long averages are doubles; other kinds keep their own type
    fn mean(&self) -> ExecutorResult<Value> {
        if self.count == 0 {
            return Ok(Value::Null);
        }
        let count = self.count;
        match self.total {
            Total::Integer(t) => Ok(Value::Double(t as f64 / count as f64)),
            Total::Real(t) if self.kind == NumericKind::Float => {
                Ok(Value::Float((t / count as f64) as f32))
            }
            Total::Real(t) => Ok(Value::Double(t / count as f64)),
            Total::Decimal(t) => t
                .checked_div(Decimal::from(count))
                .map(Value::Decimal)
                .ok_or_else(|| ExecutorError::numeric_overflow(ValueKind::Decimal)),
        }
    }
}
