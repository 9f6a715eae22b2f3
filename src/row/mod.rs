//! Row subsystem
//!
//! [`RawRow`] is what the database hands back; [`RowMapping`] carries one
//! extracted row from the generated query's row extraction to the
//! projectors; [`FromValue`] turns projected values into caller types.

mod convert;
mod mapping;

pub use convert::{ConversionError, FromValue, Record};
pub use mapping::RowMapping;

use crate::model::Value;

/// Driver-decoded column values of one returned row, in select-list order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRow {
    /// Column names reported by the driver (may be empty)
    pub names: Vec<String>,
    /// Column values
    pub values: Vec<Value>,
}

impl RawRow {
    /// A row whose columns are only known by position
    pub fn positional(values: Vec<Value>) -> Self {
        Self {
            names: Vec::new(),
            values,
        }
    }

    /// A row with driver-reported column names
    pub fn named<N: Into<String>>(columns: impl IntoIterator<Item = (N, Value)>) -> Self {
        let (names, values) = columns
            .into_iter()
            .map(|(name, value)| (name.into(), value))
            .unzip();
        Self { names, values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
