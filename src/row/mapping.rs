//! Row Mapping: the per-row bag of extracted column values
//!
//! Created by the generated query's row extraction, owned by the batch
//! being loaded, discarded once projected.

use std::sync::Arc;

use crate::model::Value;

/// Column values of one fetched row plus their names
#[derive(Debug, Clone, PartialEq)]
pub struct RowMapping {
    /// Column names shared by every row of one result set
    names: Arc<[String]>,
    /// Column values in select-list order
    columns: Vec<Value>,
}

impl RowMapping {
    /// Creates a mapping; names and columns are matched by position
    pub fn new(names: Arc<[String]>, columns: Vec<Value>) -> Self {
        Self { names, columns }
    }

    /// Column at `index`
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.columns.get(index)
    }

    /// Column named `name`
    pub fn get_by_name(&self, name: &str) -> Option<&Value> {
        self.names
            .iter()
            .position(|n| n == name)
            .and_then(|i| self.columns.get(i))
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn values(&self) -> &[Value] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Builds a record of all named columns
    pub fn to_record(&self) -> Value {
        Value::Record(
            self.names
                .iter()
                .cloned()
                .zip(self.columns.iter().cloned())
                .collect(),
        )
    }

    pub fn into_values(self) -> Vec<Value> {
        self.columns
    }
}
