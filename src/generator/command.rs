//! SQL command produced by a generated query

use std::fmt;

use crate::model::Value;
use crate::translation::SqlBuffer;

/// SQL text plus positional parameters, ready for the database
#[derive(Debug, Clone, PartialEq)]
pub struct SqlCommand {
    pub sql: String,
    pub params: Vec<Value>,
}

impl SqlCommand {
    pub fn new(sql: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }
}

impl From<SqlBuffer> for SqlCommand {
    fn from(buffer: SqlBuffer) -> Self {
        let (sql, params) = buffer.into_parts();
        Self { sql, params }
    }
}

impl fmt::Display for SqlCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.sql)
    }
}
