//! SQL output sink
//!
//! Fragments are appended in order; literal values become positional
//! `$n` parameters so generated text never embeds user data.

use crate::model::Value;

/// Growable SQL text plus its positional parameters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SqlBuffer {
    sql: String,
    params: Vec<Value>,
    /// Parameters already bound by the buffer this one was forked from
    param_offset: usize,
}

impl SqlBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty buffer whose parameter numbering continues after
    /// this one's, for fragments that are appended back with [`append`].
    ///
    /// [`append`]: SqlBuffer::append
    pub fn fork(&self) -> Self {
        Self {
            sql: String::new(),
            params: Vec::new(),
            param_offset: self.param_offset + self.params.len(),
        }
    }

    /// Appends a fragment produced by [`fork`](SqlBuffer::fork)
    pub fn append(&mut self, fragment: SqlBuffer) {
        self.sql.push_str(&fragment.sql);
        self.params.extend(fragment.params);
    }

    /// Appends raw SQL text
    pub fn push_sql(&mut self, sql: &str) {
        self.sql.push_str(sql);
    }

    /// Appends a double-quoted identifier
    pub fn push_identifier(&mut self, name: &str) {
        self.sql.push('"');
        for c in name.chars() {
            if c == '"' {
                self.sql.push('"');
            }
            self.sql.push(c);
        }
        self.sql.push('"');
    }

    /// Appends `"source"."column"`
    pub fn push_qualified(&mut self, source: &str, column: &str) {
        self.push_identifier(source);
        self.sql.push('.');
        self.push_identifier(column);
    }

    /// Binds a value and appends its placeholder
    pub fn push_param(&mut self, value: Value) {
        self.params.push(value);
        let position = self.param_offset + self.params.len();
        self.sql.push('$');
        self.sql.push_str(&position.to_string());
    }

    pub fn as_str(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }

    pub fn is_empty(&self) -> bool {
        self.sql.is_empty()
    }

    pub fn len(&self) -> usize {
        self.sql.len()
    }

    /// Consumes the buffer into text and parameters
    pub fn into_parts(self) -> (String, Vec<Value>) {
        (self.sql, self.params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_quoting() {
        let mut buf = SqlBuffer::new();
        buf.push_identifier("weird\"name");
        assert_eq!(buf.as_str(), "\"weird\"\"name\"");
    }

    #[test]
    fn test_qualified_column() {
        let mut buf = SqlBuffer::new();
        buf.push_qualified("it", "name");
        assert_eq!(buf.as_str(), "\"it\".\"name\"");
    }

    #[test]
    fn test_params_numbered_in_order() {
        let mut buf = SqlBuffer::new();
        buf.push_param(Value::Int(1));
        buf.push_sql(" + ");
        buf.push_param(Value::Int(2));
        assert_eq!(buf.as_str(), "$1 + $2");
        assert_eq!(buf.params(), &[Value::Int(1), Value::Int(2)]);
    }

    #[test]
    fn test_fork_continues_numbering() {
        let mut buf = SqlBuffer::new();
        buf.push_param(Value::from("a"));
        buf.push_sql(", ");

        let mut fragment = buf.fork();
        fragment.push_sql("f(");
        fragment.push_param(Value::from("b"));
        fragment.push_sql(")");
        assert!(!fragment.is_empty());

        buf.append(fragment);
        let (sql, params) = buf.into_parts();
        assert_eq!(sql, "$1, f($2)");
        assert_eq!(params.len(), 2);
    }
}
