//! In-memory Database Query collaborator
//!
//! Answers every command with canned rows. Queued responses are used
//! first, in order; afterwards the default rows answer every command.

use std::collections::VecDeque;
use std::ops::ControlFlow;
use std::sync::Mutex;

use crate::generator::SqlCommand;
use crate::row::RawRow;

use super::errors::{DatabaseError, DatabaseResult};
use super::DatabaseQuery;

#[derive(Debug, Clone)]
enum Response {
    Rows(Vec<RawRow>),
    Fail(DatabaseError),
    /// Deliver `n` rows, then fail
    FailAfter(Vec<RawRow>, usize),
}

#[derive(Debug, Default)]
struct State {
    queued: VecDeque<Response>,
    executed: Vec<SqlCommand>,
}

/// Canned-row database for tests and embedding demos
#[derive(Debug)]
pub struct InMemoryDatabase {
    default_rows: Vec<RawRow>,
    state: Mutex<State>,
}

impl InMemoryDatabase {
    /// A database answering every command with `rows`
    pub fn new(rows: Vec<RawRow>) -> Self {
        Self {
            default_rows: rows,
            state: Mutex::new(State::default()),
        }
    }

    /// A database answering every command with single-column rows
    pub fn with_values(values: impl IntoIterator<Item = crate::model::Value>) -> Self {
        Self::new(
            values
                .into_iter()
                .map(|v| RawRow::positional(vec![v]))
                .collect(),
        )
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Queues rows for the next unanswered command
    pub fn push_rows(&self, rows: Vec<RawRow>) -> &Self {
        self.push(Response::Rows(rows))
    }

    /// Queues a failure for the next unanswered command
    pub fn push_failure(&self, error: DatabaseError) -> &Self {
        self.push(Response::Fail(error))
    }

    /// Queues a response that delivers `delivered` of `rows`, then fails
    pub fn push_interrupted(&self, rows: Vec<RawRow>, delivered: usize) -> &Self {
        self.push(Response::FailAfter(rows, delivered))
    }

    /// Commands executed so far, in order
    pub fn executed(&self) -> Vec<SqlCommand> {
        self.state
            .lock()
            .map(|state| state.executed.clone())
            .unwrap_or_default()
    }

    pub fn last_command(&self) -> Option<SqlCommand> {
        self.executed().pop()
    }

    fn push(&self, response: Response) -> &Self {
        if let Ok(mut state) = self.state.lock() {
            state.queued.push_back(response);
        }
        self
    }

    fn next_response(&self, command: &SqlCommand) -> DatabaseResult<Response> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| DatabaseError::Execution("state lock poisoned".to_string()))?;
        state.executed.push(command.clone());
        Ok(state
            .queued
            .pop_front()
            .unwrap_or_else(|| Response::Rows(self.default_rows.clone())))
    }
}

impl Default for InMemoryDatabase {
    fn default() -> Self {
        Self::empty()
    }
}

impl DatabaseQuery for InMemoryDatabase {
    fn execute(
        &self,
        command: &SqlCommand,
        on_row: &mut dyn FnMut(RawRow) -> ControlFlow<()>,
    ) -> DatabaseResult<()> {
        let (rows, limit) = match self.next_response(command)? {
            Response::Rows(rows) => (rows, None),
            Response::Fail(error) => return Err(error),
            Response::FailAfter(rows, n) => (rows, Some(n)),
        };

        for (delivered, row) in rows.into_iter().enumerate() {
            if limit == Some(delivered) {
                return Err(DatabaseError::Interrupted {
                    rows_delivered: delivered,
                    reason: "connection reset".to_string(),
                });
            }
            if on_row(row).is_break() {
                return Ok(());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Value;

    fn collect(db: &InMemoryDatabase) -> DatabaseResult<Vec<RawRow>> {
        let mut rows = Vec::new();
        db.execute(&SqlCommand::new("SELECT 1", vec![]), &mut |row| {
            rows.push(row);
            ControlFlow::Continue(())
        })?;
        Ok(rows)
    }

    #[test]
    fn test_default_rows_answer_every_command() {
        let db = InMemoryDatabase::with_values([Value::Int(1), Value::Int(2)]);
        assert_eq!(collect(&db).unwrap().len(), 2);
        assert_eq!(collect(&db).unwrap().len(), 2);
        assert_eq!(db.executed().len(), 2);
    }

    #[test]
    fn test_queued_responses_first() {
        let db = InMemoryDatabase::empty();
        db.push_rows(vec![RawRow::positional(vec![Value::Int(7)])])
            .push_failure(DatabaseError::Cancelled);

        assert_eq!(collect(&db).unwrap().len(), 1);
        assert_eq!(collect(&db).unwrap_err(), DatabaseError::Cancelled);
        assert!(collect(&db).unwrap().is_empty());
    }

    #[test]
    fn test_interrupted_delivery() {
        let db = InMemoryDatabase::empty();
        let rows = (0..3).map(|i| RawRow::positional(vec![Value::Int(i)])).collect();
        db.push_interrupted(rows, 2);

        let mut seen = 0;
        let result = db.execute(&SqlCommand::new("SELECT 1", vec![]), &mut |_| {
            seen += 1;
            ControlFlow::Continue(())
        });
        assert_eq!(seen, 2);
        assert!(matches!(
            result,
            Err(DatabaseError::Interrupted {
                rows_delivered: 2,
                ..
            })
        ));
    }

    #[test]
    fn test_break_stops_delivery() {
        let db = InMemoryDatabase::with_values([Value::Int(1), Value::Int(2)]);
        let mut seen = 0;
        db.execute(&SqlCommand::new("SELECT 1", vec![]), &mut |_| {
            seen += 1;
            ControlFlow::Break(())
        })
        .unwrap();
        assert_eq!(seen, 1);
    }
}
