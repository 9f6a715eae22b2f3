//! Lazy collection results
//!
//! Nothing runs until the first call to `next`. That call loads and
//! materializes every row; later calls project one row each.

use std::fmt;
use std::marker::PhantomData;
use std::mem;
use std::vec;

use crate::projector::Projector;
use crate::row::{FromValue, RowMapping};

use super::errors::{ExecutorError, ExecutorResult};

/// Materialized rows plus the projector that turns each into an element
pub(crate) struct Loaded {
    pub rows: Vec<RowMapping>,
    pub projector: Projector,
}

type Loader<'e> = Box<dyn FnOnce() -> ExecutorResult<Loaded> + 'e>;

enum State<'e> {
    Pending(Loader<'e>),
    Ready {
        rows: vec::IntoIter<RowMapping>,
        projector: Projector,
    },
    Done,
}

/// One-shot sequence of typed results.
///
/// Yields `Err` once if loading fails, then ends. A row whose projection
/// or conversion fails yields `Err` for that row only.
pub struct QueryResults<'e, T> {
    state: State<'e>,
    _marker: PhantomData<fn() -> T>,
}

impl<'e, T: FromValue> QueryResults<'e, T> {
    pub(crate) fn new(loader: impl FnOnce() -> ExecutorResult<Loaded> + 'e) -> Self {
        Self {
            state: State::Pending(Box::new(loader)),
            _marker: PhantomData,
        }
    }

    /// True once the rows have been fetched
    pub fn is_loaded(&self) -> bool {
        !matches!(self.state, State::Pending(_))
    }

    /// Drains the sequence, stopping at the first error
    pub fn into_vec(self) -> ExecutorResult<Vec<T>> {
        self.collect()
    }
}

impl<T: FromValue> Iterator for QueryResults<'_, T> {
    type Item = ExecutorResult<T>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match mem::replace(&mut self.state, State::Done) {
                State::Pending(load) => match load() {
                    Ok(Loaded { rows, projector }) => {
                        self.state = State::Ready {
                            rows: rows.into_iter(),
                            projector,
                        };
                    }
                    Err(err) => return Some(Err(err)),
                },
                State::Ready {
                    mut rows,
                    projector,
                } => {
                    let row = rows.next()?;
                    let item = projector(&row)
                        .and_then(|value| T::from_value(value).map_err(ExecutorError::type_mismatch));
                    self.state = State::Ready { rows, projector };
                    return Some(item);
                }
                State::Done => return None,
            }
        }
    }
}

impl<T> fmt::Debug for QueryResults<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &self.state {
            State::Pending(_) => "pending".to_string(),
            State::Ready { rows, .. } => format!("{} rows remaining", rows.len()),
            State::Done => "done".to_string(),
        };
        f.debug_struct("QueryResults").field("state", &state).finish()
    }
}
