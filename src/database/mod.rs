//! Database Query collaborator
//!
//! Executes one SQL command and hands each returned row to a callback,
//! blocking until delivery finishes. Timeouts, pooling and cancellation
//! belong to implementations of [`DatabaseQuery`].

mod errors;
mod memory;

use std::ops::ControlFlow;

pub use errors::{DatabaseError, DatabaseResult};
pub use memory::InMemoryDatabase;

use crate::generator::SqlCommand;
use crate::row::RawRow;

/// Runs commands against a relational backend
pub trait DatabaseQuery {
    /// Executes `command`, invoking `on_row` once per returned row in order.
    ///
    /// Returning `ControlFlow::Break` from the callback stops delivery; the
    /// call then returns `Ok(())` without reading further rows.
    fn execute(
        &self,
        command: &SqlCommand,
        on_row: &mut dyn FnMut(RawRow) -> ControlFlow<()>,
    ) -> DatabaseResult<()>;
}

impl<D: DatabaseQuery + ?Sized> DatabaseQuery for &D {
    fn execute(
        &self,
        command: &SqlCommand,
        on_row: &mut dyn FnMut(RawRow) -> ControlFlow<()>,
    ) -> DatabaseResult<()> {
        (**self).execute(command, on_row)
    }
}
