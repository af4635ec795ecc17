#![forbid(unsafe_code)]

//! Boundary with the graph database.
//!
//! The crate never talks to a driver directly. A [`GraphDatabase`] hands out
//! scoped [`ReadSession`]s; a session is released when it is dropped, which
//! covers early returns and errors alike.

mod record;
mod replay;

pub use record::{RawNode, RawRelationship, Record, RecordValue};
pub use replay::{ReplayDatabase, ReplayError, ReplaySession};

use crate::error::{DecodeError, Result};

/// Read-only session. Each call to [`ReadSession::read`] runs one read
/// transaction and returns all of its rows.
pub trait ReadSession {
    /// Executes `query` in a read transaction.
    fn read(&mut self, query: &str) -> Result<Vec<Record>>;

    /// Executes `query` and requires exactly one row.
    fn read_single(&mut self, query: &str) -> Result<Record> {
        let mut rows = self.read(query)?;
        if rows.len() != 1 {
            return Err(DecodeError::RowCount {
                expected: 1,
                found: rows.len(),
            }
            .into());
        }
        Ok(rows.remove(0))
    }
}

/// Connection to a graph database.
pub trait GraphDatabase {
    /// Checks that the database is reachable and the credentials work.
    fn verify_connectivity(&self) -> Result<()>;

    /// Acquires a read session. Dropping it releases the session.
    fn session(&self) -> Result<Box<dyn ReadSession + '_>>;
}
