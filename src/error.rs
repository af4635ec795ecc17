#![forbid(unsafe_code)]

//! Error taxonomy shared by graph construction, compilation, and assembly.

use std::fmt;

use thiserror::Error;

use crate::config::ConfigError;
use crate::types::{NodeId, RelationId};

/// Error value produced by a database collaborator, passed through untouched.
pub type DatabaseError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, GraphError>;

/// A graph invariant was violated during construction.
///
/// The caller has to fix its input (for example by connecting the components
/// of a drawing) before trying again.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The node set is empty.
    #[error("graph must contain at least one node")]
    Empty,
    /// A relation or an incident-relation reference points outside the graph.
    #[error("graph is incomplete: {detail}")]
    Incomplete {
        /// Which reference could not be resolved.
        detail: String,
    },
    /// Some nodes are unreachable from the traversal start.
    #[error("graph is not connected: {unreached} of {total} nodes unreachable from node {start}")]
    Disconnected {
        /// Node the traversal started from.
        start: NodeId,
        /// Number of nodes never visited.
        unreached: usize,
        /// Number of nodes in the graph.
        total: usize,
    },
}

impl ValidationError {
    pub(crate) fn incomplete(detail: impl Into<String>) -> Self {
        ValidationError::Incomplete {
            detail: detail.into(),
        }
    }
}

/// A database relationship references a node absent from the accompanying
/// node list.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("relation {relation} references node {node} which is not in the node list")]
pub struct LookupError {
    /// Offending relation.
    pub relation: RelationId,
    /// Endpoint that could not be resolved.
    pub node: NodeId,
}

/// A raw record does not have the shape the compiled query promised.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The record has no field with this name.
    #[error("record is missing field '{field}'")]
    MissingField {
        /// Expected field name.
        field: String,
    },
    /// A value had an unexpected type.
    #[error("{context}: expected {expected}, found {found}")]
    WrongType {
        /// Where in the record the value was found.
        context: String,
        /// Expected kind of value.
        expected: &'static str,
        /// Kind actually found.
        found: &'static str,
    },
    /// The query returned a different number of rows than expected.
    #[error("expected {expected} record(s), got {found}")]
    RowCount {
        /// Expected row count.
        expected: usize,
        /// Actual row count.
        found: usize,
    },
    /// An id list did not have one entry per pattern variable.
    #[error("{context}: expected {expected} id(s), found {found}")]
    Arity {
        /// Which id list was malformed.
        context: String,
        /// Number of pattern variables.
        expected: usize,
        /// Number of ids present.
        found: usize,
    },
    /// An id pair names an element absent from the returned lists.
    #[error("{context}: id {id} is not among the returned elements")]
    DanglingId {
        /// Which id list held the id.
        context: String,
        /// Offending id.
        id: i64,
    },
}

impl DecodeError {
    pub(crate) fn missing(field: impl Into<String>) -> Self {
        DecodeError::MissingField {
            field: field.into(),
        }
    }

    pub(crate) fn wrong_type(
        context: impl Into<String>,
        expected: &'static str,
        found: &'static str,
    ) -> Self {
        DecodeError::WrongType {
            context: context.into(),
            expected,
            found,
        }
    }
}

/// Top-level error returned by every fallible operation of the crate.
#[derive(Debug, Error)]
pub enum GraphError {
    /// Graph construction rejected its input.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// Relationship endpoint lookup failed while decoding database records.
    #[error(transparent)]
    Lookup(#[from] LookupError),
    /// A database record had the wrong shape.
    #[error(transparent)]
    Decode(#[from] DecodeError),
    /// The database collaborator failed; its error is kept as the source.
    #[error("database error: {0}")]
    Database(#[source] DatabaseError),
    /// An operation needed a live connection but none was loaded.
    #[error("no database loaded")]
    NotConnected,
    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl GraphError {
    /// Wraps a collaborator error without altering it.
    pub fn database<E>(err: E) -> Self
    where
        E: Into<DatabaseError>,
    {
        GraphError::Database(err.into())
    }

    /// Returns a machine-readable code for the error variant.
    pub fn code(&self) -> &'static str {
        match self {
            GraphError::Validation(ValidationError::Empty) => "Empty",
            GraphError::Validation(ValidationError::Incomplete { .. }) => "Incomplete",
            GraphError::Validation(ValidationError::Disconnected { .. }) => "Disconnected",
            GraphError::Lookup(_) => "Lookup",
            GraphError::Decode(_) => "Decode",
            GraphError::Database(_) => "Database",
            GraphError::NotConnected => "NotConnected",
            GraphError::Config(_) => "Config",
        }
    }

    /// True for errors that signal a compiler/assembler contract break rather
    /// than bad user input.
    pub fn is_contract_violation(&self) -> bool {
        matches!(self, GraphError::Lookup(_) | GraphError::Decode(_))
    }
}

/// Convenience wrapper that formats errors with their codes.
pub struct GraphErrorWithCode<'a>(pub &'a GraphError);

impl fmt::Display for GraphErrorWithCode<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.0.code(), self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_distinguish_validation_kinds() {
        let empty = GraphError::from(ValidationError::Empty);
        let disconnected = GraphError::from(ValidationError::Disconnected {
            start: NodeId(0),
            unreached: 1,
            total: 2,
        });
        assert_eq!(empty.code(), "Empty");
        assert_eq!(disconnected.code(), "Disconnected");
        assert_eq!(
            GraphErrorWithCode(&disconnected).to_string(),
            "[Disconnected] graph is not connected: 1 of 2 nodes unreachable from node 0"
        );
    }

    #[test]
    fn lookup_and_decode_are_contract_violations() {
        let lookup = GraphError::from(LookupError {
            relation: RelationId(5),
            node: NodeId(9),
        });
        assert!(lookup.is_contract_violation());
        assert!(GraphError::from(DecodeError::missing("nodes")).is_contract_violation());
        assert!(!GraphError::NotConnected.is_contract_violation());
    }

    #[test]
    fn database_errors_keep_their_source() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "socket closed");
        let err = GraphError::database(io);
        assert_eq!(err.code(), "Database");
        let source = std::error::Error::source(&err).expect("source kept");
        assert_eq!(source.to_string(), "socket closed");
    }
}
