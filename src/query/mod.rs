#![forbid(unsafe_code)]

//! Cypher generation for drawn query graphs and the metadata catalog.
//!
//! The compiler turns a validated [`Graph`](crate::graph::Graph) into a
//! single pattern-matching query whose result row can be decoded by
//! [`ResultAssembler`](crate::results::ResultAssembler).

/// Fixed catalog queries and their column names.
pub mod catalog;

/// Query graph to Cypher translation.
pub mod compiler;

/// Identifier quoting and literal rendering.
pub mod cypher;

/// Interchangeable nodes and relations in a query graph.
pub mod symmetry;

pub use compiler::{
    CompiledQuery, CompilerOptions, QueryCompiler, RowShape, SymmetryPolicy, NODES_FIELD,
    RELATIONSHIPS_FIELD, RESULT_IDS_FIELD,
};
pub use symmetry::SymmetryReport;
