//! Visual property-graph queries.
//!
//! A drawing of labelled vertices and edges becomes a validated, canonically
//! ordered [`Graph`]; the [`QueryCompiler`] turns it into one Cypher pattern
//! query; the [`ResultAssembler`] decodes the single returned row into a
//! result graph plus one id pair per embedding. [`QueryHandler`] runs the
//! whole pipeline against a [`GraphDatabase`] and keeps the per-connection
//! [`DbMetadata`] catalog.

#![warn(missing_docs)]

pub mod config;
pub mod db;
pub mod error;
pub mod graph;
pub mod handler;
pub mod metadata;
pub mod model;
pub mod query;
pub mod results;
pub mod types;

mod printer;

pub use config::{ConfigError, SketchConfig};
pub use db::{GraphDatabase, ReadSession, Record, RecordValue, ReplayDatabase};
pub use error::{DecodeError, GraphError, LookupError, Result, ValidationError};
pub use graph::{Connectivity, Graph, GraphBuilder, Sketch, SketchEdge, SketchVertex};
pub use handler::QueryHandler;
pub use metadata::{retrieve_metadata, DbMetadata};
pub use model::{Identified, Node, Properties, Relation, Resembling};
pub use query::{CompiledQuery, CompilerOptions, QueryCompiler, SymmetryPolicy};
pub use results::{IdPair, ResultAssembler, Results};
pub use types::{NodeId, RelationId, Value};
