#![forbid(unsafe_code)]

//! Connection-scoped pipeline: drawing in, results out.

use std::sync::Arc;

use tracing::{debug, info};

use crate::db::GraphDatabase;
use crate::error::{GraphError, Result};
use crate::graph::{Graph, VisualEdge, VisualNode};
use crate::metadata::{retrieve_metadata, DbMetadata};
use crate::query::{CompiledQuery, CompilerOptions, QueryCompiler};
use crate::results::{ResultAssembler, Results};

struct Connection<D> {
    db: D,
    metadata: Arc<DbMetadata>,
    query_graph: Option<Graph>,
    last_query: Option<CompiledQuery>,
}

/// Holds one database connection with its catalog and the most recent query.
///
/// Loading a new database or disconnecting discards the catalog and the
/// current query graph together.
pub struct QueryHandler<D: GraphDatabase> {
    options: CompilerOptions,
    connection: Option<Connection<D>>,
}

impl<D: GraphDatabase> QueryHandler<D> {
    /// Creates a disconnected handler.
    pub fn new(options: CompilerOptions) -> Self {
        Self {
            options,
            connection: None,
        }
    }

    /// Verifies `db` is reachable, reads its catalog, and makes it current.
    ///
    /// On failure the previous connection, if any, has already been dropped.
    pub fn load_database(&mut self, db: D) -> Result<Arc<DbMetadata>> {
        self.connection = None;
        db.verify_connectivity()?;
        let metadata = Arc::new(retrieve_metadata(&db)?);
        info!(
            labels = metadata.node_counts_by_label.len(),
            relation_types = metadata.relation_counts_by_label.len(),
            "handler.load_database.completed"
        );
        self.connection = Some(Connection {
            db,
            metadata: Arc::clone(&metadata),
            query_graph: None,
            last_query: None,
        });
        Ok(metadata)
    }

    /// Builds the query graph from a drawing, runs it, and assembles the
    /// matches.
    pub fn exact_search<V, E>(&mut self, vertices: &[V], edges: &[E]) -> Result<Results>
    where
        V: VisualNode,
        E: VisualEdge<V::Key>,
    {
        let conn = self.connection.as_mut().ok_or(GraphError::NotConnected)?;
        let graph = Graph::from_drawing(vertices, edges)?;
        let query = QueryCompiler::new(self.options.clone())
            .with_metadata(Arc::clone(&conn.metadata))
            .translate(&graph);
        debug!(query = %query, "handler.exact_search.compiled");

        let record = {
            let mut session = conn.db.session()?;
            session.read_single(query.text())?
        };
        let results = ResultAssembler::for_query(&query).assemble(&record)?;
        info!(
            matches = results.len(),
            nodes = results.graph.as_ref().map_or(0, Graph::node_count),
            "handler.exact_search.completed"
        );

        conn.query_graph = Some(graph);
        conn.last_query = Some(query);
        Ok(results)
    }

    /// Drops the connection with its catalog and query graph, returning the
    /// database handle.
    pub fn disconnect(&mut self) -> Option<D> {
        let conn = self.connection.take()?;
        info!("handler.disconnect");
        Some(conn.db)
    }

    /// Whether a database is loaded.
    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    /// Catalog of the current connection.
    pub fn metadata(&self) -> Option<&Arc<DbMetadata>> {
        self.connection.as_ref().map(|conn| &conn.metadata)
    }

    /// Query graph of the last successful search on this connection.
    pub fn query_graph(&self) -> Option<&Graph> {
        self.connection.as_ref()?.query_graph.as_ref()
    }

    /// Compiled text of the last successful search on this connection.
    pub fn last_query(&self) -> Option<&CompiledQuery> {
        self.connection.as_ref()?.last_query.as_ref()
    }

    /// The current database.
    pub fn database(&self) -> Option<&D> {
        self.connection.as_ref().map(|conn| &conn.db)
    }
}

impl<D: GraphDatabase> Default for QueryHandler<D> {
    fn default() -> Self {
        Self::new(CompilerOptions::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::ReplayDatabase;
    use crate::graph::{SketchEdge, SketchVertex};

    #[test]
    fn search_requires_a_connection() {
        let mut handler: QueryHandler<ReplayDatabase> = QueryHandler::default();
        let err = handler
            .exact_search(&[SketchVertex::new("a", None)], &[] as &[SketchEdge])
            .unwrap_err();
        assert_eq!(err.code(), "NotConnected");
        assert!(handler.metadata().is_none());
    }

    #[test]
    fn unreachable_database_is_not_loaded() {
        let mut handler = QueryHandler::default();
        let err = handler
            .load_database(ReplayDatabase::new().unreachable())
            .unwrap_err();
        assert_eq!(err.code(), "Database");
        assert!(!handler.is_connected());
    }
}
