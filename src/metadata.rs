#![forbid(unsafe_code)]

//! Per-connection catalog of labels, counts, property types, and schema.
//!
//! The catalog is read once when a database is loaded and never mutated.
//! Reconnecting builds a fresh one.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::Serialize;
use tracing::{debug, info};

use crate::db::{GraphDatabase, ReadSession, Record};
use crate::error::{DecodeError, Result};
use crate::graph::records::graph_from_record;
use crate::graph::{Graph, RecordMode};
use crate::printer::Tree;
use crate::query::catalog::{
    self, COUNT_COLUMN, LABEL_COLUMN, NODE_TYPE_COLUMN, PROPERTIES_COLUMN, REL_TYPE_COLUMN,
};

/// Property name to first reported type name.
pub type PropertyTypes = BTreeMap<String, String>;

/// Read-only snapshot of the database catalog.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DbMetadata {
    /// Node count per label.
    pub node_counts_by_label: BTreeMap<String, u64>,
    /// Relationship count per type.
    pub relation_counts_by_label: BTreeMap<String, u64>,
    /// Property types per node label.
    pub node_properties_by_label: BTreeMap<String, PropertyTypes>,
    /// Property types per relationship type.
    pub relation_properties_by_label: BTreeMap<String, PropertyTypes>,
    /// Number of nodes in the database.
    pub total_nodes: u64,
    /// Number of relationships in the database.
    pub total_relations: u64,
    /// Schema shape; `None` for an empty database.
    pub schema_graph: Option<Graph>,
}

impl DbMetadata {
    /// Node labels in ascending order.
    pub fn node_labels(&self) -> impl Iterator<Item = &str> + '_ {
        self.node_counts_by_label.keys().map(String::as_str)
    }

    /// Relationship types in ascending order.
    pub fn relation_types(&self) -> impl Iterator<Item = &str> + '_ {
        self.relation_counts_by_label.keys().map(String::as_str)
    }

    /// True when every node in a non-empty database carries `label`, so a
    /// label filter would not discriminate.
    pub fn is_redundant_node_label(&self, label: &str) -> bool {
        self.total_nodes > 0 && self.node_counts_by_label.get(label) == Some(&self.total_nodes)
    }

    /// True when every relationship in a non-empty database has `rel_type`.
    pub fn is_redundant_relation_label(&self, rel_type: &str) -> bool {
        self.total_relations > 0
            && self.relation_counts_by_label.get(rel_type) == Some(&self.total_relations)
    }

    fn tree(&self) -> Tree {
        let counts = |title: &str, map: &BTreeMap<String, u64>| {
            Tree::with_children(
                title,
                map.iter()
                    .map(|(label, count)| Tree::new(format!("{label}: {count}")))
                    .collect(),
            )
        };
        let catalogs = |title: &str, map: &BTreeMap<String, PropertyTypes>| {
            Tree::with_children(
                title,
                map.iter()
                    .map(|(label, props)| {
                        Tree::with_children(
                            label.clone(),
                            props
                                .iter()
                                .map(|(name, ty)| Tree::new(format!("{name}: {ty}")))
                                .collect(),
                        )
                    })
                    .collect(),
            )
        };
        let mut children = vec![
            Tree::new(format!("Total Nodes: {}", self.total_nodes)),
            Tree::new(format!("Total Relations: {}", self.total_relations)),
            counts("Node Counts", &self.node_counts_by_label),
            counts("Relation Counts", &self.relation_counts_by_label),
            catalogs("Node Properties", &self.node_properties_by_label),
            catalogs("Relation Properties", &self.relation_properties_by_label),
        ];
        children.push(match &self.schema_graph {
            Some(graph) => graph.tree("Schema"),
            None => Tree::new("Schema: (empty)"),
        });
        Tree::with_children("Database Metadata", children)
    }
}

impl fmt::Display for DbMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.tree(), f)
    }
}

/// Runs the catalog queries in one read session and assembles the snapshot.
///
/// The session is released on every exit path. Any failure aborts the whole
/// retrieval; no partial catalog is returned.
pub fn retrieve_metadata(db: &dyn GraphDatabase) -> Result<DbMetadata> {
    let mut guard = db.session()?;
    let session = &mut *guard;

    let node_labels = read_names(session, catalog::LABELS_QUERY)?;
    let relation_types = read_names(session, catalog::RELATIONSHIP_TYPES_QUERY)?;

    let mut node_counts_by_label = BTreeMap::new();
    for label in node_labels {
        let count = read_count(session, &catalog::node_count_by_label(&label))?;
        node_counts_by_label.insert(label, count);
    }
    let mut relation_counts_by_label = BTreeMap::new();
    for rel_type in relation_types {
        let count = read_count(session, &catalog::relationship_count_by_type(&rel_type))?;
        relation_counts_by_label.insert(rel_type, count);
    }
    let total_nodes = read_count(session, catalog::TOTAL_NODES_QUERY)?;
    let total_relations = read_count(session, catalog::TOTAL_RELATIONSHIPS_QUERY)?;

    let node_properties_by_label =
        read_property_catalog(session, catalog::NODE_TYPE_PROPERTIES_QUERY, NODE_TYPE_COLUMN)?;
    let relation_properties_by_label =
        read_property_catalog(session, catalog::REL_TYPE_PROPERTIES_QUERY, REL_TYPE_COLUMN)?;

    let schema = session.read_single(catalog::SCHEMA_QUERY)?;
    let schema_graph = graph_from_record(&schema, RecordMode::Schema)?;

    let metadata = DbMetadata {
        node_counts_by_label,
        relation_counts_by_label,
        node_properties_by_label,
        relation_properties_by_label,
        total_nodes,
        total_relations,
        schema_graph,
    };
    info!(
        labels = metadata.node_counts_by_label.len(),
        relation_types = metadata.relation_counts_by_label.len(),
        total_nodes = metadata.total_nodes,
        total_relations = metadata.total_relations,
        "metadata.retrieve.completed"
    );
    Ok(metadata)
}

fn read_names(session: &mut (dyn ReadSession + '_), query: &str) -> Result<BTreeSet<String>> {
    let rows = session.read(query)?;
    let names = rows
        .iter()
        .map(|row| Ok(row.get(LABEL_COLUMN)?.as_str(LABEL_COLUMN)?.to_owned()))
        .collect::<std::result::Result<BTreeSet<_>, DecodeError>>()?;
    debug!(query, names = names.len(), "metadata.names.read");
    Ok(names)
}

fn read_count(session: &mut (dyn ReadSession + '_), query: &str) -> Result<u64> {
    let row = session.read_single(query)?;
    let count = row.get(COUNT_COLUMN)?.as_int(COUNT_COLUMN)?;
    u64::try_from(count).map_err(|_| {
        DecodeError::wrong_type(COUNT_COLUMN, "non-negative integer", "negative integer").into()
    })
}

fn read_property_catalog(
    session: &mut (dyn ReadSession + '_),
    query: &str,
    type_column: &str,
) -> Result<BTreeMap<String, PropertyTypes>> {
    let mut by_label: BTreeMap<String, PropertyTypes> = BTreeMap::new();
    for row in session.read(query)? {
        let (label, pairs) = decode_property_row(&row, type_column)?;
        let entry = by_label.entry(label).or_default();
        for (name, ty) in pairs {
            entry.entry(name).or_insert(ty);
        }
    }
    Ok(by_label)
}

fn decode_property_row(
    row: &Record,
    type_column: &str,
) -> std::result::Result<(String, Vec<(String, String)>), DecodeError> {
    let label = catalog::undecorate(row.get(type_column)?.as_str(type_column)?).to_owned();
    let mut pairs = Vec::new();
    for pair in row.get(PROPERTIES_COLUMN)?.as_list(PROPERTIES_COLUMN)? {
        match pair.as_list(PROPERTIES_COLUMN)? {
            [name, ty] => pairs.push((
                name.as_str(PROPERTIES_COLUMN)?.to_owned(),
                ty.as_str(PROPERTIES_COLUMN)?.to_owned(),
            )),
            _ => {
                return Err(DecodeError::wrong_type(
                    PROPERTIES_COLUMN,
                    "[name, type] pair",
                    "list of other length",
                ))
            }
        }
    }
    Ok((label, pairs))
}
