use std::collections::BTreeMap;

use super::{Connectivity, Graph, GraphBuilder};
use crate::db::{RawNode, RawRelationship, Record};
use crate::error::{LookupError, Result};
use crate::model::{Node, Properties, Relation};
use crate::query::{NODES_FIELD, RELATIONSHIPS_FIELD};
use crate::types::{NodeId, RelationId};

/// How database records are turned into entities.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RecordMode {
    /// Schema graphs describe shape only; property values are dropped.
    Schema,
    /// Result graphs keep every property value.
    Result,
}

impl Graph {
    /// Builds a graph from database nodes and relationships.
    ///
    /// Each node takes its first reported label. Nodes or relationships that
    /// appear more than once (for example across several matches) are kept
    /// once. A relationship whose endpoint is not in `nodes` fails with a
    /// [`LookupError`]. Connectivity is not checked.
    pub fn from_records(
        nodes: &[RawNode],
        relationships: &[RawRelationship],
        mode: RecordMode,
    ) -> Result<Graph> {
        let node_map = decode_nodes(nodes, mode);
        let mut relations = BTreeMap::new();
        for raw in relationships {
            let relation = decode_relationship(raw, &node_map, mode)?;
            relations.entry(relation.0).or_insert(relation.1);
        }

        let mut builder = GraphBuilder::new();
        for node in node_map.into_values() {
            builder.add_node(node);
        }
        for relation in relations.into_values() {
            builder.add_relation(relation);
        }
        Ok(builder.build(Connectivity::Unchecked)?)
    }
}

/// Decodes the `nodes` and `relationships` list fields of a record into a
/// graph, or `None` when the node list is empty.
pub(crate) fn graph_from_record(record: &Record, mode: RecordMode) -> Result<Option<Graph>> {
    let nodes = record
        .get(NODES_FIELD)?
        .as_list(NODES_FIELD)?
        .iter()
        .map(|value| value.as_node(NODES_FIELD).cloned())
        .collect::<std::result::Result<Vec<RawNode>, _>>()?;
    let relationships = record
        .get(RELATIONSHIPS_FIELD)?
        .as_list(RELATIONSHIPS_FIELD)?
        .iter()
        .map(|value| value.as_relationship(RELATIONSHIPS_FIELD).cloned())
        .collect::<std::result::Result<Vec<RawRelationship>, _>>()?;
    if nodes.is_empty() {
        if let Some(first) = relationships.first() {
            return Err(LookupError {
                relation: RelationId(first.id),
                node: NodeId(first.start),
            }
            .into());
        }
        return Ok(None);
    }
    Graph::from_records(&nodes, &relationships, mode).map(Some)
}

/// Decodes raw nodes into an id-keyed map, keeping the first occurrence.
fn decode_nodes(nodes: &[RawNode], mode: RecordMode) -> BTreeMap<NodeId, Node> {
    let mut map = BTreeMap::new();
    for raw in nodes {
        let id = NodeId(raw.id);
        map.entry(id).or_insert_with(|| {
            Node::new(
                id,
                raw.labels.first().cloned(),
                keep_properties(&raw.properties, mode),
            )
        });
    }
    map
}

fn decode_relationship(
    raw: &RawRelationship,
    nodes: &BTreeMap<NodeId, Node>,
    mode: RecordMode,
) -> Result<(RelationId, Relation)> {
    let id = RelationId(raw.id);
    for endpoint in [raw.start, raw.end] {
        if !nodes.contains_key(&NodeId(endpoint)) {
            return Err(LookupError {
                relation: id,
                node: NodeId(endpoint),
            }
            .into());
        }
    }
    Ok((
        id,
        Relation::new(
            id,
            NodeId(raw.start),
            NodeId(raw.end),
            true,
            Some(raw.rel_type.clone()),
            keep_properties(&raw.properties, mode),
        ),
    ))
}

fn keep_properties(properties: &Properties, mode: RecordMode) -> Properties {
    match mode {
        RecordMode::Schema => Properties::new(),
        RecordMode::Result => properties.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GraphError;
    use crate::model::Identified;
    use crate::types::Value;

    fn raw_node(id: i64, label: &str) -> RawNode {
        let mut properties = Properties::new();
        properties.insert("name".into(), Value::from(format!("node-{id}")));
        RawNode {
            id,
            labels: vec![label.into(), "Extra".into()],
            properties,
        }
    }

    fn raw_rel(id: i64, start: i64, end: i64) -> RawRelationship {
        RawRelationship {
            id,
            start,
            end,
            rel_type: "KNOWS".into(),
            properties: Properties::new(),
        }
    }

    #[test]
    fn result_mode_keeps_properties_and_first_label() {
        let graph = Graph::from_records(
            &[raw_node(101, "Person"), raw_node(102, "Person")],
            &[raw_rel(55, 101, 102)],
            RecordMode::Result,
        )
        .expect("graph");
        let node = graph.node(NodeId(101)).expect("node");
        assert_eq!(node.label(), Some("Person"));
        assert_eq!(node.properties().len(), 1);
        let rel = graph.relation(RelationId(55)).expect("rel");
        assert!(rel.is_directed());
        assert_eq!(rel.label(), Some("KNOWS"));
    }

    #[test]
    fn schema_mode_drops_properties() {
        let graph = Graph::from_records(&[raw_node(-1, "Person")], &[], RecordMode::Schema)
            .expect("graph");
        assert!(graph.node(NodeId(-1)).expect("node").properties().is_empty());
    }

    #[test]
    fn disconnected_records_are_accepted_and_deduplicated() {
        let graph = Graph::from_records(
            &[
                raw_node(1, "A"),
                raw_node(2, "B"),
                raw_node(3, "C"),
                raw_node(1, "A"),
            ],
            &[raw_rel(9, 1, 2), raw_rel(9, 1, 2)],
            RecordMode::Result,
        )
        .expect("graph");
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.relation_count(), 1);
        assert!(!graph.is_connected());
    }

    #[test]
    fn record_fields_decode_into_a_graph() {
        let record = Record::new()
            .with("nodes", vec![raw_node(1, "A"), raw_node(2, "B")])
            .with("relationships", vec![raw_rel(3, 1, 2)]);
        let graph = graph_from_record(&record, RecordMode::Schema)
            .expect("decode")
            .expect("non-empty");
        assert_eq!(graph.relation_count(), 1);

        let empty = Record::new()
            .with("nodes", Vec::<RawNode>::new())
            .with("relationships", Vec::<RawRelationship>::new());
        assert_eq!(graph_from_record(&empty, RecordMode::Result).expect("decode"), None);

        let missing = Record::new().with("nodes", Vec::<RawNode>::new());
        assert_eq!(
            graph_from_record(&missing, RecordMode::Result).unwrap_err().code(),
            "Decode"
        );
    }

    #[test]
    fn missing_endpoint_is_a_lookup_error() {
        let err = Graph::from_records(&[raw_node(1, "A")], &[raw_rel(9, 1, 2)], RecordMode::Result)
            .unwrap_err();
        match err {
            GraphError::Lookup(lookup) => {
                assert_eq!(lookup.relation, RelationId(9));
                assert_eq!(lookup.node, NodeId(2));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
