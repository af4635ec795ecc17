#![forbid(unsafe_code)]

//! Immutable property graph with construction-time validation.
//!
//! A [`Graph`] is only ever observed in a valid state: every constructor runs
//! through [`GraphBuilder::build`], which checks the invariants below and
//! returns a [`ValidationError`] instead of a partially built graph.
//!
//! 1. The node set is non-empty.
//! 2. Every relation referenced by a node is present, and every relation's
//!    endpoints are present.
//! 3. Optionally, every node is reachable from the first node through the
//!    undirected adjacency induced by relations.

/// Canonical construction from a user drawing.
pub mod drawing;
/// Construction from database nodes and relationships.
pub mod records;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use rustc_hash::FxHashSet;
use serde::Serialize;

use crate::error::ValidationError;
use crate::model::{Identified, Node, Relation};
use crate::printer::Tree;
use crate::types::{NodeId, RelationId};

pub use drawing::{Sketch, SketchEdge, SketchVertex, VisualEdge, VisualNode};
pub use records::RecordMode;

/// Whether construction must prove the graph is connected.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Connectivity {
    /// Query graphs: a single traversal must reach every node.
    Required,
    /// Schema and result graphs may be disconnected unions.
    Unchecked,
}

/// Validated, immutable graph. Nodes and relations iterate in id order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Graph {
    nodes: BTreeMap<NodeId, Node>,
    relations: BTreeMap<RelationId, Relation>,
}

impl Graph {
    /// Validates and freezes the supplied nodes and relations.
    ///
    /// Relations are attached to their endpoints; incident-relation ids
    /// already present on a node must resolve to relations in `relations`.
    pub fn new<N, R>(
        nodes: N,
        relations: R,
        connectivity: Connectivity,
    ) -> Result<Self, ValidationError>
    where
        N: IntoIterator<Item = Node>,
        R: IntoIterator<Item = Relation>,
    {
        let mut builder = GraphBuilder::new();
        for node in nodes {
            builder.add_node(node);
        }
        for relation in relations {
            builder.add_relation(relation);
        }
        builder.build(connectivity)
    }

    /// Nodes in ascending id order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> + '_ {
        self.nodes.values()
    }

    /// Relations in ascending id order.
    pub fn relations(&self) -> impl Iterator<Item = &Relation> + '_ {
        self.relations.values()
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of relations.
    pub fn relation_count(&self) -> usize {
        self.relations.len()
    }

    /// Node ids in ascending order.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    /// Relation ids in ascending order.
    pub fn relation_ids(&self) -> impl Iterator<Item = RelationId> + '_ {
        self.relations.keys().copied()
    }

    /// Looks up a node by id.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// Looks up a relation by id.
    pub fn relation(&self, id: RelationId) -> Option<&Relation> {
        self.relations.get(&id)
    }

    /// Distinct neighbors of `id`, excluding the node itself (self loops do
    /// not make a node its own neighbor).
    pub fn neighbors(&self, id: NodeId) -> BTreeSet<NodeId> {
        self.incident(id)
            .filter(|rel| !rel.is_self_loop())
            .filter_map(|rel| rel.other(id))
            .collect()
    }

    /// Relations connecting `a` and `b` in either direction, in id order.
    pub fn relations_between(&self, a: NodeId, b: NodeId) -> Vec<&Relation> {
        self.incident(a)
            .filter(|rel| rel.other(a) == Some(b))
            .collect()
    }

    /// Relations incident to `id`, in id order. Empty for unknown nodes.
    pub fn incident(&self, id: NodeId) -> impl Iterator<Item = &Relation> + '_ {
        self.nodes
            .get(&id)
            .into_iter()
            .flat_map(|node| node.relations())
            .filter_map(|rel| self.relations.get(&rel))
    }

    /// Whether a single traversal from the first node reaches all nodes.
    pub fn is_connected(&self) -> bool {
        unreached_from_first(&self.nodes, &self.relations).map_or(true, |(_, n)| n == 0)
    }

    /// Renders the graph as an indented tree.
    pub(crate) fn tree(&self, title: &str) -> Tree {
        let nodes = self
            .nodes()
            .map(|node| {
                let mut entry = Tree::new(format!("n{}", node.id()));
                if let Some(label) = node.label() {
                    entry.push(Tree::new(format!("Label: {label}")));
                }
                if !node.properties().is_empty() {
                    entry.push(Tree::properties(node.properties()));
                }
                let rels: Vec<String> = node.relations().map(|id| format!("r{id}")).collect();
                entry.push(Tree::new(format!("Relations: [{}]", rels.join(", "))));
                entry
            })
            .collect();
        let relations = self
            .relations()
            .map(|rel| {
                let mut entry = Tree::new(format!("r{}", rel.id()));
                if let Some(label) = rel.label() {
                    entry.push(Tree::new(format!("Label: {label}")));
                }
                if !rel.properties().is_empty() {
                    entry.push(Tree::properties(rel.properties()));
                }
                let arrow = if rel.is_directed() { "->" } else { "--" };
                entry.push(Tree::new(format!("n{} {arrow} n{}", rel.start(), rel.end())));
                entry
            })
            .collect();
        Tree::with_children(
            title,
            vec![
                Tree::with_children("Nodes", nodes),
                Tree::with_children("Relations", relations),
            ],
        )
    }
}

impl fmt::Display for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.tree("Graph"), f)
    }
}

/// Two-phase constructor: accumulate nodes and relations, then freeze.
#[derive(Debug, Default)]
pub struct GraphBuilder {
    nodes: BTreeMap<NodeId, Node>,
    relations: BTreeMap<RelationId, Relation>,
    duplicates: Vec<String>,
}

impl GraphBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a node. A second node with the same id is reported at build time.
    pub fn add_node(&mut self, node: Node) -> &mut Self {
        let id = node.id();
        if self.nodes.contains_key(&id) {
            self.duplicates.push(format!("duplicate node id {id}"));
        } else {
            self.nodes.insert(id, node);
        }
        self
    }

    /// Adds a relation. A second relation with the same id is reported at
    /// build time.
    pub fn add_relation(&mut self, relation: Relation) -> &mut Self {
        let id = relation.id();
        if self.relations.contains_key(&id) {
            self.duplicates.push(format!("duplicate relation id {id}"));
        } else {
            self.relations.insert(id, relation);
        }
        self
    }

    /// Attaches relations to their endpoints and validates the result.
    pub fn build(mut self, connectivity: Connectivity) -> Result<Graph, ValidationError> {
        if self.nodes.is_empty() {
            return Err(ValidationError::Empty);
        }
        if let Some(first) = self.duplicates.first() {
            return Err(ValidationError::incomplete(first.clone()));
        }
        for relation in self.relations.values() {
            for endpoint in [relation.start(), relation.end()] {
                match self.nodes.get_mut(&endpoint) {
                    Some(node) => node.attach(relation.id()),
                    None => {
                        return Err(ValidationError::incomplete(format!(
                            "relation {} references node {endpoint} outside the graph",
                            relation.id()
                        )))
                    }
                }
            }
        }
        check_incident_sets(&self.nodes, &self.relations)?;

        if connectivity == Connectivity::Required {
            if let Some((start, unreached)) = unreached_from_first(&self.nodes, &self.relations) {
                if unreached > 0 {
                    return Err(ValidationError::Disconnected {
                        start,
                        unreached,
                        total: self.nodes.len(),
                    });
                }
            }
        }

        Ok(Graph {
            nodes: self.nodes,
            relations: self.relations,
        })
    }
}

fn check_incident_sets(
    nodes: &BTreeMap<NodeId, Node>,
    relations: &BTreeMap<RelationId, Relation>,
) -> Result<(), ValidationError> {
    for node in nodes.values() {
        for rel_id in node.relations() {
            match relations.get(&rel_id) {
                Some(rel) if rel.touches(node.id()) => {}
                Some(_) => {
                    return Err(ValidationError::incomplete(format!(
                        "node {} lists relation {rel_id} which does not touch it",
                        node.id()
                    )))
                }
                None => {
                    return Err(ValidationError::incomplete(format!(
                        "node {} lists relation {rel_id} outside the graph",
                        node.id()
                    )))
                }
            }
        }
    }
    Ok(())
}

/// Depth-first traversal with an explicit stack from the lowest node id.
/// Returns the start node and the number of nodes never visited, or `None`
/// for an empty node set.
fn unreached_from_first(
    nodes: &BTreeMap<NodeId, Node>,
    relations: &BTreeMap<RelationId, Relation>,
) -> Option<(NodeId, usize)> {
    let start = *nodes.keys().next()?;
    let mut visited: FxHashSet<NodeId> = FxHashSet::default();
    let mut stack = vec![start];
    visited.insert(start);
    while let Some(focus) = stack.pop() {
        let Some(node) = nodes.get(&focus) else {
            continue;
        };
        for rel_id in node.relations() {
            let Some(other) = relations.get(&rel_id).and_then(|rel| rel.other(focus)) else {
                continue;
            };
            if visited.insert(other) {
                stack.push(other);
            }
        }
    }
    Some((start, nodes.len() - visited.len()))
}
