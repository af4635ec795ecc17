use std::cmp::Ordering;
use std::fmt;
use std::hash::Hash;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Connectivity, Graph, GraphBuilder};
use crate::error::{Result, ValidationError};
use crate::model::{Node, Properties, Relation};
use crate::types::{NodeId, RelationId};

/// Read-only view of a vertex drawn on the canvas.
pub trait VisualNode {
    /// Stable identity of the vertex inside the drawing.
    type Key: Eq + Hash + fmt::Debug;

    /// Identity used by edges to refer to this vertex.
    fn key(&self) -> &Self::Key;
    /// Optional label filter.
    fn label(&self) -> Option<&str>;
    /// Property filters.
    fn properties(&self) -> &Properties;
}

/// Read-only view of an edge drawn between two vertices.
pub trait VisualEdge<K> {
    /// Identity of the vertex the edge was drawn from.
    fn start(&self) -> &K;
    /// Identity of the vertex the edge was drawn to.
    fn end(&self) -> &K;
    /// Whether the edge has an arrowhead.
    fn is_directed(&self) -> bool;
    /// Optional relationship type filter.
    fn label(&self) -> Option<&str>;
    /// Property filters.
    fn properties(&self) -> &Properties;
}

/// Serializable drawing, as exported by a canvas or written by hand.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sketch {
    /// Vertices in drawing order.
    #[serde(default)]
    pub vertices: Vec<SketchVertex>,
    /// Edges in drawing order.
    #[serde(default)]
    pub edges: Vec<SketchEdge>,
}

/// Vertex of a [`Sketch`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SketchVertex {
    /// Canvas identity.
    pub key: String,
    /// Optional label.
    #[serde(default)]
    pub label: Option<String>,
    /// Property filters.
    #[serde(default)]
    pub properties: Properties,
}

/// Edge of a [`Sketch`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SketchEdge {
    /// Key of the start vertex.
    pub start: String,
    /// Key of the end vertex.
    pub end: String,
    /// Whether the edge is directed.
    #[serde(default)]
    pub directed: bool,
    /// Optional relationship type.
    #[serde(default)]
    pub label: Option<String>,
    /// Property filters.
    #[serde(default)]
    pub properties: Properties,
}

impl SketchVertex {
    /// Creates a vertex without properties.
    pub fn new(key: impl Into<String>, label: Option<&str>) -> Self {
        Self {
            key: key.into(),
            label: label.map(str::to_owned),
            properties: Properties::new(),
        }
    }

    /// Adds a property filter.
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<crate::Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }
}

impl SketchEdge {
    /// Creates an edge without properties.
    pub fn new(
        start: impl Into<String>,
        end: impl Into<String>,
        directed: bool,
        label: Option<&str>,
    ) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
            directed,
            label: label.map(str::to_owned),
            properties: Properties::new(),
        }
    }

    /// Adds a property filter.
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<crate::Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }
}

impl VisualNode for SketchVertex {
    type Key = String;

    fn key(&self) -> &String {
        &self.key
    }

    fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    fn properties(&self) -> &Properties {
        &self.properties
    }
}

impl VisualEdge<String> for SketchEdge {
    fn start(&self) -> &String {
        &self.start
    }

    fn end(&self) -> &String {
        &self.end
    }

    fn is_directed(&self) -> bool {
        self.directed
    }

    fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    fn properties(&self) -> &Properties {
        &self.properties
    }
}

impl Sketch {
    /// Builds the canonical query graph for this drawing.
    pub fn to_graph(&self) -> Result<Graph> {
        Graph::from_drawing(&self.vertices, &self.edges)
    }
}

/// Edge with endpoints resolved to vertex indexes and undirected endpoints
/// normalised.
struct PlacedEdge<'a> {
    start: usize,
    end: usize,
    directed: bool,
    label: Option<&'a str>,
    properties: &'a Properties,
}

impl Graph {
    /// Builds a connected query graph from a drawing.
    ///
    /// Node ids are the vertex positions in `vertices`. Relation ids follow
    /// the canonical edge order: undirected edges start at their lower-indexed
    /// endpoint, then edges sort by `(start, end)` with direction, label, and
    /// properties as tie breakers, so the ids do not depend on the order in
    /// which edges were drawn.
    pub fn from_drawing<V, E>(vertices: &[V], edges: &[E]) -> Result<Graph>
    where
        V: VisualNode,
        E: VisualEdge<V::Key>,
    {
        if vertices.is_empty() {
            return Err(ValidationError::Empty.into());
        }

        let mut index: FxHashMap<&V::Key, usize> =
            FxHashMap::with_capacity_and_hasher(vertices.len(), Default::default());
        for (idx, vertex) in vertices.iter().enumerate() {
            if index.insert(vertex.key(), idx).is_some() {
                return Err(ValidationError::incomplete(format!(
                    "vertex {:?} appears more than once",
                    vertex.key()
                ))
                .into());
            }
        }

        let mut placed = Vec::with_capacity(edges.len());
        for edge in edges {
            let resolve = |key: &V::Key| {
                index.get(key).copied().ok_or_else(|| {
                    ValidationError::incomplete(format!("edge endpoint {key:?} is not a vertex"))
                })
            };
            let mut start = resolve(edge.start())?;
            let mut end = resolve(edge.end())?;
            if !edge.is_directed() && start > end {
                std::mem::swap(&mut start, &mut end);
            }
            placed.push(PlacedEdge {
                start,
                end,
                directed: edge.is_directed(),
                label: edge.label(),
                properties: edge.properties(),
            });
        }
        placed.sort_by(canonical_order);

        let mut builder = GraphBuilder::new();
        for (idx, vertex) in vertices.iter().enumerate() {
            builder.add_node(Node::new(
                NodeId(idx as i64),
                vertex.label().map(str::to_owned),
                vertex.properties().clone(),
            ));
        }
        for (idx, placed) in placed.iter().enumerate() {
            builder.add_relation(Relation::new(
                RelationId(idx as i64),
                NodeId(placed.start as i64),
                NodeId(placed.end as i64),
                placed.directed,
                placed.label.map(str::to_owned),
                placed.properties.clone(),
            ));
        }
        let graph = builder.build(Connectivity::Required)?;
        debug!(
            nodes = graph.node_count(),
            relations = graph.relation_count(),
            "graph.from_drawing.built"
        );
        Ok(graph)
    }
}

fn canonical_order(a: &PlacedEdge<'_>, b: &PlacedEdge<'_>) -> Ordering {
    a.start
        .cmp(&b.start)
        .then(a.end.cmp(&b.end))
        .then(a.directed.cmp(&b.directed))
        .then_with(|| a.label.cmp(&b.label))
        .then_with(|| compare_properties(a.properties, b.properties))
}

pub(crate) fn compare_properties(a: &Properties, b: &Properties) -> Ordering {
    let mut left = a.iter();
    let mut right = b.iter();
    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some((ka, va)), Some((kb, vb))) => {
                let ord = ka.cmp(kb).then_with(|| va.total_cmp(vb));
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}
