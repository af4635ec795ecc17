//! Entity records shared by nodes and relations.
//!
//! Nodes and relations never hold references to each other. A node keeps the
//! ids of its incident relations and a relation keeps the ids of its two
//! endpoints; both are resolved through the owning [`Graph`](crate::graph::Graph).

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{NodeId, RelationId, Value};

/// Ordered property map carried by every entity.
pub type Properties = BTreeMap<String, Value>;

/// Identity, optional label, and properties common to nodes and relations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity<I> {
    /// Stable identity within one graph.
    pub id: I,
    /// Label (node) or relationship type (relation).
    pub label: Option<String>,
    /// Property filters or values.
    #[serde(default)]
    pub properties: Properties,
}

impl<I> Entity<I> {
    /// Creates an entity without properties.
    pub fn new(id: I, label: Option<String>) -> Self {
        Self {
            id,
            label,
            properties: Properties::new(),
        }
    }

    /// Returns the entity with the supplied properties.
    pub fn with_properties(mut self, properties: Properties) -> Self {
        self.properties = properties;
        self
    }

    /// Checks whether two entities could describe the same database element.
    ///
    /// A missing label acts as a wildcard and a property missing on either
    /// side is not a conflict.
    pub fn compatible_with<J>(&self, other: &Entity<J>) -> bool {
        if let (Some(a), Some(b)) = (&self.label, &other.label) {
            if a != b {
                return false;
            }
        }
        self.properties.iter().all(|(key, value)| {
            other
                .properties
                .get(key)
                .map_or(true, |theirs| theirs == value)
        })
    }
}

/// Access to the identity and constraints of an entity.
pub trait Identified {
    /// Identifier type.
    type Id: Copy + Ord + fmt::Display;

    /// Shared entity record.
    fn entity(&self) -> &Entity<Self::Id>;

    /// Identity within the owning graph.
    fn id(&self) -> Self::Id {
        self.entity().id
    }

    /// Label or relationship type.
    fn label(&self) -> Option<&str> {
        self.entity().label.as_deref()
    }

    /// Property map.
    fn properties(&self) -> &Properties {
        &self.entity().properties
    }
}

/// Conservative check for entities that may bind the same database element.
pub trait Resembling: Identified {
    /// True when `other` is a different entity whose label and properties do
    /// not conflict with this one. An entity never resembles itself.
    fn resembles(&self, other: &Self) -> bool {
        self.id() != other.id() && self.entity().compatible_with(other.entity())
    }
}

/// Node of a pattern, schema, or result graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    #[serde(flatten)]
    entity: Entity<NodeId>,
    #[serde(default)]
    relations: BTreeSet<RelationId>,
}

impl Node {
    /// Creates a node without incident relations.
    pub fn new(id: NodeId, label: Option<String>, properties: Properties) -> Self {
        Self {
            entity: Entity::new(id, label).with_properties(properties),
            relations: BTreeSet::new(),
        }
    }

    /// Ids of incident relations in ascending order.
    pub fn relations(&self) -> impl Iterator<Item = RelationId> + '_ {
        self.relations.iter().copied()
    }

    /// Number of incident relations; a self loop counts once.
    pub fn relation_count(&self) -> usize {
        self.relations.len()
    }

    pub(crate) fn attach(&mut self, relation: RelationId) {
        self.relations.insert(relation);
    }
}

impl Identified for Node {
    type Id = NodeId;

    fn entity(&self) -> &Entity<NodeId> {
        &self.entity
    }
}

impl Resembling for Node {}

/// Relation between two nodes of the same graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relation {
    #[serde(flatten)]
    entity: Entity<RelationId>,
    start: NodeId,
    end: NodeId,
    directed: bool,
}

impl Relation {
    /// Creates a relation from `start` to `end`.
    pub fn new(
        id: RelationId,
        start: NodeId,
        end: NodeId,
        directed: bool,
        label: Option<String>,
        properties: Properties,
    ) -> Self {
        Self {
            entity: Entity::new(id, label).with_properties(properties),
            start,
            end,
            directed,
        }
    }

    /// Start endpoint.
    pub fn start(&self) -> NodeId {
        self.start
    }

    /// End endpoint.
    pub fn end(&self) -> NodeId {
        self.end
    }

    /// Whether direction matters when matching.
    pub fn is_directed(&self) -> bool {
        self.directed
    }

    /// Whether both endpoints are the same node.
    pub fn is_self_loop(&self) -> bool {
        self.start == self.end
    }

    /// Whether `node` is one of the endpoints.
    pub fn touches(&self, node: NodeId) -> bool {
        self.start == node || self.end == node
    }

    /// The endpoint opposite `node`, or `None` if `node` is not an endpoint.
    pub fn other(&self, node: NodeId) -> Option<NodeId> {
        if node == self.start {
            Some(self.end)
        } else if node == self.end {
            Some(self.start)
        } else {
            None
        }
    }
}

impl Identified for Relation {
    type Id = RelationId;

    fn entity(&self) -> &Entity<RelationId> {
        &self.entity
    }
}

impl Resembling for Relation {}

#[cfg(test)]
mod tests {
    use super::*;

    fn person(id: i64, age: Option<i64>) -> Node {
        let mut props = Properties::new();
        if let Some(age) = age {
            props.insert("age".into(), Value::Int(age));
        }
        Node::new(NodeId(id), Some("Person".into()), props)
    }

    #[test]
    fn resembles_unlabelled_wildcard() {
        let a = person(0, Some(30));
        let b = Node::new(NodeId(1), None, Properties::new());
        assert!(a.resembles(&b));
        assert!(b.resembles(&a));
    }

    #[test]
    fn label_and_property_conflicts_block_resemblance() {
        let a = person(0, Some(30));
        let company = Node::new(NodeId(1), Some("Company".into()), Properties::new());
        assert!(!a.resembles(&company));
        assert!(!a.resembles(&person(2, Some(31))));
        assert!(a.resembles(&person(3, None)));
    }

    #[test]
    fn never_resembles_itself() {
        let a = person(0, Some(30));
        assert!(!a.resembles(&a.clone()));
    }

    #[test]
    fn relation_other_endpoint() {
        let rel = Relation::new(RelationId(0), NodeId(1), NodeId(2), true, None, Properties::new());
        assert_eq!(rel.other(NodeId(1)), Some(NodeId(2)));
        assert_eq!(rel.other(NodeId(2)), Some(NodeId(1)));
        assert_eq!(rel.other(NodeId(3)), None);
        let self_loop =
            Relation::new(RelationId(1), NodeId(4), NodeId(4), false, None, Properties::new());
        assert!(self_loop.is_self_loop());
        assert_eq!(self_loop.other(NodeId(4)), Some(NodeId(4)));
    }
}
