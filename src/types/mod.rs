#![forbid(unsafe_code)]

//! Identifier newtypes and the scalar property value shared by every layer.

use std::fmt;

use serde::{Deserialize, Serialize};

mod value;

pub use value::Value;

/// Identity of a node within one [`Graph`](crate::graph::Graph).
///
/// Drawing-origin graphs use the vertex index; database-origin graphs use the
/// id assigned by the database.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub i64);

/// Identity of a relation within one [`Graph`](crate::graph::Graph).
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RelationId(pub i64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for RelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for NodeId {
    fn from(value: i64) -> Self {
        NodeId(value)
    }
}

impl From<NodeId> for i64 {
    fn from(value: NodeId) -> Self {
        value.0
    }
}

impl From<i64> for RelationId {
    fn from(value: i64) -> Self {
        RelationId(value)
    }
}

impl From<RelationId> for i64 {
    fn from(value: RelationId) -> Self {
        value.0
    }
}
