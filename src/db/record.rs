use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::DecodeError;
use crate::model::Properties;

/// Node as reported by the database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawNode {
    /// Database-assigned id.
    pub id: i64,
    /// Labels in database order.
    #[serde(default)]
    pub labels: Vec<String>,
    /// Property values.
    #[serde(default)]
    pub properties: Properties,
}

/// Relationship as reported by the database. Always directed from `start`
/// to `end`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRelationship {
    /// Database-assigned id.
    pub id: i64,
    /// Id of the start node.
    pub start: i64,
    /// Id of the end node.
    pub end: i64,
    /// Relationship type.
    #[serde(rename = "type")]
    pub rel_type: String,
    /// Property values.
    #[serde(default)]
    pub properties: Properties,
}

/// Value of a record field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "t", content = "v")]
pub enum RecordValue {
    /// Null.
    Null,
    /// Boolean.
    Bool(bool),
    /// Integer.
    Int(i64),
    /// Floating point number.
    Float(f64),
    /// String.
    String(String),
    /// List of values.
    List(Vec<RecordValue>),
    /// Node.
    Node(RawNode),
    /// Relationship.
    Relationship(RawRelationship),
}

impl RecordValue {
    /// Kind name used in decode errors.
    pub fn kind(&self) -> &'static str {
        match self {
            RecordValue::Null => "null",
            RecordValue::Bool(_) => "boolean",
            RecordValue::Int(_) => "integer",
            RecordValue::Float(_) => "float",
            RecordValue::String(_) => "string",
            RecordValue::List(_) => "list",
            RecordValue::Node(_) => "node",
            RecordValue::Relationship(_) => "relationship",
        }
    }

    /// Reads an integer.
    pub fn as_int(&self, context: &str) -> Result<i64, DecodeError> {
        match self {
            RecordValue::Int(v) => Ok(*v),
            other => Err(DecodeError::wrong_type(context, "integer", other.kind())),
        }
    }

    /// Reads a string.
    pub fn as_str(&self, context: &str) -> Result<&str, DecodeError> {
        match self {
            RecordValue::String(v) => Ok(v),
            other => Err(DecodeError::wrong_type(context, "string", other.kind())),
        }
    }

    /// Reads a list.
    pub fn as_list(&self, context: &str) -> Result<&[RecordValue], DecodeError> {
        match self {
            RecordValue::List(v) => Ok(v),
            other => Err(DecodeError::wrong_type(context, "list", other.kind())),
        }
    }

    /// Reads a node.
    pub fn as_node(&self, context: &str) -> Result<&RawNode, DecodeError> {
        match self {
            RecordValue::Node(v) => Ok(v),
            other => Err(DecodeError::wrong_type(context, "node", other.kind())),
        }
    }

    /// Reads a relationship.
    pub fn as_relationship(&self, context: &str) -> Result<&RawRelationship, DecodeError> {
        match self {
            RecordValue::Relationship(v) => Ok(v),
            other => Err(DecodeError::wrong_type(context, "relationship", other.kind())),
        }
    }

    /// Reads a list of integers.
    pub fn as_int_list(&self, context: &str) -> Result<Vec<i64>, DecodeError> {
        self.as_list(context)?
            .iter()
            .map(|value| value.as_int(context))
            .collect()
    }
}

impl From<i64> for RecordValue {
    fn from(value: i64) -> Self {
        RecordValue::Int(value)
    }
}

impl From<&str> for RecordValue {
    fn from(value: &str) -> Self {
        RecordValue::String(value.to_owned())
    }
}

impl From<RawNode> for RecordValue {
    fn from(value: RawNode) -> Self {
        RecordValue::Node(value)
    }
}

impl From<RawRelationship> for RecordValue {
    fn from(value: RawRelationship) -> Self {
        RecordValue::Relationship(value)
    }
}

impl<T: Into<RecordValue>> From<Vec<T>> for RecordValue {
    fn from(value: Vec<T>) -> Self {
        RecordValue::List(value.into_iter().map(Into::into).collect())
    }
}

/// One result row: named fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: BTreeMap<String, RecordValue>,
}

impl Record {
    /// Creates an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the record with `name` set to `value`.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<RecordValue>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Reads a field, failing when it is absent.
    pub fn get(&self, name: &str) -> Result<&RecordValue, DecodeError> {
        self.fields.get(name).ok_or_else(|| DecodeError::missing(name))
    }
}
