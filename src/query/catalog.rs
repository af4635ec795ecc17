//! Fixed read-only queries used to build the metadata catalog.
//!
//! Every query aliases its columns so rows can be decoded by name.

use super::cypher::identifier;

/// Column holding a label or relationship type name.
pub const LABEL_COLUMN: &str = "label";
/// Column holding a count.
pub const COUNT_COLUMN: &str = "count";
/// Column holding the decorated node type of a property catalog row.
pub const NODE_TYPE_COLUMN: &str = "nodeType";
/// Column holding the decorated relationship type of a property catalog row.
pub const REL_TYPE_COLUMN: &str = "relType";
/// Column holding `[name, type]` pairs of a property catalog row.
pub const PROPERTIES_COLUMN: &str = "properties";

/// Lists node labels.
pub const LABELS_QUERY: &str = "CALL db.labels() YIELD label RETURN label";

/// Lists relationship types.
pub const RELATIONSHIP_TYPES_QUERY: &str =
    "CALL db.relationshipTypes() YIELD relationshipType RETURN relationshipType AS label";

/// Counts every node.
pub const TOTAL_NODES_QUERY: &str = "MATCH (n) RETURN count(n) AS count";

/// Counts every relationship.
pub const TOTAL_RELATIONSHIPS_QUERY: &str = "MATCH ()-[r]->() RETURN count(r) AS count";

/// Property names and types per node label.
pub const NODE_TYPE_PROPERTIES_QUERY: &str = "CALL db.schema.nodeTypeProperties() \
     YIELD nodeType, propertyName, propertyTypes \
     WHERE propertyName IS NOT NULL \
     RETURN nodeType, collect([propertyName, propertyTypes[0]]) AS properties";

/// Property names and types per relationship type.
pub const REL_TYPE_PROPERTIES_QUERY: &str = "CALL db.schema.relTypeProperties() \
     YIELD relType, propertyName, propertyTypes \
     WHERE propertyName IS NOT NULL \
     RETURN relType, collect([propertyName, propertyTypes[0]]) AS properties";

/// Schema shape: one node per label, one relationship per connected type.
pub const SCHEMA_QUERY: &str =
    "CALL db.schema.visualization() YIELD nodes, relationships RETURN nodes, relationships";

/// Counts nodes carrying `label`.
pub fn node_count_by_label(label: &str) -> String {
    format!("MATCH (n:{}) RETURN count(n) AS count", identifier(label))
}

/// Counts relationships of type `rel_type`.
pub fn relationship_count_by_type(rel_type: &str) -> String {
    format!(
        "MATCH ()-[r:{}]->() RETURN count(r) AS count",
        identifier(rel_type)
    )
}

/// Strips the `` :` `` prefix and `` ` `` suffix the schema procedures put
/// around type names. Undecorated names are returned unchanged.
pub fn undecorate(name: &str) -> &str {
    let name = name.strip_prefix(":`").unwrap_or(name);
    name.strip_suffix('`').unwrap_or(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_queries_quote_odd_names() {
        assert_eq!(
            node_count_by_label("Person"),
            "MATCH (n:Person) RETURN count(n) AS count"
        );
        assert_eq!(
            relationship_count_by_type("ACTED IN"),
            "MATCH ()-[r:`ACTED IN`]->() RETURN count(r) AS count"
        );
    }

    #[test]
    fn schema_type_names_are_undecorated() {
        assert_eq!(undecorate(":`Person`"), "Person");
        assert_eq!(undecorate(":`Big Company`"), "Big Company");
        assert_eq!(undecorate("Person"), "Person");
    }
}
