#![allow(dead_code)]

use graphsketch::db::{RawNode, RawRelationship};
use graphsketch::query::catalog;
use graphsketch::{Properties, Record, RecordValue, ReplayDatabase, Value};

pub fn raw_node(id: i64, label: &str, props: &[(&str, Value)]) -> RawNode {
    RawNode {
        id,
        labels: vec![label.to_owned()],
        properties: props_of(props),
    }
}

pub fn raw_rel(id: i64, start: i64, end: i64, rel_type: &str) -> RawRelationship {
    RawRelationship {
        id,
        start,
        end,
        rel_type: rel_type.to_owned(),
        properties: Properties::new(),
    }
}

pub fn props_of(props: &[(&str, Value)]) -> Properties {
    props
        .iter()
        .map(|(k, v)| ((*k).to_owned(), v.clone()))
        .collect()
}

fn names(values: &[&str]) -> Vec<Record> {
    values
        .iter()
        .map(|name| Record::new().with("label", *name))
        .collect()
}

fn count(value: i64) -> Vec<Record> {
    vec![Record::new().with("count", value)]
}

/// Row returned by a compiled query: node and relationship lists plus the
/// id pairs of each embedding.
pub fn result_row(
    nodes: Vec<RawNode>,
    relationships: Vec<RawRelationship>,
    pairs: Vec<(Vec<i64>, Vec<i64>)>,
) -> Record {
    let ids: Vec<RecordValue> = pairs
        .into_iter()
        .map(|(n, r)| RecordValue::List(vec![n.into(), r.into()]))
        .collect();
    Record::new()
        .with("nodes", nodes)
        .with("relationships", relationships)
        .with("resultIds", ids)
}

/// Small social graph: three people and a company.
pub fn social_catalog() -> ReplayDatabase {
    ReplayDatabase::new()
        .with_response(catalog::LABELS_QUERY, names(&["Person", "Company"]))
        .with_response(
            catalog::RELATIONSHIP_TYPES_QUERY,
            names(&["KNOWS", "WORKS_AT"]),
        )
        .with_response(catalog::node_count_by_label("Person"), count(3))
        .with_response(catalog::node_count_by_label("Company"), count(1))
        .with_response(catalog::relationship_count_by_type("KNOWS"), count(2))
        .with_response(catalog::relationship_count_by_type("WORKS_AT"), count(3))
        .with_response(catalog::TOTAL_NODES_QUERY, count(4))
        .with_response(catalog::TOTAL_RELATIONSHIPS_QUERY, count(5))
        .with_response(
            catalog::NODE_TYPE_PROPERTIES_QUERY,
            vec![
                Record::new().with("nodeType", ":`Person`").with(
                    "properties",
                    vec![
                        vec!["name", "String"],
                        vec!["age", "Long"],
                        vec!["age", "Double"],
                    ],
                ),
                Record::new()
                    .with("nodeType", ":`Company`")
                    .with("properties", vec![vec!["name", "String"]]),
            ],
        )
        .with_response(
            catalog::REL_TYPE_PROPERTIES_QUERY,
            vec![Record::new()
                .with("relType", ":`KNOWS`")
                .with("properties", vec![vec!["since", "Long"]])],
        )
        .with_response(
            catalog::SCHEMA_QUERY,
            vec![Record::new()
                .with(
                    "nodes",
                    vec![
                        raw_node(-1, "Person", &[("name", Value::from("Person"))]),
                        raw_node(-2, "Company", &[("name", Value::from("Company"))]),
                    ],
                )
                .with(
                    "relationships",
                    vec![
                        raw_rel(-1, -1, -1, "KNOWS"),
                        raw_rel(-2, -1, -2, "WORKS_AT"),
                    ],
                )],
        )
}

/// Catalog of a database without any data.
pub fn empty_catalog() -> ReplayDatabase {
    ReplayDatabase::new()
        .with_response(catalog::LABELS_QUERY, Vec::new())
        .with_response(catalog::RELATIONSHIP_TYPES_QUERY, Vec::new())
        .with_response(catalog::TOTAL_NODES_QUERY, count(0))
        .with_response(catalog::TOTAL_RELATIONSHIPS_QUERY, count(0))
        .with_response(catalog::NODE_TYPE_PROPERTIES_QUERY, Vec::new())
        .with_response(catalog::REL_TYPE_PROPERTIES_QUERY, Vec::new())
        .with_response(
            catalog::SCHEMA_QUERY,
            vec![Record::new()
                .with("nodes", Vec::<RawNode>::new())
                .with("relationships", Vec::<RawRelationship>::new())],
        )
}
